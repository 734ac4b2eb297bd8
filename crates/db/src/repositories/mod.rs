//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod course_repo;
pub mod enrollment_repo;
pub mod lesson_repo;
pub mod lesson_unlock_repo;
pub mod progress_repo;
pub mod tier_purchase_repo;
pub mod user_repo;

pub use course_repo::CourseRepo;
pub use enrollment_repo::EnrollmentRepo;
pub use lesson_repo::LessonRepo;
pub use lesson_unlock_repo::LessonUnlockRepo;
pub use progress_repo::ProgressRepo;
pub use tier_purchase_repo::TierPurchaseRepo;
pub use user_repo::UserRepo;
