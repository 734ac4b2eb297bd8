pub mod access;
pub mod admin;
pub mod enrollment;
pub mod progress;
