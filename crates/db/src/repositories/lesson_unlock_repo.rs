//! Repository for the `lesson_unlocks` table.

use sqlx::{PgConnection, PgPool};
use coursegate_core::types::DbId;

use crate::models::enrollment::{LessonUnlock, UpsertLessonUnlock};

const COLUMNS: &str = "lu.id, lu.enrollment_id, lu.lesson_id, lu.unlock_at, lu.is_unlocked, \
     lu.created_at, lu.updated_at";

/// Insert-or-merge for one calendar entry.
///
/// A row that is already unlocked keeps its date and can never be re-locked.
const UPSERT: &str = "INSERT INTO lesson_unlocks AS lu (enrollment_id, lesson_id, unlock_at, is_unlocked)
     VALUES ($1, $2, $3, $4)
     ON CONFLICT (enrollment_id, lesson_id) DO UPDATE SET
        unlock_at = CASE WHEN lu.is_unlocked THEN lu.unlock_at ELSE EXCLUDED.unlock_at END,
        is_unlocked = lu.is_unlocked OR EXCLUDED.is_unlocked";

pub struct LessonUnlockRepo;

impl LessonUnlockRepo {
    pub async fn find(
        pool: &PgPool,
        enrollment_id: DbId,
        lesson_id: DbId,
    ) -> Result<Option<LessonUnlock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lesson_unlocks lu
             WHERE lu.enrollment_id = $1 AND lu.lesson_id = $2"
        );
        sqlx::query_as::<_, LessonUnlock>(&query)
            .bind(enrollment_id)
            .bind(lesson_id)
            .fetch_optional(pool)
            .await
    }

    /// All rows of an enrollment ordered by date, then module and lesson order.
    pub async fn list_by_enrollment(
        pool: &PgPool,
        enrollment_id: DbId,
    ) -> Result<Vec<LessonUnlock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lesson_unlocks lu
             JOIN lessons l ON l.id = lu.lesson_id
             JOIN course_modules m ON m.id = l.module_id
             WHERE lu.enrollment_id = $1
             ORDER BY lu.unlock_at ASC, m.order_index ASC, l.order_index ASC, lu.lesson_id ASC"
        );
        sqlx::query_as::<_, LessonUnlock>(&query)
            .bind(enrollment_id)
            .fetch_all(pool)
            .await
    }

    /// Upsert every entry on an open connection, typically a transaction
    /// owned by the caller.
    pub async fn upsert_many(
        conn: &mut PgConnection,
        enrollment_id: DbId,
        entries: &[UpsertLessonUnlock],
    ) -> Result<u64, sqlx::Error> {
        let mut affected = 0;
        for entry in entries {
            let result = sqlx::query(UPSERT)
                .bind(enrollment_id)
                .bind(entry.lesson_id)
                .bind(entry.unlock_at)
                .bind(entry.is_unlocked)
                .execute(&mut *conn)
                .await?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }
}
