/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates carry no time zone; they are interpreted as UTC days.
pub type Date = chrono::NaiveDate;

/// The instant a calendar date begins (midnight UTC).
pub fn start_of_day(date: Date) -> Timestamp {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
