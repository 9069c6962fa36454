/// Zero-based position of a job in its batch, assigned at enumeration time.
pub type JobIndex = usize;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
