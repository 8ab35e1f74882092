pub mod attendance;
pub mod config;
pub mod event;
pub mod gpa;
pub mod prefs;
pub mod subject;
pub mod timer;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use studyroom_core::{Config, Database};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: the database and the loaded configuration.
pub struct Session {
    pub db: Database,
    pub config: Config,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let db = Database::open()?;
        Ok(Self { db, config })
    }

    /// Id the synchronized documents are stored under.
    pub fn owner(&self) -> &str {
        &self.config.account.user_id
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a date-time given as RFC 3339 or as local `YYYY-MM-DD HH:MM`.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| format!("'{input}' does not exist in the local time zone"));
        }
    }
    Err(format!(
        "invalid date-time '{input}' (expected RFC 3339 or YYYY-MM-DD HH:MM)"
    ))
}

pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{input}' (expected YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_accepts_rfc3339() {
        let dt = parse_datetime("2024-09-02T10:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-09-02T10:00:00+00:00");
    }

    #[test]
    fn datetime_accepts_local_forms() {
        let a = parse_datetime("2024-09-02 10:00").unwrap();
        let b = parse_datetime("2024-09-02T10:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn datetime_rejects_garbage() {
        assert!(parse_datetime("tomorrow").is_err());
        assert!(parse_date("02/09/2024").is_err());
    }
}
