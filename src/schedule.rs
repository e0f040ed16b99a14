//! Run schedule derived from pipe settings.
//!
//! `summary_frequency = "daily"` fires once a day at `email_time` (local
//! clock); a number `N` fires every N hours.

use chrono::{DateTime, Duration, NaiveTime, TimeZone};

use crate::types::{DigestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Daily { at: NaiveTime },
    EveryHours(u32),
}

impl Schedule {
    pub fn from_settings(summary_frequency: &str, email_time: &str) -> Result<Self> {
        let frequency = summary_frequency.trim().to_lowercase();
        if frequency == "daily" {
            let at = NaiveTime::parse_from_str(email_time.trim(), "%H:%M").map_err(|e| {
                DigestError::Config(format!(
                    "Invalid email_time '{}' (expected HH:MM): {}",
                    email_time, e
                ))
            })?;
            return Ok(Self::Daily { at });
        }

        match frequency.parse::<u32>() {
            Ok(hours) if hours > 0 => Ok(Self::EveryHours(hours)),
            _ => Err(DigestError::Config(format!(
                "Invalid summary_frequency '{}'. Valid values: daily, or a number of hours",
                summary_frequency
            ))),
        }
    }

    /// Human-readable schedule used in the welcome email
    pub fn describe(&self) -> String {
        match self {
            Self::Daily { at } => format!("It will run at {} every day.", at.format("%H:%M")),
            Self::EveryHours(hours) => format!("It will run every {} hours.", hours),
        }
    }

    /// Next fire time strictly after `now`
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Self::EveryHours(hours) => now.clone() + Duration::hours(i64::from(*hours)),
            Self::Daily { at } => {
                let tz = now.timezone();
                let local_now = now.naive_local();
                let mut candidate = local_now.date().and_time(*at);
                if candidate <= local_now {
                    candidate += Duration::days(1);
                }
                tz.from_local_datetime(&candidate)
                    .earliest()
                    // Local time skipped by a DST jump: fire one day later
                    .unwrap_or_else(|| now.clone() + Duration::days(1))
            }
        }
    }

    /// Time to wait from `now` until the next fire
    pub fn wait_from<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> std::time::Duration {
        (self.next_after(now) - now.clone())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_parse_daily() {
        let schedule = Schedule::from_settings("daily", "11:00").unwrap();
        assert_eq!(
            schedule,
            Schedule::Daily {
                at: NaiveTime::from_hms_opt(11, 0, 0).unwrap()
            }
        );
        assert_eq!(schedule.describe(), "It will run at 11:00 every day.");
    }

    #[test]
    fn test_parse_hours() {
        let schedule = Schedule::from_settings(" 4 ", "ignored").unwrap();
        assert_eq!(schedule, Schedule::EveryHours(4));
        assert_eq!(schedule.describe(), "It will run every 4 hours.");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Schedule::from_settings("daily", "noon").is_err());
        assert!(Schedule::from_settings("0", "11:00").is_err());
        assert!(Schedule::from_settings("weekly", "11:00").is_err());
    }

    #[test]
    fn test_daily_next_is_later_today() {
        let schedule = Schedule::from_settings("daily", "11:00").unwrap();
        let next = schedule.next_after(&at("2026-03-01T09:30:00Z"));
        assert_eq!(next, at("2026-03-01T11:00:00Z"));
    }

    #[test]
    fn test_daily_next_rolls_to_tomorrow() {
        let schedule = Schedule::from_settings("daily", "11:00").unwrap();
        let next = schedule.next_after(&at("2026-03-01T11:00:00Z"));
        assert_eq!(next, at("2026-03-02T11:00:00Z"));
    }

    #[test]
    fn test_every_hours_wait() {
        let schedule = Schedule::EveryHours(2);
        let wait = schedule.wait_from(&at("2026-03-01T09:30:00Z"));
        assert_eq!(wait, std::time::Duration::from_secs(7200));
    }
}
