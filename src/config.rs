use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// In-memory store when unset.
    pub database_url: Option<String>,
    /// JSON array of profiles seeded into the in-memory store.
    pub profiles_file: Option<String>,
    pub jwt_secret: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance policy
    pub late_after: NaiveTime,
    pub workday_offset: FixedOffset,

    pub cache_ttl: Duration,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            profiles_file: env::var("PROFILES_FILE").ok().filter(|s| !s.trim().is_empty()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("RATE_PROTECTED_PER_MIN must be a number")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            late_after: parse_clock_time(
                &env::var("LATE_AFTER").unwrap_or_else(|_| "09:00".to_string()),
            )?,
            workday_offset: parse_utc_offset(
                &env::var("WORKDAY_UTC_OFFSET").unwrap_or_else(|_| "+01:00".to_string()),
            )?,

            cache_ttl: Duration::from_secs(
                env::var("CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "30".to_string()) // default 30s
                    .parse()
                    .context("CACHE_TTL_SECS must be a number")?,
            ),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .with_context(|| format!("invalid time of day: {raw:?}"))
}

/// `+01:00`, `-0530`, `+1`, `UTC`, `UTC+2`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();
    let rest = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(upper.as_str())
        .trim();

    if rest.is_empty() {
        return FixedOffset::east_opt(0).ok_or_else(|| anyhow!("invalid UTC offset"));
    }

    let (sign, digits) = match rest.chars().next() {
        Some('+') => (1, &rest[1..]),
        Some('-') => (-1, &rest[1..]),
        _ => return Err(anyhow!("UTC offset must start with + or -: {trimmed:?}")),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return Err(anyhow!("UTC offset must be digits like +01:00: {trimmed:?}"));
    }

    let (hours, minutes) = if let Some((h, m)) = digits.split_once(':') {
        (h.parse::<i32>()?, m.parse::<i32>()?)
    } else if digits.len() > 2 {
        let (h, m) = digits.split_at(digits.len() - 2);
        (h.parse::<i32>()?, m.parse::<i32>()?)
    } else {
        (digits.parse::<i32>()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return Err(anyhow!("UTC offset out of range: {trimmed:?}"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("UTC offset out of range: {trimmed:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_clock_time("09:00").unwrap(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(
            parse_clock_time(" 08:30:15 ").unwrap(),
            NaiveTime::from_hms_opt(8, 30, 15).unwrap()
        );
        assert!(parse_clock_time("9am").is_err());
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("+01:00").unwrap().local_minus_utc(), 3600);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -19800);
        assert_eq!(parse_utc_offset("+2").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_utc_offset("utc").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("UTC+3").unwrap().local_minus_utc(), 10800);
    }

    #[test]
    fn rejects_bad_offsets() {
        assert!(parse_utc_offset("01:00").is_err());
        assert!(parse_utc_offset("+15:00").is_err());
        assert!(parse_utc_offset("+01:75").is_err());
        assert!(parse_utc_offset("+ab").is_err());
        assert!(parse_utc_offset("+").is_err());
    }

    #[test]
    fn non_ascii_offset_is_an_error_not_a_panic() {
        assert!(parse_utc_offset("+é1").is_err());
        assert!(parse_utc_offset("+1é").is_err());
        assert!(parse_utc_offset("-０１００").is_err());
    }
}
