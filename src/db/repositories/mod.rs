pub mod feature;
pub mod token;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::DomainError;

pub use feature::SeaOrmFeatureRepository;
pub use token::SeaOrmTokenRepository;

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DomainError::internal(format!("invalid stored timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_at_microsecond_precision() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn formatted_timestamps_have_fixed_width() {
        let whole = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let fractional = DateTime::from_timestamp(1_700_000_000, 123_000).unwrap();
        assert_eq!(
            format_timestamp(whole).len(),
            format_timestamp(fractional).len()
        );
    }

    #[test]
    fn garbage_timestamp_is_internal_error() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DomainError::Internal(_))
        ));
    }
}
