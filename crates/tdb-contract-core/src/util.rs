use std::time::Duration;

use uuid::Uuid;

/// Port nothing listens on in the test environments; clone targets pointing here
/// fail with a refused connection.
pub const UNREACHABLE_PORT: u16 = 12345;

/// Random lowercase alphanumeric identifier, safe as an org, db, user or branch name.
#[must_use]
pub fn random_string() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    // Names must not start with a digit on the server side.
    format!("t{}", &raw[..15])
}

#[must_use]
pub fn random_org_name() -> String {
    format!("org_{}", random_string())
}

#[must_use]
pub fn random_db_name() -> String {
    format!("db_{}", random_string())
}

#[must_use]
pub fn random_user_name() -> String {
    format!("user_{}", random_string())
}

/// `<org>/<db>` spec naming a database that is guaranteed not to exist.
#[must_use]
pub fn random_db_spec() -> String {
    format!("{}/{}", random_string(), random_string())
}

#[must_use]
pub fn unreachable_url() -> String {
    format!("http://localhost:{UNREACHABLE_PORT}/admin/db")
}

/// URL whose host cannot be resolved (`.invalid` is reserved by RFC 2606).
#[must_use]
pub fn unresolvable_url() -> String {
    format!("http://{}.invalid/admin/db", random_string())
}

/// Whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn duration_ms_truncates_fractions_and_saturates() {
        assert_eq!(duration_ms(Duration::from_micros(12_900)), 12);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn random_strings_are_distinct_and_name_safe() {
        let values = (0..64).map(|_| random_string()).collect::<HashSet<_>>();
        assert_eq!(values.len(), 64);
        for value in values {
            assert_eq!(value.len(), 16);
            assert!(value.starts_with('t'));
            assert!(value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn random_db_spec_has_org_and_db_segments() {
        let spec = random_db_spec();
        let (org, db) = spec.split_once('/').expect("org/db");
        assert!(!org.is_empty());
        assert!(!db.is_empty());
        assert_ne!(org, db);
    }

    #[test]
    fn unreachable_targets_are_urls() {
        assert_eq!(unreachable_url(), "http://localhost:12345/admin/db");
        assert!(unresolvable_url().starts_with("http://t"));
        assert!(unresolvable_url().ends_with(".invalid/admin/db"));
    }
}
