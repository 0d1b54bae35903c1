/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Timestamp `days` days after `from` (both epoch millis)
pub fn add_days(from: i64, days: i64) -> i64 {
    from + days * MILLIS_PER_DAY
}

/// Lowercase and trim an email so it can be used as a lookup key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_days() {
        assert_eq!(add_days(0, 1), 86_400_000);
        assert_eq!(add_days(1_000, 365), 1_000 + 365 * MILLIS_PER_DAY);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("owner@cafe.sv"));
        assert!(is_valid_email(" a@b.co "));
        assert!(!is_valid_email("owner"));
        assert!(!is_valid_email("@cafe.sv"));
        assert!(!is_valid_email("owner@cafe"));
        assert!(!is_valid_email("owner@.sv"));
        assert!(!is_valid_email("own er@cafe.sv"));
        assert!(!is_valid_email("a@b@c.sv"));
    }
}
