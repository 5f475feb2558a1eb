//! Utility functions for sign-in.

/// Whether `email` looks like a deliverable address.
///
/// A shape check only, not full RFC 5322: one `@`, a non-empty local part,
/// a dotted domain with no empty labels, 3 to 255 characters overall.
///
/// # Examples
///
/// ```
/// use prospect_portal_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("dana@acme.com"));
/// assert!(is_valid_email("dana+portal@benefits.acme.com"));
/// assert!(!is_valid_email("dana"));
/// assert!(!is_valid_email("@acme.com"));
/// assert!(!is_valid_email("dana@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let valid_local_chars =
        |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_' | '\'');
    let valid_domain_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local_chars) || !domain.chars().all(valid_domain_chars) {
        return false;
    }

    // Domain must have at least two labels, none empty
    domain.contains('.') && domain.split('.').all(|part| !part.is_empty())
}

/// Normalize an address for lookup: trimmed and lowercased.
///
/// # Examples
///
/// ```
/// use prospect_portal_auth::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
