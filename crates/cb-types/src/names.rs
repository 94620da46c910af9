//! Name validation for users, communities and storage keys.
//!
//! Keys become path components in the blob store, so every rule here also
//! keeps keys free of separators and traversal sequences.
//!
//! - Usernames: 3–20 characters, ASCII letters, digits, `_` or `-`.
//! - Community names: sanitized to `[a-z0-9_]`, then 3–21 characters.
//! - Document keys: 1–128 characters, ASCII letters, digits, `_` or `-`.

use crate::error::{TypeError, TypeResult};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const COMMUNITY_MIN: usize = 3;
pub const COMMUNITY_MAX: usize = 21;
const KEY_MAX: usize = 128;

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

/// Validate a username.
///
/// ```
/// use cb_types::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("al").is_err());
/// assert!(validate_username("../etc").is_err());
/// ```
pub fn validate_username(name: &str) -> TypeResult<()> {
    let invalid = |reason: String| TypeError::InvalidUsername {
        name: name.to_string(),
        reason,
    };
    let len = name.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(invalid(format!(
            "must be {USERNAME_MIN}-{USERNAME_MAX} characters, got {len}"
        )));
    }
    if let Some(ch) = name.chars().find(|c| !is_key_char(*c)) {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

/// Reduce a requested community name to the stored alphabet.
///
/// Lowercases, turns whitespace and `-` into `_`, and drops everything else
/// outside `[a-z0-9_]`. The result still has to pass
/// [`validate_community_name`].
pub fn sanitize_community_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter_map(|ch| {
            let ch = ch.to_ascii_lowercase();
            match ch {
                'a'..='z' | '0'..='9' | '_' => Some(ch),
                '-' => Some('_'),
                c if c.is_whitespace() => Some('_'),
                _ => None,
            }
        })
        .collect()
}

/// Validate an already-sanitized community name.
pub fn validate_community_name(name: &str) -> TypeResult<()> {
    let invalid = |reason: String| TypeError::InvalidCommunityName {
        name: name.to_string(),
        reason,
    };
    let len = name.len();
    if !(COMMUNITY_MIN..=COMMUNITY_MAX).contains(&len) {
        return Err(invalid(format!(
            "must be {COMMUNITY_MIN}-{COMMUNITY_MAX} characters, got {len}"
        )));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '_'))
    {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

/// Validate a key that will be embedded in a storage path.
pub fn validate_document_key(key: &str) -> TypeResult<()> {
    let invalid = |reason: &str| TypeError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    if key.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if key.len() > KEY_MAX {
        return Err(invalid("too long"));
    }
    if !key.chars().all(is_key_char) {
        return Err(invalid("only ASCII letters, digits, '_' and '-' are allowed"));
    }
    Ok(())
}
