/// Longest slugified title kept before the id suffix.
const TITLE_PART_MAX: usize = 60;

/// Length of the id suffix appended to every slug.
const SUFFIX_LEN: usize = 6;

/// Derive a post slug from its title and id.
///
/// The title is lowercased and reduced to dash-separated ASCII words; the
/// last six characters of the id are appended so two posts with the same
/// title do not collide.
///
/// ```
/// use cb_types::post_slug;
///
/// assert_eq!(post_slug("Hello World", "0190abcdef123456"), "hello-world-123456");
/// ```
pub fn post_slug(title: &str, id: &str) -> String {
    let mut words = String::new();
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !words.is_empty() {
                words.push('-');
            }
            pending_dash = false;
            words.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if words.len() >= TITLE_PART_MAX {
            break;
        }
    }
    words.truncate(TITLE_PART_MAX);
    let words = words.trim_end_matches('-');

    let suffix_start = id.len().saturating_sub(SUFFIX_LEN);
    let suffix = id.get(suffix_start..).unwrap_or(id);

    if words.is_empty() {
        format!("post-{suffix}")
    } else {
        format!("{words}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_punctuation() {
        assert_eq!(post_slug("  What's new?!  Rust 2.0 ", "abcdef"), "what-s-new-rust-2-0-abcdef");
    }

    #[test]
    fn empty_title_still_gets_slug() {
        assert_eq!(post_slug("!!!", "zzz999"), "post-zzz999");
    }

    #[test]
    fn same_title_different_ids() {
        assert_ne!(post_slug("Same", "aaaaaa111111"), post_slug("Same", "aaaaaa222222"));
    }

    #[test]
    fn long_titles_are_bounded() {
        let slug = post_slug(&"word ".repeat(100), "123456");
        assert!(slug.len() <= TITLE_PART_MAX + 1 + SUFFIX_LEN);
        assert!(slug.ends_with("-123456"));
    }
}
