use std::sync::OnceLock;

use regex::Regex;

/// Upper bound on a single fragment. The assignment lists and panel sections
/// are small server-rendered snippets; anything bigger is a server fault.
const MAX_FRAGMENT_BYTES: usize = 256 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    #[error("fragment too large: {0} bytes")]
    TooLarge(usize),
}

fn script_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("script block regex"))
}

fn script_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</?script\b[^>]*>").expect("script tag regex"))
}

fn event_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\son[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("event attr regex")
    })
}

/// Scrub a server fragment at the trust boundary: drop script elements and
/// inline `on*=` handlers, leave the rest of the markup untouched. The server
/// owns the fragment's shape; the scrub only removes what must never cross
/// into the shell.
pub fn scrub(raw: &str) -> Result<String, FragmentError> {
    if raw.len() > MAX_FRAGMENT_BYTES {
        return Err(FragmentError::TooLarge(raw.len()));
    }
    let without_blocks = script_block_re().replace_all(raw, "");
    let without_tags = script_tag_re().replace_all(&without_blocks, "");
    let clean = event_attr_re().replace_all(&without_tags, "");
    Ok(clean.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_markup_passes_through() {
        assert_eq!(scrub("<li>Math</li>").expect("scrub"), "<li>Math</li>");
    }

    #[test]
    fn script_blocks_are_stripped() {
        let html = "<li>Math</li><script>steal()</script><li>Science</li>";
        assert_eq!(scrub(html).expect("scrub"), "<li>Math</li><li>Science</li>");
    }

    #[test]
    fn unclosed_script_tag_is_stripped() {
        let html = "<li>Math</li><script src=\"x.js\">";
        assert_eq!(scrub(html).expect("scrub"), "<li>Math</li>");
    }

    #[test]
    fn inline_handlers_are_stripped() {
        let html = r##"<a href="#" onclick="evil()" data-subject="3">x</a>"##;
        assert_eq!(
            scrub(html).expect("scrub"),
            r##"<a href="#" data-subject="3">x</a>"##
        );
    }

    #[test]
    fn oversized_fragment_is_rejected() {
        let big = "x".repeat(MAX_FRAGMENT_BYTES + 1);
        assert!(matches!(scrub(&big), Err(FragmentError::TooLarge(_))));
    }
}
