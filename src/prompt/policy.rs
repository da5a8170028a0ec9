//! Free-text policy.
//!
//! Special instructions may clarify colours, sizes and positions but may not
//! ask the render provider for new items, which would escape pricing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::prelude::Result;
use crate::Error;

pub const NO_NEW_ITEMS: &str = "no-new-items";

static ALLOWED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r"(?i)\badd\s+more\s+(colou?r|red|orange|yellow|green|teal|blue|purple|pink|brown|gray|grey|cream|white|black|gold|silver)\b",
        )
        .expect("add-more-colour regex"),
        Regex::new(r"(?i)\bmake\s+(the\s+)?[\w\s]{1,30}?\s+bigger\b").expect("make-bigger regex"),
        Regex::new(r"(?i)\badd\s+more\s+(sparkle|shimmer|glitter)\b").expect("sparkle regex"),
    ]
});

static FORBIDDEN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r"(?i)\b(add|put|include|place)\s+(a\s+)?(new|another|more|extra|a)\s+(topper|figure|character|item|decoration|element)s?\b",
        )
        .expect("new-item regex"),
        Regex::new(r"(?i)\bcreate\s+(a\s+)?new\b").expect("create-new regex"),
        Regex::new(r"(?i)\bextra\s+toppers?\b").expect("extra-topper regex"),
        Regex::new(r"(?i)\bput\s+a\s+new\b").expect("put-a-new regex"),
        Regex::new(r"(?i)\binclude\s+another\b").expect("include-another regex"),
    ]
});

/// Reject free text that asks for new items.
///
/// Allowed phrases are blanked out first, so "add more pink" passes while the
/// rest of the sentence is still checked.
pub fn check_free_text(text: &str) -> Result<()> {
    let mut remaining = text.to_string();
    for allowed in ALLOWED.iter() {
        remaining = allowed.replace_all(&remaining, " ").into_owned();
    }

    if let Some(hit) = FORBIDDEN.iter().find_map(|re| re.find(&remaining)) {
        info!(
            target: "cake_customizer::prompt",
            phrase = hit.as_str(),
            "Free text rejected"
        );
        return Err(Error::PolicyViolation {
            policy: NO_NEW_ITEMS,
            message: format!(
                "instructions cannot add new items (found \"{}\"); use them only to clarify colours, sizes or positions",
                hit.as_str()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarifications_pass() {
        for text in [
            "",
            "make the bear a bit more pastel",
            "Add more pink to the side",
            "make the unicorn horn bigger",
            "add more sparkle please",
            "move the name closer to the edge",
        ] {
            assert!(check_free_text(text).is_ok(), "{text}");
        }
    }

    #[test]
    fn test_new_items_rejected() {
        for text in [
            "add a new topper of a cat",
            "Please put another figure on top",
            "include extra decorations",
            "create new flowers on the side",
            "two extra toppers",
            "put a new balloon",
            "include another bow",
        ] {
            let err = check_free_text(text).unwrap_err();
            assert!(
                matches!(err, Error::PolicyViolation { policy: NO_NEW_ITEMS, .. }),
                "{text}"
            );
        }
    }

    #[test]
    fn test_allowed_phrase_does_not_mask_violation() {
        assert!(check_free_text("add more pink and add a new figure").is_err());
    }
}
