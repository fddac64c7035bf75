use crate::error::DriverError;
use regex::Regex;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+[A-Za-z0-9_.-]*$").expect("tag pattern is a valid regex")
});

/// Checks an image tag against the docker tag grammar: at least one word character,
/// followed by any number of word characters, dots and dashes.
pub fn is_valid_tag(tag: &str) -> Result<(), DriverError> {
    if TAG_PATTERN.is_match(tag) {
        Ok(())
    } else {
        Err(DriverError::InvalidTag(tag.to_string()))
    }
}
