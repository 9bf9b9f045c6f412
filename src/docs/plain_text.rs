use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Turns wiki markup into text suitable for a prompt.
pub trait PlainText: Send + Sync {
    fn extract(&self, markup: &str) -> String;
}

/// Removes anything shaped like `<...>`. Not a markup parser: attribute
/// values containing `>` and unterminated tags are cut naively.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagStripper;

fn tag_pattern() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| match Regex::new("<[^>]*>") {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Tag pattern failed to compile, markup passes through: {}", e);
            None
        }
    })
    .as_ref()
}

impl PlainText for TagStripper {
    fn extract(&self, markup: &str) -> String {
        match tag_pattern() {
            Some(re) => re.replace_all(markup, "").into_owned(),
            None => markup.to_string(),
        }
    }
}
