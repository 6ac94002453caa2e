use std::sync::OnceLock;

use regex::Regex;

pub trait TextFormatter: Send + Sync {
    fn format(&self, text: &str, arguments: &[(String, String)]) -> String;
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([^{}]+)\}").ok())
        .as_ref()
}

/// Replaces `{Name}` with the value of the argument whose display string is `Name`.
/// Unknown placeholders are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BraceTextFormatter;

impl TextFormatter for BraceTextFormatter {
    fn format(&self, text: &str, arguments: &[(String, String)]) -> String {
        if arguments.is_empty() || !text.contains('{') {
            return text.to_string();
        }
        let Some(regex) = placeholder_pattern() else {
            return text.to_string();
        };
        let mut output = String::new();
        let mut last_index = 0usize;
        for captures in regex.captures_iter(text) {
            let Some(full) = captures.get(0) else {
                continue;
            };
            let Some(key) = captures.get(1) else {
                continue;
            };
            output.push_str(&text[last_index..full.start()]);
            match arguments.iter().find(|(name, _)| name == key.as_str()) {
                Some((_, value)) => output.push_str(value),
                None => output.push_str(full.as_str()),
            }
            last_index = full.end();
        }
        output.push_str(&text[last_index..]);
        output
    }
}
