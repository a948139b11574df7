//! Text measuring, wrapping, and placeholder expansion.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex must compile"));

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\((\w+)\)s|%%").expect("static regex must compile"));

/// Terminal column width of `text`.
pub(crate) fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Replaces `%(key)s` with the looked-up value and `%%` with `%`.
///
/// Unknown keys are left in place.
pub fn expand_placeholders<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match caps.get(1) {
            Some(key) => lookup(key.as_str()).unwrap_or_else(|| caps[0].to_string()),
            None => "%".to_string(),
        })
        .into_owned()
}

/// Greedily wraps whitespace-separated words into lines of at most `width`
/// columns. Words wider than a line are broken.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let mut rest = word;
        while !rest.is_empty() {
            let word_width = display_width(rest);
            let needed = if line.is_empty() {
                word_width
            } else {
                line_width + 1 + word_width
            };
            if needed <= width {
                if !line.is_empty() {
                    line.push(' ');
                    line_width += 1;
                }
                line.push_str(rest);
                line_width += word_width;
                break;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
                continue;
            }
            let (head, tail) = split_at_width(rest, width);
            lines.push(head.to_string());
            rest = tail;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_at_width(word: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (index, ch) in word.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if index > 0 && used + ch_width > width {
            return word.split_at(index);
        }
        used += ch_width;
    }
    (word, "")
}

/// Wraps `text` to `width` columns with every line prefixed by `indent`.
pub(crate) fn fill(text: &str, width: usize, indent: &str) -> String {
    wrap(text, width.saturating_sub(display_width(indent)))
        .iter()
        .map(|line| format!("{indent}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefixes every line of `text` with `indent`, keeping line breaks.
pub(crate) fn indent_lines(text: &str, indent: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| format!("{indent}{line}"))
        .collect()
}

/// Joins rendered parts, skipping empty and suppressed ones.
pub(crate) fn join_parts<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|part| !part.is_empty() && *part != crate::value::SUPPRESS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
        assert!(lines.iter().all(|l| display_width(l) <= 10));
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        assert_eq!(wrap("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn test_expand_placeholders() {
        let expanded = expand_placeholders("%(prog)s runs at 100%% (%(missing)s)", |key| {
            (key == "prog").then(|| "tool".to_string())
        });
        assert_eq!(expanded, "tool runs at 100% (%(missing)s)");
    }

    #[test]
    fn test_normalize_and_indent() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
        assert_eq!(indent_lines("a\n\nb", "  "), "  a\n  \n  b");
        assert_eq!(fill("alpha beta gamma", 12, "  "), "  alpha beta\n  gamma");
    }
}
