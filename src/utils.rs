// src/utils.rs
use crate::types::UserFinderError;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Reads lines from a file into a vector of strings.
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    reader.lines().collect()
}

/// Collect usernames from raw lines, skipping blanks and `#` comments.
pub fn parse_username_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Substitute the percent-encoded username into every placeholder of a URL template
pub fn render_url(template: &str, username: &str) -> String {
    template.replace(USERNAME_PLACEHOLDER, &urlencoding::encode(username))
}

pub fn validate_username(username: &str) -> Result<String, UserFinderError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(UserFinderError::InvalidUsername("username is empty".to_string()));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(UserFinderError::InvalidUsername(format!(
            "'{}' contains whitespace or control characters",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

/// Get terminal width
pub fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

/// Shorten `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut cut: String = text.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_url_encodes_username() {
        assert_eq!(
            render_url("https://github.com/{username}", "octocat"),
            "https://github.com/octocat"
        );
        assert_eq!(
            render_url("https://example.com/u/{username}?q={username}", "a/b"),
            "https://example.com/u/a%2Fb?q=a%2Fb"
        );
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("john doe").is_err());
        assert!(validate_username("bad\u{7}").is_err());
    }

    #[test]
    fn test_parse_username_lines() {
        let names = parse_username_lines(["alice", "", "  bob  ", "# comment"]);
        assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("https://example.com/long", 12), "https://e...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
