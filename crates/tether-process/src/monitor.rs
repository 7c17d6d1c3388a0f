//! Output monitor
//!
//! Classifies lines read from a child's stdout/stderr against a readiness
//! pattern. Lines are tested in isolation; only stdout can signal readiness
//! and only the first match per process counts.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

/// Default readiness pattern: the line a web host prints once it has bound.
///
/// The `address` group captures the full bound address token.
pub const DEFAULT_STARTUP_PATTERN: &str = r"\bNow listening on:\s+(?P<address>https?://\S+)";

static DEFAULT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_STARTUP_PATTERN).expect("default startup pattern compiles"));

/// Which output stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled readiness pattern
#[derive(Debug, Clone)]
pub struct ReadinessPattern {
    regex: Regex,
}

impl ReadinessPattern {
    /// Compile a readiness pattern
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Wrap an already compiled regex
    pub fn from_regex(regex: Regex) -> Self {
        Self { regex }
    }

    /// Source text of the pattern
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Test a single line
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Extract the bound address from a readiness line.
    ///
    /// Uses the `address` capture group when the pattern defines one, else
    /// the first capture group. Returns `None` when the line does not match
    /// or the pattern captures nothing.
    pub fn extract_address<'a>(&self, line: &'a str) -> Option<&'a str> {
        let captures = self.regex.captures(line)?;
        captures
            .name("address")
            .or_else(|| captures.get(1))
            .map(|m| m.as_str())
    }
}

impl Default for ReadinessPattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_REGEX.clone(),
        }
    }
}

impl PartialEq for ReadinessPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ReadinessPattern {}

/// Per-process line classifier
#[derive(Debug, Clone)]
pub struct OutputMonitor {
    pattern: ReadinessPattern,
    matched: bool,
}

impl OutputMonitor {
    pub fn new(pattern: ReadinessPattern) -> Self {
        Self {
            pattern,
            matched: false,
        }
    }

    /// Whether the readiness line has already been seen
    pub fn has_matched(&self) -> bool {
        self.matched
    }

    /// Classify one line.
    ///
    /// Returns the full readiness line the first time a stdout line matches;
    /// every later call returns `None`. Stderr is never tested.
    pub fn observe(&mut self, stream: OutputStream, line: &str) -> Option<String> {
        if stream == OutputStream::Stderr || self.matched {
            return None;
        }
        if !self.pattern.is_match(line) {
            return None;
        }
        self.matched = true;
        Some(line.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_extracts_address() {
        let pattern = ReadinessPattern::default();
        let line = "info: Microsoft.Hosting.Lifetime[14] Now listening on: http://127.0.0.1:54321";

        assert!(pattern.is_match(line));
        assert_eq!(
            pattern.extract_address(line),
            Some("http://127.0.0.1:54321")
        );
    }

    #[test]
    fn test_extraction_does_not_depend_on_prefix_length() {
        let pattern = ReadinessPattern::default();
        let short = "Now listening on: http://localhost:5000";
        let long = "      [host] Now listening on:    http://localhost:5000";

        assert_eq!(pattern.extract_address(short), Some("http://localhost:5000"));
        assert_eq!(pattern.extract_address(long), Some("http://localhost:5000"));
    }

    #[test]
    fn test_first_group_used_without_named_group() {
        let pattern = ReadinessPattern::new(r"ready at (\S+)").unwrap();
        assert_eq!(
            pattern.extract_address("server ready at tcp://0.0.0.0:9000"),
            Some("tcp://0.0.0.0:9000")
        );

        let bare = ReadinessPattern::new("ready").unwrap();
        assert_eq!(bare.extract_address("ready"), None);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(ReadinessPattern::new("(unclosed").is_err());
    }

    #[test]
    fn test_only_first_stdout_match_reported() {
        let mut monitor = OutputMonitor::new(ReadinessPattern::default());

        assert_eq!(monitor.observe(OutputStream::Stdout, "Building..."), None);
        assert_eq!(
            monitor.observe(OutputStream::Stdout, "Now listening on: http://localhost:5000"),
            Some("Now listening on: http://localhost:5000".to_string())
        );
        assert!(monitor.has_matched());
        assert_eq!(
            monitor.observe(OutputStream::Stdout, "Now listening on: http://localhost:5001"),
            None
        );
    }

    #[test]
    fn test_stderr_never_matches() {
        let mut monitor = OutputMonitor::new(ReadinessPattern::default());

        assert_eq!(
            monitor.observe(OutputStream::Stderr, "Now listening on: http://localhost:5000"),
            None
        );
        assert!(!monitor.has_matched());
    }
}
