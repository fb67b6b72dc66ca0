//! File-name patterns used by the bulk operations.
//!
//! Dialect, applied after upper-casing both sides:
//!
//! | glob | meaning                      |
//! |------|------------------------------|
//! | `.`  | a literal dot                |
//! | `?`  | any single character         |
//! | `#`  | one digit                    |
//! | `*`  | any run, including empty     |
//!
//! Everything else is literal. A matcher reports a hit when the pattern
//! occurs *anywhere* in the name, so `*.txt` also accepts
//! `report.txtarchive`. Callers rely on this; keep it unanchored.

use regex::Regex;

/// A compiled, case-insensitive file-name pattern.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    glob: String,
    regex: Regex,
}

impl NameMatcher {
    pub fn compile(glob: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&translate(glob))?;
        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(&name.to_uppercase())
    }

    /// The pattern as given by the caller.
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Keep only the names accepted by this matcher, preserving order.
    pub fn filter(&self, names: Vec<String>) -> Vec<String> {
        names.into_iter().filter(|n| self.matches(n)).collect()
    }
}

fn translate(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut buf = [0u8; 4];
    for ch in glob.to_uppercase().chars() {
        match ch {
            '.' => out.push_str("[.]"),
            '?' => out.push('.'),
            '#' => out.push_str("[0-9]"),
            '*' => out.push_str(".*"),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out
}
