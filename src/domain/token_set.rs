//! Token Set
//!
//! Ordered, duplicate-free sequence of string tokens and its storage codec.
//!
//! In memory a set of favor tags or liked movie ids is always a [`TokenSet`].
//! The single-space delimited text form only exists at the persistence
//! boundary, produced by [`TokenSet::encode`] and read back with
//! [`TokenSet::decode`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Delimiter used by the text encoding
pub const DELIMITER: char = ' ';

/// Ordered set of tokens.
///
/// Insertion order is preserved and the first occurrence of a token wins its
/// position. Tokens are compared as exact, case-sensitive strings, so `"12"`
/// and `"012"` are distinct members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", from = "Vec<String>")]
pub struct TokenSet {
    tokens: Vec<String>,
}

impl TokenSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the stored text form.
    ///
    /// `None` and blank input give an empty set. Runs of whitespace and
    /// leading/trailing whitespace are tolerated; duplicates are dropped.
    pub fn decode(raw: Option<&str>) -> Self {
        let mut set = Self::new();
        if let Some(raw) = raw {
            set.extend(raw.split_whitespace());
        }
        set
    }

    /// Encode to the stored text form (tokens joined by one space)
    pub fn encode(&self) -> String {
        self.tokens.join(" ")
    }

    /// Exact-string membership test
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Append a token if it is not already present.
    ///
    /// A token containing whitespace is treated as free text and each of its
    /// words is inserted separately. Returns true if anything was added.
    pub fn insert(&mut self, token: &str) -> bool {
        let mut added = false;
        for part in token.split_whitespace() {
            if !self.contains(part) {
                self.tokens.push(part.to_string());
                added = true;
            }
        }
        added
    }

    /// Insert every token in order, returning the newly added ones
    pub fn extend<I, S>(&mut self, tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = Vec::new();
        for token in tokens {
            for part in token.as_ref().split_whitespace() {
                if self.insert(part) {
                    added.push(part.to_string());
                }
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }
}

impl fmt::Display for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<Vec<String>> for TokenSet {
    fn from(tokens: Vec<String>) -> Self {
        let mut set = Self::new();
        set.extend(tokens);
        set
    }
}

impl From<TokenSet> for Vec<String> {
    fn from(set: TokenSet) -> Self {
        set.tokens
    }
}

impl<S: AsRef<str>> FromIterator<S> for TokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

// =========================================================================
// Text-level codec
// =========================================================================

/// Decode a stored field into its tokens
pub fn decode(raw: Option<&str>) -> Vec<String> {
    TokenSet::decode(raw).into()
}

/// Encode tokens into the stored form; duplicates are dropped
pub fn encode<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().collect::<TokenSet>().encode()
}

/// Membership test directly against a stored field
pub fn contains(raw: Option<&str>, token: &str) -> bool {
    raw.map_or(false, |raw| raw.split_whitespace().any(|t| t == token))
}

/// Append `token` to a stored field.
///
/// Returns the field unchanged when the token is already a member, otherwise
/// the normalized encoding with the token at the end.
pub fn append(raw: Option<&str>, token: &str) -> String {
    if contains(raw, token) {
        return raw.unwrap_or_default().to_string();
    }
    let mut set = TokenSet::decode(raw);
    set.insert(token);
    set.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_inputs() {
        assert!(TokenSet::decode(None).is_empty());
        assert!(TokenSet::decode(Some("")).is_empty());
        assert!(TokenSet::decode(Some("   ")).is_empty());
        assert_eq!(encode(Vec::<String>::new()), "");
    }

    #[test]
    fn test_decode_normalizes_malformed_input() {
        let set = TokenSet::decode(Some("  action   drama action "));
        assert_eq!(set.as_slice(), ["action", "drama"]);
        assert_eq!(set.encode(), "action drama");
    }

    #[test]
    fn test_concatenation_keeps_first_occurrence() {
        let first = vec!["b", "a", "b"];
        let second = vec!["c", "a", "d"];
        let joined: Vec<&str> = first.iter().chain(second.iter()).copied().collect();

        assert_eq!(decode(Some(&encode(joined))), ["b", "a", "c", "d"]);
    }

    #[test]
    fn test_numeric_tokens_compare_as_strings() {
        let raw = Some("12 7");
        assert!(contains(raw, "12"));
        assert!(!contains(raw, "012"));
        assert_eq!(append(raw, "012"), "12 7 012");
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        let mut set = TokenSet::decode(Some("Drama"));
        assert!(set.insert("drama"));
        assert_eq!(set.encode(), "Drama drama");
    }

    #[test]
    fn test_append_is_idempotent() {
        for raw in [None, Some(""), Some("x"), Some("a b"), Some(" a  b ")] {
            let once = append(raw, "x");
            let twice = append(Some(&once), "x");
            assert_eq!(once, twice, "raw = {:?}", raw);
        }
    }

    #[test]
    fn test_append_to_member_returns_raw_unchanged() {
        // already a member: the stored text is left as-is, not normalized
        assert_eq!(append(Some(" a  b"), "b"), " a  b");
        assert_eq!(append(Some(" a  b"), "c"), "a b c");
        assert_eq!(append(None, "c"), "c");
    }

    #[test]
    fn test_extend_reports_new_tokens_in_input_order() {
        let mut set = TokenSet::decode(Some("action"));
        let added = set.extend(["drama comedy", "action", "drama", "horror"]);

        assert_eq!(added, ["drama", "comedy", "horror"]);
        assert_eq!(set.encode(), "action drama comedy horror");
    }

    #[test]
    fn test_serde_as_plain_list() {
        let set: TokenSet = ["x", "y", "x"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["x","y"]"#);

        let back: TokenSet = serde_json::from_str(r#"["y","y","z"]"#).unwrap();
        assert_eq!(back.as_slice(), ["y", "z"]);
    }
}
