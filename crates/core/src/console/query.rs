//! Read-only statement guard for the god-mode SQL console.
//!
//! The scan is lexical: string literals, quoted identifiers, dollar-quoted
//! bodies and comments are skipped, and every remaining word is checked.
//! The database layer still runs the statement in a `READ ONLY`
//! transaction.

use serde::Serialize;
use std::fmt;

use crate::console::error::ConsoleError;

/// Keywords that may open a console statement.
const ALLOWED_LEADING: [&str; 4] = ["SELECT", "WITH", "SHOW", "EXPLAIN"];

/// Keywords refused anywhere outside literals.
const FORBIDDEN: [&str; 16] = [
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT",
    "REVOKE", "COPY", "CALL", "DO", "VACUUM", "SET", "LOCK",
];

/// Leading keyword of an accepted statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryKind {
    /// `SELECT ...`
    Select,
    /// `WITH ... SELECT ...`
    With,
    /// `SHOW ...`
    Show,
    /// `EXPLAIN ...`
    Explain,
}

impl QueryKind {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "SELECT" => Some(Self::Select),
            "WITH" => Some(Self::With),
            "SHOW" => Some(Self::Show),
            "EXPLAIN" => Some(Self::Explain),
            _ => None,
        }
    }

    /// Whether the statement can be wrapped as a subquery.
    #[must_use]
    pub const fn is_wrappable(&self) -> bool {
        matches!(self, Self::Select | Self::With)
    }
}

/// A statement that passed the read-only guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyQuery {
    sql: String,
    kind: QueryKind,
}

impl ReadOnlyQuery {
    /// Validates a console statement.
    ///
    /// A single trailing `;` is tolerated and stripped.
    pub fn parse(input: &str) -> Result<Self, ConsoleError> {
        let scan = scan(input)?;

        let Some(first) = scan.words.first() else {
            return Err(ConsoleError::Empty);
        };
        let kind = QueryKind::from_keyword(first)
            .ok_or_else(|| ConsoleError::NotReadOnly(first.clone()))?;

        if let Some(word) = scan.words.iter().find(|w| FORBIDDEN.contains(&w.as_str())) {
            return Err(ConsoleError::ForbiddenKeyword(word.clone()));
        }

        let sql = match scan.terminator {
            Some(pos) => input[..pos].trim(),
            None => input.trim(),
        };
        Ok(Self {
            sql: sql.to_string(),
            kind,
        })
    }

    /// The validated statement without its trailing `;`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// The leading keyword.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    /// The statement wrapped to return at most `limit` rows.
    ///
    /// `SHOW` and `EXPLAIN` cannot be wrapped; they are returned unchanged
    /// and the caller truncates the result set.
    #[must_use]
    pub fn limited(&self, limit: u64) -> String {
        if self.kind.is_wrappable() {
            // newline ends a trailing `--` comment before the closing paren
            format!("SELECT * FROM ({}\n) AS console_result LIMIT {limit}", self.sql)
        } else {
            self.sql.clone()
        }
    }
}

impl fmt::Display for ReadOnlyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Words outside literals, uppercased, plus the position of a trailing `;`.
struct Scan {
    words: Vec<String>,
    terminator: Option<usize>,
}

fn scan(input: &str) -> Result<Scan, ConsoleError> {
    let bytes = input.as_bytes();
    let mut words = Vec::new();
    let mut terminator = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];

        if terminator.is_some() && !c.is_ascii_whitespace() {
            // Anything after a `;` other than whitespace or comments
            if !(starts_with(bytes, i, b"--") || starts_with(bytes, i, b"/*")) {
                return Err(ConsoleError::MultipleStatements);
            }
        }

        match c {
            b'\'' => i = skip_quoted(bytes, i, b'\'', "string literal")?,
            b'"' => i = skip_quoted(bytes, i, b'"', "quoted identifier")?,
            b'-' if starts_with(bytes, i, b"--") => {
                i = bytes[i..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map_or(bytes.len(), |p| i + p + 1);
            }
            b'/' if starts_with(bytes, i, b"/*") => {
                i = find(bytes, i + 2, b"*/")
                    .map(|p| p + 2)
                    .ok_or(ConsoleError::Unterminated("comment"))?;
            }
            b'$' => match dollar_tag(bytes, i) {
                Some(tag_end) => {
                    let tag = &bytes[i..tag_end];
                    i = find(bytes, tag_end, tag)
                        .map(|p| p + tag.len())
                        .ok_or(ConsoleError::Unterminated("dollar-quoted string"))?;
                }
                None => i += 1,
            },
            b';' => {
                if terminator.is_some() {
                    return Err(ConsoleError::MultipleStatements);
                }
                terminator = Some(i);
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                words.push(input[start..i].to_ascii_uppercase());
            }
            _ => i += 1,
        }
    }

    Ok(Scan { words, terminator })
}

fn starts_with(bytes: &[u8], at: usize, pat: &[u8]) -> bool {
    bytes.get(at..at + pat.len()) == Some(pat)
}

fn find(bytes: &[u8], from: usize, pat: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(pat.len())
        .position(|w| w == pat)
        .map(|p| from + p)
}

/// Skips a quoted token starting at `at`; doubled quotes are escapes.
fn skip_quoted(
    bytes: &[u8],
    at: usize,
    quote: u8,
    what: &'static str,
) -> Result<usize, ConsoleError> {
    let mut i = at + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Ok(i + 1);
        }
        i += 1;
    }
    Err(ConsoleError::Unterminated(what))
}

/// End index (exclusive) of a `$tag$` opener at `at`, if one starts there.
fn dollar_tag(bytes: &[u8], at: usize) -> Option<usize> {
    let mut i = at + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'$' => return Some(i + 1),
            b if b.is_ascii_alphanumeric() || b == b'_' => i += 1,
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SELECT * FROM profiles", QueryKind::Select)]
    #[case("  select count(*) from audit_logs;  ", QueryKind::Select)]
    #[case("WITH t AS (SELECT 1) SELECT * FROM t", QueryKind::With)]
    #[case("SHOW server_version", QueryKind::Show)]
    #[case("EXPLAIN SELECT * FROM spending_limits", QueryKind::Explain)]
    #[case("SELECT 'DROP TABLE x; DELETE' AS s", QueryKind::Select)]
    #[case("SELECT \"update\" FROM t", QueryKind::Select)]
    #[case("SELECT 1 -- delete everything\n", QueryKind::Select)]
    #[case("SELECT /* insert */ 1", QueryKind::Select)]
    #[case("SELECT $$drop$$", QueryKind::Select)]
    #[case("SELECT 'it''s fine; really'", QueryKind::Select)]
    #[case("SELECT 1; -- trailing comment", QueryKind::Select)]
    fn test_accepts_read_only(#[case] sql: &str, #[case] kind: QueryKind) {
        let q = ReadOnlyQuery::parse(sql).unwrap();
        assert_eq!(q.kind(), kind);
    }

    #[rstest]
    #[case("", ConsoleError::Empty)]
    #[case("   ;", ConsoleError::Empty)]
    #[case("DELETE FROM audit_logs", ConsoleError::NotReadOnly("DELETE".into()))]
    #[case("SELECT 1; SELECT 2", ConsoleError::MultipleStatements)]
    #[case("SELECT 1;;", ConsoleError::MultipleStatements)]
    #[case(
        "WITH d AS (DELETE FROM t RETURNING *) SELECT * FROM d",
        ConsoleError::ForbiddenKeyword("DELETE".into())
    )]
    #[case("INSERT INTO t VALUES (1)", ConsoleError::NotReadOnly("INSERT".into()))]
    #[case("SELECT * FROM t FOR UPDATE", ConsoleError::ForbiddenKeyword("UPDATE".into()))]
    #[case("SELECT 'open", ConsoleError::Unterminated("string literal"))]
    #[case("SELECT /* open", ConsoleError::Unterminated("comment"))]
    fn test_rejects(#[case] sql: &str, #[case] expected: ConsoleError) {
        assert_eq!(ReadOnlyQuery::parse(sql).unwrap_err(), expected);
    }

    #[test]
    fn test_trailing_semicolon_stripped() {
        let q = ReadOnlyQuery::parse("SELECT 1;").unwrap();
        assert_eq!(q.as_str(), "SELECT 1");
    }

    #[test]
    fn test_limited_wraps_select_only() {
        let select = ReadOnlyQuery::parse("SELECT * FROM profiles").unwrap();
        assert_eq!(
            select.limited(50),
            "SELECT * FROM (SELECT * FROM profiles\n) AS console_result LIMIT 50"
        );

        let commented = ReadOnlyQuery::parse("SELECT 1 -- note").unwrap();
        let wrapped = commented.limited(10);
        assert!(wrapped.starts_with("SELECT * FROM (SELECT 1 -- note\n"));
        assert!(wrapped.ends_with("\n) AS console_result LIMIT 10"));

        let show = ReadOnlyQuery::parse("SHOW timezone").unwrap();
        assert_eq!(show.limited(50), "SHOW timezone");
    }
}
