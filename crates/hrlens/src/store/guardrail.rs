//! Statement screening ahead of SQLite.
//!
//! Comments and quoted text are masked before any keyword is inspected, so
//! `LIKE '%update%'` or a leading `-- note` never trips the check. Whether the
//! statement can write is decided by SQLite itself after `prepare`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationReason {
    EmptyStatement,
    MultiStatement,
    UnsupportedStatement,
}

impl ViolationReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyStatement => "empty_statement",
            Self::MultiStatement => "multi_statement",
            Self::UnsupportedStatement => "unsupported_statement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailViolation {
    pub reason: ViolationReason,
    pub message: String,
}

impl std::fmt::Display for GuardrailViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GuardrailViolation {}

/// Returns the single statement to hand to SQLite: trimmed, cut at its
/// terminating semicolon.
pub fn read_only_statement(raw_sql: &str) -> Result<&str, GuardrailViolation> {
    let masked = mask_comments_and_literals(raw_sql);

    let end = match masked.find(';') {
        Some(position) => {
            if masked[position..].chars().any(|ch| ch != ';' && !ch.is_whitespace()) {
                return Err(violation(
                    ViolationReason::MultiStatement,
                    "Multi-statement SQL is not allowed; submit exactly one read-only statement",
                ));
            }
            position
        }
        None => raw_sql.len(),
    };

    let masked_statement = masked[..end].trim();
    if masked_statement.is_empty() {
        return Err(violation(
            ViolationReason::EmptyStatement,
            "SQL query is empty; provide a SELECT/CTE statement",
        ));
    }

    let leading = leading_keyword(masked_statement);
    if leading != "select" && leading != "with" {
        return Err(violation(
            ViolationReason::UnsupportedStatement,
            format!("Only SELECT and WITH ... SELECT statements are allowed, got `{leading}`"),
        ));
    }

    Ok(raw_sql[..end].trim())
}

/// Copy of `sql` with comment bodies and quoted text (strings and quoted
/// identifiers) replaced by spaces. Byte offsets match the input.
fn mask_comments_and_literals(sql: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Quoted(char),
    }

    let mut masked = String::with_capacity(sql.len());
    let mut state = State::Code;
    let mut chars = sql.chars().peekable();
    let blank = |masked: &mut String, ch: char| {
        masked.extend(std::iter::repeat_n(' ', ch.len_utf8()));
    };

    while let Some(ch) = chars.next() {
        match state {
            State::Code => match ch {
                '-' if chars.peek() == Some(&'-') => {
                    state = State::LineComment;
                    blank(&mut masked, ch);
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                    masked.push_str("  ");
                }
                '\'' | '"' | '`' => {
                    state = State::Quoted(ch);
                    blank(&mut masked, ch);
                }
                '[' => {
                    state = State::Quoted(']');
                    blank(&mut masked, ch);
                }
                _ => masked.push(ch),
            },
            State::LineComment => {
                if ch == '\n' {
                    state = State::Code;
                    masked.push(ch);
                } else {
                    blank(&mut masked, ch);
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                    masked.push_str("  ");
                } else {
                    blank(&mut masked, ch);
                }
            }
            State::Quoted(close) => {
                blank(&mut masked, ch);
                if ch == close {
                    // Doubled quote is an escaped quote inside the literal.
                    if close != ']' && chars.peek() == Some(&close) {
                        chars.next();
                        blank(&mut masked, close);
                    } else {
                        state = State::Code;
                    }
                }
            }
        }
    }

    masked
}

fn leading_keyword(masked_statement: &str) -> String {
    masked_statement
        .trim_start_matches(|ch: char| ch == '(' || ch.is_whitespace())
        .split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
        .next()
        .filter(|token| !token.is_empty())
        .unwrap_or("unknown")
        .to_ascii_lowercase()
}

fn violation(reason: ViolationReason, message: impl Into<String>) -> GuardrailViolation {
    GuardrailViolation {
        reason,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ViolationReason, mask_comments_and_literals, read_only_statement};

    #[test]
    fn allows_select_and_cte_with_trailing_semicolon() {
        assert_eq!(
            read_only_statement(" SELECT COUNT(*) FROM hr_data ;; "),
            Ok("SELECT COUNT(*) FROM hr_data")
        );
        assert!(
            read_only_statement("WITH m AS (SELECT month FROM hr_data) SELECT COUNT(*) FROM m")
                .is_ok()
        );
    }

    #[test]
    fn keywords_inside_literals_and_comments_are_ignored() {
        for sql in [
            "-- headcount\nSELECT COUNT(*) FROM hr_data",
            "/* monthly */ SELECT month FROM hr_data",
            "(SELECT COUNT(*) FROM hr_data)",
            "SELECT * FROM hr_data WHERE reason LIKE '%update%'",
            "SELECT * FROM hr_data WHERE designation = 'Analyze; Report'",
            "SELECT \"delete\" FROM t",
            "SELECT REPLACE(department, ' ', '_') FROM hr_data",
            "SELECT 'it''s; fine' FROM hr_data; -- trailing note",
        ] {
            assert!(read_only_statement(sql).is_ok(), "{sql}");
        }
    }

    #[test]
    fn statement_is_cut_at_terminator_outside_literals() {
        assert_eq!(
            read_only_statement("SELECT 'a;b' FROM hr_data; -- done"),
            Ok("SELECT 'a;b' FROM hr_data")
        );
    }

    #[test]
    fn rejects_multiple_statements_and_empty_input() {
        let multi = read_only_statement("SELECT 1; DROP TABLE hr_data")
            .expect_err("multi-statement SQL must be rejected");
        assert_eq!(multi.reason, ViolationReason::MultiStatement);

        for empty in ["  ;", "-- nothing here", "/* */"] {
            let error = read_only_statement(empty).expect_err("empty SQL must be rejected");
            assert_eq!(error.reason, ViolationReason::EmptyStatement, "{empty}");
        }
    }

    #[test]
    fn rejects_non_select_leading_keyword() {
        let rejected = read_only_statement("EXPLAIN SELECT 1")
            .expect_err("explain is not a result-producing statement here");
        assert_eq!(rejected.reason, ViolationReason::UnsupportedStatement);
        assert!(rejected.message.contains("`explain`"));

        let delete = read_only_statement("-- cleanup\nDELETE FROM hr_data")
            .expect_err("delete must be rejected");
        assert_eq!(delete.reason, ViolationReason::UnsupportedStatement);
    }

    #[test]
    fn masking_preserves_byte_offsets() {
        let sql = "SELECT 'é;x' -- ü\nFROM t";
        let masked = mask_comments_and_literals(sql);
        assert_eq!(masked.len(), sql.len());
        assert!(!masked.contains(';'));
        assert!(masked.ends_with("\nFROM t"));
    }
}
