//! SQL script helpers: statement splitting and classification.

/// Split a script into statements on top-level semicolons.
///
/// Semicolons inside single- or double-quoted literals are left alone.
/// This does not parse comments; scripts with `;` inside comments should
/// use one statement per call. Adequate for regular scripts; anything
/// fancier needs a real SQL parser.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_string = false;
    let mut quote = '\0';

    for ch in sql.chars() {
        match ch {
            '\'' | '"' => {
                if !in_string {
                    in_string = true;
                    quote = ch;
                } else if quote == ch {
                    in_string = false;
                }
                buf.push(ch);
            }
            ';' if !in_string => {
                let segment = buf.trim();
                if !segment.is_empty() {
                    out.push(segment.to_string());
                }
                buf.clear();
            }
            _ => buf.push(ch),
        }
    }

    let tail = buf.trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }

    out
}

/// Whether a statement produces rows when executed.
pub fn is_row_returning(sql: &str) -> bool {
    let lower = sql.trim_start().to_lowercase();
    lower.starts_with("select")
        || lower.starts_with("with")
        || lower.starts_with("pragma")
        || lower.starts_with("explain")
        || lower.starts_with("values")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let stmts = split_statements("CREATE TABLE t(a); INSERT INTO t VALUES(1);");
        assert_eq!(
            stmts,
            vec!["CREATE TABLE t(a)", "INSERT INTO t VALUES(1)"]
        );
    }

    #[test]
    fn test_split_trailing_statement_without_semicolon() {
        let stmts = split_statements("SELECT 1; SELECT 2");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_split_semicolon_in_string() {
        let stmts = split_statements("INSERT INTO t VALUES('a;b'); SELECT * FROM t;");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "INSERT INTO t VALUES('a;b')");
    }

    #[test]
    fn test_split_double_quoted_identifier() {
        let stmts = split_statements(r#"SELECT "weird;name" FROM t;"#);
        assert_eq!(stmts, vec![r#"SELECT "weird;name" FROM t"#]);
    }

    #[test]
    fn test_split_empty_segments_dropped() {
        let stmts = split_statements(";;  ;SELECT 1;;");
        assert_eq!(stmts, vec!["SELECT 1"]);
    }

    #[test]
    fn test_is_row_returning() {
        assert!(is_row_returning("SELECT * FROM users"));
        assert!(is_row_returning("  select 1"));
        assert!(is_row_returning("WITH cte AS (SELECT 1) SELECT * FROM cte"));
        assert!(is_row_returning("PRAGMA table_info(users)"));
        assert!(is_row_returning("EXPLAIN QUERY PLAN SELECT 1"));
        assert!(is_row_returning("VALUES (1), (2)"));

        assert!(!is_row_returning("INSERT INTO users VALUES (1)"));
        assert!(!is_row_returning("UPDATE users SET name = 'x'"));
        assert!(!is_row_returning("DELETE FROM users"));
        assert!(!is_row_returning("CREATE TABLE foo (id INT)"));
    }
}
