//! Schema-template application.
//!
//! Each phase (schema DDL, then optional sample data) runs in its own
//! transaction with a stop-on-first-failure policy. SQLite's DDL is
//! transactional, so a failed schema phase really does roll back; a
//! failed data phase rolls back the data while keeping the committed
//! schema.

use super::catalog::SchemaTemplate;
use crate::services::database::{DatabaseError, TestDatabase};

/// Which phase of template application a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPhase {
    /// DDL statements from the template's schema list.
    Schema,
    /// Sample-data DML statements.
    Data,
}

impl std::fmt::Display for ApplyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyPhase::Schema => write!(f, "schema"),
            ApplyPhase::Data => write!(f, "data"),
        }
    }
}

/// Outcome of applying a schema template.
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// Every requested statement ran.
    Applied {
        /// Statements executed across both phases.
        statements_run: usize,
    },
    /// A statement failed; nothing after it ran and its phase was rolled
    /// back.
    Failed {
        phase: ApplyPhase,
        /// Zero-based index into the failing phase's statement list.
        statement_index: usize,
        message: String,
    },
}

impl ApplyOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }

    /// Zero-based index of the failing statement, if any.
    pub fn failed_statement_index(&self) -> Option<usize> {
        match self {
            ApplyOutcome::Failed {
                statement_index, ..
            } => Some(*statement_index),
            ApplyOutcome::Applied { .. } => None,
        }
    }

    /// One-line status message for the footer.
    pub fn describe(&self, template_name: &str) -> String {
        match self {
            ApplyOutcome::Applied { statements_run } => format!(
                "Applied '{template_name}' ({statements_run} statements)."
            ),
            ApplyOutcome::Failed {
                phase,
                statement_index,
                message,
            } => format!(
                "'{template_name}' failed at {phase} statement {}: {message}",
                statement_index + 1
            ),
        }
    }
}

/// Apply `template` to `db`, optionally including its sample data.
///
/// Mutates only the target database. Returns `Err` only for handle-level
/// problems (`ClosedHandle`, transaction plumbing); statement failures
/// come back as `ApplyOutcome::Failed`.
pub async fn apply(
    db: &TestDatabase,
    template: &SchemaTemplate,
    include_data: bool,
) -> Result<ApplyOutcome, DatabaseError> {
    let mut statements_run =
        match run_phase(db, ApplyPhase::Schema, &template.schema).await? {
            PhaseResult::Ran(n) => n,
            PhaseResult::Failed(outcome) => return Ok(outcome),
        };

    if include_data {
        if let Some(data) = &template.data {
            match run_phase(db, ApplyPhase::Data, data).await? {
                PhaseResult::Ran(n) => statements_run += n,
                PhaseResult::Failed(outcome) => return Ok(outcome),
            }
        }
    }

    tracing::debug!(template = %template.name, statements_run, "applied schema template");
    Ok(ApplyOutcome::Applied { statements_run })
}

enum PhaseResult {
    Ran(usize),
    Failed(ApplyOutcome),
}

async fn run_phase(
    db: &TestDatabase,
    phase: ApplyPhase,
    statements: &[String],
) -> Result<PhaseResult, DatabaseError> {
    let pool = db.pool().await?;
    let mut tx = pool.begin().await?;

    for (statement_index, statement) in statements.iter().enumerate() {
        if let Err(e) = sqlx::query(statement).execute(&mut *tx).await {
            tx.rollback().await?;
            return Ok(PhaseResult::Failed(ApplyOutcome::Failed {
                phase,
                statement_index,
                message: e.to_string(),
            }));
        }
    }

    tx.commit().await?;
    Ok(PhaseResult::Ran(statements.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::{QueryExecutionResult, Value};
    use crate::services::templates::catalog::TemplateCatalog;

    fn people_template(data: Option<Vec<String>>) -> SchemaTemplate {
        SchemaTemplate {
            name: "People".into(),
            category: "Test".into(),
            description: String::new(),
            schema: vec![
                "CREATE TABLE people(id INTEGER PRIMARY KEY, name TEXT NOT NULL)".into(),
                "CREATE TABLE pets(id INTEGER PRIMARY KEY, owner INTEGER REFERENCES people(id))"
                    .into(),
            ],
            data,
        }
    }

    async fn scratch_db(dir: &tempfile::TempDir) -> TestDatabase {
        TestDatabase::create(dir.path().join("apply.db")).await.unwrap()
    }

    #[test]
    fn test_apply_creates_exactly_the_template_tables() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            let outcome = apply(&db, &people_template(None), false).await.unwrap();
            assert!(outcome.success());
            assert_eq!(outcome.failed_statement_index(), None);

            let names: Vec<_> = db
                .tables()
                .await
                .unwrap()
                .into_iter()
                .map(|t| t.name)
                .collect();
            assert_eq!(names, vec!["people", "pets"]);
        });
    }

    #[test]
    fn test_apply_with_data_populates_rows() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            let template = people_template(Some(vec![
                "INSERT INTO people(name) VALUES ('Ada'), ('Linus')".into(),
            ]));

            let outcome = apply(&db, &template, true).await.unwrap();
            assert!(outcome.success());

            match db
                .run_script("SELECT name FROM people ORDER BY name")
                .await
                .unwrap()
            {
                QueryExecutionResult::Select(select) => {
                    assert_eq!(select.row_count, 2);
                    assert_eq!(
                        select.rows[0].get_value(0),
                        Some(&Value::Text("Ada".into()))
                    );
                    assert_eq!(
                        select.rows[1].get_value(0),
                        Some(&Value::Text("Linus".into()))
                    );
                }
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_data_skipped_when_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            let template = people_template(Some(vec![
                "INSERT INTO people(name) VALUES ('Ada')".into(),
            ]));

            apply(&db, &template, false).await.unwrap();

            match db.run_script("SELECT COUNT(*) FROM people").await.unwrap() {
                QueryExecutionResult::Select(select) => {
                    assert_eq!(select.rows[0].get_value(0), Some(&Value::Integer(0)));
                }
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_stops_at_first_failing_ddl_statement() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            let template = SchemaTemplate {
                name: "Broken".into(),
                category: "Test".into(),
                description: String::new(),
                schema: vec![
                    "CREATE TABLE ok_table(a INTEGER)".into(),
                    "CREATE BOGUS SYNTAX".into(),
                    "CREATE TABLE never_reached(b INTEGER)".into(),
                ],
                data: None,
            };

            let outcome = apply(&db, &template, false).await.unwrap();
            assert!(!outcome.success());
            assert_eq!(outcome.failed_statement_index(), Some(1));
            match &outcome {
                ApplyOutcome::Failed { phase, message, .. } => {
                    assert_eq!(*phase, ApplyPhase::Schema);
                    assert!(!message.is_empty());
                }
                _ => unreachable!(),
            }

            // The whole phase rolled back: statement 0's table is gone too.
            assert!(db.tables().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_data_failure_keeps_schema_drops_data() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            let template = people_template(Some(vec![
                "INSERT INTO people(name) VALUES ('Ada')".into(),
                "INSERT INTO people(name) VALUES (NULL)".into(), // NOT NULL violation
            ]));

            let outcome = apply(&db, &template, true).await.unwrap();
            assert_eq!(outcome.failed_statement_index(), Some(1));
            match &outcome {
                ApplyOutcome::Failed { phase, .. } => assert_eq!(*phase, ApplyPhase::Data),
                _ => panic!("expected failure"),
            }

            // Schema committed, data rolled back.
            assert_eq!(db.tables().await.unwrap().len(), 2);
            match db.run_script("SELECT COUNT(*) FROM people").await.unwrap() {
                QueryExecutionResult::Select(select) => {
                    assert_eq!(select.rows[0].get_value(0), Some(&Value::Integer(0)));
                }
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_apply_to_closed_handle_fails() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            db.close().await.unwrap();

            let err = apply(&db, &people_template(None), false).await.unwrap_err();
            assert!(err.is_closed_handle());
        });
    }

    #[test]
    fn test_builtin_template_applies_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let catalog = TemplateCatalog::builtin().unwrap();
            let template = catalog.find_schema("Tiny People DB").unwrap();

            let db = scratch_db(&dir).await;
            let outcome = apply(&db, template, true).await.unwrap();
            assert!(outcome.success(), "{:?}", outcome);

            let tables = db.tables().await.unwrap();
            assert_eq!(tables.len(), 1);
            assert_eq!(tables[0].name, "people");
        });
    }

    #[test]
    fn test_describe_messages() {
        let applied = ApplyOutcome::Applied { statements_run: 3 };
        assert_eq!(applied.describe("Shop"), "Applied 'Shop' (3 statements).");

        let failed = ApplyOutcome::Failed {
            phase: ApplyPhase::Data,
            statement_index: 1,
            message: "NOT NULL constraint failed".into(),
        };
        let text = failed.describe("Shop");
        assert!(text.contains("data statement 2"));
        assert!(text.contains("NOT NULL"));
    }
}
