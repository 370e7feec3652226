//! Test-database connection handle.
//!
//! A `TestDatabase` wraps one SQLite file and its SQLx pool. The pool
//! lives behind `RwLock<Option<..>>`: closing the handle takes the pool
//! out, and every later operation reports `ClosedHandle`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_lock::RwLock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::decode;
use super::error::DatabaseError;
use super::row::{ColumnInfo, Row};
use super::script::{is_row_returning, split_statements};

/// First bytes of every non-empty SQLite database file.
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Result of executing SQL against a test database.
///
/// Engine failures are captured in the `Error` variant rather than
/// propagated, so the results pane can render them like any other outcome.
#[derive(Debug, Clone)]
pub enum QueryExecutionResult {
    /// Row-returning statement result
    Select(SelectResult),
    /// Mutation result (INSERT, UPDATE, DELETE, DDL)
    Modified(ModifiedResult),
    /// Execution error
    Error(ErrorResult),
}

/// Result of a row-returning statement
#[derive(Debug, Clone)]
pub struct SelectResult {
    /// Column metadata
    pub columns: Vec<ColumnInfo>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Total row count
    pub row_count: usize,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
}

impl SelectResult {
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>, execution_time_ms: u128) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_time_ms,
        }
    }
}

/// Result of a mutation
#[derive(Debug, Clone)]
pub struct ModifiedResult {
    /// Number of rows affected (summed across a script)
    pub rows_affected: u64,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Result when execution fails
#[derive(Debug, Clone)]
pub struct ErrorResult {
    /// Error message from the engine
    pub message: String,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
}

/// An open connection to one user-created SQLite file.
pub struct TestDatabase {
    path: PathBuf,
    pool: RwLock<Option<SqlitePool>>,
}

impl std::fmt::Debug for TestDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDatabase")
            .field("path", &self.path)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl TestDatabase {
    /// Create a database file at `path`, or open it if it already exists
    /// as a database.
    ///
    /// Fails with `Io` if the path is unwritable or occupied by a
    /// non-database file.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();

        if path.exists() && !file_has_sqlite_header(&path)? {
            return Err(DatabaseError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} exists and is not a SQLite database", path.display()),
            )));
        }

        Self::connect(path, true).await
    }

    /// Open an existing database file.
    ///
    /// Fails with `NotADatabase` if the file content is not SQLite, and
    /// with `Io` if the file cannot be read at all.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();

        // Surface missing/unreadable files as plain I/O errors.
        std::fs::metadata(&path)?;

        if !file_has_sqlite_header(&path)? {
            return Err(DatabaseError::NotADatabase { path });
        }

        Self::connect(path, false).await
    }

    async fn connect(path: PathBuf, create_if_missing: bool) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(create_if_missing)
            .foreign_keys(true);

        // Small pool: SQLite is single-writer.
        let pool = SqlitePoolOptions::new()
            .max_connections(3)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        // Probe so that creation touches disk and corrupt files fail now
        // rather than on the first user action.
        sqlx::query("SELECT 1").fetch_one(&pool).await?;

        tracing::debug!(path = %path.display(), "opened test database");

        Ok(Self {
            path,
            pool: RwLock::new(Some(pool)),
        })
    }

    /// File path of this database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Whether the handle is still open.
    pub async fn is_open(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Close the handle. Later operations fail with `ClosedHandle`.
    pub async fn close(&self) -> Result<(), DatabaseError> {
        let mut guard = self.pool.write().await;
        match guard.take() {
            Some(pool) => {
                pool.close().await;
                tracing::debug!(path = %self.path.display(), "closed test database");
                Ok(())
            }
            None => Err(DatabaseError::ClosedHandle),
        }
    }

    pub(crate) async fn pool(&self) -> Result<SqlitePool, DatabaseError> {
        let guard = self.pool.read().await;
        guard.as_ref().cloned().ok_or(DatabaseError::ClosedHandle)
    }

    /// Run a SQL script exactly as submitted.
    ///
    /// The script is split on top-level semicolons and executed statement
    /// by statement with no added transaction. The last row-returning
    /// statement's result is reported; otherwise the summed affected-row
    /// count is. The first engine failure stops execution and is returned
    /// as an `Error` result.
    pub async fn run_script(&self, sql: &str) -> Result<QueryExecutionResult, DatabaseError> {
        let pool = self.pool().await?;
        let start = std::time::Instant::now();

        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(QueryExecutionResult::Error(ErrorResult {
                message: "Empty query".to_string(),
                execution_time_ms: 0,
            }));
        }

        // One connection for the whole script: BEGIN/COMMIT pairs and
        // other session state must not be split across pooled
        // connections.
        let mut conn = pool.acquire().await?;

        let result = execute_statements(&mut conn, sql, start).await;

        // A failed or unfinished script can leave a user-opened
        // transaction on this connection; discard it before the
        // connection returns to the pool.
        let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;

        Ok(result)
    }

    /// Drop every user table. Used before applying a schema template.
    pub async fn drop_all_tables(&self) -> Result<usize, DatabaseError> {
        let pool = self.pool().await?;

        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&pool)
        .await?;

        for (name,) in &names {
            let quoted = name.replace('"', "\"\"");
            sqlx::query(&format!("DROP TABLE IF EXISTS \"{quoted}\""))
                .execute(&pool)
                .await?;
        }

        Ok(names.len())
    }
}

async fn execute_statements(
    conn: &mut sqlx::pool::PoolConnection<sqlx::Sqlite>,
    sql: &str,
    start: std::time::Instant,
) -> QueryExecutionResult {
    let mut last_select: Option<(Vec<ColumnInfo>, Vec<Row>)> = None;
    let mut rows_affected: u64 = 0;

    for statement in split_statements(sql) {
        if is_row_returning(&statement) {
            match sqlx::query(&statement).fetch_all(&mut **conn).await {
                Ok(sqlite_rows) => {
                    let columns = sqlite_rows
                        .first()
                        .map(decode::build_column_info)
                        .unwrap_or_default();
                    let rows = sqlite_rows.iter().map(decode::convert_row).collect();
                    last_select = Some((columns, rows));
                }
                Err(e) => {
                    return QueryExecutionResult::Error(ErrorResult {
                        message: e.to_string(),
                        execution_time_ms: start.elapsed().as_millis(),
                    });
                }
            }
        } else {
            match sqlx::query(&statement).execute(&mut **conn).await {
                Ok(result) => rows_affected += result.rows_affected(),
                Err(e) => {
                    return QueryExecutionResult::Error(ErrorResult {
                        message: e.to_string(),
                        execution_time_ms: start.elapsed().as_millis(),
                    });
                }
            }
        }
    }

    let execution_time_ms = start.elapsed().as_millis();
    match last_select {
        Some((columns, rows)) => {
            QueryExecutionResult::Select(SelectResult::new(columns, rows, execution_time_ms))
        }
        None => QueryExecutionResult::Modified(ModifiedResult {
            rows_affected,
            execution_time_ms,
        }),
    }
}

/// Check the 16-byte SQLite header. Empty files count as valid: SQLite
/// initializes them on first write.
fn file_has_sqlite_header(path: &Path) -> Result<bool, std::io::Error> {
    let mut file = std::fs::File::open(path)?;
    let mut header = [0u8; 16];
    let mut read = 0;

    while read < header.len() {
        match file.read(&mut header[read..])? {
            0 => break,
            n => read += n,
        }
    }

    if read == 0 {
        return Ok(true);
    }

    Ok(read == header.len() && &header == SQLITE_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::row::Value;

    fn temp_db_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn test_create_and_select_one() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "t.db")).await.unwrap();
            assert!(db.is_open().await);

            match db.run_script("SELECT 1").await.unwrap() {
                QueryExecutionResult::Select(select) => {
                    assert_eq!(select.row_count, 1);
                    assert_eq!(select.columns.len(), 1);
                    assert_eq!(select.columns[0].name, "1");
                    assert_eq!(select.rows[0].get_value(0), Some(&Value::Integer(1)));
                }
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_create_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_db_path(&dir, "notes.db");
        std::fs::write(&path, "definitely not a database").unwrap();

        smol::block_on(async {
            let err = TestDatabase::create(&path).await.unwrap_err();
            assert!(matches!(err, DatabaseError::Io(_)), "got {err:?}");
        });
    }

    #[test]
    fn test_open_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_db_path(&dir, "readme.sqlite");
        std::fs::write(&path, "# hello\nthis is markdown\n").unwrap();

        smol::block_on(async {
            let err = TestDatabase::open(&path).await.unwrap_err();
            assert!(matches!(err, DatabaseError::NotADatabase { .. }), "got {err:?}");
        });
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let err = TestDatabase::open(temp_db_path(&dir, "missing.db"))
                .await
                .unwrap_err();
            assert!(matches!(err, DatabaseError::Io(_)), "got {err:?}");
        });
    }

    #[test]
    fn test_open_reopens_created_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_db_path(&dir, "reopen.db");

        smol::block_on(async {
            let db = TestDatabase::create(&path).await.unwrap();
            db.run_script("CREATE TABLE marker(id INTEGER)").await.unwrap();
            db.close().await.unwrap();

            let db = TestDatabase::open(&path).await.unwrap();
            match db.run_script("SELECT COUNT(*) FROM marker").await.unwrap() {
                QueryExecutionResult::Select(select) => assert_eq!(select.row_count, 1),
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_mutation_reports_rows_affected() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "m.db")).await.unwrap();
            db.run_script("CREATE TABLE t(a INTEGER)").await.unwrap();

            match db
                .run_script("INSERT INTO t VALUES (1), (2), (3)")
                .await
                .unwrap()
            {
                QueryExecutionResult::Modified(modified) => {
                    assert_eq!(modified.rows_affected, 3);
                }
                other => panic!("expected Modified, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_error_is_captured_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "e.db")).await.unwrap();

            match db
                .run_script("SELECT * FROM nonexistent_table")
                .await
                .unwrap()
            {
                QueryExecutionResult::Error(error) => {
                    assert!(!error.message.is_empty());
                }
                other => panic!("expected Error, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_script_reports_last_select() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "s.db")).await.unwrap();

            let script = "CREATE TABLE t(a INTEGER);\n\
                          INSERT INTO t VALUES (7);\n\
                          SELECT a FROM t;";
            match db.run_script(script).await.unwrap() {
                QueryExecutionResult::Select(select) => {
                    assert_eq!(select.rows[0].get_value(0), Some(&Value::Integer(7)));
                }
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_transaction_script_commits() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "tx.db")).await.unwrap();
            db.run_script("CREATE TABLE t(a INTEGER)").await.unwrap();

            let script = "BEGIN;\n\
                          INSERT INTO t VALUES (1);\n\
                          INSERT INTO t VALUES (2);\n\
                          COMMIT;";
            match db.run_script(script).await.unwrap() {
                QueryExecutionResult::Modified(modified) => {
                    assert_eq!(modified.rows_affected, 2);
                }
                other => panic!("expected Modified, got {other:?}"),
            }

            match db.run_script("SELECT COUNT(*) FROM t").await.unwrap() {
                QueryExecutionResult::Select(select) => {
                    assert_eq!(select.rows[0].get_value(0), Some(&Value::Integer(2)));
                }
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_failed_script_leaves_no_open_transaction() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "dangling.db"))
                .await
                .unwrap();
            db.run_script("CREATE TABLE t(a INTEGER NOT NULL)").await.unwrap();

            // The failing INSERT aborts the script with BEGIN still open;
            // the executor must discard that transaction.
            match db
                .run_script("BEGIN; INSERT INTO t VALUES (NULL);")
                .await
                .unwrap()
            {
                QueryExecutionResult::Error(_) => {}
                other => panic!("expected Error, got {other:?}"),
            }

            // A later script on the same pool still works.
            match db.run_script("INSERT INTO t VALUES (5)").await.unwrap() {
                QueryExecutionResult::Modified(modified) => {
                    assert_eq!(modified.rows_affected, 1);
                }
                other => panic!("expected Modified, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_empty_script_is_error_result() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "empty.db")).await.unwrap();
            match db.run_script("   \n  ").await.unwrap() {
                QueryExecutionResult::Error(error) => {
                    assert_eq!(error.message, "Empty query");
                }
                other => panic!("expected Error, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_closed_handle_rejects_operations() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "c.db")).await.unwrap();
            db.close().await.unwrap();
            assert!(!db.is_open().await);

            let err = db.run_script("SELECT 1").await.unwrap_err();
            assert!(err.is_closed_handle());

            let err = db.drop_all_tables().await.unwrap_err();
            assert!(err.is_closed_handle());

            let err = db.close().await.unwrap_err();
            assert!(err.is_closed_handle());
        });
    }

    #[test]
    fn test_drop_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = TestDatabase::create(temp_db_path(&dir, "d.db")).await.unwrap();
            db.run_script("CREATE TABLE a(x INTEGER); CREATE TABLE b(y INTEGER);")
                .await
                .unwrap();

            assert_eq!(db.drop_all_tables().await.unwrap(), 2);

            match db
                .run_script("SELECT name FROM sqlite_master WHERE type = 'table'")
                .await
                .unwrap()
            {
                QueryExecutionResult::Select(select) => assert_eq!(select.row_count, 0),
                other => panic!("expected Select, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_sqlite_header_check() {
        let dir = tempfile::tempdir().unwrap();

        let empty = temp_db_path(&dir, "empty");
        std::fs::write(&empty, b"").unwrap();
        assert!(file_has_sqlite_header(&empty).unwrap());

        let text = temp_db_path(&dir, "text");
        std::fs::write(&text, b"hello world, definitely text").unwrap();
        assert!(!file_has_sqlite_header(&text).unwrap());

        let short = temp_db_path(&dir, "short");
        std::fs::write(&short, b"SQLite").unwrap();
        assert!(!file_has_sqlite_header(&short).unwrap());

        let magic = temp_db_path(&dir, "magic");
        std::fs::write(&magic, b"SQLite format 3\0plus trailing junk").unwrap();
        assert!(file_has_sqlite_header(&magic).unwrap());
    }
}
