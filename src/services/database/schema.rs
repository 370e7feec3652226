//! Schema introspection for test databases.
//!
//! Queries `sqlite_master` and `PRAGMA table_info` directly on every call
//! so the result always reflects the live schema: template application
//! and ad-hoc DDL must show up immediately in the tree.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use sqlx::Row;

use super::connection::TestDatabase;
use super::error::DatabaseError;

/// A table or view in a test database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Object name
    pub name: String,
    /// `TABLE` or `VIEW`
    pub table_type: String,
}

impl TableInfo {
    pub fn is_view(&self) -> bool {
        self.table_type.eq_ignore_ascii_case("view")
    }
}

/// One column of a table, from `PRAGMA table_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDetail {
    /// Column name
    pub name: String,
    /// Declared type (may be empty; SQLite allows untyped columns)
    pub data_type: String,
    /// NOT NULL constraint present
    pub not_null: bool,
    /// Default value expression
    pub default: Option<String>,
    /// Position of this column in the primary key (0 = not part of it)
    pub primary_key: i32,
    /// Position in the table (1-indexed)
    pub ordinal: i32,
}

impl ColumnDetail {
    /// `name : TYPE` label for the tree, mirroring how untyped columns
    /// are shown.
    pub fn display_label(&self) -> String {
        let ty = if self.data_type.is_empty() {
            "UNKNOWN"
        } else {
            &self.data_type
        };
        format!("{} : {}", self.name, ty)
    }
}

impl TestDatabase {
    /// List tables and views, internals excluded, ordered by name.
    pub async fn tables(&self) -> Result<Vec<TableInfo>, DatabaseError> {
        let pool = self.pool().await?;

        let rows = sqlx::query(
            r#"
            SELECT name, type
            FROM sqlite_master
            WHERE type IN ('table', 'view')
                AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let name: String = row.get("name");
                let table_type: String = row.get("type");
                TableInfo {
                    name,
                    table_type: table_type.to_uppercase(),
                }
            })
            .collect())
    }

    /// List the columns of one table in declaration order.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDetail>, DatabaseError> {
        let pool = self.pool().await?;

        let query = format!("PRAGMA table_info('{}')", table.replace('\'', "''"));
        let rows = sqlx::query(&query).fetch_all(&pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let cid: i32 = row.get("cid");
                let name: String = row.get("name");
                let data_type: String = row.get("type");
                let notnull: i32 = row.get("notnull");
                let dflt_value: Option<String> = row.get("dflt_value");
                let pk: i32 = row.get("pk");

                ColumnDetail {
                    name,
                    data_type,
                    not_null: notnull != 0,
                    default: dflt_value,
                    primary_key: pk,
                    ordinal: cid + 1, // PRAGMA cid is 0-indexed
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_db(dir: &tempfile::TempDir) -> TestDatabase {
        TestDatabase::create(dir.path().join("schema.db"))
            .await
            .unwrap()
    }

    #[test]
    fn test_tables_ordered_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            db.run_script(
                "CREATE TABLE zebra(a INTEGER);\n\
                 CREATE TABLE apple(b INTEGER);\n\
                 CREATE VIEW fruit AS SELECT b FROM apple;",
            )
            .await
            .unwrap();

            let tables = db.tables().await.unwrap();
            let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["apple", "fruit", "zebra"]);
            assert!(tables[1].is_view());
            assert!(!tables[0].is_view());
        });
    }

    #[test]
    fn test_columns_in_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            db.run_script(
                "CREATE TABLE people(\n\
                   id INTEGER PRIMARY KEY,\n\
                   name TEXT NOT NULL,\n\
                   age INTEGER DEFAULT 0,\n\
                   city TEXT\n\
                 )",
            )
            .await
            .unwrap();

            let columns = db.columns("people").await.unwrap();
            assert_eq!(columns.len(), 4);

            assert_eq!(columns[0].name, "id");
            assert_eq!(columns[0].primary_key, 1);
            assert_eq!(columns[0].ordinal, 1);

            assert_eq!(columns[1].name, "name");
            assert!(columns[1].not_null);
            assert_eq!(columns[1].data_type, "TEXT");

            assert_eq!(columns[2].default.as_deref(), Some("0"));
            assert_eq!(columns[3].name, "city");
            assert_eq!(columns[3].ordinal, 4);
        });
    }

    #[test]
    fn test_introspection_sees_fresh_schema() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            assert!(db.tables().await.unwrap().is_empty());

            db.run_script("CREATE TABLE first(a INTEGER)").await.unwrap();
            assert_eq!(db.tables().await.unwrap().len(), 1);

            db.run_script("ALTER TABLE first ADD COLUMN b TEXT")
                .await
                .unwrap();
            assert_eq!(db.columns("first").await.unwrap().len(), 2);

            db.run_script("DROP TABLE first").await.unwrap();
            assert!(db.tables().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_columns_of_missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let db = scratch_db(&dir).await;
            assert!(db.columns("no_such_table").await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_display_label_handles_untyped_columns() {
        let typed = ColumnDetail {
            name: "age".into(),
            data_type: "INTEGER".into(),
            not_null: false,
            default: None,
            primary_key: 0,
            ordinal: 1,
        };
        assert_eq!(typed.display_label(), "age : INTEGER");

        let untyped = ColumnDetail {
            name: "anything".into(),
            data_type: String::new(),
            not_null: false,
            default: None,
            primary_key: 0,
            ordinal: 2,
        };
        assert_eq!(untyped.display_label(), "anything : UNKNOWN");
    }
}
