mod connection;
mod decode;
mod error;
mod manager;
mod row;
mod schema;
mod script;

pub use connection::{
    ErrorResult, ModifiedResult, QueryExecutionResult, SelectResult, TestDatabase,
};
pub use error::DatabaseError;
pub use manager::{is_database_file, TestDatabaseManager};
pub use row::{Cell, ColumnInfo, Row, Value};
pub use schema::{ColumnDetail, TableInfo};
pub use script::{is_row_returning, split_statements};
