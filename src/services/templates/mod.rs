mod applicator;
mod catalog;

pub use applicator::{apply, ApplyOutcome, ApplyPhase};
pub use catalog::{
    QueryTemplate, SchemaTemplate, StatementClass, TemplateCatalog, TemplateError,
};
