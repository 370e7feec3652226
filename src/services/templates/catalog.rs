//! Template catalog: typed query snippets and schema bundles.
//!
//! A catalog is loaded from a single JSON document and is immutable
//! afterwards; imports build a new merged catalog. Loading is
//! all-or-nothing: one bad entry rejects the whole file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::Assets;

/// Embedded starter catalog, seeded on first run.
const BUILTIN_CATALOG: &str = "templates.json";

/// Errors from loading or merging template catalogs.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Filesystem failure reading the document.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not a valid catalog: bad JSON, a missing required
    /// field, an unrecognized statement class, or a duplicate template.
    #[error("malformed template file: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for TemplateError {
    fn from(e: serde_json::Error) -> Self {
        TemplateError::Malformed(e.to_string())
    }
}

/// SQL statement class a query template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementClass {
    Ddl,
    Dql,
    Dml,
    Dcl,
    Tcl,
}

impl StatementClass {
    /// All classes, in the order the templates tab lists them.
    pub fn all() -> [StatementClass; 5] {
        [Self::Ddl, Self::Dql, Self::Dml, Self::Dcl, Self::Tcl]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ddl => "DDL",
            Self::Dql => "DQL",
            Self::Dml => "DML",
            Self::Dcl => "DCL",
            Self::Tcl => "TCL",
        }
    }

    /// Human description shown next to the class name.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ddl => "Data definition",
            Self::Dql => "Queries",
            Self::Dml => "Data manipulation",
            Self::Dcl => "Access control",
            Self::Tcl => "Transactions",
        }
    }
}

impl std::fmt::Display for StatementClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A categorized SQL snippet for study and reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub class: StatementClass,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub sql: String,
}

/// A named bundle of DDL (and optional sample-data DML) statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaTemplate {
    pub name: String,
    /// Free-form theme, e.g. "Learning" or "Demo".
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// DDL statements, applied in order.
    pub schema: Vec<String>,
    /// Optional sample-data DML statements, applied in order.
    #[serde(default)]
    pub data: Option<Vec<String>>,
}

impl SchemaTemplate {
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }
}

/// On-disk document shape.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    query_templates: Vec<QueryTemplate>,
    #[serde(default)]
    schema_templates: Vec<SchemaTemplate>,
}

/// Loaded, validated template collections. Read-only.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    query_templates: Vec<QueryTemplate>,
    schema_templates: Vec<SchemaTemplate>,
}

impl TemplateCatalog {
    /// Load a catalog document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse a catalog document. All-or-nothing: any invalid entry fails
    /// the whole load.
    pub fn from_json(text: &str) -> Result<Self, TemplateError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Self::validated(file.query_templates, file.schema_templates)
    }

    /// The starter catalog embedded in the binary.
    pub fn builtin() -> Result<Self, TemplateError> {
        let asset = Assets::get(BUILTIN_CATALOG).ok_or_else(|| {
            TemplateError::Malformed(format!("embedded catalog {BUILTIN_CATALOG} missing"))
        })?;
        let text = std::str::from_utf8(asset.data.as_ref())
            .map_err(|e| TemplateError::Malformed(e.to_string()))?;
        Self::from_json(text)
    }

    fn validated(
        query_templates: Vec<QueryTemplate>,
        schema_templates: Vec<SchemaTemplate>,
    ) -> Result<Self, TemplateError> {
        let mut seen_queries = HashSet::new();
        for template in &query_templates {
            if !seen_queries.insert((template.class, template.title.clone())) {
                return Err(TemplateError::Malformed(format!(
                    "duplicate query template [{}] {}",
                    template.class, template.title
                )));
            }
        }

        let mut seen_schemas = HashSet::new();
        for template in &schema_templates {
            if template.schema.is_empty() {
                return Err(TemplateError::Malformed(format!(
                    "schema template '{}' has no DDL statements",
                    template.name
                )));
            }
            if !seen_schemas.insert(template.name.clone()) {
                return Err(TemplateError::Malformed(format!(
                    "duplicate schema template '{}'",
                    template.name
                )));
            }
        }

        Ok(Self {
            query_templates,
            schema_templates,
        })
    }

    /// Build a new catalog with `other`'s entries added. An incoming
    /// duplicate of an existing template rejects the import.
    pub fn merge(&self, other: TemplateCatalog) -> Result<Self, TemplateError> {
        let mut query_templates = self.query_templates.clone();
        query_templates.extend(other.query_templates);
        let mut schema_templates = self.schema_templates.clone();
        schema_templates.extend(other.schema_templates);
        Self::validated(query_templates, schema_templates)
    }

    pub fn query_templates(&self) -> &[QueryTemplate] {
        &self.query_templates
    }

    pub fn schema_templates(&self) -> &[SchemaTemplate] {
        &self.schema_templates
    }

    /// Query templates of one class, ordered by title.
    pub fn filter_by_class(&self, class: StatementClass) -> Vec<&QueryTemplate> {
        let mut matches: Vec<_> = self
            .query_templates
            .iter()
            .filter(|t| t.class == class)
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title));
        matches
    }

    /// Case-insensitive substring search over title and description.
    pub fn search(&self, text: &str) -> Vec<&QueryTemplate> {
        let needle = text.to_lowercase();
        self.query_templates
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Look up one query template by its identity.
    pub fn find_query(&self, class: StatementClass, title: &str) -> Option<&QueryTemplate> {
        self.query_templates
            .iter()
            .find(|t| t.class == class && t.title == title)
    }

    /// Distinct schema-template categories, sorted.
    pub fn schema_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .schema_templates
            .iter()
            .map(|t| t.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Schema templates of one category, ordered by name.
    pub fn schema_templates_in(&self, category: &str) -> Vec<&SchemaTemplate> {
        let mut matches: Vec<_> = self
            .schema_templates
            .iter()
            .filter(|t| t.category == category)
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }

    pub fn find_schema(&self, name: &str) -> Option<&SchemaTemplate> {
        self.schema_templates.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "query_templates": [
            {"class": "DDL", "title": "Create t", "description": "Make a table", "sql": "CREATE TABLE t(a)"},
            {"class": "DQL", "title": "Read t", "description": "Read it back", "sql": "SELECT * FROM t"},
            {"class": "DQL", "title": "Count t", "sql": "SELECT COUNT(*) FROM t"}
        ],
        "schema_templates": [
            {"name": "One", "category": "Learning", "description": "", "schema": ["CREATE TABLE one(a)"]},
            {"name": "Two", "category": "Demo", "schema": ["CREATE TABLE two(b)"], "data": ["INSERT INTO two VALUES (1)"]}
        ]
    }"#;

    #[test]
    fn test_load_sample() {
        let catalog = TemplateCatalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.query_templates().len(), 3);
        assert_eq!(catalog.schema_templates().len(), 2);

        // Omitted description defaults to empty.
        let count = catalog.find_query(StatementClass::Dql, "Count t").unwrap();
        assert_eq!(count.description, "");

        assert!(!catalog.find_schema("One").unwrap().has_data());
        assert!(catalog.find_schema("Two").unwrap().has_data());
    }

    #[test]
    fn test_missing_class_fails_whole_load() {
        let bad = r#"{
            "query_templates": [
                {"class": "DQL", "title": "fine", "sql": "SELECT 1"},
                {"title": "no class here", "sql": "SELECT 2"}
            ],
            "schema_templates": []
        }"#;
        let err = TemplateCatalog::from_json(bad).unwrap_err();
        assert!(matches!(err, TemplateError::Malformed(_)));
    }

    #[test]
    fn test_unrecognized_class_fails() {
        let bad = r#"{
            "query_templates": [
                {"class": "DANCE", "title": "nope", "sql": "SELECT 1"}
            ]
        }"#;
        assert!(TemplateCatalog::from_json(bad).is_err());
    }

    #[test]
    fn test_duplicate_identity_fails() {
        let bad = r#"{
            "query_templates": [
                {"class": "DQL", "title": "Same", "sql": "SELECT 1"},
                {"class": "DQL", "title": "Same", "sql": "SELECT 2"}
            ]
        }"#;
        assert!(TemplateCatalog::from_json(bad).is_err());

        // Same title under a different class is a different identity.
        let ok = r#"{
            "query_templates": [
                {"class": "DQL", "title": "Same", "sql": "SELECT 1"},
                {"class": "DML", "title": "Same", "sql": "DELETE FROM t"}
            ]
        }"#;
        assert!(TemplateCatalog::from_json(ok).is_ok());
    }

    #[test]
    fn test_schema_template_without_statements_fails() {
        let bad = r#"{
            "schema_templates": [
                {"name": "Empty", "category": "Broken", "schema": []}
            ]
        }"#;
        assert!(TemplateCatalog::from_json(bad).is_err());
    }

    #[test]
    fn test_filter_by_class_sorted() {
        let catalog = TemplateCatalog::from_json(SAMPLE).unwrap();
        let dql: Vec<_> = catalog
            .filter_by_class(StatementClass::Dql)
            .into_iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(dql, vec!["Count t", "Read t"]);
        assert!(catalog.filter_by_class(StatementClass::Tcl).is_empty());
    }

    #[test]
    fn test_search_case_insensitive() {
        let catalog = TemplateCatalog::from_json(SAMPLE).unwrap();

        let by_title = catalog.search("CREATE T");
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Create t");

        let by_description = catalog.search("read it BACK");
        assert_eq!(by_description.len(), 1);

        assert!(catalog.search("zzz-no-match").is_empty());
        assert_eq!(catalog.search("").len(), 3);
    }

    #[test]
    fn test_schema_categories() {
        let catalog = TemplateCatalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.schema_categories(), vec!["Demo", "Learning"]);
        assert_eq!(catalog.schema_templates_in("Learning").len(), 1);
        assert!(catalog.schema_templates_in("Nope").is_empty());
    }

    #[test]
    fn test_merge_rejects_duplicates() {
        let catalog = TemplateCatalog::from_json(SAMPLE).unwrap();

        let incoming = TemplateCatalog::from_json(
            r#"{"query_templates": [{"class": "TCL", "title": "Begin", "sql": "BEGIN"}]}"#,
        )
        .unwrap();
        let merged = catalog.merge(incoming).unwrap();
        assert_eq!(merged.query_templates().len(), 4);

        let duplicate = TemplateCatalog::from_json(
            r#"{"query_templates": [{"class": "DDL", "title": "Create t", "sql": "CREATE TABLE t(a)"}]}"#,
        )
        .unwrap();
        assert!(catalog.merge(duplicate).is_err());
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = TemplateCatalog::builtin().unwrap();
        assert!(!catalog.query_templates().is_empty());
        assert!(!catalog.schema_templates().is_empty());

        // Every class the tab lists resolves without panicking.
        for class in StatementClass::all() {
            let _ = catalog.filter_by_class(class);
        }
    }
}
