//! Schema validation
//!
//! Produces a fresh list of findings from the current model on every call,
//! plus an independent best-practice checklist and a composite score.
//! Findings never block SQL generation.

use std::collections::HashSet;
use std::sync::LazyLock;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::schema::{Schema, Table};

/// Points deducted per finding kind
const ERROR_PENALTY: u32 = 20;
const WARNING_PENALTY: u32 = 10;
const SUGGESTION_PENALTY: u32 = 5;

/// Keywords that need quoting when used as identifiers in PostgreSQL or MySQL
static RESERVED_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "ALL", "ALTER", "AND", "ANY", "ARRAY", "AS", "ASC", "BETWEEN", "BOTH", "BY", "CASE",
        "CAST", "CHECK", "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE",
        "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DELETE", "DESC",
        "DISTINCT", "DO", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR",
        "FOREIGN", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN", "INDEX", "INNER",
        "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "LATERAL", "LEADING", "LEFT",
        "LIKE", "LIMIT", "NATURAL", "NOT", "NULL", "OFFSET", "ON", "ONLY", "OR", "ORDER",
        "OUTER", "PRIMARY", "REFERENCES", "RETURNING", "RIGHT", "SELECT", "SESSION_USER",
        "SET", "SOME", "TABLE", "THEN", "TO", "TRAILING", "TRUE", "UNION", "UNIQUE", "UPDATE",
        "USING", "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
    ]
    .into_iter()
    .collect()
});

/// Severity of a finding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    #[display("error")]
    Error,
    #[display("warning")]
    Warning,
    #[display("suggestion")]
    Suggestion,
}

/// One finding, with optional back-references for highlighting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub kind: ValidationKind,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_id: Option<String>,
}

impl ValidationResult {
    fn new(kind: ValidationKind, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestion: suggestion.into(),
            table_id: None,
            column_id: None,
            relationship_id: None,
        }
    }

    /// Blocking finding
    pub fn error(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::new(ValidationKind::Error, message, suggestion)
    }

    /// Non-blocking finding worth fixing
    pub fn warning(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::new(ValidationKind::Warning, message, suggestion)
    }

    /// Optional improvement
    pub fn suggestion(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::new(ValidationKind::Suggestion, message, suggestion)
    }

    /// Point the finding at a table
    pub fn for_table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    /// Point the finding at a column
    pub fn for_column(mut self, column_id: impl Into<String>) -> Self {
        self.column_id = Some(column_id.into());
        self
    }

    /// Point the finding at a relationship
    pub fn for_relationship(mut self, relationship_id: impl Into<String>) -> Self {
        self.relationship_id = Some(relationship_id.into());
        self
    }

    /// Whether this is an error finding
    pub fn is_error(&self) -> bool {
        self.kind == ValidationKind::Error
    }
}

/// Run every rule against the schema.
///
/// Output order: per-table findings (table by table), then relationship
/// findings, then global findings.
pub fn validate_schema(schema: &Schema) -> Vec<ValidationResult> {
    let mut results = Vec::new();

    for table in &schema.tables {
        check_table(table, &mut results);
    }

    for relationship in &schema.relationships {
        if schema.endpoints(relationship).is_none() {
            results.push(
                ValidationResult::error(
                    "Relationship references non-existent table",
                    "Delete the relationship or recreate the missing table",
                )
                .for_relationship(&relationship.id),
            );
        }
    }

    let has_audit_columns = schema.tables.iter().any(|t| {
        t.columns
            .iter()
            .any(|c| c.name.contains("created_at") || c.name.contains("updated_at"))
    });
    if !schema.tables.is_empty() && !has_audit_columns {
        results.push(ValidationResult::warning(
            "No audit timestamp columns found",
            "Add created_at and updated_at columns to track when rows change",
        ));
    }

    results
}

fn check_table(table: &Table, results: &mut Vec<ValidationResult>) {
    let label = if table.name.trim().is_empty() {
        "(unnamed)"
    } else {
        table.name.as_str()
    };

    if !table.has_primary_key() {
        results.push(
            ValidationResult::error(
                format!("Table '{}' has no primary key", label),
                "Add a primary key column, e.g. id uuid",
            )
            .for_table(&table.id),
        );
    }

    if table.name.trim().is_empty() {
        results.push(
            ValidationResult::error(
                "Table name cannot be empty",
                "Give the table a descriptive snake_case name",
            )
            .for_table(&table.id),
        );
    }

    for column in &table.columns {
        if column.name.trim().is_empty() {
            results.push(
                ValidationResult::error(
                    format!("Column name cannot be empty in table '{}'", label),
                    "Name the column or remove it",
                )
                .for_table(&table.id)
                .for_column(&column.id),
            );
        }
    }

    if is_reserved_keyword(&table.name) {
        results.push(
            ValidationResult::suggestion(
                format!("Table name '{}' is a reserved SQL keyword", table.name),
                "Rename the table, e.g. use a plural noun",
            )
            .for_table(&table.id),
        );
    }
    for column in table.columns.iter().filter(|c| is_reserved_keyword(&c.name)) {
        results.push(
            ValidationResult::suggestion(
                format!(
                    "Column name '{}' in table '{}' is a reserved SQL keyword",
                    column.name, label
                ),
                "Rename the column so it does not need quoting",
            )
            .for_table(&table.id)
            .for_column(&column.id),
        );
    }
}

/// Check if a name is a reserved keyword (case-insensitive)
pub fn is_reserved_keyword(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && RESERVED_KEYWORDS.contains(trimmed.to_uppercase().as_str())
}

/// `^[a-z][a-z0-9_]*$`
pub fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => chars
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
        _ => false,
    }
}

/// `max(0, 100 - 20*errors - 10*warnings - 5*suggestions)`
pub fn score(results: &[ValidationResult]) -> u32 {
    let penalty: u32 = results
        .iter()
        .map(|r| match r.kind {
            ValidationKind::Error => ERROR_PENALTY,
            ValidationKind::Warning => WARNING_PENALTY,
            ValidationKind::Suggestion => SUGGESTION_PENALTY,
        })
        .sum();
    100u32.saturating_sub(penalty)
}

/// Independent best-practice audit. "All" checks hold vacuously on an empty
/// schema, "at least one" checks do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPracticeChecklist {
    pub primary_keys: bool,
    pub naming_convention: bool,
    pub relationship_columns: bool,
    pub audit_timestamps: bool,
    pub user_ownership: bool,
}

impl BestPracticeChecklist {
    /// Evaluate all five checks against the schema
    pub fn evaluate(schema: &Schema) -> Self {
        Self {
            primary_keys: schema.tables.iter().all(Table::has_primary_key),
            naming_convention: schema.tables.iter().all(|t| {
                is_snake_case(&t.name) && t.columns.iter().all(|c| is_snake_case(&c.name))
            }),
            relationship_columns: schema
                .relationships
                .iter()
                .all(|r| !r.from_column.is_empty() && !r.to_column.is_empty()),
            audit_timestamps: schema
                .tables
                .iter()
                .any(|t| t.has_column("created_at") && t.has_column("updated_at")),
            user_ownership: schema.tables.iter().any(|t| t.has_column("user_id")),
        }
    }

    /// Number of checks that hold
    pub fn passed(&self) -> usize {
        [
            self.primary_keys,
            self.naming_convention,
            self.relationship_columns,
            self.audit_timestamps,
            self.user_ownership,
        ]
        .into_iter()
        .filter(|ok| *ok)
        .count()
    }

    pub const TOTAL: usize = 5;
}

/// Everything a validation panel shows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
    pub checklist: BestPracticeChecklist,
    pub score: u32,
}

impl ValidationReport {
    /// Validate the schema and score the findings
    pub fn build(schema: &Schema) -> Self {
        let results = validate_schema(schema);
        let score = score(&results);
        Self {
            results,
            checklist: BestPracticeChecklist::evaluate(schema),
            score,
        }
    }

    /// Number of findings of the given kind
    pub fn count(&self, kind: ValidationKind) -> usize {
        self.results.iter().filter(|r| r.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, Relationship, RelationshipKind};

    fn table(name: &str, columns: Vec<Column>) -> Table {
        columns
            .into_iter()
            .fold(Table::new(name), |t, c| t.add_column(c))
    }

    #[test]
    fn test_empty_schema_has_no_findings() {
        let schema = Schema::new();
        assert!(validate_schema(&schema).is_empty());
        assert_eq!(ValidationReport::build(&schema).score, 100);
    }

    #[test]
    fn test_missing_primary_key_is_one_error_per_table() {
        let schema = Schema {
            tables: vec![
                table("a", vec![Column::new("x", "text")]),
                table("b", vec![]),
                table("c", vec![Column::identity()]),
            ],
            relationships: vec![],
        };
        let results = validate_schema(&schema);
        let pk_errors: Vec<_> = results
            .iter()
            .filter(|r| r.is_error() && r.message.contains("no primary key"))
            .collect();
        assert_eq!(pk_errors.len(), 2);
        assert_eq!(pk_errors[0].table_id.as_deref(), Some(schema.tables[0].id.as_str()));
        assert_eq!(pk_errors[1].table_id.as_deref(), Some(schema.tables[1].id.as_str()));
    }

    #[test]
    fn test_blank_names_are_errors() {
        let blank_col = Column::new("  ", "text");
        let blank_col_id = blank_col.id.clone();
        let schema = Schema {
            tables: vec![table(" ", vec![Column::identity(), blank_col])],
            relationships: vec![],
        };
        let results = validate_schema(&schema);
        assert!(results.iter().any(|r| r.message == "Table name cannot be empty"));
        let column_error = results
            .iter()
            .find(|r| r.column_id.as_deref() == Some(blank_col_id.as_str()))
            .unwrap();
        assert!(column_error.is_error());
        assert_eq!(column_error.table_id.as_deref(), Some(schema.tables[0].id.as_str()));
    }

    #[test]
    fn test_dangling_relationship_error() {
        let users = table("users", vec![Column::identity()]);
        let rel = Relationship::new(RelationshipKind::OneToMany, &users.id, "id", "missing", "user_id");
        let schema = Schema {
            tables: vec![users],
            relationships: vec![rel.clone()],
        };
        let results = validate_schema(&schema);
        let errors: Vec<_> = results.iter().filter(|r| r.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].relationship_id.as_deref(), Some(rel.id.as_str()));
        assert_eq!(errors[0].message, "Relationship references non-existent table");
    }

    #[test]
    fn test_audit_warning_is_last_and_substring_based() {
        let mut schema = Schema {
            tables: vec![table("users", vec![Column::new("x", "text")])],
            relationships: vec![],
        };
        let results = validate_schema(&schema);
        assert_eq!(results.last().unwrap().kind, ValidationKind::Warning);

        schema.tables[0]
            .columns
            .push(Column::new("row_created_at", "timestamp"));
        let results = validate_schema(&schema);
        assert!(results.iter().all(|r| r.kind != ValidationKind::Warning));
    }

    #[test]
    fn test_reserved_keyword_suggestions() {
        let schema = Schema {
            tables: vec![table(
                "order",
                vec![Column::identity(), Column::new("select", "text")],
            )],
            relationships: vec![],
        };
        let results = validate_schema(&schema);
        let suggestions = results
            .iter()
            .filter(|r| r.kind == ValidationKind::Suggestion)
            .count();
        assert_eq!(suggestions, 2);
    }

    #[test]
    fn test_score_formula() {
        let results = vec![
            ValidationResult::error("e", ""),
            ValidationResult::warning("w", ""),
            ValidationResult::suggestion("s", ""),
        ];
        assert_eq!(score(&results), 65);

        let many_errors: Vec<_> = (0..6).map(|_| ValidationResult::error("e", "")).collect();
        assert_eq!(score(&many_errors), 0);
    }

    #[test]
    fn test_snake_case() {
        assert!(is_snake_case("users"));
        assert!(is_snake_case("user_id2"));
        assert!(!is_snake_case("Users"));
        assert!(!is_snake_case("_users"));
        assert!(!is_snake_case("2users"));
        assert!(!is_snake_case("user-id"));
        assert!(!is_snake_case(""));
    }

    #[test]
    fn test_checklist() {
        let empty = BestPracticeChecklist::evaluate(&Schema::new());
        assert!(empty.primary_keys && empty.naming_convention && empty.relationship_columns);
        assert!(!empty.audit_timestamps && !empty.user_ownership);
        assert_eq!(empty.passed(), 3);

        let schema = Schema {
            tables: vec![table(
                "posts",
                vec![
                    Column::identity(),
                    Column::new("user_id", "uuid"),
                    Column::new("created_at", "timestamp"),
                    Column::new("updated_at", "timestamp"),
                ],
            )],
            relationships: vec![],
        };
        let checklist = BestPracticeChecklist::evaluate(&schema);
        assert_eq!(checklist.passed(), BestPracticeChecklist::TOTAL);

        let schema = Schema {
            tables: vec![table("Posts", vec![Column::new("created_at", "timestamp")])],
            relationships: vec![Relationship::new(RelationshipKind::OneToOne, "a", "", "b", "id")],
        };
        let checklist = BestPracticeChecklist::evaluate(&schema);
        assert!(!checklist.primary_keys);
        assert!(!checklist.naming_convention);
        assert!(!checklist.relationship_columns);
        assert!(!checklist.audit_timestamps);
    }

    #[test]
    fn test_keyword_lookup_is_case_insensitive() {
        assert!(is_reserved_keyword("Select"));
        assert!(is_reserved_keyword("order"));
        assert!(!is_reserved_keyword("orders"));
        assert!(!is_reserved_keyword(""));
    }
}
