//! Schema editor: the single owner and writer of the schema model
//!
//! Validation and SQL generation only ever read a snapshot of the model.

use super::error::SchemaError;
use super::schema::{Column, Position, Relationship, Schema, Table};
use super::sql_generator::{SqlGenerator, SqlMode};
use super::validation::{ValidationReport, ValidationResult, validate_schema};

/// Name of the exported schema file
pub const EXPORT_FILE_NAME: &str = "database-schema.json";

/// Grid used to place new tables
const TABLE_WIDTH: f64 = 250.0;
const TABLE_HEIGHT: f64 = 200.0;
const TABLE_SPACING: f64 = 50.0;
const TABLES_PER_ROW: usize = 4;
const START_X: f64 = 100.0;
const START_Y: f64 = 100.0;

/// Header colors, cycled by table count
const TABLE_COLORS: &[&str] = &[
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
];

#[derive(Debug, Default)]
pub struct SchemaEditor {
    schema: Schema,
}

impl SchemaEditor {
    /// Create an editor over an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an editor over an existing schema
    pub fn with_schema(schema: Schema) -> Self {
        Self { schema }
    }

    /// Current model snapshot
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All tables in insertion order
    pub fn tables(&self) -> &[Table] {
        &self.schema.tables
    }

    /// All relationships in insertion order
    pub fn relationships(&self) -> &[Relationship] {
        &self.schema.relationships
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Append a new `table_<n>` with an identity primary key, `n` being the
    /// smallest index not already taken by a table name
    pub fn add_table(&mut self) -> &Table {
        let count = self.schema.tables.len();
        let mut table = Table::new(self.next_table_name()).add_column(Column::identity());
        table.position = self.next_position();
        table.color = TABLE_COLORS[count % TABLE_COLORS.len()].to_string();

        tracing::debug!(table_id = %table.id, name = %table.name, "Table added");
        self.schema.tables.push(table);
        &self.schema.tables[count]
    }

    /// Replace the table with the same id. Unknown ids are ignored;
    /// returns whether a table was replaced.
    pub fn update_table(&mut self, table: Table) -> bool {
        match self.schema.table_mut(&table.id) {
            Some(existing) => {
                tracing::debug!(table_id = %table.id, "Table updated");
                *existing = table;
                true
            }
            None => {
                tracing::warn!(table_id = %table.id, "Update ignored: table not found");
                false
            }
        }
    }

    /// Rename a table in place
    pub fn rename_table(&mut self, table_id: &str, name: impl Into<String>) -> Result<(), SchemaError> {
        let table = self.table_mut(table_id)?;
        table.name = name.into();
        tracing::debug!(table_id, name = %table.name, "Table renamed");
        Ok(())
    }

    /// Remove a table and every relationship touching it. Unknown ids are a no-op.
    pub fn delete_table(&mut self, table_id: &str) {
        let before = self.schema.tables.len();
        self.schema.tables.retain(|t| t.id != table_id);
        if self.schema.tables.len() == before {
            return;
        }

        let relationships = self.schema.relationships.len();
        self.schema.relationships.retain(|r| !r.touches(table_id));
        tracing::debug!(
            table_id,
            cascaded = relationships - self.schema.relationships.len(),
            "Table deleted"
        );
    }

    fn next_table_name(&self) -> String {
        (1usize..)
            .map(|n| format!("table_{}", n))
            .find(|name| self.schema.find_table_by_name(name).is_none())
            .unwrap_or_else(|| format!("table_{}", self.schema.tables.len() + 1))
    }

    /// Where the next table goes: the next free grid cell, or right of the
    /// rightmost table when that cell is taken
    fn next_position(&self) -> Position {
        let existing: Vec<Position> = self.schema.tables.iter().map(|t| t.position).collect();
        if existing.is_empty() {
            return Position::new(START_X, START_Y);
        }

        let count = existing.len();
        let x = START_X + (count % TABLES_PER_ROW) as f64 * (TABLE_WIDTH + TABLE_SPACING);
        let y = START_Y + (count / TABLES_PER_ROW) as f64 * (TABLE_HEIGHT + TABLE_SPACING);

        let overlaps = existing
            .iter()
            .any(|p| (x - p.x).abs() < TABLE_WIDTH && (y - p.y).abs() < TABLE_HEIGHT);
        if !overlaps {
            return Position::new(x, y);
        }

        let max_x = existing.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = existing
            .iter()
            .filter(|p| (p.x - max_x).abs() < TABLE_WIDTH)
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);

        if (count + 1).is_multiple_of(TABLES_PER_ROW) {
            Position::new(START_X, max_y + TABLE_HEIGHT + TABLE_SPACING)
        } else {
            Position::new(max_x + TABLE_WIDTH + TABLE_SPACING, max_y)
        }
    }

    fn table_mut(&mut self, table_id: &str) -> Result<&mut Table, SchemaError> {
        self.schema
            .table_mut(table_id)
            .ok_or_else(|| SchemaError::TableNotFound(table_id.to_string()))
    }

    // ========================================================================
    // Columns
    // ========================================================================

    /// Append a column; names must be unique within the table
    pub fn add_column(&mut self, table_id: &str, column: Column) -> Result<(), SchemaError> {
        let table = self.table_mut(table_id)?;
        if table.has_column(&column.name) {
            return Err(SchemaError::DuplicateColumn {
                table: table.name.clone(),
                column: column.name,
            });
        }
        tracing::debug!(table_id, column = %column.name, "Column added");
        table.columns.push(column);
        Ok(())
    }

    /// Replace the column with the same id
    pub fn update_column(&mut self, table_id: &str, column: Column) -> Result<(), SchemaError> {
        let table = self.table_mut(table_id)?;
        let index = table
            .find_column(&column.id)
            .map(|(index, _)| index)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: table_id.to_string(),
                column: column.id.clone(),
            })?;
        tracing::debug!(table_id, column_id = %column.id, "Column updated");
        table.columns[index] = column;
        Ok(())
    }

    /// Remove a column by id, returning it
    pub fn delete_column(&mut self, table_id: &str, column_id: &str) -> Result<Column, SchemaError> {
        let table = self.table_mut(table_id)?;
        let index = table
            .find_column(column_id)
            .map(|(index, _)| index)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: table_id.to_string(),
                column: column_id.to_string(),
            })?;
        tracing::debug!(table_id, column_id, "Column deleted");
        Ok(table.columns.remove(index))
    }

    /// Move a column to a new position within its table
    pub fn move_column(&mut self, table_id: &str, from: usize, to: usize) -> Result<(), SchemaError> {
        let table = self.table_mut(table_id)?;
        let len = table.columns.len();
        for index in [from, to] {
            if index >= len {
                return Err(SchemaError::ColumnIndexOutOfBounds { index, len });
            }
        }
        let column = table.columns.remove(from);
        table.columns.insert(to, column);
        Ok(())
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    /// Insert as-is; endpoints are checked by validation, not here
    pub fn add_relationship(&mut self, relationship: Relationship) {
        tracing::debug!(
            relationship_id = %relationship.id,
            kind = %relationship.kind,
            "Relationship added"
        );
        self.schema.relationships.push(relationship);
    }

    /// Remove a relationship by id. Unknown ids are a no-op.
    pub fn delete_relationship(&mut self, relationship_id: &str) {
        self.schema.relationships.retain(|r| r.id != relationship_id);
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    /// Pretty-printed JSON `{ tables, relationships }`
    pub fn export_schema(&self) -> Result<Vec<u8>, SchemaError> {
        let bytes = serde_json::to_vec_pretty(&self.schema).map_err(SchemaError::Serialization)?;
        tracing::info!(
            tables = self.schema.tables.len(),
            relationships = self.schema.relationships.len(),
            "Schema exported"
        );
        Ok(bytes)
    }

    /// Replace the whole model. On a parse error the current model is kept.
    pub fn import_schema(&mut self, bytes: &[u8]) -> Result<(), SchemaError> {
        let schema: Schema = serde_json::from_slice(bytes).map_err(|e| {
            tracing::warn!("Rejected schema import: {}", e);
            SchemaError::InvalidSchemaFile(e)
        })?;
        tracing::info!(
            tables = schema.tables.len(),
            relationships = schema.relationships.len(),
            "Schema imported"
        );
        self.schema = schema;
        Ok(())
    }

    // ========================================================================
    // Derived output
    // ========================================================================

    /// Findings for the current model
    pub fn validation_results(&self) -> Vec<ValidationResult> {
        validate_schema(&self.schema)
    }

    /// Findings, checklist and score for the current model
    pub fn validation_report(&self) -> ValidationReport {
        ValidationReport::build(&self.schema)
    }

    /// SQL for the current model in the given mode
    pub fn generate_sql(&self, mode: SqlMode) -> String {
        SqlGenerator::new(&self.schema).generate(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::RelationshipKind;

    #[test]
    fn test_add_table_defaults() {
        let mut editor = SchemaEditor::new();
        let table = editor.add_table().clone();

        assert_eq!(table.name, "table_1");
        assert_eq!(table.columns.len(), 1);
        assert!(table.columns[0].is_primary_key);
        assert_eq!(table.position, Position::new(START_X, START_Y));
        assert_eq!(table.color, TABLE_COLORS[0]);

        let second = editor.add_table().clone();
        assert_eq!(second.name, "table_2");
        assert_ne!(second.id, table.id);
        assert_ne!(second.position, table.position);
    }

    #[test]
    fn test_grid_wraps_after_a_row() {
        let mut editor = SchemaEditor::new();
        for _ in 0..5 {
            editor.add_table();
        }
        let positions: Vec<Position> = editor.tables().iter().map(|t| t.position).collect();
        assert_eq!(positions[3], Position::new(START_X + 3.0 * 300.0, START_Y));
        assert_eq!(positions[4], Position::new(START_X, START_Y + 250.0));
    }

    #[test]
    fn test_occupied_cell_places_right_of_rightmost() {
        let mut editor = SchemaEditor::with_schema(Schema {
            tables: vec![Table::new("a").with_position(400.0, 100.0)],
            relationships: vec![],
        });
        let table = editor.add_table();
        assert_eq!(table.position, Position::new(700.0, 100.0));
    }

    #[test]
    fn test_update_table_unknown_id_is_noop() {
        let mut editor = SchemaEditor::new();
        editor.add_table();
        let before = editor.schema().clone();

        assert!(!editor.update_table(Table::new("ghost")));
        assert_eq!(editor.schema(), &before);

        let mut renamed = editor.tables()[0].clone();
        renamed.name = "users".into();
        assert!(editor.update_table(renamed));
        assert_eq!(editor.tables()[0].name, "users");
    }

    #[test]
    fn test_delete_table_cascades() {
        let mut editor = SchemaEditor::new();
        let a = editor.add_table().id.clone();
        let b = editor.add_table().id.clone();
        let c = editor.add_table().id.clone();
        editor.add_relationship(Relationship::new(RelationshipKind::OneToMany, &a, "id", &b, "a_id"));
        editor.add_relationship(Relationship::new(RelationshipKind::OneToOne, &c, "b_id", &b, "id"));
        editor.add_relationship(Relationship::new(RelationshipKind::OneToMany, &a, "id", &c, "a_id"));

        editor.delete_table(&b);
        assert_eq!(editor.tables().len(), 2);
        assert_eq!(editor.relationships().len(), 1);
        assert!(editor.relationships().iter().all(|r| !r.touches(&b)));

        // idempotent
        editor.delete_table(&b);
        assert_eq!(editor.tables().len(), 2);
    }

    #[test]
    fn test_column_operations() {
        let mut editor = SchemaEditor::new();
        let id = editor.add_table().id.clone();

        let email = Column::new("email", "text").required();
        let email_id = email.id.clone();
        editor.add_column(&id, email).unwrap();
        assert!(matches!(
            editor.add_column(&id, Column::new("email", "text")),
            Err(SchemaError::DuplicateColumn { .. })
        ));

        let updated = Column::new("email", "varchar(320)").with_id(&email_id).unique();
        editor.update_column(&id, updated).unwrap();
        assert_eq!(editor.tables()[0].columns[1].data_type, "varchar(320)");

        editor.move_column(&id, 1, 0).unwrap();
        assert_eq!(editor.tables()[0].columns[0].name, "email");
        assert!(matches!(
            editor.move_column(&id, 0, 9),
            Err(SchemaError::ColumnIndexOutOfBounds { index: 9, len: 2 })
        ));

        let removed = editor.delete_column(&id, &email_id).unwrap();
        assert_eq!(removed.name, "email");
        assert!(editor.delete_column(&id, &email_id).unwrap_err().is_not_found());
        assert!(editor.add_column("nope", Column::new("x", "text")).is_err());
    }

    #[test]
    fn test_rename_table() {
        let mut editor = SchemaEditor::new();
        let id = editor.add_table().id.clone();
        editor.rename_table(&id, "users").unwrap();
        assert_eq!(editor.tables()[0].name, "users");
        assert!(matches!(
            editor.rename_table("missing", "x"),
            Err(SchemaError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_delete_relationship() {
        let mut editor = SchemaEditor::new();
        let rel = Relationship::new(RelationshipKind::ManyToMany, "a", "id", "b", "id");
        let rel_id = rel.id.clone();
        editor.add_relationship(rel);
        editor.delete_relationship("other");
        assert_eq!(editor.relationships().len(), 1);
        editor.delete_relationship(&rel_id);
        assert!(editor.relationships().is_empty());
    }

    #[test]
    fn test_invalid_import_keeps_model() {
        let mut editor = SchemaEditor::new();
        editor.add_table();
        let before = editor.schema().clone();

        let err = editor.import_schema(b"{ not json").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchemaFile(_)));
        assert_eq!(editor.schema(), &before);

        let err = editor.import_schema(br#"{"tables": 5}"#).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchemaFile(_)));
        assert_eq!(editor.schema(), &before);
    }

    #[test]
    fn test_add_table_reuses_free_name() {
        let mut editor = SchemaEditor::new();
        let first = editor.add_table().id.clone();
        editor.add_table();
        editor.delete_table(&first);

        assert_eq!(editor.add_table().name, "table_1");
        assert_eq!(editor.add_table().name, "table_3");
        let mut names: Vec<&str> = editor.tables().iter().map(|t| t.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["table_1", "table_2", "table_3"]);
    }

    #[test]
    fn test_import_accepts_nameless_table() {
        let mut editor = SchemaEditor::new();
        editor
            .import_schema(
                br#"{"tables": [{"id": "t1", "columns": [
                    {"id": "c1", "name": "id", "type": "uuid", "isPrimaryKey": true}
                ]}], "relationships": []}"#,
            )
            .unwrap();

        assert_eq!(editor.tables()[0].name, "");
        let blank_name_errors = editor
            .validation_results()
            .into_iter()
            .filter(|r| r.is_error() && r.message == "Table name cannot be empty")
            .count();
        assert_eq!(blank_name_errors, 1);
    }

    #[test]
    fn test_import_replaces_model() {
        let mut editor = SchemaEditor::new();
        editor.add_table();
        editor
            .import_schema(br#"{"tables": [{"id": "t1", "name": "users"}]}"#)
            .unwrap();
        assert_eq!(editor.tables().len(), 1);
        assert_eq!(editor.tables()[0].id, "t1");
        assert!(editor.relationships().is_empty());
    }
}
