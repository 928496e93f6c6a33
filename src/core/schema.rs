use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate an opaque identifier with the given prefix
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Canvas position of a table. Presentation only.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a position from canvas coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Informational pointer from a column to a column of another table
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
}

/// Database table
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub color: String,
}

impl Table {
    /// Create an empty table with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id("table"),
            name: name.into(),
            columns: Vec::new(),
            position: Position::default(),
            description: None,
            color: String::new(),
        }
    }

    /// Override the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the canvas position
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Attach a free-form description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a column
    pub fn add_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Whether any column is flagged as primary key
    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.is_primary_key)
    }

    /// Whether a column with exactly this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Find a column by id, returning its index as well
    pub fn find_column(&self, column_id: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.id == column_id)
    }

    /// Find a column by its name
    pub fn find_column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Table column
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Type tag from an open vocabulary (uuid, text, integer, ...)
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_unique: bool,
    /// Raw SQL expression, emitted as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ColumnReference>,
}

impl Column {
    /// Create a nullable, non-key column with a fresh id
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: new_id("col"),
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            is_foreign_key: false,
            is_required: false,
            is_unique: false,
            default_value: None,
            description: None,
            references: None,
        }
    }

    /// The column every new table starts with
    pub fn identity() -> Self {
        Self::new("id", "uuid")
            .primary_key()
            .with_default("gen_random_uuid()")
    }

    /// Override the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Mark as primary key (implies required)
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_required = true;
        self
    }

    /// Mark as NOT NULL
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Mark as unique
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Set the raw default expression
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Attach a free-form description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark as foreign key pointing at `table.column`
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.is_foreign_key = true;
        self.references = Some(ColumnReference {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

/// Cardinality of a relationship
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default, Display)]
pub enum RelationshipKind {
    #[serde(rename = "one-to-one")]
    #[display("1:1")]
    OneToOne,
    #[default]
    #[serde(rename = "one-to-many")]
    #[display("1:N")]
    OneToMany,
    #[serde(rename = "many-to-many")]
    #[display("N:M")]
    ManyToMany,
}

/// `ON DELETE` / `ON UPDATE` action
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Display)]
pub enum ReferentialAction {
    #[serde(rename = "CASCADE")]
    #[display("CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    #[display("SET NULL")]
    SetNull,
    #[serde(rename = "RESTRICT")]
    #[display("RESTRICT")]
    Restrict,
}

/// Link between two tables. Table and column fields hold ids and names
/// respectively; the referenced tables are not guaranteed to exist.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: RelationshipKind,
    #[serde(default)]
    pub from_table: String,
    #[serde(default)]
    pub from_column: String,
    #[serde(default)]
    pub to_table: String,
    #[serde(default)]
    pub to_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

impl Relationship {
    /// Create a relationship between `from_table.from_column` and
    /// `to_table.to_column` (table ids, column names)
    pub fn new(
        kind: RelationshipKind,
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id("rel"),
            kind,
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Override the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the `ON DELETE` action
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Set the `ON UPDATE` action
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Whether either endpoint is the given table
    pub fn touches(&self, table_id: &str) -> bool {
        self.from_table == table_id || self.to_table == table_id
    }
}

/// The whole model: tables plus relationships.
///
/// This is also the import/export file shape; either key may be missing.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table by id
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    /// Look up a table by id for editing
    pub fn table_mut(&mut self, id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    /// Look up a table by name
    pub fn find_table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Look up a relationship by id
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Both endpoints of a relationship, if they resolve
    pub fn endpoints(&self, relationship: &Relationship) -> Option<(&Table, &Table)> {
        Some((
            self.table(&relationship.from_table)?,
            self.table(&relationship.to_table)?,
        ))
    }
}
