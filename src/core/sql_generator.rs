//! SQL generation from the schema model
//!
//! Output is a pure function of the schema and the mode. Sections are always
//! emitted in the same order (tables, foreign keys, indexes, row level
//! security) so regenerating an unchanged schema yields identical text.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::error::SchemaError;
use super::schema::{Column, Schema, Table};

/// Defaults that the database fills in by itself; seed skeletons skip them
const GENERATED_DEFAULTS: &[&str] = &["gen_random_uuid()", "uuid_generate_v4()", "now()"];

/// Column that ties a row to its owner for row level security
const OWNER_COLUMN: &str = "user_id";

/// What kind of script to produce
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum SqlMode {
    #[default]
    #[display("create")]
    Create,
    /// Currently identical to `Create`
    #[display("migrate")]
    Migrate,
    #[display("seed")]
    Seed,
}

impl FromStr for SqlMode {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(SqlMode::Create),
            "migrate" => Ok(SqlMode::Migrate),
            "seed" => Ok(SqlMode::Seed),
            _ => Err(SchemaError::UnknownSqlMode(s.to_string())),
        }
    }
}

/// File name for a downloaded script: `schema_<mode>_<millis>.sql`
pub fn sql_file_name(mode: SqlMode, at: DateTime<Utc>) -> String {
    format!("schema_{}_{}.sql", mode, at.timestamp_millis())
}

/// Parse SQL with the PostgreSQL dialect, returning the statement count
pub fn check_sql_syntax(sql: &str) -> Result<usize, SchemaError> {
    Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .map(|statements| statements.len())
        .map_err(|e| SchemaError::SqlSyntax(e.to_string()))
}

/// Renders a schema as SQL text
pub struct SqlGenerator<'a> {
    schema: &'a Schema,
}

impl<'a> SqlGenerator<'a> {
    /// Create a generator over a schema snapshot
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Render the script for the given mode
    pub fn generate(&self, mode: SqlMode) -> String {
        match mode {
            SqlMode::Create | SqlMode::Migrate => self.generate_ddl(),
            SqlMode::Seed => self.generate_seed(),
        }
    }

    fn generate_ddl(&self) -> String {
        let mut sql = String::from("-- Database schema\n");

        if self.schema.tables.is_empty() {
            sql.push_str("-- No tables defined\n");
            return sql;
        }

        let sections = [
            ("Tables", self.create_tables()),
            ("Foreign keys", self.foreign_keys()),
            ("Indexes", self.indexes()),
            ("Row level security", self.row_level_security()),
        ];
        for (title, statements) in sections {
            if statements.is_empty() {
                continue;
            }
            let _ = write!(sql, "\n-- {}\n", title);
            for statement in statements {
                sql.push_str(&statement);
                sql.push('\n');
            }
        }

        sql
    }

    fn create_tables(&self) -> Vec<String> {
        self.schema
            .tables
            .iter()
            .map(|table| {
                let columns: Vec<String> = table.columns.iter().map(column_clause).collect();
                format!("CREATE TABLE {} (\n{}\n);", table.name, columns.join(",\n"))
            })
            .collect()
    }

    /// Relationships whose tables are missing are skipped here; validation
    /// reports them.
    fn foreign_keys(&self) -> Vec<String> {
        self.schema
            .relationships
            .iter()
            .filter_map(|rel| {
                let (from, to) = self.schema.endpoints(rel)?;
                let mut statement = format!(
                    "ALTER TABLE {from} ADD CONSTRAINT fk_{from}_{to} FOREIGN KEY ({}) REFERENCES {to}({})",
                    rel.from_column,
                    rel.to_column,
                    from = from.name,
                    to = to.name,
                );
                if let Some(action) = rel.on_delete {
                    let _ = write!(statement, " ON DELETE {}", action);
                }
                if let Some(action) = rel.on_update {
                    let _ = write!(statement, " ON UPDATE {}", action);
                }
                statement.push(';');
                Some(statement)
            })
            .collect()
    }

    fn indexes(&self) -> Vec<String> {
        self.schema
            .tables
            .iter()
            .flat_map(|table| {
                table
                    .columns
                    .iter()
                    .filter(|c| needs_index(c))
                    .map(move |c| {
                        format!(
                            "CREATE INDEX idx_{table}_{col} ON {table}({col});",
                            table = table.name,
                            col = c.name
                        )
                    })
            })
            .collect()
    }

    fn row_level_security(&self) -> Vec<String> {
        self.schema
            .tables
            .iter()
            .filter(|t| t.has_column(OWNER_COLUMN))
            .map(rls_block)
            .collect()
    }

    fn generate_seed(&self) -> String {
        let mut sql = String::from("-- Seed data\n");

        if self.schema.tables.is_empty() {
            sql.push_str("-- No tables defined\n");
            return sql;
        }

        for table in &self.schema.tables {
            let columns: Vec<&str> = table
                .columns
                .iter()
                .filter(|c| !is_generated(c))
                .map(|c| c.name.as_str())
                .collect();

            let _ = write!(sql, "\n-- {}\n", table.name);
            if columns.is_empty() {
                let _ = writeln!(sql, "INSERT INTO {} DEFAULT VALUES;", table.name);
                continue;
            }
            let placeholders: Vec<String> = columns.iter().map(|c| format!("<{}>", c)).collect();
            let _ = writeln!(
                sql,
                "INSERT INTO {} ({}) VALUES\n  -- ({})\n;",
                table.name,
                columns.join(", "),
                placeholders.join(", ")
            );
        }

        sql
    }
}

/// `  <name> <type>` followed by at most one of PRIMARY KEY, NOT NULL or
/// DEFAULT, in that order of precedence.
fn column_clause(column: &Column) -> String {
    let mut clause = format!("  {} {}", column.name, column.data_type);
    if column.is_primary_key {
        clause.push_str(" PRIMARY KEY");
    } else if column.is_required {
        clause.push_str(" NOT NULL");
    } else if let Some(default) = &column.default_value {
        let _ = write!(clause, " DEFAULT {}", default);
    }
    clause
}

fn needs_index(column: &Column) -> bool {
    column.name.contains("_id") || column.name.contains("email") || column.is_foreign_key
}

fn is_generated(column: &Column) -> bool {
    column.default_value.as_deref().is_some_and(|default| {
        let lower = default.to_lowercase();
        GENERATED_DEFAULTS.iter().any(|g| lower.contains(g))
    })
}

fn rls_block(table: &Table) -> String {
    let name = &table.name;
    let owner = format!("auth.uid() = {}", OWNER_COLUMN);
    [
        format!("ALTER TABLE {name} ENABLE ROW LEVEL SECURITY;"),
        format!("CREATE POLICY {name}_select_policy ON {name} FOR SELECT USING ({owner});"),
        format!("CREATE POLICY {name}_insert_policy ON {name} FOR INSERT WITH CHECK ({owner});"),
        format!("CREATE POLICY {name}_update_policy ON {name} FOR UPDATE USING ({owner});"),
        format!("CREATE POLICY {name}_delete_policy ON {name} FOR DELETE USING ({owner});"),
    ]
    .join("\n")
}
