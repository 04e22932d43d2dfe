//! Current-shape schema declarations.
//!
//! A `TableDeclaration` describes a table exactly as the running code expects
//! it today. Items added after the first release carry a `since` annotation
//! naming the catalog step that creates them on existing databases; bootstrap
//! ignores the annotation and always creates the full shape.

pub mod layout;

use std::fmt::Write as _;

use crate::version_store::SchemaVersion;

pub use layout::{declarations, PackageStatus};

/// Storage type of a column, rendered verbatim into DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Blob,
    DateTime,
    /// Bounded string, rendered as `VARCHAR(n)`.
    Varchar(u16),
}

impl ColumnType {
    pub fn sql(&self) -> String {
        match self {
            Self::Integer => "INTEGER".to_string(),
            Self::Text => "TEXT".to_string(),
            Self::Real => "REAL".to_string(),
            Self::Blob => "BLOB".to_string(),
            Self::DateTime => "DATETIME".to_string(),
            Self::Varchar(n) => format!("VARCHAR({n})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDeclaration {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Server-side default expression, emitted as-is.
    pub default: Option<&'static str>,
    pub primary_key: bool,
    pub unique: bool,
    /// `(table, column)` this column references.
    pub references: Option<(&'static str, &'static str)>,
    /// Allowed values, emitted as a `CHECK (... IN (...))` constraint.
    pub allowed: Option<&'static [&'static str]>,
    pub since: Option<SchemaVersion>,
}

impl ColumnDeclaration {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            references: None,
            allowed: None,
            since: None,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    pub const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some((table, column));
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }

    /// Mark the column as created by the step that reaches `version`.
    pub const fn since(mut self, version: u32) -> Self {
        self.since = Some(SchemaVersion::new(version));
        self
    }

    /// Column definition as used inside `CREATE TABLE` and `ADD COLUMN`.
    pub fn sql(&self) -> String {
        let mut sql = format!("{} {}", quote(self.name), self.column_type.sql());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(expr) = self.default {
            let _ = write!(sql, " DEFAULT {expr}");
        }
        if let Some(values) = self.allowed {
            let list = values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(sql, " CHECK ({} IN ({list}))", quote(self.name));
        }
        if let Some((table, column)) = self.references {
            let _ = write!(sql, " REFERENCES {} ({})", quote(table), quote(column));
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDeclaration {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
    pub since: Option<SchemaVersion>,
}

impl IndexDeclaration {
    pub const fn new(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: false,
            since: None,
        }
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn since(mut self, version: u32) -> Self {
        self.since = Some(SchemaVersion::new(version));
        self
    }

    pub fn sql(&self, table: &str) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE {}INDEX {} ON {} ({columns})",
            if self.unique { "UNIQUE " } else { "" },
            quote(self.name),
            quote(table),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDeclaration {
    pub name: &'static str,
    pub columns: Vec<ColumnDeclaration>,
    pub indexes: Vec<IndexDeclaration>,
    /// Table-level composite primary key.
    pub primary_key: Option<&'static [&'static str]>,
}

impl TableDeclaration {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            indexes: Vec::new(),
            primary_key: None,
        }
    }

    pub fn column(mut self, column: ColumnDeclaration) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: IndexDeclaration) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn primary_key(mut self, columns: &'static [&'static str]) -> Self {
        self.primary_key = Some(columns);
        self
    }

    /// The table as it looked once `version` steps had been applied.
    pub fn at_version(&self, version: SchemaVersion) -> TableDeclaration {
        let present = |since: Option<SchemaVersion>| since.map_or(true, |s| s <= version);
        TableDeclaration {
            name: self.name,
            columns: self
                .columns
                .iter()
                .filter(|c| present(c.since))
                .cloned()
                .collect(),
            indexes: self
                .indexes
                .iter()
                .filter(|i| present(i.since))
                .cloned()
                .collect(),
            primary_key: self.primary_key,
        }
    }

    pub fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(ColumnDeclaration::sql).collect();
        if let Some(pk) = self.primary_key {
            let cols = pk.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
            parts.push(format!("PRIMARY KEY ({cols})"));
        }
        format!(
            "CREATE TABLE {} (\n    {}\n)",
            quote(self.name),
            parts.join(",\n    ")
        )
    }

    /// `CREATE TABLE` followed by every index, in declaration order.
    pub fn create_statements(&self) -> Vec<String> {
        std::iter::once(self.create_table_sql())
            .chain(self.indexes.iter().map(|i| i.sql(self.name)))
            .collect()
    }
}

/// Double-quote an identifier. Needed for names like `commit` or `arch-branch`.
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
