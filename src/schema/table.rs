use crate::dialect::Dialect;

#[macro_export]
macro_rules! warehouse_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Allow unused_mut because the variable is only mutated when optional
            // field assignments are passed to the macro (e.g., `is_primary_key = true`)
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                is_identity: false,
                non_null: false,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SqlType {
    Varchar,
    Text,
    Integer,
    BigInt,
    Float,
    Timestamp,
}

impl SqlType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            SqlType::Varchar => "VARCHAR",
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Float => "FLOAT",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug)]
pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    /// Warehouse-generated surrogate key, never written by the pipeline.
    pub is_identity: bool,
    pub non_null: bool,
    pub foreign_key: Option<&'static ForeignKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Mirrors raw source files, replaced on every load.
    Staging,
    Dimension,
    Fact,
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub kind: TableKind,
    pub columns: &'static [Column],
}

/// A column as reported back by a live warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,
    pub type_name: String,
    pub non_null: bool,
}

impl Table {
    pub fn create_sql(&self, dialect: Dialect) -> String {
        let mut create_sql = format!("CREATE TABLE IF NOT EXISTS {} (", self.name);
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push_str(", ");
            }
            if column.is_identity {
                create_sql.push_str(&dialect.identity_column(column.name));
                continue;
            }
            create_sql.push_str(&format!("{} {}", column.name, column.sql_type.sql_name()));
            let declare_keys = dialect.declares_key_constraints();
            if column.is_primary_key && declare_keys {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if let (Some(foreign_key), true) = (column.foreign_key, declare_keys) {
                create_sql.push_str(&format!(
                    " REFERENCES {}({})",
                    foreign_key.foreign_table, foreign_key.foreign_column
                ));
            }
        }
        create_sql.push(')');
        create_sql
    }

    /// `cascade` is honored only where the dialect supports it.
    pub fn drop_sql(&self, dialect: Dialect, cascade: bool) -> String {
        if cascade && dialect.supports_drop_cascade() {
            format!("DROP TABLE IF EXISTS {} CASCADE", self.name)
        } else {
            format!("DROP TABLE IF EXISTS {}", self.name)
        }
    }

    pub fn references(&self, other: &Table) -> bool {
        self.columns.iter().any(|c| {
            c.foreign_key
                .map(|fk| fk.foreign_table == other.name)
                .unwrap_or(false)
        })
    }

    /// Columns the pipeline writes, i.e. everything but the identity column.
    pub fn writable_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns.iter().filter(|c| !c.is_identity)
    }

    /// Compare the declaration with the columns a live warehouse reports.
    /// Returns a description of the first difference found.
    pub fn diff(&self, dialect: Dialect, actual_columns: &[LiveColumn]) -> Option<String> {
        if actual_columns.len() != self.columns.len() {
            return Some(format!(
                "Table {} has {} columns, expected {}. Found column names: {}, expected: {}",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        for (actual_column, expected_column) in actual_columns.iter().zip(self.columns.iter()) {
            if actual_column.name != expected_column.name {
                return Some(format!(
                    "Table {} Column name mismatch: expected {}, got {}",
                    self.name, expected_column.name, actual_column.name
                ));
            }
            let expected_type = dialect.reported_type_name(expected_column.sql_type);
            if !actual_column.type_name.eq_ignore_ascii_case(expected_type) {
                return Some(format!(
                    "Table {} Column {} type mismatch: expected {}, got {}",
                    self.name, expected_column.name, expected_type, actual_column.type_name
                ));
            }
            // Key columns are implicitly NOT NULL on Redshift but not on SQLite,
            // so only explicitly declared constraints are compared for them.
            let key_column = expected_column.is_primary_key || expected_column.is_identity;
            if !key_column && actual_column.non_null != expected_column.non_null {
                return Some(format!(
                    "Table {} Column {} non-null mismatch: expected {}, got {}",
                    self.name, expected_column.name, expected_column.non_null, actual_column.non_null
                ));
            }
        }
        None
    }
}
