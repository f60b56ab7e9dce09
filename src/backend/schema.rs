//! Table definitions shared by every backend
//!
//! Both backends validate queries against these definitions, so an unknown
//! table or column is reported the same way whichever store is in use.

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
}

impl ColumnType {
    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

const fn text(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Text,
        nullable: false,
    }
}

const fn opt_text(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Text,
        nullable: true,
    }
}

const fn integer(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Integer,
        nullable: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Columns that get a secondary index
    pub indexed: &'static [&'static str],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// `CREATE TABLE` statement plus its indexes
    pub fn ddl(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut col = format!("{} {}", c.name, c.ty.sql());
                if c.name == "id" {
                    col.push_str(" PRIMARY KEY");
                } else if !c.nullable {
                    col.push_str(" NOT NULL");
                }
                col
            })
            .collect();

        let mut ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);\n",
            self.name,
            columns.join(",\n    ")
        );

        for column in self.indexed {
            ddl.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column});\n",
                table = self.name,
                column = column
            ));
        }

        ddl
    }
}

pub const TABLES: &[TableDef] = &[
    TableDef {
        name: "suppliers",
        columns: &[
            text("id"),
            text("name"),
            opt_text("tax_id"),
            opt_text("email"),
            text("created_at"),
        ],
        indexed: &["created_at"],
    },
    TableDef {
        name: "contracts",
        columns: &[
            text("id"),
            text("number"),
            text("title"),
            text("supplier_id"),
            text("status"),
            integer("value_cents"),
            opt_text("starts_on"),
            opt_text("ends_on"),
            text("created_at"),
        ],
        indexed: &["supplier_id", "status", "created_at"],
    },
    TableDef {
        name: "contract_orders",
        columns: &[
            text("id"),
            text("contract_id"),
            text("number"),
            text("description"),
            text("status"),
            text("created_at"),
        ],
        indexed: &["contract_id", "status", "created_at"],
    },
    TableDef {
        name: "items",
        columns: &[
            text("id"),
            text("order_id"),
            text("description"),
            integer("quantity"),
            integer("unit_price_cents"),
            text("created_at"),
        ],
        indexed: &["order_id", "created_at"],
    },
    TableDef {
        name: "solicitations",
        columns: &[
            text("id"),
            opt_text("contract_id"),
            text("requester"),
            text("description"),
            text("status"),
            text("created_at"),
        ],
        indexed: &["contract_id", "status", "created_at"],
    },
];

/// Looks up a table definition by name
pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|t| t.name == name)
}

/// Returns true if `name` is a plain lower-case SQL identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
