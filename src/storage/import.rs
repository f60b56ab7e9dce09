//! Bulk import of JSONL files
//!
//! Each non-blank line is one JSON object describing a row of the target
//! table. Every line is decoded into the table's record type before anything
//! is written, and all rows go in as one batch, so a file that fails at any
//! line leaves the database untouched.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::records::to_row;
use crate::backend::{Client, Row};
use crate::domain::{Contract, ContractOrder, EntityKind, Item, Solicitation, Supplier};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unknown table '{0}'. Expected one of: suppliers, contracts, contract_orders, items, solicitations")]
    UnknownTable(String),

    #[error("Failed to parse {table} row at line {line}: {message}")]
    Parse {
        table: &'static str,
        line: usize,
        message: String,
    },

    #[error("Failed to insert row from line {line}: {message}")]
    Insert { line: usize, message: String },

    #[error("Failed to import rows: {0}")]
    Batch(String),
}

/// Result of an import
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub table: &'static str,
    pub rows: usize,
}

/// Imports all rows of `path` into `table`
pub fn import_jsonl(client: &Client, table: &str, path: &Path) -> Result<ImportSummary> {
    let kind = EntityKind::ALL
        .into_iter()
        .find(|k| k.table() == table)
        .ok_or_else(|| ImportError::UnknownTable(table.to_string()))?;

    let rows = read_rows(kind, path)?;

    let (lines, batch): (Vec<usize>, Vec<Row>) = rows.into_iter().unzip();
    client
        .insert_many(kind.table(), &batch)
        .map_err(|e| match e.row.and_then(|i| lines.get(i)) {
            Some(line) => ImportError::Insert {
                line: *line,
                message: e.source.to_string(),
            },
            None => ImportError::Batch(e.source.to_string()),
        })?;

    tracing::info!(table = kind.table(), rows = batch.len(), file = %path.display(), "imported rows");

    Ok(ImportSummary {
        table: kind.table(),
        rows: batch.len(),
    })
}

/// Reads and validates every row, keeping the line number of each
fn read_rows(kind: EntityKind, path: &Path) -> Result<Vec<(usize, Row)>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open import file: {}", path.display()))?;

    file.lock_shared()
        .context("Failed to acquire read lock on import file")?;

    let reader = BufReader::new(&file);
    let mut rows = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_num))?;

        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line).map_err(|e| ImportError::Parse {
            table: kind.table(),
            line: line_num,
            message: e.to_string(),
        })?;

        let row = match kind {
            EntityKind::Supplier => normalize::<Supplier>(kind, line_num, value)?,
            EntityKind::Contract => normalize::<Contract>(kind, line_num, value)?,
            EntityKind::Order => normalize::<ContractOrder>(kind, line_num, value)?,
            EntityKind::Item => normalize::<Item>(kind, line_num, value)?,
            EntityKind::Solicitation => normalize::<Solicitation>(kind, line_num, value)?,
        };
        rows.push((line_num, row));
    }

    Ok(rows)
}

/// Decodes a line into its record type and re-encodes it in stored form
fn normalize<T: DeserializeOwned + Serialize>(
    kind: EntityKind,
    line: usize,
    value: Value,
) -> Result<Row> {
    let record: T = serde_json::from_value(value).map_err(|e| ImportError::Parse {
        table: kind.table(),
        line,
        message: e.to_string(),
    })?;
    to_row(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, SqliteBackend};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(lines: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        file
    }

    #[test]
    fn imports_rows_and_skips_blank_lines() {
        let client = Client::new(MemoryBackend::new());
        let file = file_with(concat!(
            r#"{"id":"s-0000001","name":"ACME","created_at":"2024-01-01T00:00:00.000000Z"}"#,
            "\n\n",
            r#"{"id":"s-0000002","name":"Globex","email":"sales@globex.test","created_at":"2024-01-02T00:00:00.000000Z"}"#,
            "\n",
        ));

        let summary = import_jsonl(&client, "suppliers", file.path()).unwrap();
        assert_eq!(summary.rows, 2);

        let rows = client.from("suppliers").select("id").execute().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn defaults_fill_missing_status() {
        let client = Client::new(MemoryBackend::new());
        let file = file_with(
            r#"{"id":"r-0000001","requester":"maria","description":"Toner","created_at":"2024-01-01T00:00:00.000000Z"}"#,
        );

        import_jsonl(&client, "solicitations", file.path()).unwrap();

        let rows = client.from("solicitations").select("status").execute().unwrap();
        assert_eq!(rows[0]["status"], "PENDENTE");
    }

    #[test]
    fn parse_error_reports_line_and_writes_nothing() {
        let client = Client::new(MemoryBackend::new());
        let file = file_with(concat!(
            r#"{"id":"s-0000001","name":"ACME","created_at":"2024-01-01T00:00:00.000000Z"}"#,
            "\n",
            r#"{"id":"not-an-id","name":"Broken","created_at":"2024-01-01T00:00:00.000000Z"}"#,
            "\n",
        ));

        let err = import_jsonl(&client, "suppliers", file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);

        let rows = client.from("suppliers").select("id").execute().unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn invalid_json_reports_line() {
        let client = Client::new(MemoryBackend::new());
        let file = file_with("\n{not json}\n");

        let err = import_jsonl(&client, "suppliers", file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn unknown_table_rejected() {
        let client = Client::new(MemoryBackend::new());
        let file = file_with("");

        let err = import_jsonl(&client, "invoices", file.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown table 'invoices'"));
    }

    #[test]
    fn duplicate_id_reports_insert_line() {
        let client = Client::new(MemoryBackend::new());
        let row = r#"{"id":"s-0000001","name":"ACME","created_at":"2024-01-01T00:00:00.000000Z"}"#;
        let file = file_with(&format!("{}\n{}\n", row, row));

        let err = import_jsonl(&client, "suppliers", file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);

        let rows = client.from("suppliers").select("id").execute().unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn insert_failure_rolls_back_sqlite_import() {
        let client = Client::new(SqliteBackend::open_in_memory().unwrap());
        let file = file_with(concat!(
            r#"{"id":"s-0000001","name":"ACME","created_at":"2024-01-01T00:00:00.000000Z"}"#,
            "\n",
            r#"{"id":"s-0000002","name":"Globex","created_at":"2024-01-02T00:00:00.000000Z"}"#,
            "\n\n",
            r#"{"id":"s-0000001","name":"ACME again","created_at":"2024-01-03T00:00:00.000000Z"}"#,
            "\n",
        ));

        let err = import_jsonl(&client, "suppliers", file.path()).unwrap_err();
        assert!(err.to_string().contains("line 4"), "{}", err);
        assert!(err.to_string().contains("UNIQUE"), "{}", err);

        let rows = client.from("suppliers").select("id").execute().unwrap();
        assert!(rows.is_empty());
    }
}
