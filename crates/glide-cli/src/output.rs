//! Output formatting for CLI

use clap::ValueEnum;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

/// Print `rows` as JSON, a table, or one `text` line per row
pub fn print_rows<T, F>(rows: &[T], format: OutputFormat, text: F) -> anyhow::Result<()>
where
    T: Serialize + Tabled,
    F: Fn(&T) -> String,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => println!("{}", Table::new(rows).with(Style::rounded())),
        OutputFormat::Text => {
            for row in rows {
                println!("{}", text(row));
            }
        }
    }
    Ok(())
}

/// Print a single record; tables render it as key/value pairs
pub fn print_record<T: Serialize>(record: &T, format: OutputFormat, text: impl Fn(&T) -> String) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Table => {
            let rows = key_values(record)?;
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        OutputFormat::Text => println!("{}", text(record)),
    }
    Ok(())
}

#[derive(Tabled)]
struct Field {
    field: String,
    value: String,
}

fn key_values<T: Serialize>(record: &T) -> anyhow::Result<Vec<Field>> {
    let value = serde_json::to_value(record)?;
    let rows = match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(field, value)| Field {
                field,
                value: match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
            })
            .collect(),
        other => vec![Field {
            field: "value".into(),
            value: other.to_string(),
        }],
    };
    Ok(rows)
}
