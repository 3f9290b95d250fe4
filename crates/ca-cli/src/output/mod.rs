//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::str::FromStr;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tables and colored text
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// CSV output, one row per record
    Csv,
    /// YAML output
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "table" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => anyhow::bail!(
                "Unknown output format: {s}\n\
                 Valid formats: pretty, json, csv, yaml"
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Yaml => "yaml",
        })
    }
}

/// Print `value` in a machine format, or run `pretty` for [`OutputFormat::Pretty`].
pub fn render<T, F>(format: OutputFormat, value: &T, pretty: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> Result<()>,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Csv => {
            let stdout = std::io::stdout();
            write_csv(&serde_json::to_value(value)?, stdout.lock())?;
        }
        OutputFormat::Pretty => pretty()?,
    }
    Ok(())
}

/// Write records as CSV.
///
/// An array becomes one row per element, an object a single row. Columns
/// are the union of keys in first-seen order; nested arrays are joined
/// with `;`.
pub fn write_csv<W: Write>(value: &Value, out: W) -> Result<()> {
    let records: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    };

    let mut headers: Vec<String> = Vec::new();
    for record in &records {
        match record {
            Value::Object(map) => {
                for key in map.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
            _ if headers.is_empty() => headers.push("value".into()),
            _ => {}
        }
    }

    let mut writer = csv::Writer::from_writer(out);
    if !headers.is_empty() {
        writer.write_record(&headers)?;
    }
    for record in records {
        let row: Vec<String> = match record {
            Value::Object(map) => headers
                .iter()
                .map(|h| map.get(h).map(cell).unwrap_or_default())
                .collect(),
            scalar => vec![cell(scalar)],
        };
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(";"),
        other => other.to_string(),
    }
}
