mod formatters;
mod template_helpers;

pub use formatters::{
    CsvFormatter, JsonFormatter, JsonLinesFormatter, TemplateFormatter, TextFormatter,
};

use anyhow::Result;
use colored::*;
use pathcat_core::{Catalog, CatalogEntry, MatchRecord};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    JsonLines,
    Csv,
    Template,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-lines" | "jsonl" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            "template" => Ok(Self::Template),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }
}

/// Trait for catalog formatters
pub trait OutputFormatter: Send + Sync {
    /// Format a single row
    fn format_entry(&self, entry: &CatalogEntry<'_>) -> Result<String>;

    /// Format a whole catalog
    fn format_catalog(&self, catalog: &Catalog) -> Result<String> {
        let formatted: Result<Vec<String>> =
            catalog.iter().map(|entry| self.format_entry(&entry)).collect();

        Ok(formatted?.join("\n"))
    }
}

/// Create a formatter based on output format
pub fn create_formatter(
    format: OutputFormat,
    use_color: bool,
    template: Option<&str>,
) -> Result<Box<dyn OutputFormatter>> {
    match format {
        OutputFormat::Text => Ok(Box::new(TextFormatter::new(use_color))),
        OutputFormat::Json => Ok(Box::new(JsonFormatter::new(true))),
        OutputFormat::JsonLines => Ok(Box::new(JsonLinesFormatter::new())),
        OutputFormat::Csv => Ok(Box::new(CsvFormatter::new())),
        OutputFormat::Template => {
            let template_str = template.ok_or_else(|| {
                anyhow::anyhow!("Template format requires --template-string argument")
            })?;
            Ok(Box::new(TemplateFormatter::new(template_str)?))
        }
    }
}

/// Format match records: one JSON document per record for the JSON formats,
/// a status line per record otherwise
pub fn format_records(
    records: &[MatchRecord],
    format: OutputFormat,
    use_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::JsonLines => {
            let lines: Result<Vec<String>> = records
                .iter()
                .map(|record| Ok(serde_json::to_string(record)?))
                .collect();
            Ok(lines?.join("\n"))
        }
        _ => Ok(records
            .iter()
            .map(|record| record_line(record, use_color))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn record_line(record: &MatchRecord, use_color: bool) -> String {
    match record {
        MatchRecord::Success { path, fields } => {
            let status = if use_color {
                "ok".green().to_string()
            } else {
                "ok".to_string()
            };
            let fields: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            format!("{status} {path} {}", fields.join(" "))
                .trim_end()
                .to_string()
        }
        MatchRecord::Failure { path, reason } => {
            let status = if use_color {
                "FAIL".red().to_string()
            } else {
                "FAIL".to_string()
            };
            format!("{status} {path}: {reason}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathcat_core::{PathMatcher, Template};

    fn records() -> Vec<MatchRecord> {
        let matcher =
            PathMatcher::new(Template::compile("{site}/{year:d}.csv").unwrap()).unwrap();
        vec![
            matcher.match_path("A/2020.csv"),
            matcher.match_path("A/latest.csv"),
        ]
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_string("JSONL").unwrap(), OutputFormat::JsonLines);
        assert_eq!(OutputFormat::from_string("csv").unwrap(), OutputFormat::Csv);
        assert!(OutputFormat::from_string("yaml").is_err());
    }

    #[test]
    fn test_template_format_requires_template() {
        assert!(create_formatter(OutputFormat::Template, false, None).is_err());
    }

    #[test]
    fn test_record_lines() {
        let text = format_records(&records(), OutputFormat::Text, false).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ok A/2020.csv site=A year=2020");
        assert!(lines[1].starts_with("FAIL A/latest.csv: "));
    }

    #[test]
    fn test_records_as_json_lines() {
        let text = format_records(&records(), OutputFormat::JsonLines, false).unwrap();
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["status"], "success");
        assert_eq!(first["fields"]["year"], 2020);
    }
}
