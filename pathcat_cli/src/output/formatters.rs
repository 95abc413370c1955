use super::OutputFormatter;
use anyhow::Result;
use colored::*;
use handlebars::Handlebars;
use pathcat_core::{Catalog, CatalogEntry, FieldValue};

fn cell(value: &Option<FieldValue>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Aligned table for human-readable output
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn row_line(cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(text, width)| format!("{text:<width$}"))
            .collect();
        padded.join("  ").trim_end().to_string()
    }
}

impl OutputFormatter for TextFormatter {
    fn format_entry(&self, entry: &CatalogEntry<'_>) -> Result<String> {
        let mut cells: Vec<String> = entry.paths().map(|(_, path)| path.to_string()).collect();
        cells.extend(entry.row().values().iter().map(cell));
        Ok(cells.join("  "))
    }

    fn format_catalog(&self, catalog: &Catalog) -> Result<String> {
        let table = catalog.to_table();
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(cell).collect())
            .collect();

        let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
        for row in &rows {
            for (width, text) in widths.iter_mut().zip(row) {
                *width = (*width).max(text.chars().count());
            }
        }

        let header = Self::row_line(&table.columns, &widths);
        let mut lines = vec![if self.use_color {
            header.bold().to_string()
        } else {
            header
        }];
        lines.extend(rows.iter().map(|row| Self::row_line(row, &widths)));

        Ok(lines.join("\n"))
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_entry(&self, entry: &CatalogEntry<'_>) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(entry)?)
        } else {
            Ok(serde_json::to_string(entry)?)
        }
    }

    fn format_catalog(&self, catalog: &Catalog) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(catalog)?)
        } else {
            Ok(serde_json::to_string(catalog)?)
        }
    }
}

/// JSON Lines formatter, one object per row
pub struct JsonLinesFormatter;

impl Default for JsonLinesFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonLinesFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for JsonLinesFormatter {
    fn format_entry(&self, entry: &CatalogEntry<'_>) -> Result<String> {
        JsonFormatter::new(false).format_entry(entry)
    }
}

/// CSV formatter: path columns first, then fields
pub struct CsvFormatter;

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for CsvFormatter {
    fn format_entry(&self, entry: &CatalogEntry<'_>) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        let mut record: Vec<String> = entry.paths().map(|(_, path)| path.to_string()).collect();
        record.extend(entry.row().values().iter().map(cell));
        wtr.write_record(&record)?;

        let data = wtr.into_inner()?;
        Ok(String::from_utf8(data)?.trim_end().to_string())
    }

    fn format_catalog(&self, catalog: &Catalog) -> Result<String> {
        let table = catalog.to_table();
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&table.columns)?;

        for row in &table.rows {
            wtr.write_record(row.iter().map(cell))?;
        }

        let data = wtr.into_inner()?;
        Ok(String::from_utf8(data)?.trim_end().to_string())
    }
}

/// One rendered line per row, using Handlebars
pub struct TemplateFormatter {
    handlebars: Handlebars<'static>,
    template_name: String,
}

impl TemplateFormatter {
    pub fn new(template: &str) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        super::template_helpers::register_helpers(&mut handlebars);

        let template_name = "user_template";
        handlebars.register_template_string(template_name, template)?;

        Ok(Self {
            handlebars,
            template_name: template_name.to_string(),
        })
    }
}

impl OutputFormatter for TemplateFormatter {
    fn format_entry(&self, entry: &CatalogEntry<'_>) -> Result<String> {
        let data = serde_json::to_value(entry)?;
        Ok(self.handlebars.render(&self.template_name, &data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathcat_core::{CatalogBuilder, Template};

    fn catalog() -> Catalog {
        CatalogBuilder::new(".")
            .template(Template::compile("{site}/{year:d}/data_{month:02d}.csv").unwrap())
            .build_from_paths(["A/2020/data_01.csv", "BB/2021/data_12.csv"])
            .unwrap()
            .into_catalog()
    }

    #[test]
    fn test_text_table_is_aligned() {
        let text = TextFormatter::new(false).format_catalog(&catalog()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "path                 site  year  month");
        assert_eq!(lines[1], "A/2020/data_01.csv   A     2020  1");
        assert_eq!(lines[2], "BB/2021/data_12.csv  BB    2021  12");
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let text = CsvFormatter::new().format_catalog(&catalog()).unwrap();
        assert_eq!(
            text,
            "path,site,year,month\nA/2020/data_01.csv,A,2020,1\nBB/2021/data_12.csv,BB,2021,12"
        );
    }

    #[test]
    fn test_json_lines_one_object_per_row() {
        let text = JsonLinesFormatter::new().format_catalog(&catalog()).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["site"], "BB");
        assert_eq!(rows[1]["month"], 12);
    }

    #[test]
    fn test_json_is_an_array() {
        let text = JsonFormatter::new(true).format_catalog(&catalog()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["path"], "A/2020/data_01.csv");
    }

    #[test]
    fn test_template_renders_each_row() {
        let formatter = TemplateFormatter::new("{{site}}-{{pad month 2}}").unwrap();
        let text = formatter.format_catalog(&catalog()).unwrap();
        assert_eq!(text, "A-01\nBB-12");
    }
}
