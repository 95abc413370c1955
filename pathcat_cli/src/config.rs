use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use pathcat_core::CrawlOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Named templates, usable with `find --name`
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CrawlConfig {
    pub follow_links: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub default_format: String,
    pub color_enabled: bool,
    pub progress_enabled: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            follow_links: true,
            max_depth: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "text".to_string(),
            color_enabled: true,
            progress_enabled: true,
        }
    }
}

impl AppConfig {
    /// Crawl options for the core
    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions::new()
            .with_follow_links(self.crawl.follow_links)
            .with_max_depth(self.crawl.max_depth)
    }

    /// Look up a named template
    pub fn template(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }
}

/// Configuration manager that handles XDG-compliant paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("pathcat/config.toml");
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pathcat")
            .join("config.toml")
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment = figment.merge(Env::prefixed("PATHCAT_").split("__"));

        figment.extract().context("Failed to load configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = self.effective()?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        scalar_text(current)
            .ok_or_else(|| anyhow::anyhow!("Value at '{}' is not a simple type", key))
    }

    /// Set a configuration value by key (dot notation) in the config file
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parsed = parse_config_value(key, value)?;

        let mut config = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, sections)) = parts.split_last() else {
            anyhow::bail!("Empty key");
        };

        let mut current = &mut config;
        for part in sections {
            let toml::Value::Table(table) = current else {
                anyhow::bail!("Invalid key path: expected table at '{}'", part);
            };
            current = table
                .entry(part.to_string())
                .or_insert(toml::Value::Table(toml::map::Map::new()));
        }
        let toml::Value::Table(table) = current else {
            anyhow::bail!("Cannot set value on non-table");
        };
        table.insert(last.to_string(), parsed);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, toml::to_string_pretty(&config)?)?;

        // Reject files that no longer load
        self.load().map(|_| ())
    }

    /// All effective configuration values, sorted by key
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let mut items = Vec::new();
        collect_values(&self.effective()?, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(items)
    }

    fn effective(&self) -> Result<toml::Value> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        Ok(toml::from_str(&toml_string)?)
    }
}

fn scalar_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
    if let toml::Value::Table(table) = value {
        for (key, val) in table {
            let key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            collect_values(val, key, items);
        }
    } else if let Some(text) = scalar_text(value) {
        items.push((prefix, text));
    }
}

/// Parse a value to the TOML type its key expects
fn parse_config_value(key: &str, value: &str) -> Result<toml::Value> {
    match key {
        "crawl.follow_links" | "output.color_enabled" | "output.progress_enabled" => {
            let flag: bool = value.parse().context("Value must be 'true' or 'false'")?;
            Ok(toml::Value::Boolean(flag))
        }
        "crawl.max_depth" => {
            let depth: i64 = value
                .parse()
                .context("max_depth must be a non-negative integer")?;
            if depth < 0 {
                anyhow::bail!("max_depth must be a non-negative integer");
            }
            Ok(toml::Value::Integer(depth))
        }
        "output.default_format" => {
            crate::output::OutputFormat::from_string(value)?;
            Ok(toml::Value::String(value.to_string()))
        }
        k if k.starts_with("templates.") => {
            pathcat_core::Template::compile(value)
                .with_context(|| format!("Invalid template for '{k}'"))?;
            Ok(toml::Value::String(value.to_string()))
        }
        _ => anyhow::bail!("Unknown configuration key: {}", key),
    }
}
