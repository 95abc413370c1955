use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Instant;

use pathcat_cli::config::{AppConfig, ConfigManager};
use pathcat_cli::error::{CliError, CliResult, ErrorContext};
use pathcat_cli::output::{self, OutputFormat};
use pathcat_cli::progress::{CrawlSpinner, format_elapsed};
use pathcat_cli::terminal;
use pathcat_core::{
    BuildReport, CatalogBuilder, Criteria, FieldValue, OnParseError, PathMatcher, QueryError,
    Template, TraversalPattern,
};

#[derive(Parser)]
#[command(name = "pathcat")]
#[command(author, version, about = "Catalog files by the typed fields encoded in their paths", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a directory and list the paths matching one or more templates
    Find(FindArgs),

    /// Print the traversal glob derived from a template
    Glob {
        template: String,
    },

    /// Match paths against a template and print the extracted fields
    Match {
        template: String,

        /// Paths to match
        #[arg(required = true)]
        paths: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
    },

    /// Fill a template with field values
    Render {
        template: String,

        /// Field values, e.g. 'year=2020'
        #[arg(value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct FindArgs {
    /// Directory to crawl
    root: PathBuf,

    /// Path template, e.g. '{site}/{year:d}/data_{month:02d}.csv' (repeatable)
    #[arg(short = 't', long = "template", value_name = "TEMPLATE")]
    templates: Vec<String>,

    /// Named template from the configuration (repeatable)
    #[arg(short, long = "name", value_name = "NAME")]
    names: Vec<String>,

    /// Keep rows whose field has one of the values, e.g. 'year=2020,2021' (repeatable)
    #[arg(short = 'w', long = "where", value_name = "FIELD=VALUES")]
    criteria: Vec<String>,

    /// Only show these fields
    #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
    select: Vec<String>,

    /// Sort rows by these fields
    #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
    sort: Vec<String>,

    /// Output format (defaults to output.default_format)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Handlebars template for the template format, e.g. '{{site}}: {{path}}'
    #[arg(long, value_name = "HBS")]
    template_string: Option<String>,

    /// What to do with paths the templates cannot parse: raise, warn or ignore
    #[arg(long, default_value = "warn")]
    on_parse_error: String,

    /// Print every unparsable path and skipped entry to stderr
    #[arg(long)]
    show_failures: bool,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the configuration file path
    Path,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., crawl.follow_links)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., templates.archive)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Json,
    Jsonl,
    Csv,
    Template,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Template => OutputFormat::Template,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("pathcat_core", log::LevelFilter::Debug)
            .filter_module("pathcat_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let debug = cli.debug;
    if let Err(error) = run(cli.command) {
        eprint!("{}", error.format_for_user(debug));
        std::process::exit(error.exit_code() as i32);
    }
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Find(args) => {
            let config = load_config()?;
            find_command(&config, args)
        }
        Commands::Glob { template } => {
            let template = compile(&template)?;
            let pattern = TraversalPattern::from_template(&template).map_err(core)?;
            println!("{pattern}");
            Ok(())
        }
        Commands::Match {
            template,
            paths,
            format,
        } => match_command(&template, &paths, format.into()),
        Commands::Render { template, fields } => render_command(&template, &fields),
        Commands::Config { command } => config_command(command),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn load_config() -> CliResult<AppConfig> {
    let manager = ConfigManager::new();
    manager.load().map_err(|e| {
        CliError::filesystem(&format!("{e:#}"))
            .with_context("config", &manager.config_path().display().to_string())
    })
}

fn core(error: impl Into<pathcat_core::Error>) -> CliError {
    CliError::from(error.into())
}

fn compile(source: &str) -> CliResult<Template> {
    Template::compile(source)
        .map_err(core)
        .map_err(|e| e.with_context("template", source))
}

fn use_color(config: Option<&AppConfig>) -> bool {
    config.is_none_or(|config| config.output.color_enabled) && terminal::should_color_stdout()
}

fn find_command(config: &AppConfig, args: FindArgs) -> CliResult<()> {
    let mut sources = args.templates.clone();
    for name in &args.names {
        let template = config.template(name).ok_or_else(|| {
            let known: Vec<&str> = config.templates.keys().map(String::as_str).collect();
            CliError::misuse(&format!("Unknown template name '{name}'")).with_suggestion(
                &if known.is_empty() {
                    "Add one with 'pathcat config set templates.<name> <template>'".to_string()
                } else {
                    format!("Configured templates: {}", known.join(", "))
                },
            )
        })?;
        sources.push(template.to_string());
    }
    if sources.is_empty() {
        return Err(CliError::misuse("No template given; use --template or --name"));
    }

    let templates = sources
        .iter()
        .map(|source| compile(source))
        .collect::<CliResult<Vec<_>>>()?;

    let on_parse_error: OnParseError = args
        .on_parse_error
        .parse()
        .map_err(|e: QueryError| CliError::misuse(&e.to_string()))?;

    let mut criteria = Criteria::new();
    for term in &args.criteria {
        criteria = criteria
            .parse_term(term)
            .map_err(|e| CliError::misuse(&e.to_string()))?;
    }

    let format = match args.format {
        Some(arg) => arg.into(),
        None => OutputFormat::from_string(&config.output.default_format)?,
    };
    let formatter = output::create_formatter(
        format,
        use_color(Some(config)),
        args.template_string.as_deref(),
    )
    .map_err(|e| CliError::misuse(&format!("{e:#}")))?;

    log::debug!("Finding {sources:?} under {}", args.root.display());
    log::debug!("Criteria: {:?}", criteria.terms());

    let spinner = CrawlSpinner::start(
        config.output.progress_enabled
            && !args.no_progress
            && terminal::should_show_progress_by_default(),
        format!("Crawling {}", args.root.display()),
    );
    let start = Instant::now();
    let report = CatalogBuilder::new(&args.root)
        .templates(templates)
        .options(config.crawl_options())
        .build();
    spinner.finish();
    let BuildReport {
        catalog,
        failures,
        warnings,
    } = report.map_err(core)?;

    if args.show_failures {
        for warning in &warnings {
            eprintln!("{} {warning}", "skipped:".yellow());
        }
    }

    match on_parse_error {
        OnParseError::Raise => {
            if let Some(failure) = failures.first() {
                let reason = failure
                    .reason()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                return Err(CliError::general(&format!(
                    "Could not parse '{}': {reason}",
                    failure.path()
                ))
                .with_suggestion("Use --on-parse-error warn or ignore to skip unparsable paths"));
            }
        }
        OnParseError::Warn if !failures.is_empty() => {
            eprintln!(
                "{} {} path(s) could not be parsed",
                "Warning:".yellow(),
                failures.len()
            );
        }
        _ => {}
    }
    if args.show_failures {
        for failure in &failures {
            let reason = failure
                .reason()
                .map(ToString::to_string)
                .unwrap_or_default();
            eprintln!("{} {}: {reason}", "unparsable:".yellow(), failure.path());
        }
    }

    let mut catalog = catalog;
    if !criteria.is_empty() {
        catalog = catalog.search(&criteria).map_err(core)?;
    }
    if !args.sort.is_empty() {
        catalog = catalog.sort_by(args.sort.as_slice()).map_err(core)?;
    }
    if !args.select.is_empty() {
        catalog = catalog.select_fields(args.select.as_slice()).map_err(core)?;
    }

    if catalog.is_empty() {
        eprintln!("{}", "No matching files found.".yellow());
        return Ok(());
    }

    println!("{}", formatter.format_catalog(&catalog)?);

    if terminal::is_interactive() {
        eprintln!(
            "\nFound {} path(s) in {}",
            catalog.len(),
            format_elapsed(start.elapsed())
        );
    }
    Ok(())
}

fn match_command(template: &str, paths: &[String], format: OutputFormat) -> CliResult<()> {
    let matcher = PathMatcher::new(compile(template)?).map_err(core)?;
    let records: Vec<_> = paths.iter().map(|path| matcher.match_path(path)).collect();

    println!(
        "{}",
        output::format_records(&records, format, use_color(None))?
    );

    let failed = records.iter().filter(|record| !record.is_success()).count();
    if failed > 0 {
        return Err(CliError::general(&format!(
            "{failed} of {} path(s) did not match",
            records.len()
        )));
    }
    Ok(())
}

fn render_command(template: &str, assignments: &[String]) -> CliResult<()> {
    let template = compile(template)?;

    let mut fields: HashMap<String, FieldValue> = HashMap::new();
    for assignment in assignments {
        let Some((name, value)) = assignment.split_once('=') else {
            return Err(CliError::misuse(&format!(
                "Expected FIELD=VALUE, got '{assignment}'"
            )));
        };
        if template.placeholder(name).is_none() {
            let error = QueryError::unknown_field(name, template.keys());
            return Err(CliError::misuse(&error.to_string()));
        }
        fields.insert(name.to_string(), FieldValue::from(value));
    }

    let rendered = template.render(&fields).map_err(core)?;
    println!("{rendered}");
    Ok(())
}

fn config_command(command: ConfigCommand) -> CliResult<()> {
    let mut manager = ConfigManager::new();

    match command {
        ConfigCommand::Path => {
            println!("{}", manager.config_path().display());
        }
        ConfigCommand::Get { key } => {
            println!("{}", manager.get(&key)?);
        }
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value)?;
            eprintln!("{}", format!("Set {key} = {value}").green());
            eprintln!(
                "Configuration saved to: {}",
                manager.config_path().display()
            );
        }
        ConfigCommand::List => {
            let items = manager.list()?;
            eprintln!("Config file: {}", manager.config_path().display());

            let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
            for (key, value) in items {
                let (section, rest) = key.split_once('.').unwrap_or(("general", key.as_str()));
                sections
                    .entry(section.to_string())
                    .or_default()
                    .push((rest.to_string(), value));
            }

            for (section, items) in sections {
                println!("[{}]", section.yellow());
                for (key, value) in items {
                    println!("  {} = {}", key.cyan(), value);
                }
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
