//! obs-connect - Command line host for the Huawei OBS plugins
//!
//! Plays the host runtime locally: loads a configuration file, builds the
//! configured connections and batch plugins, and drives their hooks.
//!
//! # Usage
//!
//! ```bash
//! # Validate every enabled source and sink
//! obs-connect -c connect.yaml validate
//!
//! # Test a connection
//! obs-connect -c connect.yaml test --connection lake
//!
//! # Browse buckets, then a directory
//! obs-connect -c connect.yaml browse --connection lake
//! obs-connect -c connect.yaml browse --connection lake --path sales/orders/ --limit 50
//!
//! # Browse an in-memory fixture instead of a live endpoint
//! obs-connect -c connect.yaml browse --connection lake --memory fixture.yaml
//!
//! # Batch source spec for a browsed path
//! obs-connect -c connect.yaml spec --connection lake --path sales/orders/2024-01.csv
//!
//! # File system properties of a source or sink
//! obs-connect -c connect.yaml properties orders
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use obs_connect::{
    init_logging, parse_plugin_config, BatchPlugin, BrowseDetail, BrowseRequest, CheckResult,
    ConnectConfig, ConnectionSpecRequest, Connector, ConnectorContext, FailureCollector,
    LogFormat, PluginRegistry, PluginType,
};
use obs_storage::client::memory::MemoryFixture;
use obs_storage::connection::OBS_SECRET_KEY;
use obs_storage::{MemoryObsClient, ObsConnector, ObsConnectorConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "obs-connect")]
#[command(version, about = "Command line host for the Huawei OBS connector plugins")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "connect.yaml", env = "OBS_CONNECT_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every enabled source and sink
    Validate,
    /// Validate a connection and try to reach OBS
    Test {
        /// Connection name (default: all connections)
        #[arg(long)]
        connection: Option<String>,
        /// Use an in-memory fixture instead of the configured endpoint
        #[arg(long)]
        memory: Option<PathBuf>,
    },
    /// List buckets, directories and objects
    Browse {
        /// Connection name
        #[arg(long)]
        connection: String,
        /// Path to browse; `/` lists buckets
        #[arg(long, default_value = "/")]
        path: String,
        /// Maximum number of entities (0 or less means unlimited)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i32>,
        /// Use an in-memory fixture instead of the configured endpoint
        #[arg(long)]
        memory: Option<PathBuf>,
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the batch source spec for a browsed path
    Spec {
        /// Connection name
        #[arg(long)]
        connection: String,
        /// Browsed path
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Show the file system properties of a source or sink
    Properties {
        /// Source or sink name
        name: String,
        /// Print secrets instead of redacting them
        #[arg(long)]
        show_secrets: bool,
    },
    /// List available plugins
    Plugins,
    /// Show config schema for a plugin
    Schema {
        /// Plugin kind (connector, source, sink)
        kind: String,
        /// Output format (json, yaml)
        #[arg(long, default_value = "json")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut registry = PluginRegistry::new();
    obs_storage::register_all(&mut registry);

    // Commands that don't need config
    match &cli.command {
        Commands::Plugins => {
            init_logging(log_level(&cli, None), LogFormat::Pretty);
            return list_plugins(&registry);
        }
        Commands::Schema { kind, format } => {
            init_logging(log_level(&cli, None), LogFormat::Pretty);
            return show_schema(&registry, kind, format);
        }
        _ => {}
    }

    let config = ConnectConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    init_logging(log_level(&cli, Some(&config)), config.settings.log_format);
    debug!("Loaded configuration from {}", cli.config.display());

    match &cli.command {
        Commands::Validate => validate_config(&registry, &config),
        Commands::Test { connection, memory } => {
            test_connections(&registry, &config, connection.as_deref(), memory.as_deref()).await
        }
        Commands::Browse {
            connection,
            path,
            limit,
            memory,
            format,
        } => {
            let connector = open_connector(&registry, &config, connection, memory.as_deref()).await?;
            let mut request = BrowseRequest::new(path.clone());
            request.limit = *limit;
            let result = browse(connector.as_ref(), &request, format).await;
            close_after(connector.as_ref(), result).await
        }
        Commands::Spec { connection, path } => {
            let connector = open_connector(&registry, &config, connection, None).await?;
            let request = ConnectionSpecRequest::new(path.clone(), format!("${{conn({})}}", connection));
            let result = connector.connection_spec(&request);
            let spec = close_after(connector.as_ref(), result).await?;
            println!("{}", serde_json::to_string_pretty(&spec)?);
            Ok(())
        }
        Commands::Properties { name, show_secrets } => {
            show_properties(&registry, &config, name, *show_secrets)
        }
        Commands::Plugins | Commands::Schema { .. } => unreachable!(), // handled above
    }
}

fn log_level<'a>(cli: &Cli, config: Option<&'a ConnectConfig>) -> &'a str {
    if cli.verbose {
        return "debug";
    }
    config.map_or("info", |c| c.settings.log_level.as_str())
}

/// Close `connector`, then hand back the result of the call made on it
async fn close_after<T, E>(
    connector: &dyn Connector,
    result: std::result::Result<T, E>,
) -> Result<T>
where
    E: Into<anyhow::Error>,
{
    connector.close().await?;
    result.map_err(Into::into)
}

/// Build the connector for a named connection
async fn open_connector(
    registry: &PluginRegistry,
    config: &ConnectConfig,
    name: &str,
    memory: Option<&Path>,
) -> Result<Box<dyn Connector>> {
    let connection = config
        .connections
        .get(name)
        .with_context(|| format!("Connection '{}' not found in configuration", name))?;

    if let Some(fixture_path) = memory {
        let obs_config: ObsConnectorConfig = parse_plugin_config(&connection.config)?;
        let content = std::fs::read_to_string(fixture_path)
            .with_context(|| format!("Failed to read fixture {}", fixture_path.display()))?;
        let fixture: MemoryFixture = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse fixture {}", fixture_path.display()))?;
        info!("Using in-memory fixture {} for '{}'", fixture_path.display(), name);
        let client = Arc::new(MemoryObsClient::from_fixture(fixture));
        return Ok(Box::new(ObsConnector::new(obs_config, client)));
    }

    let factory = registry
        .connectors
        .get(&connection.connector)
        .with_context(|| format!("Unknown connector type '{}'", connection.connector))?;
    Ok(factory.create(&connection.config).await?)
}

/// Build a configured source or sink by name
fn open_plugin(
    registry: &PluginRegistry,
    config: &ConnectConfig,
    name: &str,
) -> Result<(PluginType, Box<dyn BatchPlugin>)> {
    if let Some(source) = config.sources.get(name) {
        let factory = registry
            .sources
            .get(&source.plugin)
            .with_context(|| format!("Unknown source type '{}'", source.plugin))?;
        let plugin = factory.create(&config.resolved_plugin_config(source)?)?;
        return Ok((PluginType::BatchSource, plugin));
    }
    if let Some(sink) = config.sinks.get(name) {
        let factory = registry
            .sinks
            .get(&sink.plugin)
            .with_context(|| format!("Unknown sink type '{}'", sink.plugin))?;
        let plugin = factory.create(&config.resolved_plugin_config(sink)?)?;
        return Ok((PluginType::BatchSink, plugin));
    }
    bail!("No source or sink named '{}' in configuration", name)
}

fn validate_config(registry: &PluginRegistry, config: &ConnectConfig) -> Result<()> {
    let names: Vec<&String> = config
        .enabled_sources()
        .chain(config.enabled_sinks())
        .map(|(name, _)| name)
        .collect();

    if names.is_empty() {
        warn!("No enabled sources or sinks found in configuration");
    }

    let mut failed = 0;
    for name in names {
        let (plugin_type, plugin) = open_plugin(registry, config, name)?;
        let mut collector = FailureCollector::new(name.as_str());
        plugin.validate(&mut collector);

        if collector.is_empty() {
            println!("  ✓ {} ({})", name, plugin_type);
        } else {
            failed += 1;
            println!("  ✗ {} ({})", name, plugin_type);
            for failure in collector.failures() {
                println!("      └─ {}", failure);
            }
        }
    }

    println!();
    if failed > 0 {
        bail!("{} plugin(s) failed validation", failed);
    }
    println!("✓ Configuration valid!");
    Ok(())
}

async fn test_connections(
    registry: &PluginRegistry,
    config: &ConnectConfig,
    only: Option<&str>,
    memory: Option<&Path>,
) -> Result<()> {
    let names: Vec<&str> = match only {
        Some(name) => vec![name],
        None => config.connections.keys().map(String::as_str).collect(),
    };

    let mut all_passed = true;
    for name in names {
        let connector = open_connector(registry, config, name, memory).await?;
        let mut ctx = ConnectorContext::new(name);
        let tested = connector.test(&mut ctx).await;
        close_after(connector.as_ref(), tested).await?;

        let result = CheckResult::from_failures("connectivity", ctx.failure_collector());
        println!("{}", result);
        all_passed &= result.is_success();
    }

    if !all_passed {
        bail!("One or more connection tests failed");
    }
    Ok(())
}

async fn browse(connector: &dyn Connector, request: &BrowseRequest, format: &str) -> Result<()> {
    let mut ctx = ConnectorContext::new("browse");
    let detail = connector.browse(&mut ctx, request).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&detail)?),
        "table" => print_browse_table(&detail),
        other => bail!("Unknown output format '{}', expected table or json", other),
    }
    Ok(())
}

fn print_browse_table(detail: &BrowseDetail) {
    println!(
        "{} of {} entities",
        detail.entities.len(),
        detail.total_count
    );
    for entity in &detail.entities {
        let marker = if entity.can_browse { "+" } else { " " };
        let size = entity
            .property("Size")
            .map(|p| p.value.as_str())
            .unwrap_or("-");
        let file_type = entity
            .property("File Type")
            .map(|p| p.value.as_str())
            .unwrap_or("");
        println!(
            "  {} {:<10} {:>12}  {:<28} {}",
            marker, entity.entity_type, size, file_type, entity.path
        );
    }
}

fn show_properties(
    registry: &PluginRegistry,
    config: &ConnectConfig,
    name: &str,
    show_secrets: bool,
) -> Result<()> {
    let (_, plugin) = open_plugin(registry, config, name)?;
    let mut properties: BTreeMap<String, String> = plugin.prepare_run(name)?;

    if !show_secrets {
        if let Some(secret) = properties.get_mut(OBS_SECRET_KEY) {
            *secret = "***REDACTED***".to_string();
        }
    }

    println!("{}", serde_json::to_string_pretty(&properties)?);
    Ok(())
}

fn list_plugins(registry: &PluginRegistry) -> Result<()> {
    println!("Available plugins:\n");
    for spec in registry.specs() {
        println!(
            "  {:<8} {:<12} v{}  {}",
            spec.connector_type,
            spec.plugin_type,
            spec.version,
            spec.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn show_schema(registry: &PluginRegistry, kind: &str, format: &str) -> Result<()> {
    let spec = match kind {
        "connector" => registry.connectors.get("obs").map(|f| f.spec()),
        "source" => registry.sources.get("obs").map(|f| f.spec()),
        "sink" => registry.sinks.get("obs").map(|f| f.spec()),
        other => bail!("Unknown plugin kind '{}', expected connector, source or sink", other),
    }
    .with_context(|| format!("No {} registered", kind))?;

    let schema = spec
        .config_schema
        .with_context(|| format!("The {} has no config schema", kind))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&schema)?),
        "yaml" => println!("{}", serde_yaml::to_string(&schema)?),
        other => bail!("Unknown output format '{}', expected json or yaml", other),
    }
    Ok(())
}
