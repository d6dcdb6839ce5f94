//! CLI command implementations
//!
//! Both commands follow the same boot sequence: load configuration, fetch
//! mappings, build the schema, bind it to the store. `serve` then listens;
//! `schema` prints the SDL and exits.

use std::path::Path;
use std::sync::Arc;

use async_graphql::dynamic::Schema;

use crate::graphql::{build_executable_schema, GraphqlServer};
use crate::names::NameRegistry;
use crate::observability::{init_logging, log_event_with_fields, Event};
use crate::resolver::ExecutionContext;
use crate::schema::SchemaBuilder;
use crate::store::{DocumentStore, ElasticsearchStore};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};

pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    init_logging();

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    match cmd {
        Command::Serve { config } => rt.block_on(serve(&config)),
        Command::Schema { config } => rt.block_on(schema(&config)),
    }
}

/// Build the schema and serve it until the process is stopped
pub async fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let addr = config.socket_addr()?;
    let schema = boot(&config).await?;

    GraphqlServer::new(addr, schema, config.enable_graphiql)
        .start()
        .await
        .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
}

/// Build the schema and print its SDL to stdout
pub async fn schema(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let schema = boot(&config).await?;
    println!("{}", schema.sdl());
    Ok(())
}

fn load_config(path: &Path) -> CliResult<Config> {
    let config = Config::load(path)?;
    let hosts = config.elasticsearch_hosts.join(",");
    let path = path.display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", path.as_str()), ("hosts", hosts.as_str())],
    );
    Ok(config)
}

/// Connect to the store and produce an executable schema
async fn boot(config: &Config) -> CliResult<Schema> {
    let store: Arc<dyn DocumentStore> = Arc::new(
        ElasticsearchStore::new(config.elasticsearch_hosts.clone(), config.request_timeout())?
            .with_result_logging(config.enable_query_result_logging),
    );

    let mut names = NameRegistry::with_policy(config.collision_policy);
    let query_schema = SchemaBuilder::new(config.builder_options())
        .build_from_store(store.as_ref(), &mut names)
        .await?;

    let ctx = ExecutionContext::new(store, Arc::new(names))
        .with_query_logging(config.enable_query_logging);
    Ok(build_executable_schema(&query_schema, ctx)?)
}
