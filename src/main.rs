use anyhow::Context;
use clap::Parser;
use csp_collector::config::{self, Config, OutputFormat, Overrides};
use csp_collector::handler::ViolationReportHandler;
use csp_collector::{app, sink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Receives Content-Security-Policy violation reports and logs them")]
struct Args {
    /// Config TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address (default: 0.0.0.0)
    #[arg(long)]
    bind: Option<String>,

    /// Bind port (default: 8080)
    #[arg(long)]
    port: Option<u16>,

    /// Path answering health checks (default: /_healthcheck)
    #[arg(long)]
    health_check_path: Option<String>,

    /// Blocked URI noise list, one prefix per line; replaces the built-in list
    #[arg(long)]
    filter_file: Option<PathBuf>,

    /// Strip query string and fragment from logged URIs (`--truncate-query-fragment=false` turns off a config file setting)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    truncate_query_fragment: Option<bool>,

    /// Log all query parameters instead of the first one (`--query-params-metadata=false` turns off a config file setting)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    query_params_metadata: Option<bool>,

    #[arg(long, value_enum)]
    output_format: Option<OutputFormat>,

    /// Log rejected reports and request traces (`--debug=false` turns off a config file setting)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    debug: Option<bool>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            bind: self.bind.clone(),
            port: self.port,
            health_check_path: self.health_check_path.clone(),
            filter_file: self.filter_file.clone(),
            truncate_query_string_fragment: self.truncate_query_fragment,
            metadata_object: self.query_params_metadata,
            output_format: self.output_format,
            debug: self.debug,
        }
    }
}

fn init_tracing(config: &Config) {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.output_format {
        OutputFormat::Text => builder.init(),
        OutputFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };
    let config = file_config.apply(args.overrides());

    init_tracing(&config);

    anyhow::ensure!(
        config.health_check_path.starts_with('/'),
        "health check path must start with '/': {}",
        config.health_check_path
    );

    let sink = match config.output_format {
        OutputFormat::Text => sink::TracingSink::text(),
        OutputFormat::Json => sink::TracingSink::json(),
    };
    let handler = ViolationReportHandler::new(config.handler_config()?, Arc::new(sink));
    info!(
        ignored_blocked_uris = handler.config().blocked_uris.len(),
        truncate_query_string_fragment = handler.config().truncate_query_string_fragment,
        metadata_object = handler.config().metadata_object,
        "report handler ready"
    );

    let app = app::build_router(handler, &config.health_check_path, config.max_body_bytes);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
