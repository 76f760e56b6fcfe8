//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::context::Context;
use crate::engine::Paginator;
use crate::error::{Error, Result};
use crate::request::TimeseriesRequest;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                path,
                params,
                limit,
                page_size,
                frequency,
                start_time,
                end_time,
            } => {
                let mut config = self.client_config()?;
                if let Some(limit) = limit {
                    config.pagination.limit = *limit;
                }
                if let Some(size) = page_size {
                    config.pagination.page_size = *size;
                }
                let request = build_request(
                    path,
                    params,
                    frequency.as_deref(),
                    *start_time,
                    *end_time,
                );
                self.fetch(&config, request).await
            }
            Commands::Config => self.show_config(),
        }
    }

    /// Resolve config: file, then environment, then flags
    pub fn client_config(&self) -> Result<ClientConfig> {
        let config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        let mut config = config.with_env_overrides();
        if let Some(endpoint) = &self.cli.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(key) = &self.cli.api_key {
            config.api_key = Some(key.clone());
        }
        config.validate()?;
        Ok(config)
    }

    /// Stream records to stdout until the loop ends
    async fn fetch(&self, config: &ClientConfig, request: TimeseriesRequest) -> Result<()> {
        let paginator = Paginator::from_config(config)?;
        let (ctx, cancel) = Context::with_cancel();

        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling fetch");
                cancel.cancel();
            }
        });

        info!(
            path = %request.path,
            limit = config.pagination.limit,
            page_size = config.pagination.page_size,
            "Starting fetch"
        );
        let start = Instant::now();
        let mut stream = paginator.stream(&ctx, request);
        let mut out = std::io::stdout();
        let mut count = 0u64;
        let mut failure = None;

        while let Some(item) = stream.recv().await {
            match item {
                Ok(record) => {
                    self.output_record(&mut out, &record)?;
                    count += 1;
                }
                Err(e) => failure = Some(e),
            }
        }
        out.flush()?;
        interrupt.abort();

        let stats = stream.join().await?;
        debug!(?stats, "Fetch loop stats");
        info!(
            "Fetched {count} records in {} pages ({} ms)",
            stats.pages_fetched,
            start.elapsed().as_millis()
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Print the effective configuration as YAML
    fn show_config(&self) -> Result<()> {
        let mut config = self.client_config()?;
        if config.api_key.is_some() {
            config.api_key = Some("********".to_string());
        }
        let yaml = serde_yaml::to_string(&config)?;
        print!("{yaml}");
        Ok(())
    }

    /// Output a record
    fn output_record(&self, out: &mut impl Write, record: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(record)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(record)?,
        };
        writeln!(out, "{line}").map_err(Error::from)
    }
}

/// Build a request from CLI arguments
pub fn build_request(
    path: &str,
    params: &[(String, String)],
    frequency: Option<&str>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
) -> TimeseriesRequest {
    let mut request = TimeseriesRequest::new(path);
    for (key, value) in params {
        request = request.param(key, value);
    }
    if let Some(frequency) = frequency {
        request = request.frequency(frequency);
    }
    if let Some(start) = start_time {
        request = request.start_time(start);
    }
    if let Some(end) = end_time {
        request = request.end_time(end);
    }
    request
}
