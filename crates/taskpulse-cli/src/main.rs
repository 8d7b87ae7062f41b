//! taskpulse - タスクイベントを集約してサマリを出力する CLI
//!
//! 1. 改行区切り JSON をファイルまたは stdin から読む（`--simulate N` なら合成）
//! 2. EventPipeline に流す
//! 3. 入力終了（または Ctrl-C）で JSON サマリを stdout に出力

mod simulate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use taskpulse_core::app::{EventPipeline, RoutingPoller, TaskMetrics};
use taskpulse_core::impls::JsonFileRoutingSource;
use taskpulse_core::ExporterConfig;

#[derive(Debug, Parser)]
#[command(name = "taskpulse", version, about = "Aggregate task lifecycle events")]
struct Args {
    /// Newline-delimited JSON events; stdin when omitted.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Generate this many synthetic task lifecycles instead of reading input.
    #[arg(long, conflicts_with = "input")]
    simulate: Option<usize>,

    /// JSON file with worker routing configurations, re-read periodically.
    #[arg(long, env = "TASKPULSE_ROUTING_FILE")]
    routing_file: Option<PathBuf>,

    #[arg(long, env = "TASKPULSE_MAX_TASKS_IN_MEMORY", default_value_t = 10_000)]
    max_tasks_in_memory: usize,

    #[arg(long, env = "TASKPULSE_DEFAULT_QUEUE", default_value = taskpulse_core::config::DEFAULT_QUEUE)]
    default_queue: String,

    #[arg(long, env = "TASKPULSE_ROUTING_REFRESH_SECS", default_value_t = 60)]
    routing_refresh_secs: u64,

    #[arg(long, env = "TASKPULSE_WORKER_EXPIRE_WINDOW", default_value_t = 2.0)]
    worker_expire_window: f64,

    #[arg(long, env = "TASKPULSE_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

impl Args {
    fn config(&self) -> ExporterConfig {
        ExporterConfig {
            max_tasks_in_memory: self.max_tasks_in_memory,
            default_queue: self.default_queue.clone(),
            routing_refresh_secs: self.routing_refresh_secs,
            worker_expire_window: self.worker_expire_window,
            namespace: self.namespace.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)))
        .init();

    let config = args.config();
    config.validate().context("invalid configuration")?;
    TaskMetrics::describe();

    let pipeline = EventPipeline::new(&config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = args.routing_file.clone().map(|path| {
        let source = JsonFileRoutingSource::new(path);
        tracing::info!(path = %source.path().display(), every = ?config.routing_refresh(), "polling routing file");
        let poller = RoutingPoller::new(
            source,
            Arc::clone(pipeline.aggregator()),
            config.routing_refresh(),
        );
        tokio::spawn(poller.run(shutdown_rx))
    });

    match args.simulate {
        Some(count) => simulate::run(&pipeline, count),
        None => consume(&pipeline, args.input.as_deref()).await?,
    }

    stop(shutdown_tx, poller).await;

    let summary = pipeline.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Feed input lines to the pipeline until EOF or Ctrl-C.
async fn consume(pipeline: &EventPipeline, input: Option<&std::path::Path>) -> Result<()> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(reader).lines();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    let mut line_no = 0usize;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading input")? else {
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(err) = pipeline.handle_line(&line) {
                    tracing::warn!(line = line_no, error = %err, "skipping undecodable event");
                }
            }
            _ = ticker.tick() => pipeline.tick(),
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, stopping");
                break;
            }
        }
    }

    tracing::debug!(lines = line_no, "input consumed");
    Ok(())
}

async fn stop(shutdown: watch::Sender<bool>, poller: Option<JoinHandle<()>>) {
    let _ = shutdown.send(true);
    if let Some(handle) = poller
        && let Err(err) = handle.await
    {
        tracing::warn!(error = %err, "routing poller task failed");
    }
}
