pub mod api;
pub mod auth;
pub mod cli;
pub mod codec;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod outcome;
pub mod rpc;
pub mod services;
pub mod telemetry;

use std::future::Future;
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use anyhow::Context;
use cli::{Cli, Commands, TokenCommands};
pub use config::Config;
use config::LogFormat;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config)?;
    config.validate()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let prometheus_handle = install_metrics_recorder(&config)?;
            run_server(config, prometheus_handle).await
        }

        Commands::Init { path } => cli::cmd_init(&path),

        Commands::Token { command } => match command {
            TokenCommands::Issue { name, principal } => {
                cli::cmd_token_issue(&config, &name, &principal).await
            }
            TokenCommands::List => cli::cmd_token_list(&config).await,
            TokenCommands::Revoke { id } => cli::cmd_token_revoke(&config, &id).await,
        },
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let initialized = match config.general.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    initialized.context("Failed to initialize logging")
}

fn install_metrics_recorder(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    let http_addr: SocketAddr = config
        .server
        .http_addr()
        .parse()
        .context("Invalid HTTP bind address")?;
    let grpc_addr: SocketAddr = config
        .server
        .grpc_addr()
        .parse()
        .context("Invalid gRPC bind address")?;

    let state = api::create_app_state_from_config(config, prometheus_handle).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {http_addr}"))?;
    let app = api::router(state.clone());
    let http_shutdown = wait_for_shutdown(shutdown_rx.clone());

    let http_task: ListenerTask = tokio::spawn(async move {
        info!("HTTP server listening on {http_addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(http_shutdown)
            .await?;
        Ok::<_, anyhow::Error>(())
    });

    let grpc_task: ListenerTask = tokio::spawn(rpc::serve(
        state,
        grpc_addr,
        wait_for_shutdown(shutdown_rx),
    ));

    info!("flagd running. Press Ctrl+C to stop.");

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Error listening for shutdown: {e}");
        }
    };

    supervise(http_task, grpc_task, shutdown_tx, ctrl_c).await?;

    info!("flagd stopped");
    Ok(())
}

type ListenerTask = JoinHandle<anyhow::Result<()>>;

/// Keeps both listeners up until `stop` resolves.
///
/// A listener that exits on its own takes the other one down with it and its
/// error is returned.
async fn supervise<F>(
    mut http: ListenerTask,
    mut grpc: ListenerTask,
    shutdown: watch::Sender<bool>,
    stop: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    tokio::select! {
        () = stop => {
            info!("Shutdown signal received");
            let _ = shutdown.send(true);
            let (http_exit, grpc_exit) = tokio::join!(&mut http, &mut grpc);
            listener_result("HTTP", http_exit)?;
            listener_result("gRPC", grpc_exit)
        }
        exit = &mut http => {
            let _ = shutdown.send(true);
            stop_survivor("gRPC", &mut grpc).await;
            Err(unexpected_exit("HTTP", exit))
        }
        exit = &mut grpc => {
            let _ = shutdown.send(true);
            stop_survivor("HTTP", &mut http).await;
            Err(unexpected_exit("gRPC", exit))
        }
    }
}

async fn stop_survivor(name: &str, task: &mut ListenerTask) {
    if let Err(e) = listener_result(name, task.await) {
        error!("{e:#}");
    }
}

fn listener_result(name: &str, exit: Result<anyhow::Result<()>, JoinError>) -> anyhow::Result<()> {
    match exit {
        Ok(result) => result.with_context(|| format!("{name} server failed")),
        Err(e) => Err(e).with_context(|| format!("{name} server task panicked")),
    }
}

fn unexpected_exit(name: &str, exit: Result<anyhow::Result<()>, JoinError>) -> anyhow::Error {
    match listener_result(name, exit) {
        Ok(()) => anyhow::anyhow!("{name} server stopped unexpectedly"),
        Err(e) => e,
    }
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
