use anyhow::Result;
use mindns_solver::config::GROUP_NAME_ENV;
use mindns_solver::rpc::GrpcConnector;
use mindns_solver::solver::DynSolver;
use mindns_solver::{Config, MindnsSolver, SharedConfig, Solver};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let config = config_init(std::env::args().nth(1))?;

    let solver = MindnsSolver::new(GrpcConnector).with_rpc_timeout(config.rpc_timeout);
    let solver: DynSolver = Arc::new(solver);
    let (stop_tx, stop_rx) = watch::channel(false);
    let kube = match kube::Client::try_default().await {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::info!("no Kubernetes client ({err}), tokenSecretRef is unavailable");
            None
        }
    };
    solver.initialize(kube, stop_rx.clone()).await?;

    tracing::info!(
        "serving solver \"{}\" for group \"{}\" on {}",
        solver.name(),
        config.group_name,
        config.api_bind_addr
    );
    let mut api_stop = stop_rx;
    let api_server = mindns_solver::api::new(config.clone(), solver, async move {
        let _ = api_stop.wait_for(|stopped| *stopped).await;
    });
    let mut api_handle = tokio::spawn(api_server);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        api_res = &mut api_handle => {
            api_res??;
            return Ok(());
        }
    }
    let _ = stop_tx.send(true);
    api_handle.await??;
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindns_solver=info".into()),
        )
        .init();
}

fn config_init(config_file: Option<String>) -> Result<SharedConfig> {
    let config = match config_file {
        None => Config::default(),
        Some(config_file) => {
            tracing::debug!("loaded config from {config_file}");
            Config::try_from_file(&config_file)?
        }
    };
    let config = config.with_group_name(std::env::var(GROUP_NAME_ENV).ok())?;
    Ok(Arc::new(config))
}
