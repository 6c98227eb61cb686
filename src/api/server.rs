use crate::api::routes;
use crate::config::SharedConfig;
use crate::solver::DynSolver;
use std::future::Future;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub solver: DynSolver,
}

pub fn new(
    config: SharedConfig,
    solver: DynSolver,
    shutdown: impl Future<Output = ()>,
) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.api_bind_addr)
        .serve(routes::new(AppState { config, solver }).into_make_service())
        .with_graceful_shutdown(shutdown)
}
