use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_task_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rentwise::config::AppConfig;
use rentwise::error::AppError;
use rentwise::services::MemoryNotifier;
use rentwise::store::Store;
use rentwise::tasks::TaskManager;
use rentwise::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(Store::in_memory());
    let notifier = Arc::new(MemoryNotifier::default());
    let (manager, queue) = TaskManager::standard(store, notifier, config.tasks, config.tenancy);
    let manager = Arc::new(manager);
    let worker = queue.spawn(manager.clone());

    let app = with_task_routes(manager)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        queue_capacity = config.tasks.queue_capacity,
        tenant_filter = config.tenancy.filter_enabled,
        "rentwise api ready"
    );

    let served = axum::serve(listener, app).await;
    worker.abort();
    served?;
    Ok(())
}
