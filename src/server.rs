use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use hyper::{body::Incoming, server::conn::http1};
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::broadcast};
use tower::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, ServerConfig},
    error::AppError,
    handlers::{self, AppState},
    metrics,
    pricing::{AwsPricingClient, PriceFetcher, PriceStore, PricingUpdater, RegionNameIndex},
    signals::{setup_signal_handlers, ShutdownSignal},
};

/// Start the price server
///
/// This function:
/// 1. Initializes metrics
/// 2. Builds the store and updater, installs the signal handlers
/// 3. Binds to the configured address
/// 4. Hands over to [`run_server`] until a shutdown signal arrives
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics()?);

    let store = Arc::new(PriceStore::new());
    let updater = Arc::new(build_updater(&config, store.clone())?);

    // Setup signal handlers (SIGTERM, SIGINT for shutdown; SIGHUP for refresh)
    let (shutdown_tx, signal_handle) = setup_signal_handlers(updater.refresh_trigger());

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    run_server(
        listener,
        updater,
        AppState {
            store,
            metrics_handle,
        },
        config.server,
        shutdown_tx,
    )
    .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Serve prices on a bound listener until shutdown.
///
/// The initial fetch completes before the first connection is accepted. When
/// it fails the service still serves, starting from an empty table.
pub async fn run_server(
    listener: TcpListener,
    updater: Arc<PricingUpdater>,
    state: AppState,
    server: ServerConfig,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
) -> Result<()> {
    let serve_rx = shutdown_tx.subscribe();
    let updater_rx = shutdown_tx.subscribe();

    initial_refresh(&updater).await;
    let updater_handle = tokio::spawn(updater.run(updater_rx));

    info!("Serving HTTP requests on {}", listener.local_addr()?);
    let app = create_router(state, server.write_timeout());
    serve(
        listener,
        app,
        server.read_timeout(),
        server.write_timeout(),
        serve_rx,
    )
    .await?;

    updater_handle.await?;
    Ok(())
}

async fn initial_refresh(updater: &PricingUpdater) {
    info!("Getting prices from the pricing API");
    match updater.refresh().await {
        Ok(summary) => info!(
            "Got prices for {} instance types in {} regions",
            summary.instance_types, summary.regions
        ),
        Err(e) => error!(
            "Initial price fetch failed, serving an empty table until the next refresh: {}",
            e
        ),
    }
}

/// Build the updater wired to the AWS pricing API
pub fn build_updater(config: &Config, store: Arc<PriceStore>) -> Result<PricingUpdater> {
    let client = AwsPricingClient::new(&config.pricing, config.aws.clone())?;
    let regions = Arc::new(RegionNameIndex::with_overrides(&config.pricing.extra_regions));
    let fetcher = PriceFetcher::new(
        Arc::new(client),
        regions,
        config.pricing.page_size,
        config.pricing.max_pages,
    );

    Ok(PricingUpdater::new(
        fetcher,
        store,
        config.pricing.refresh_interval(),
    ))
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, write_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(handlers::usage::usage_page))
        .route("/all", get(handlers::prices::all_prices))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics_handler::metrics))
        .route("/:region", get(handlers::prices::region_prices))
        .route("/:region/:instance_type", get(handlers::prices::instance_price))
        .fallback(redirect_trailing_slash)
        .with_state(state)
        .layer(middleware::from_fn(response_headers))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::HEAD]),
        )
        .layer(TimeoutLayer::new(write_timeout))
        .layer(TraceLayer::new_for_http())
}

/// `/eu-west-1/` redirects to `/eu-west-1`; anything else unrouted is a 404
async fn redirect_trailing_slash(uri: Uri) -> Response {
    let path = uri.path();
    if path.len() <= 1 || !path.ends_with('/') {
        return AppError::NotFound.into_response();
    }

    let mut location = match path.trim_end_matches('/') {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    };
    if let Some(query) = uri.query() {
        location.push('?');
        location.push_str(query);
    }

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Headers every response carries: open CORS, read-only methods, no caching
async fn response_headers(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, HEAD"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );

    resp
}

/// Accept loop serving `app` over HTTP/1.1.
///
/// Each connection gets a header read timeout, which also bounds how long
/// an idle keep-alive connection may wait for its next request. On shutdown
/// the listener is closed, idle connections are dropped and in-flight
/// requests get up to `drain_timeout` to finish.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    read_timeout: Duration,
    drain_timeout: Duration,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> Result<()> {
    let mut http = http1::Builder::new();
    http.timer(TokioTimer::new())
        .header_read_timeout(read_timeout);
    let graceful = GracefulShutdown::new();

    loop {
        let (socket, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) if is_connection_error(&e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
                Err(e) => return Err(e).context("HTTP listener failed"),
            },
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        };

        let tower_service = app.clone();
        let hyper_service = hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
            tower_service.clone().oneshot(request)
        });
        let connection = graceful.watch(http.serve_connection(TokioIo::new(socket), hyper_service));

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                debug!(%remote_addr, "Connection closed: {}", err);
            }
        });
    }

    drop(listener);
    tokio::select! {
        _ = graceful.shutdown() => debug!("All connections drained"),
        _ = tokio::time::sleep(drain_timeout) => {
            warn!("Timed out after {:?} waiting for connections to drain", drain_timeout);
        }
    }

    Ok(())
}

fn is_connection_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}
