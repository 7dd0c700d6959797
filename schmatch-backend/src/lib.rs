pub mod database;
pub mod error;
pub mod routes;
pub mod templating;

use core::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use error::AppError;
use futures_util::{pin_mut, Future};
use handlebars::Handlebars;
use http::{Method, Request, Response};
use http_body::Body;
use http_body_util::{BodyExt as _, Full};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use schmatch_config::Config;
use schmatch_database::{get_database_pool, initialize_database, Pool};
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument as _};
use tracing_subscriber::EnvFilter;

use crate::routes::{resources, schedules, slots, static_files};

const DEFAULT_LOG_LEVEL: &str = "info,schmatch_backend=debug,schmatch_database=debug,hyper=info";

/// Everything a request handler needs. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pool: Pool,
    templates: Arc<Handlebars<'static>>,
}

impl AppState {
    #[must_use]
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }

    #[must_use]
    pub fn templates(&self) -> &Handlebars<'static> {
        &self.templates
    }
}

pub fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into()),
        )
        .init();
}

/// Prepares the database below the configured location and the templates.
pub fn setup_server(config: &Config) -> Result<AppState, AppError> {
    info!("starting up server...");
    let database_path = config.database_path();
    initialize_database(&database_path, false)?;
    let pool = get_database_pool(&database_path)?;
    Ok(AppState {
        pool,
        templates: Arc::new(templating::templates()?),
    })
}

enum Route {
    Resources,
    Slots,
    Schedule(i32),
    Script,
}

impl Route {
    fn resolve(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Self::Resources),
            "/slots" => Some(Self::Slots),
            static_files::SCRIPT_PATH => Some(Self::Script),
            _ => path
                .strip_prefix("/schedules/")
                .and_then(|id| id.parse().ok())
                .map(Self::Schedule),
        }
    }
}

async fn collect_body<B>(body: B) -> Result<Bytes, AppError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<AppError>,
{
    Ok(body
        .collect()
        .await
        .map_err(Into::<AppError>::into)?
        .to_bytes())
}

async fn route<B>(request: Request<B>, state: &AppState) -> Result<Response<Full<Bytes>>, AppError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<AppError>,
{
    let (parts, body) = request.into_parts();
    let route = Route::resolve(parts.uri.path()).ok_or(AppError::NotFound)?;
    match (route, parts.method) {
        (Route::Resources, Method::GET | Method::HEAD) => resources::list(state).await,
        (Route::Resources, Method::POST) => resources::create(state, collect_body(body).await?).await,
        (Route::Slots, Method::GET | Method::HEAD) => slots::list(state).await,
        (Route::Slots, Method::POST) => slots::create(state, collect_body(body).await?).await,
        (Route::Schedule(id), Method::GET | Method::HEAD) => schedules::show(state, id).await,
        (Route::Schedule(id), Method::POST) => {
            schedules::update(state, id, collect_body(body).await?).await
        }
        (Route::Script, Method::GET | Method::HEAD) => {
            Ok(static_files::schmatch_js(&parts.headers))
        }
        _ => Err(AppError::MethodNotAllowed),
    }
}

/// Answers one request. Failures are rendered as error pages, so this never
/// fails itself.
pub async fn handle<B>(request: Request<B>, state: AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<AppError>,
{
    let span = info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path()
    );
    async move {
        match route(request, &state).await {
            Ok(response) => {
                debug!(status = %response.status(), "handled request");
                response
            }
            Err(app_error) => {
                let status = app_error.status_code();
                if status.is_server_error() {
                    error!(%status, "{app_error}");
                } else {
                    debug!(%status, "{app_error}");
                }
                app_error.into_response(&state.templates)
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn run_server(
    config: &Config,
) -> Result<impl Future<Output = Result<(), AppError>>, AppError> {
    let state = setup_server(config)?;

    let listener = TcpListener::bind(config.listen_address).await?;

    // tell the connections to shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let shutdown_tx = Arc::new(shutdown_tx);

    // wait for the connections to finish shutdown
    let (closed_tx, closed_rx) = watch::channel(());

    info!("listening on http://{}", config.listen_address);

    Ok(async move {
        let shutdown = shutdown_signal();
        pin_mut!(shutdown);

        #[allow(clippy::redundant_pub_crate)]
        loop {
            select! {
                accept = listener.accept() => {
                    let (socket, remote_addr) = match accept {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!("failed to accept connection: {err}");
                            continue;
                        }
                    };

                    let state = state.clone();
                    let shutdown_tx = Arc::clone(&shutdown_tx);
                    let closed_rx = closed_rx.clone();

                    tokio::spawn(async move {
                        let socket = TokioIo::new(socket);

                        let hyper_service = hyper::service::service_fn(move |request: Request<Incoming>| {
                            let state = state.clone();
                            async move { Ok::<_, Infallible>(handle(request, state).await) }
                        });

                        let builder = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
                        let connection = builder.serve_connection(socket, hyper_service);
                        pin_mut!(connection);

                        let result = select! {
                            result = connection.as_mut() => result,
                            () = shutdown_tx.closed() => {
                                connection.as_mut().graceful_shutdown();
                                connection.as_mut().await
                            }
                        };
                        if let Err(err) = result {
                            debug!(%remote_addr, "failed to serve connection: {err:#}");
                        }

                        drop(closed_rx);
                    });
                }
                () = &mut shutdown => {
                    info!("shutting down...");
                    drop(shutdown_rx); // initiate shutdown
                    drop(closed_rx);
                    closed_tx.closed().await;
                    break;
                }
            }
        }

        Ok(())
    })
}

#[allow(clippy::redundant_pub_crate)]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            core::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {err}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
