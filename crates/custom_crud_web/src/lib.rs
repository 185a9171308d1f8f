//! HTTP surface for the admin CRUD page.
//!
//! # Responsibility
//! - Register the admin page and submission routes on an `axum::Router`.
//! - Extract the host-asserted principal from request headers.
//! - Translate controller responses into HTTP responses.
//!
//! # Invariants
//! - The connection lock is taken and released inside one synchronous call;
//!   it is never held across an `.await`.
//! - All behavior lives in `custom_crud_core::AdminController`; handlers only adapt.

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use custom_crud_core::admin::action::SubmitMethod;
use custom_crud_core::{
    open_db, AdminController, AdminPageQuery, AdminPostRequest, AdminPrincipal, AdminResponse,
    AppConfig, ConfigError, DbError,
};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Shared state behind every handler.
pub struct AppState {
    conn: Mutex<Connection>,
    controller: AdminController,
    user_header: String,
    capabilities_header: String,
}

impl AppState {
    /// Wraps a provisioned connection and a controller bound to its table.
    pub fn new(
        conn: Connection,
        controller: AdminController,
        user_header: impl Into<String>,
        capabilities_header: impl Into<String>,
    ) -> Self {
        Self {
            conn: Mutex::new(conn),
            controller,
            user_header: user_header.into(),
            capabilities_header: capabilities_header.into(),
        }
    }

    /// Opens the configured database and builds the controller.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServerError> {
        let controller = AdminController::from_config(config)?;
        let conn = open_db(&config.database.path, controller.table())?;
        Ok(Self::new(
            conn,
            controller,
            config.security.user_header.as_str(),
            config.security.capabilities_header.as_str(),
        ))
    }

    fn principal(&self, headers: &HeaderMap) -> AdminPrincipal {
        let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
        AdminPrincipal::from_host_values(
            header(&self.user_header),
            header(&self.capabilities_header),
        )
    }

    fn with_conn(&self, run: impl FnOnce(&Connection) -> AdminResponse) -> AdminResponse {
        let guard = self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("event=db_lock module=web status=recovered reason=poisoned");
            self.conn.clear_poison();
            poisoned.into_inner()
        });
        run(&*guard)
    }
}

/// Server startup and runtime failures.
#[derive(Debug)]
pub enum ServerError {
    Config(ConfigError),
    Db(DbError),
    Bind {
        addr: String,
        source: std::io::Error,
    },
    Serve(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "config error: {err}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Bind { addr, source } => write!(f, "cannot bind `{addr}`: {source}"),
            Self::Serve(err) => write!(f, "http server failed: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Bind { source, .. } => Some(source),
            Self::Serve(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for ServerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Builds the router with the admin page on `page_path` and both
/// submission methods on `post_path`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = state.controller.routes();
    let page_path = routes.page_path().to_string();
    let post_path = routes.post_path().to_string();

    Router::new()
        .route(&page_path, get(admin_page))
        .route(&post_path, get(submit_get).post(submit_post))
        .with_state(state)
}

/// Serves the router on an already bound listener until `shutdown` resolves.
pub async fn serve_with_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

/// Provisions storage, binds `server.bind` and serves until Ctrl-C.
pub async fn serve(config: &AppConfig) -> Result<(), ServerError> {
    let state = Arc::new(AppState::from_config(config)?);
    let addr = config.server.bind.clone();
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let local = listener
        .local_addr()
        .map_or_else(|_| addr.clone(), |local| local.to_string());
    info!(
        "event=server_start module=web status=ok bind={} page_path={} post_path={}",
        local,
        state.controller.routes().page_path(),
        state.controller.routes().post_path()
    );

    serve_with_listener(listener, state, shutdown_signal()).await?;
    info!("event=server_stop module=web status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_signal module=web status=error error={err}");
        std::future::pending::<()>().await;
    }
}

async fn admin_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<AdminPageQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return into_http(AdminResponse::BadRequest("malformed query"));
    };
    let principal = state.principal(&headers);
    into_http(state.with_conn(|conn| state.controller.admin_page(conn, &principal, &query)))
}

async fn submit_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<AdminPostRequest>, QueryRejection>,
) -> Response {
    let Ok(Query(request)) = query else {
        return into_http(AdminResponse::BadRequest("malformed query"));
    };
    submit(&state, &headers, SubmitMethod::Get, &request)
}

async fn submit_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<AdminPostRequest>, FormRejection>,
) -> Response {
    let Ok(Form(request)) = form else {
        return into_http(AdminResponse::BadRequest("malformed form body"));
    };
    submit(&state, &headers, SubmitMethod::Post, &request)
}

fn submit(
    state: &AppState,
    headers: &HeaderMap,
    method: SubmitMethod,
    request: &AdminPostRequest,
) -> Response {
    let principal = state.principal(headers);
    into_http(state.with_conn(|conn| state.controller.submit(conn, &principal, method, request)))
}

fn into_http(response: AdminResponse) -> Response {
    match response {
        AdminResponse::Page(html) => Html(html).into_response(),
        AdminResponse::Redirect(location) => Redirect::to(&location).into_response(),
        AdminResponse::Forbidden => (
            StatusCode::FORBIDDEN,
            "Sorry, you are not allowed to access this page.",
        )
            .into_response(),
        AdminResponse::NotFound => (StatusCode::NOT_FOUND, "Not found.").into_response(),
        AdminResponse::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
        AdminResponse::InternalError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "The records could not be loaded.",
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::AppState;
    use custom_crud_core::{open_db_in_memory, AdminController, AdminResponse, AppConfig};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn state() -> AppState {
        let config = AppConfig::default();
        let controller = AdminController::from_config(&config).unwrap();
        let conn = open_db_in_memory(controller.table()).unwrap();
        AppState::new(conn, controller, "x-host-user", "x-host-capabilities")
    }

    #[test]
    fn panicked_request_does_not_wedge_the_connection() {
        let state = state();
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = state.conn.lock();
            panic!("handler panicked while holding the connection");
        }));
        assert!(state.conn.is_poisoned());

        let response = state.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM wp_custom_crud;", [], |row| row.get(0))
                .unwrap();
            AdminResponse::Page(count.to_string())
        });
        assert_eq!(response, AdminResponse::Page("0".to_string()));
        assert!(!state.conn.is_poisoned());
    }
}
