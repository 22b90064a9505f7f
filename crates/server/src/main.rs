use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use shared::{
    domain::{Product, ProductId},
    error::{ApiError, ErrorCode},
    protocol::{
        DashboardSummary, LoginRequest, LoginResponse, MessageResponse, ProductDeleted,
        ProductDraft, ProductPatch, ProductQuery, SetupRequest, SetupResponse,
    },
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod guard;
mod pages;
mod session;

use api::{status_for, ApiContext};
use app_state::AppState;
use config::{load_settings, prepare_database_url, DEV_JWT_SECRET};
use session::{cleared_session_cookie, session_cookie, SessionClaims, SessionDelivery};

const MAX_BODY_BYTES: usize = 1024 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[derive(Debug, Serialize)]
struct ProtectedResponse {
    message: String,
    user: SessionClaims,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    if settings.jwt_secret == DEV_JWT_SECRET {
        warn!("JWT secret not configured, using the development fallback");
    }

    let storage = match settings.database_url.as_deref() {
        Some(raw) => {
            let database_url = prepare_database_url(raw)?;
            let storage = Storage::new(&database_url).await.map_err(|error| {
                error!(
                    %database_url,
                    %error,
                    "failed to open SQLite database; verify parent directory exists and permissions are correct"
                );
                error
            })?;
            Some(storage)
        }
        None => {
            warn!("no database configured; catalog and admin routes will answer 503");
            None
        }
    };

    let api = ApiContext {
        storage,
        session: settings.session(),
        password_hash_cost: settings.password_hash_cost,
    };
    let mut app = build_router(Arc::new(AppState { api }));
    if let Some(cors) = cors_layer(settings.allow_origin.as_deref())? {
        app = app.layer(cors);
    }

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let admin_pages: Router<Arc<AppState>> = Router::new()
        .route("/admin", get(pages::login_page))
        .route("/admin/dashboard", get(pages::dashboard_page))
        .route("/admin/products", get(pages::products_page))
        .route("/admin/products/new", get(pages::new_product_page))
        .route("/admin/products/:id/edit", get(pages::edit_product_page))
        .route_layer(middleware::from_fn(guard::admin_guard));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/login", post(http_login))
        .route("/api/logout", post(http_logout))
        .route("/api/admin/setup", post(http_setup_admin))
        .route("/api/admin/dashboard", get(http_dashboard))
        .route("/api/protected", get(http_protected))
        .route(
            "/api/products",
            get(http_list_products).post(http_create_product),
        )
        .route(
            "/api/products/:id",
            get(http_get_product)
                .put(http_update_product)
                .delete(http_delete_product),
        )
        .merge(admin_pages)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

/// `*` allows any origin without credentials; a concrete origin also allows
/// the session cookie.
fn cors_layer(allow_origin: Option<&str>) -> anyhow::Result<Option<CorsLayer>> {
    let Some(origin) = allow_origin.map(str::trim).filter(|o| !o.is_empty()) else {
        return Ok(None);
    };
    if origin == "*" {
        return Ok(Some(CorsLayer::permissive()));
    }
    let origin = HeaderValue::from_str(origin)?;
    Ok(Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    ))
}

fn reject(err: ApiError) -> HttpError {
    (status_for(err.code), Json(err))
}

fn bad_request(rejection: impl std::fmt::Display) -> HttpError {
    reject(ApiError::new(ErrorCode::Validation, rejection.to_string()))
}

/// `ok` when the store answers or none is configured.
async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    if let Some(storage) = state.api.storage.as_ref() {
        storage.health_check().await.map_err(|error| {
            warn!(%error, "health check failed");
            reject(ApiError::new(ErrorCode::Unavailable, "database unreachable"))
        })?;
    }
    Ok("ok")
}

async fn http_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    let Json(req) = payload.map_err(bad_request)?;
    let (admin, token) = api::login(&state.api, &req).await.map_err(reject)?;

    let session = &state.api.session;
    let mut body = LoginResponse {
        message: "Login realizado com sucesso".into(),
        user: admin.summary(),
        token: None,
    };
    match session.delivery {
        SessionDelivery::Body => {
            body.token = Some(token);
            Ok(Json(body).into_response())
        }
        SessionDelivery::Cookie => {
            let cookie = HeaderValue::from_str(&session_cookie(session, &token)).map_err(|e| {
                error!(error = %e, "session cookie is not a valid header value");
                reject(ApiError::new(ErrorCode::Internal, "Erro no servidor"))
            })?;
            Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
        }
    }
}

async fn http_logout(State(state): State<Arc<AppState>>) -> Response {
    let body = Json(MessageResponse::new("Logout realizado com sucesso"));
    match HeaderValue::from_str(&cleared_session_cookie(&state.api.session)) {
        Ok(cookie) => ([(header::SET_COOKIE, cookie)], body).into_response(),
        Err(_) => body.into_response(),
    }
}

async fn http_setup_admin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SetupResponse>), HttpError> {
    let Json(req) = payload.map_err(bad_request)?;
    let user = api::setup_admin(&state.api, &req).await.map_err(reject)?;
    Ok((
        StatusCode::CREATED,
        Json(SetupResponse {
            message: "Usuário administrador criado com sucesso".into(),
            user,
        }),
    ))
}

async fn http_protected(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProtectedResponse>, HttpError> {
    let claims = api::authorize(&state.api, &headers).map_err(reject)?;
    Ok(Json(ProtectedResponse {
        message: "Acesso autorizado".into(),
        user: claims,
    }))
}

async fn http_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardSummary>, HttpError> {
    api::authorize(&state.api, &headers).map_err(reject)?;
    let summary = api::dashboard(&state.api).await.map_err(reject)?;
    Ok(Json(summary))
}

async fn http_list_products(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, HttpError> {
    let products = api::list_products(&state.api, &q).await.map_err(reject)?;
    Ok(Json(products))
}

async fn http_get_product(
    State(state): State<Arc<AppState>>,
    product_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, HttpError> {
    let Path(product_id) = product_id.map_err(bad_request)?;
    let product = api::get_product(&state.api, ProductId(product_id))
        .await
        .map_err(reject)?;
    Ok(Json(product))
}

async fn http_create_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), HttpError> {
    api::authorize(&state.api, &headers).map_err(reject)?;
    let Json(draft) = payload.map_err(bad_request)?;
    let product = api::create_product(&state.api, draft)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn http_update_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    product_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>, HttpError> {
    api::authorize(&state.api, &headers).map_err(reject)?;
    let Path(product_id) = product_id.map_err(bad_request)?;
    let Json(patch) = payload.map_err(bad_request)?;
    let product = api::update_product(&state.api, ProductId(product_id), patch)
        .await
        .map_err(reject)?;
    Ok(Json(product))
}

async fn http_delete_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    product_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProductDeleted>, HttpError> {
    api::authorize(&state.api, &headers).map_err(reject)?;
    let Path(product_id) = product_id.map_err(bad_request)?;
    let product_id = ProductId(product_id);
    api::delete_product(&state.api, product_id)
        .await
        .map_err(reject)?;
    Ok(Json(ProductDeleted {
        message: "Produto removido com sucesso".into(),
        id: product_id,
    }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
