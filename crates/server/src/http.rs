//! axum routes, error envelope mapping, and middleware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use meigen_core::{
    DataAccessError, IntegrityReport, Quote, QuoteServiceError, QuoteSource, ValidationError,
};
use meigen_proto::{
    ApiResponse, ErrorResponse, QuoteListParams, CODE_INVALID_QUERY_PARAMETER, CODE_NOT_FOUND,
    CODE_VALIDATION_ERROR, ROUTE_ADMIN_CACHE, ROUTE_ADMIN_CACHE_INVALIDATE, ROUTE_ADMIN_INTEGRITY,
    ROUTE_HEALTHZ, ROUTE_QUOTES, ROUTE_QUOTES_AUTHORS, ROUTE_QUOTES_BY_AUTHOR,
    ROUTE_QUOTES_BY_CATEGORY, ROUTE_QUOTES_CATEGORIES, ROUTE_QUOTES_RANDOM, ROUTE_QUOTE_BY_ID,
    ROUTE_ROOT,
};
use serde_json::json;
use tracing::{debug, error, Instrument};

use crate::cache::CacheStatus;
use crate::pagination::PageRequest;
use crate::query::QuoteService;
use crate::{CorsPolicy, ServerOptions};

/// An error already resolved to its HTTP status and envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, CODE_INVALID_QUERY_PARAMETER, message)
    }

    fn route_not_found(method: &Method, uri: &Uri) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            CODE_NOT_FOUND,
            format!("Route {method} {} not found", uri.path()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.body.error.code
    }

    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }
}

pub fn data_access_status(err: &DataAccessError) -> StatusCode {
    match err {
        DataAccessError::FileNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DataAccessError> for ApiError {
    fn from(err: DataAccessError) -> Self {
        let mut api = Self::new(data_access_status(&err), err.code(), err.to_string());
        if let DataAccessError::ValidationFailed(v) = &err {
            api.body = api.body.with_details(json!(v));
        }
        api
    }
}

impl From<QuoteServiceError> for ApiError {
    fn from(err: QuoteServiceError) -> Self {
        let message = err.to_string();
        match err {
            QuoteServiceError::Initialization(inner) => {
                let mut api = Self::from(inner);
                api.body.error.message = message;
                api
            }
            QuoteServiceError::InvalidQuoteId(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.code(), message)
            }
            QuoteServiceError::NoQuotesAvailable | QuoteServiceError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, err.code(), message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let details = json!(err);
        let mut api = Self::new(StatusCode::BAD_REQUEST, CODE_VALIDATION_ERROR, err.to_string());
        api.body = api.body.with_details(details);
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), code = %self.body.error.code, message = %self.body.error.message, "request failed");
        } else {
            debug!(status = self.status.as_u16(), code = %self.body.error.code, "request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub(crate) struct AppState<S> {
    service: QuoteService<S>,
    options: Arc<ServerOptions>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            options: Arc::clone(&self.options),
        }
    }
}

pub(crate) fn router<S>(service: QuoteService<S>, options: ServerOptions) -> Router
where
    S: QuoteSource + Send + Sync + 'static,
{
    let cors = Arc::new(options.cors.clone());
    let request_seq = Arc::new(AtomicU64::new(1));
    let state = AppState {
        service,
        options: Arc::new(options),
    };
    Router::new()
        .route(ROUTE_ROOT, get(root))
        .route(ROUTE_HEALTHZ, get(healthz))
        .route(ROUTE_QUOTES, get(list_quotes::<S>))
        .route(ROUTE_QUOTES_RANDOM, get(random_quote::<S>))
        .route(ROUTE_QUOTES_CATEGORIES, get(categories::<S>))
        .route(ROUTE_QUOTES_AUTHORS, get(authors::<S>))
        .route(ROUTE_QUOTE_BY_ID, get(quote_by_id::<S>))
        .route(ROUTE_QUOTES_BY_CATEGORY, get(quotes_by_category::<S>))
        .route(ROUTE_QUOTES_BY_AUTHOR, get(quotes_by_author::<S>))
        .route(ROUTE_ADMIN_CACHE, get(cache_status::<S>))
        .route(ROUTE_ADMIN_CACHE_INVALIDATE, post(invalidate_cache::<S>))
        .route(ROUTE_ADMIN_INTEGRITY, get(integrity::<S>))
        .fallback(route_not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(cors, cors_middleware))
        .layer(middleware::from_fn_with_state(
            request_seq,
            request_tracing_middleware,
        ))
}

async fn root() -> &'static str {
    "名言 quotes API. Try GET /quotes/random"
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"ok": true}))
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::route_not_found(&method, &uri)
}

fn path_segment(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    path.map(|Path(raw)| raw)
        .map_err(|rej| ApiError::invalid_parameter(rej.body_text()))
}

async fn list_quotes<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<QuoteListParams>, QueryRejection>,
) -> ApiResult<Vec<Quote>>
where
    S: QuoteSource + Send + Sync + 'static,
{
    let Query(params) = query.map_err(|rej| ApiError::invalid_parameter(rej.body_text()))?;
    let page = PageRequest::parse(
        params.limit.as_deref(),
        params.offset.as_deref(),
        params.page.as_deref(),
        state.options.default_page_size,
    )
    .map_err(ApiError::invalid_parameter)?;
    let options = params.options().map_err(ApiError::invalid_parameter)?;
    let filters = params.filters();

    let quotes = if filters.is_empty() {
        state.service.all().await?
    } else {
        state.service.with_filters(&filters, options).await?
    };
    let (items, pagination) = page.apply(&quotes);
    Ok(Json(ApiResponse::paginated(items, pagination)))
}

async fn random_quote<S>(State(state): State<AppState<S>>) -> ApiResult<Quote>
where
    S: QuoteSource + Send + Sync + 'static,
{
    Ok(Json(ApiResponse::ok(state.service.random_quote().await?)))
}

async fn quote_by_id<S>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Quote>
where
    S: QuoteSource + Send + Sync + 'static,
{
    let raw = path_segment(path)?;
    let id = QuoteService::<S>::parse_id(&raw)?;
    Ok(Json(ApiResponse::ok(state.service.by_id(id).await?)))
}

async fn quotes_by_category<S>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Vec<Quote>>
where
    S: QuoteSource + Send + Sync + 'static,
{
    let category = path_segment(path)?;
    Ok(Json(ApiResponse::ok(
        state.service.by_category(&category).await?,
    )))
}

async fn quotes_by_author<S>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Vec<Quote>>
where
    S: QuoteSource + Send + Sync + 'static,
{
    let author = path_segment(path)?;
    Ok(Json(ApiResponse::ok(state.service.by_author(&author).await?)))
}

async fn categories<S>(State(state): State<AppState<S>>) -> ApiResult<Vec<String>>
where
    S: QuoteSource + Send + Sync + 'static,
{
    state.service.initialize().await?;
    Ok(Json(ApiResponse::ok(state.service.available_categories())))
}

async fn authors<S>(State(state): State<AppState<S>>) -> ApiResult<Vec<String>>
where
    S: QuoteSource + Send + Sync + 'static,
{
    state.service.initialize().await?;
    Ok(Json(ApiResponse::ok(state.service.available_authors())))
}

async fn cache_status<S>(State(state): State<AppState<S>>) -> ApiResult<CacheStatus>
where
    S: QuoteSource + Send + Sync + 'static,
{
    Ok(Json(ApiResponse::ok(state.service.status())))
}

async fn invalidate_cache<S>(State(state): State<AppState<S>>) -> ApiResult<CacheStatus>
where
    S: QuoteSource + Send + Sync + 'static,
{
    state.service.invalidate();
    Ok(Json(ApiResponse::ok(state.service.status())))
}

async fn integrity<S>(State(state): State<AppState<S>>) -> ApiResult<IntegrityReport>
where
    S: QuoteSource + Send + Sync + 'static,
{
    Ok(Json(ApiResponse::ok(
        state.service.integrity_report().await?,
    )))
}

fn allowed_origin(headers: &HeaderMap, policy: &CorsPolicy) -> Option<HeaderValue> {
    let origin = headers.get("origin")?.to_str().ok()?.trim();
    if origin.is_empty() || origin.len() > 256 {
        return None;
    }
    policy
        .allowed_origins
        .iter()
        .any(|allowed| allowed == origin)
        .then(|| HeaderValue::from_str(origin).ok())
        .flatten()
}

fn insert_list(headers: &mut HeaderMap, name: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    if let Ok(v) = HeaderValue::from_str(&values.join(", ")) {
        headers.insert(name, v);
    }
}

async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = allowed_origin(req.headers(), &policy);

    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = origin {
            let headers = resp.headers_mut();
            headers.insert("access-control-allow-origin", origin);
            headers.insert("vary", HeaderValue::from_static("Origin"));
            insert_list(headers, "access-control-allow-methods", &policy.allow_methods);
            insert_list(headers, "access-control-allow-headers", &policy.allow_headers);
            headers.insert("access-control-max-age", HeaderValue::from(policy.max_age_secs));
            if policy.allow_credentials {
                headers.insert(
                    "access-control-allow-credentials",
                    HeaderValue::from_static("true"),
                );
            }
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if let Some(origin) = origin {
        let headers = resp.headers_mut();
        headers.insert("access-control-allow-origin", origin);
        headers.insert("vary", HeaderValue::from_static("Origin"));
        insert_list(headers, "access-control-expose-headers", &policy.expose_headers);
        if policy.allow_credentials {
            headers.insert(
                "access-control-allow-credentials",
                HeaderValue::from_static("true"),
            );
        }
    }
    resp
}

fn request_id(headers: &HeaderMap, seq: &AtomicU64) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128 && v.bytes().all(|b| b.is_ascii_graphic()))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("req-{:08x}", seq.fetch_add(1, Ordering::Relaxed)))
}

async fn request_tracing_middleware(
    State(seq): State<Arc<AtomicU64>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let request_id = request_id(req.headers(), &seq);
    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %req.method(),
        route = %req.uri().path(),
    );

    let mut resp = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert("x-request-id", value);
    }
    resp
}
