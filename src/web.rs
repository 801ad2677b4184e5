use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::aggregate::month_end;
use crate::config::{DashboardConfig, ViewDefaults};
use crate::error::QueryError;
use crate::filter::parse_bound;
use crate::loader::Dataset;
use crate::selection::{detail_for, headline_for, price_info, ClickEvent, DetailPanel, HeadlineDetail, PriceInfo, Selection};
use crate::types::{MonthlyBucket, SentimentComposition, SentimentSelector, ViewQuery};
use crate::views::{self, LineView};

pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub defaults: ViewDefaults,
}

// ── Request / Response Types ──

/// Widget values as query parameters. Missing values fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewParams {
    pub stock: Option<String>,
    pub sentiment: Option<String>,
    pub threshold: Option<f64>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeadlineParams {
    pub stock: Option<String>,
    pub date: String,
}

/// Range parameters plus the clicked month.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceInfoParams {
    pub stock: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub month: String,
}

#[derive(Debug, Serialize)]
pub struct StocksResponse {
    pub stocks: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub default_stock: Option<String>,
    pub default_sentiment: &'static str,
    pub default_threshold: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyResponse {
    pub stock: String,
    pub buckets: Vec<MonthlyBucket>,
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    #[serde(flatten)]
    view: ViewParams,
    click: Option<ClickEvent>,
}

#[derive(Debug, Serialize)]
struct SessionReply {
    selection: Selection,
    detail: DetailPanel,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(QueryError),
    NoData,
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::BadRequest(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::NoData => (StatusCode::NOT_FOUND, "dataset is empty".to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl ViewParams {
    pub fn resolve(&self, state: &AppState) -> Result<ViewQuery, ApiError> {
        let base = state.defaults.resolve(&state.dataset).ok_or(ApiError::NoData)?;
        let selector = match &self.sentiment {
            Some(s) => s.parse::<SentimentSelector>().map_err(QueryError::InvalidSentiment)?,
            None => base.selector,
        };
        Ok(ViewQuery {
            stock: self.stock.clone().unwrap_or(base.stock),
            selector,
            threshold: self.threshold.unwrap_or(base.threshold),
            start: self.start.as_deref().map(parse_bound).transpose()?.unwrap_or(base.start),
            end: self.end.as_deref().map(parse_bound).transpose()?.unwrap_or(base.end),
        })
    }
}

// ── Server ──

pub fn router(state: Arc<AppState>, static_dir: &std::path::Path) -> Router {
    Router::new()
        .route("/api/stocks", get(stocks_handler))
        .route("/api/line", get(line_handler))
        .route("/api/compound", get(compound_handler))
        .route("/api/composition", get(composition_handler))
        .route("/api/headline", get(headline_handler))
        .route("/api/price-info", get(price_info_handler))
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: DashboardConfig, dataset: Dataset) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState {
        dataset: Arc::new(dataset),
        defaults: config.view.clone(),
    });
    let app = router(state, &config.static_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    info!(port = config.port, "dashboard at http://localhost:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ──

pub async fn stocks_handler(State(state): State<Arc<AppState>>) -> Json<StocksResponse> {
    let bounds = state.dataset.date_bounds();
    let base = state.defaults.resolve(&state.dataset);
    Json(StocksResponse {
        stocks: state.dataset.symbols().into_iter().map(str::to_string).collect(),
        start: bounds.map(|(s, _)| s),
        end: bounds.map(|(_, e)| e),
        default_stock: base.map(|q| q.stock),
        default_sentiment: state.defaults.selector.label(),
        default_threshold: state.defaults.threshold,
    })
}

pub async fn line_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Json<LineView>, ApiError> {
    let query = params.resolve(&state)?;
    Ok(Json(views::line_view(&state.dataset, &query)))
}

pub async fn compound_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Json<MonthlyResponse>, ApiError> {
    let query = params.resolve(&state)?;
    let buckets = views::monthly_view(&state.dataset, &query.stock, query.start, query.end);
    Ok(Json(MonthlyResponse { stock: query.stock, buckets }))
}

pub async fn composition_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewParams>,
) -> Result<Json<Option<SentimentComposition>>, ApiError> {
    let query = params.resolve(&state)?;
    Ok(Json(views::composition_view(&state.dataset, &query.stock, query.start, query.end)))
}

pub async fn headline_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HeadlineParams>,
) -> Result<Json<HeadlineDetail>, ApiError> {
    let date = parse_bound(&params.date)?;
    let stock = match params.stock {
        Some(s) => s,
        None => state.defaults.resolve(&state.dataset).ok_or(ApiError::NoData)?.stock,
    };
    Ok(Json(headline_for(&state.dataset, &stock, date)))
}

pub async fn price_info_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceInfoParams>,
) -> Result<Json<Option<PriceInfo>>, ApiError> {
    let view = ViewParams {
        stock: params.stock,
        start: params.start,
        end: params.end,
        ..Default::default()
    };
    let query = view.resolve(&state)?;
    let month = month_end(parse_bound(&params.month)?);
    let buckets = views::monthly_view(&state.dataset, &query.stock, query.start, query.end);
    Ok(Json(price_info(&buckets, month)))
}

// ── Session Socket ──

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One selection per connection; every click replaces it.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut selection = Selection::default();

    while let Some(Ok(msg)) = socket.recv().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let reply = match handle_session_message(&state, &mut selection, &text) {
            Ok(reply) => serde_json::to_string(&reply),
            Err(e) => {
                warn!(error = %e, "rejected session message");
                serde_json::to_string(&serde_json::json!({ "error": e }))
            }
        };
        let Ok(json) = reply else { continue };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
    debug!("session closed");
}

fn handle_session_message(state: &AppState, selection: &mut Selection, text: &str) -> Result<SessionReply, String> {
    let request: SessionRequest = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let query = request.view.resolve(state).map_err(|e| match e {
        ApiError::BadRequest(q) => q.to_string(),
        ApiError::NoData => "dataset is empty".to_string(),
    })?;
    if let Some(click) = request.click {
        *selection = selection.click(click);
    }

    let buckets = views::monthly_view(&state.dataset, &query.stock, query.start, query.end);
    Ok(SessionReply {
        selection: *selection,
        detail: detail_for(&state.dataset, &query.stock, &buckets, *selection),
    })
}
