use crate::auth::{AuthGate, BearerTokenGate, require_auth};
use crate::error::AppError;
use crate::types::*;
use anyhow::Context;
use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use dbx_catalog::{
    ColumnAnalysis, DatabaseExplorer, DatabaseGroup, Overview, SearchOptions, SearchResult,
};
use dbx_core::DbxConfig;
use dbx_telemetry::{
    CatalogSpanAttributes, QuerySpanAttributes, trace_catalog_operation, trace_query_execution,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub explorer: Arc<DatabaseExplorer>,
    pub gate: Arc<dyn AuthGate>,
}

pub fn create_router(explorer: Arc<DatabaseExplorer>, gate: Arc<dyn AuthGate>) -> Router {
    let state = AppState { explorer, gate };

    let api = Router::new()
        .route("/tables", get(list_tables))
        .route("/overview", get(overview))
        .route("/tables/:table", get(describe_table))
        .route("/tables/:table/rows", get(table_rows))
        .route("/tables/:table/columns/:column/analysis", get(analyze_column))
        .route("/query", post(run_query))
        .route("/search", get(search))
        .route("/databases", get(databases))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health check endpoints
        .route("/health", get(health_check))
        .route("/readiness", get(readiness_check))
        // API endpoints
        .nest("/api/v1", api)
        // Middleware layers (applied in reverse order)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped
pub async fn serve(config: &DbxConfig) -> anyhow::Result<()> {
    let explorer = Arc::new(DatabaseExplorer::from_config(config)?);
    if config.auth.admin_token.is_none() {
        tracing::warn!("No admin token configured, every API request will be refused");
    }
    let gate: Arc<dyn AuthGate> = Arc::new(BearerTokenGate::new(config.auth.admin_token.clone()));

    let app = create_router(explorer, gate);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(address = %address, "dbx server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint - returns OK if the service is running
async fn health_check() -> impl IntoResponse {
    tracing::debug!("Health check requested");
    (StatusCode::OK, "OK")
}

/// Readiness check endpoint - connects to the store if that has not happened yet
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    tracing::debug!("Readiness check requested");

    match state.explorer.provider().get_connection().await {
        Ok(_) => (StatusCode::OK, "READY".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

async fn list_tables(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let tables = observe(&state, "list_tables", "", state.explorer.list_tables()).await?;
    Ok(Json(tables))
}

async fn overview(State(state): State<AppState>) -> Result<Json<Overview>, AppError> {
    let overview = observe(&state, "overview", "", state.explorer.describe_overview()).await?;
    Ok(Json(overview))
}

async fn describe_table(
    Path(table): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TableDetailsResponse>, AppError> {
    let descriptor = observe(
        &state,
        "describe_table",
        &table,
        state.explorer.describe_table(&table),
    )
    .await?;

    Ok(Json(descriptor.into()))
}

async fn table_rows(
    Path(table): Path<String>,
    query: Result<Query<RowsQuery>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<Json<TableRowsResponse>, AppError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);
    if limit > MAX_PAGE_LIMIT {
        return Err(dbx_core::Error::InvalidArgument(format!(
            "limit must not exceed {}",
            MAX_PAGE_LIMIT
        ))
        .into());
    }

    let page = observe(
        &state,
        "page_table",
        &table,
        state.explorer.page(&table, limit, offset),
    )
    .await?;

    Ok(Json(TableRowsResponse {
        data: page.rows,
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

async fn run_query(
    State(state): State<AppState>,
    req: Result<Json<RunQueryRequest>, JsonRejection>,
) -> Result<Json<RunQueryResponse>, AppError> {
    let Json(req) = req?;
    let started = Instant::now();
    let outcome = state.explorer.execute(&req.sql).await;

    trace_query_execution(QuerySpanAttributes {
        backend: state.explorer.provider().backend().name().to_string(),
        sql: req.sql.clone(),
        row_count: outcome.as_ref().ok().map(|r| r.row_count),
        elapsed_ms: elapsed_ms(started),
        outcome: outcome_label(&outcome).to_string(),
    });

    let result = outcome?;
    Ok(Json(RunQueryResponse {
        data: result.rows,
        execution_time: result.execution_time_millis,
        row_count: result.row_count,
    }))
}

async fn search(
    query: Result<Query<SearchQuery>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SearchResult>>, AppError> {
    let Query(query) = query?;
    let options = SearchOptions {
        include_data: query.include_data,
        limit: query.limit,
    };
    let results = observe(
        &state,
        "search",
        "",
        state.explorer.search(&query.term, &options),
    )
    .await?;

    Ok(Json(results))
}

async fn analyze_column(
    Path((table, column)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ColumnAnalysis>, AppError> {
    let analysis = observe(
        &state,
        "analyze_column",
        &table,
        state.explorer.analyze(&table, &column),
    )
    .await?;

    Ok(Json(analysis))
}

async fn databases(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, DatabaseGroup>>, AppError> {
    let groups = observe(
        &state,
        "group_tables_by_prefix",
        "",
        state.explorer.group_tables_by_prefix(),
    )
    .await?;

    Ok(Json(groups))
}

/// Await one explorer operation and record it as a catalog span
async fn observe<T, F>(
    state: &AppState,
    operation: &str,
    table: &str,
    work: F,
) -> Result<T, AppError>
where
    F: Future<Output = dbx_core::Result<T>>,
{
    let started = Instant::now();
    let outcome = work.await;

    trace_catalog_operation(CatalogSpanAttributes {
        backend: state.explorer.provider().backend().name().to_string(),
        operation: operation.to_string(),
        table: table.to_string(),
        elapsed_ms: elapsed_ms(started),
        outcome: outcome_label(&outcome).to_string(),
    });

    outcome.map_err(AppError::from)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn outcome_label<T>(outcome: &dbx_core::Result<T>) -> &'static str {
    match outcome {
        Ok(_) => "ok",
        Err(dbx_core::Error::ForbiddenQuery(_)) => "forbidden",
        Err(e) if e.is_not_found() => "not_found",
        Err(_) => "error",
    }
}
