use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    daily_log::{DailyLog, ReportRequest},
    error::AppError,
    state::AppContext,
};

pub async fn serve(ctx: AppContext) -> anyhow::Result<()> {
    let addr: SocketAddr = ctx.config().server.addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, ctx).await
}

pub async fn serve_with_listener(listener: TcpListener, ctx: AppContext) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "server listening");

    let app = router(ctx.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(ctx))
        .await?;

    Ok(())
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/log", post(save_log))
        .route("/log/:date", get(load_log))
        .route("/logs", get(list_logs))
        .route("/generate-report", post(generate_report))
        .layer(TraceLayer::new_for_http())
        // The desktop frontend calls from its own origin.
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn shutdown_signal(ctx: AppContext) {
    ctx.shutdown_notifier().notified().await;
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct SaveLogResponse {
    message: &'static str,
    file: String,
}

async fn save_log(
    State(ctx): State<AppContext>,
    Json(log): Json<DailyLog>,
) -> Result<Json<SaveLogResponse>, AppError> {
    let file = ctx.store().save(&log).await?;
    Ok(Json(SaveLogResponse {
        message: "Log saved successfully",
        file,
    }))
}

async fn load_log(
    State(ctx): State<AppContext>,
    Path(date): Path<String>,
) -> Result<Json<DailyLog>, AppError> {
    let log = ctx.store().load(&date).await?;
    Ok(Json(log))
}

#[derive(Debug, Serialize)]
struct LogListResponse {
    dates: Vec<String>,
}

async fn list_logs(State(ctx): State<AppContext>) -> Result<Json<LogListResponse>, AppError> {
    let dates = ctx.store().list().await?;
    Ok(Json(LogListResponse { dates }))
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    report: String,
}

async fn generate_report(
    State(ctx): State<AppContext>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    let report = ctx.reports().generate(&request).await?;
    Ok(Json(ReportResponse { report }))
}
