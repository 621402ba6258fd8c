//! Handler模块

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::models::{Comment, Project};
use common::response::{Envelope, ErrorBody};
use crate::pool_manager::PoolStats;
use crate::service::ListingService;
use crate::state::AppState;

/// 列出全部基础设施项目
#[utoipa::path(
    get,
    path = "/",
    tag = "listings",
    responses(
        (status = 200, description = "项目列表", body = Envelope<Project>),
        (status = 500, description = "数据库错误或查询无结果", body = ErrorBody)
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Project>>, AppError> {
    let service =
        ListingService::new(state.executor).with_empty_policy(state.empty_policy);
    let envelope = service.projects().await?;
    Ok(Json(envelope))
}

/// 列出全部公众评论
#[utoipa::path(
    get,
    path = "/comments",
    tag = "listings",
    responses(
        (status = 200, description = "评论列表", body = Envelope<Comment>),
        (status = 500, description = "数据库错误或查询无结果", body = ErrorBody)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Comment>>, AppError> {
    let service =
        ListingService::new(state.executor).with_empty_policy(state.empty_policy);
    let envelope = service.comments().await?;
    Ok(Json(envelope))
}

/// 健康检查端点，不访问数据库
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行状态", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool = state.pool_manager.stats().await;
    Json(HealthResponse {
        status: if pool.ready { "healthy" } else { "degraded" }.to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        pool,
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub pool: PoolStats,
}
