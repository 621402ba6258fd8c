//! 基础设施项目与公众评论查询服务
//!
//! 提供两个只读列表接口：
//! - `GET /` 项目列表
//! - `GET /comments` 评论列表
//!
//! 每个请求通过共享连接池执行固定 SQL，结果映射为文本字段并附带耗时信息。

mod executor;
mod handlers;
mod pool_manager;
mod routes;
mod service;
mod state;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "project-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "项目查询服务 API",
        version = "0.1.0",
        description = "基础设施项目与公众评论只读查询微服务"
    ),
    paths(
        handlers::list_projects,
        handlers::list_comments,
        handlers::health_check,
    ),
    components(schemas(
        common::models::Project,
        common::models::Comment,
        common::response::ErrorBody,
        handlers::HealthResponse,
        pool_manager::PoolStats,
    )),
    tags(
        (name = "listings", description = "列表查询端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

fn main() -> anyhow::Result<()> {
    // .env 必须在运行时的工作线程启动前加载
    let dotenv = dotenvy::dotenv().ok();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("创建 Tokio 运行时失败")?
        .block_on(run(dotenv))
}

async fn run(dotenv: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Some(path) = dotenv {
        info!(path = %path.display(), "已加载 .env 文件");
    }

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载配置失败")?;

    // 创建应用状态并初始化连接池，失败则不启动服务
    let state = AppState::new(config.clone());
    state
        .pool_manager
        .initialize()
        .await
        .context("数据库连接池初始化失败")?;

    let app = create_router(state.clone());

    // 启动服务
    let addr = config.bind_addr();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        root_path = %config.root_path,
        "启动服务"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // 关闭连接池
    state.pool_manager.shutdown().await;
    served.context("服务运行失败")?;

    info!(service = SERVICE_NAME, "服务已停止");
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = routes::router().route("/api-docs/openapi.json", get(openapi_json));

    routes::with_root_path(api, &state.config.root_path)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// 等待 Ctrl+C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "无法监听 Ctrl+C 信号");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "无法监听 SIGTERM 信号");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("收到 Ctrl+C，开始优雅停机"),
        _ = terminate => warn!("收到 SIGTERM，开始优雅停机"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::errors::AppError;
    use common::models::{CellValue, RawRow};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::executor::testing::StubExecutor;
    use crate::executor::{FixedQuery, QueryExecutor};
    use crate::pool_manager::PoolManager;
    use crate::state::test_config;

    fn scenario_row() -> RawRow {
        RawRow::from(vec![
            CellValue::Int(101),
            "Main St".into(),
            "desc".into(),
            "Erie".into(),
            "0 to 1".into(),
            "AQ1".into(),
            "MRP1".into(),
            "CityA".into(),
            "Cat1".into(),
        ])
    }

    fn comment_row() -> RawRow {
        RawRow::from(vec![
            CellValue::Int(7),
            "Pat Doe".into(),
            "pat@example.com".into(),
            "Bucks".into(),
            "Please add a sidewalk".into(),
            "2023-11-02".into(),
            CellValue::Int(57_624),
        ])
    }

    fn app_with(executor: Arc<dyn QueryExecutor>, root_path: &str) -> Router {
        let mut config = test_config();
        config.root_path = root_path.to_string();
        let pool_manager = Arc::new(PoolManager::new(config.clone()));
        create_router(AppState::with_executor(config, pool_manager, executor))
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn elapsed_seconds(body: &Value) -> f64 {
        body["message"]
            .as_str()
            .and_then(|m| m.strip_suffix(" seconds"))
            .and_then(|s| s.parse().ok())
            .expect("timing message")
    }

    #[tokio::test]
    async fn test_projects_scenario() {
        let stub = StubExecutor::default().with_rows(FixedQuery::Projects, vec![scenario_row()]);
        let (status, body) = send_get(app_with(Arc::new(stub), ""), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!([{
                "id": "101",
                "road_name": "Main St",
                "description": "desc",
                "county": "Erie",
                "limits": "0 to 1",
                "aqcode": "AQ1",
                "mrp": "MRP1",
                "municipalities": "CityA",
                "category": "Cat1",
                "type": "Other"
            }])
        );
        assert!(elapsed_seconds(&body) >= 0.0);
    }

    #[tokio::test]
    async fn test_comments_listing() {
        let stub = StubExecutor::default().with_rows(FixedQuery::Comments, vec![comment_row()]);
        let (status, body) = send_get(app_with(Arc::new(stub), ""), "/comments").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["comment_id"], "7");
        assert_eq!(body["data"][0]["mpms"], "57624");
        assert!(body["data"][0]
            .as_object()
            .unwrap()
            .values()
            .all(Value::is_string));
    }

    #[tokio::test]
    async fn test_empty_comments_is_server_error() {
        let (status, body) = send_get(app_with(Arc::new(StubExecutor::default()), ""), "/comments").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("data").is_none());
        assert_eq!(body["code"], "EMPTY_RESULT");
    }

    #[tokio::test]
    async fn test_empty_listing_allowed_by_config() {
        let mut config = test_config();
        config.allow_empty_results = true;
        let pool_manager = Arc::new(PoolManager::new(config.clone()));
        let state = AppState::with_executor(config, pool_manager, Arc::new(StubExecutor::default()));

        let (status, body) = send_get(create_router(state), "/comments").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_uninitialized_pool_is_server_error() {
        let config = test_config();
        let state = AppState::new(config);
        let app = create_router(state);

        let (status, body) = send_get(app.clone(), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "POOL_NOT_READY");

        let (status, body) = send_get(app, "/comments").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "POOL_NOT_READY");
    }

    #[tokio::test]
    async fn test_database_error_is_hidden_from_caller() {
        let stub = StubExecutor::default().failing(|| AppError::Database("FATAL: password authentication failed".into()));
        let (status, body) = send_get(app_with(Arc::new(stub), ""), "/").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert!(!body.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_timing_reflects_query_span_only() {
        let stub = StubExecutor::default()
            .with_rows(FixedQuery::Projects, vec![scenario_row()])
            .with_delay(Duration::from_millis(40));
        let app = app_with(Arc::new(stub), "")
            .layer(middleware::from_fn(|req: Request<Body>, next: middleware::Next| async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                next.run(req).await
            }));

        let (status, body) = send_get(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        let seconds = elapsed_seconds(&body);
        assert!(seconds >= 0.04, "query delay missing: {seconds}");
        assert!(seconds < 0.3, "request overhead leaked: {seconds}");
    }

    #[tokio::test]
    async fn test_root_path_prefix() {
        let stub = Arc::new(
            StubExecutor::default()
                .with_rows(FixedQuery::Projects, vec![scenario_row()])
                .with_rows(FixedQuery::Comments, vec![comment_row()]),
        );

        let (status, _) = send_get(app_with(stub.clone(), "/tip"), "/tip").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_get(app_with(stub.clone(), "/tip"), "/tip/comments").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_get(app_with(stub, "/tip"), "/comments").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_pool_state_without_querying() {
        let stub = Arc::new(StubExecutor::default());
        let (status, body) = send_get(app_with(stub.clone(), ""), "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["service"], "project-service");
        assert_eq!(body["pool"]["ready"], false);
        assert_eq!(stub.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_openapi_lists_listing_paths() {
        let (status, body) = send_get(app_with(Arc::new(StubExecutor::default()), ""), "/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/").is_some());
        assert!(body["paths"].get("/comments").is_some());
    }
}
