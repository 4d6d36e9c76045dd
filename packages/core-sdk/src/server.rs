use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, Method, StatusCode,
    },
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    config::GatewayConfig,
    db, email,
    error::GatewayError,
    models::{AnalysisRequest, AnalysisResponse, DispatchReceipt, EmailDispatchRequest, PhotoKind},
    prompts,
    settings::{self, SettingsCache},
    telemetry, vin, vision,
};

/**
 * \brief 网关共享状态：配置、设置缓存、出站 HTTP 客户端。
 * \details 三者都在启动时构造一次，之后随请求克隆（内部是 Arc / 连接池，克隆廉价）。
 */
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub settings: Arc<SettingsCache>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let settings = Arc::new(SettingsCache::new(&config.db_path, config.settings_ttl));
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            config,
            settings,
            http,
        })
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
}

/**
 * \brief 组装路由表。
 */
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai-analysis", post(analyze_photo).options(preflight))
        .route(
            "/api/send-maintenance-email",
            post(send_maintenance_email).options(preflight),
        )
        .route("/decode/{vin}", get(decode_vin))
        .route("/test", get(liveness))
        .fallback(not_found)
        .layer(cors_layer())
        .with_state(state)
}

/**
 * \brief 启动网关 HTTP 服务。
 * \param addr 监听地址，如 "127.0.0.1:8787"
 */
pub async fn run(addr: &str, config: GatewayConfig) -> Result<()> {
    let conn = db::open_db(&config.db_path)?;
    db::migrate(&conn)?;
    telemetry::set_enabled(db::get_telemetry_enabled(&conn).unwrap_or(false));
    drop(conn);

    let state = AppState::new(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Gateway listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/**
 * \brief 图片分析入口：POST /api/ai-analysis。
 * \details 校验顺序：请求体 JSON → 图片地址 → 授权头 → 取密钥 → 调上游。
 *          图片地址和授权头原文不落日志，只记截断值 / 长度。
 */
async fn analyze_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, GatewayError> {
    let Json(request) =
        payload.map_err(|rejection| GatewayError::Validation(rejection.body_text()))?;

    if request.image_url.trim().is_empty() {
        return Err(GatewayError::Validation("Image URL is required".to_string()));
    }
    let auth = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| GatewayError::Validation("Missing authorization header".to_string()))?;

    let kind = PhotoKind::from_hint(request.photo_type.as_deref());
    telemetry::log_event(
        "server.analysis",
        &format!(
            "imageUrl={} photoType={} auth_len={}",
            telemetry::truncate_for_log(&request.image_url, 100),
            kind,
            auth.as_bytes().len()
        ),
    );

    let api_key = settings::resolve_openai_api_key(&state.settings)?;
    telemetry::log_event(
        "server.analysis",
        &format!("api key retrieved, length={}", api_key.len()),
    );

    let prompt = prompts::select_prompt(kind);
    let analysis = vision::analyze_image(
        &state.http,
        &state.config.openai_api_base,
        &api_key,
        &request.image_url,
        prompt,
    )
    .await?;
    Ok(Json(AnalysisResponse { analysis }))
}

/**
 * \brief 维修邮件派发入口：POST /api/send-maintenance-email。
 */
async fn send_maintenance_email(
    State(state): State<AppState>,
    payload: Result<Json<EmailDispatchRequest>, JsonRejection>,
) -> Result<Json<DispatchReceipt>, GatewayError> {
    let Json(request) =
        payload.map_err(|rejection| GatewayError::Validation(rejection.body_text()))?;
    let data = request
        .email_data
        .ok_or_else(|| GatewayError::Validation("Email data is required".to_string()))?;

    let receipt = email::dispatch_maintenance_email(&state.config.db_path, &state.settings, &data)?;
    Ok(Json(receipt))
}

/**
 * \brief VIN 解码入口：GET /decode/{vin}，转发 NHTSA vPIC 的解码结果。
 */
async fn decode_vin(
    State(state): State<AppState>,
    Path(vin_code): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let decoded = vin::decode_vin(&state.http, &state.config.vpic_api_base, &vin_code).await?;
    Ok(Json(decoded))
}

/**
 * \brief 存活探针：GET /test。
 */
async fn liveness() -> Json<Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(json!({
        "status": "AssetLens gateway is running!",
        "timestamp": timestamp,
    }))
}

/** \brief CORS 预检一律放行，不进入业务逻辑。 */
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
