use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/**
 * \brief 网关错误分类。
 * \details 不同类别映射到不同 HTTP 状态码，但响应体统一为 {"error": 信息}，
 *          调用方既能按状态码区分可重试性，也能拿到可读的失败原因。
 *          诊断细节（上游原始响应、存储错误）只进 telemetry，不出边界。
 */
#[derive(Debug, Error)]
pub enum GatewayError {
    /** \brief 必需设置缺失或存储不可读。 */
    #[error("{0}")]
    Configuration(String),
    /** \brief 请求字段缺失或非法。 */
    #[error("{0}")]
    Validation(String),
    /** \brief 上游调用返回非成功状态或不可达。 */
    #[error("{0}")]
    Upstream(String),
    /** \brief 上游调用成功但响应体缺少预期字段。 */
    #[error("{0}")]
    MalformedUpstreamResponse(String),
    /** \brief 其余未归类失败。 */
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Upstream(_) | GatewayError::MalformedUpstreamResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
