use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::telemetry;

/** \brief 图像分析所用的模型。 */
pub const VISION_MODEL: &str = "gpt-4o-mini";

/** \brief 单次分析的回复 token 上限。 */
pub const MAX_ANALYSIS_TOKENS: u32 = 800;

/**
 * \brief 组装 chat completions 请求体。
 * \details 单条 user 消息，两个分段：文本提示词 + 图片 URL（HTTP(S) 或 data URI 原样透传）。
 */
pub fn build_payload(image_url: &str, prompt: &str) -> Value {
    json!({
        "model": VISION_MODEL,
        "messages": [
            {
                "role": "user",
                "content": [
                    {
                        "type": "text",
                        "text": prompt,
                    },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": image_url,
                        },
                    },
                ],
            },
        ],
        "max_tokens": MAX_ANALYSIS_TOKENS,
    })
}

/**
 * \brief 调用 OpenAI 图像理解接口，返回模型回复的原始文本。
 * \details 上游原始错误体只进 telemetry；回给调用方的信息只含状态码。
 */
pub async fn analyze_image(
    client: &reqwest::Client,
    api_base: &str,
    api_key: &str,
    image_url: &str,
    prompt: &str,
) -> Result<String, GatewayError> {
    let url = format!("{}/v1/chat/completions", api_base.trim_end_matches('/'));
    let body = build_payload(image_url, prompt);

    let resp = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {}", api_key))
        .json(&body)
        .send()
        .await
        .map_err(|e| GatewayError::Upstream(format!("OpenAI API request failed: {}", e)))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        telemetry::log_error(
            "vision",
            &format!(
                "OpenAI API error: {} -> {}",
                status,
                telemetry::truncate_for_log(&text, 300)
            ),
        );
        return Err(GatewayError::Upstream(format!(
            "OpenAI API request failed with status {}",
            status.as_u16()
        )));
    }

    let v: Value = resp.json().await.map_err(|_| {
        GatewayError::MalformedUpstreamResponse("OpenAI response was not valid JSON".to_string())
    })?;
    extract_message_content(&v)
}

/**
 * \brief 从响应中取 choices[0].message.content；任一层缺失都判为上游响应畸形。
 */
pub fn extract_message_content(v: &Value) -> Result<String, GatewayError> {
    v.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            GatewayError::MalformedUpstreamResponse(
                "OpenAI response is missing choices[0].message.content".to_string(),
            )
        })
}
