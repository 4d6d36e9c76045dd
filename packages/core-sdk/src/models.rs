use std::fmt;

use serde::{Deserialize, Serialize};

/**
 * \brief 照片类型：决定分析走铭牌信息提取还是资产状况评估。
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    /** \brief 铭牌/数据板照片，走字段提取模板。 */
    Nameplate,
    /** \brief 资产整体照片，走状况评估模板。 */
    Asset,
}

impl PhotoKind {
    /**
     * \brief 从请求携带的类型提示解析照片类型。
     * \details 仅 "nameplate" 命中铭牌模板；其余取值（含缺省、未识别）一律回落到资产模板，
     *          没有错误分支。
     */
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("nameplate") => PhotoKind::Nameplate,
            _ => PhotoKind::Asset,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoKind::Nameplate => "nameplate",
            PhotoKind::Asset => "asset",
        }
    }
}

impl fmt::Display for PhotoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
 * \brief 图片分析请求体。
 */
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /** \brief 图片地址，HTTP(S) URL 或 data URI。 */
    #[serde(default)]
    pub image_url: String,
    /** \brief 照片类型提示，可缺省。 */
    #[serde(default)]
    pub photo_type: Option<String>,
}

/**
 * \brief 图片分析响应体：模型返回的原始文本，不做二次校验。
 */
#[derive(Serialize, Debug)]
pub struct AnalysisResponse {
    pub analysis: String,
}

/**
 * \brief 维修邮件派发请求体。
 */
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EmailDispatchRequest {
    /** \brief 邮件数据，缺省视为非法请求。 */
    #[serde(default)]
    pub email_data: Option<EmailData>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EmailData {
    /** \brief 关联资产。 */
    pub asset_data: AssetData,
    /** \brief 问题分析结论。 */
    pub issue_analysis: IssueAnalysis,
    /** \brief 渲染好的邮件正文（HTML）。 */
    pub email_content: String,
    /** \brief 发起人，可缺省。 */
    #[serde(default)]
    pub requested_by: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AssetData {
    /** \brief 资产标识。 */
    pub id: String,
    /** \brief 资产名称。 */
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IssueAnalysis {
    /** \brief 优先级，如 HIGH/MEDIUM/LOW。 */
    pub priority: String,
    /** \brief 问题列表。 */
    pub issues: Vec<String>,
    /** \brief 处理建议列表。 */
    pub recommendations: Vec<String>,
}

/**
 * \brief 派发回执。
 */
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReceipt {
    pub success: bool,
    pub message: String,
    /** \brief 形如 maintenance_<毫秒时间戳> 的派发标识。 */
    pub email_id: String,
    pub to: String,
    pub subject: String,
    /** \brief RFC 3339 时间戳。 */
    pub timestamp: String,
}

/**
 * \brief 从设置表解析出的邮件配置。
 */
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /** \brief SMTP 服务器地址（必填）。 */
    pub smtp_server: String,
    /** \brief SMTP 端口，可缺省。 */
    pub port: Option<String>,
    /** \brief 登录用户名，同时作为发件地址（必填）。 */
    pub username: String,
    /** \brief 登录口令（必填，不入日志）。 */
    pub password: String,
    /** \brief 发件人显示名，可缺省。 */
    pub from_name: Option<String>,
    /** \brief 收件地址（必填）。 */
    pub to_address: String,
    /** \brief 抄送地址，可缺省。 */
    pub cc_address: Option<String>,
}

/**
 * \brief 待写入审计表的维修请求记录。
 */
#[derive(Debug, Clone)]
pub struct MaintenanceRequest {
    pub asset_id: String,
    pub asset_name: String,
    pub priority: String,
    /** \brief 问题列表，"; " 连接。 */
    pub issues: String,
    /** \brief 建议列表，"; " 连接。 */
    pub recommendations: String,
    pub requested_by: String,
    /** \brief RFC 3339 时间戳。 */
    pub requested_at: String,
    pub status: String,
    pub email_to: String,
    pub email_subject: String,
}

/**
 * \brief 带主键的审计记录。
 */
#[derive(Debug, Clone)]
pub struct StoredMaintenanceRequest {
    /** \brief 审计行主键。 */
    pub id: i64,
    pub asset_id: String,
    pub asset_name: String,
    pub priority: String,
    pub issues: String,
    pub recommendations: String,
    pub requested_by: String,
    pub requested_at: String,
    pub status: String,
    pub email_to: String,
    pub email_subject: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_kind_hint_mapping() {
        assert_eq!(PhotoKind::from_hint(Some("nameplate")), PhotoKind::Nameplate);
        assert_eq!(PhotoKind::from_hint(Some("asset")), PhotoKind::Asset);
        assert_eq!(PhotoKind::from_hint(Some("Nameplate")), PhotoKind::Asset);
        assert_eq!(PhotoKind::from_hint(Some("NAMEPLATE")), PhotoKind::Asset);
        assert_eq!(PhotoKind::from_hint(Some("")), PhotoKind::Asset);
        assert_eq!(PhotoKind::from_hint(Some("something-else")), PhotoKind::Asset);
        assert_eq!(PhotoKind::from_hint(None), PhotoKind::Asset);
    }

    #[test]
    fn test_analysis_request_defaults() {
        let req: AnalysisRequest =
            serde_json::from_str(r#"{"imageUrl":"https://img/x.jpg"}"#).expect("parse request");
        assert_eq!(req.image_url, "https://img/x.jpg");
        assert!(req.photo_type.is_none());

        let req: AnalysisRequest = serde_json::from_str("{}").expect("parse empty request");
        assert!(req.image_url.is_empty());
        assert!(req.photo_type.is_none());
    }

    #[test]
    fn test_email_dispatch_request_wire_shape() {
        let raw = r#"{
            "emailData": {
                "assetData": { "id": "A-17", "name": "Forklift 3" },
                "issueAnalysis": {
                    "priority": "HIGH",
                    "issues": ["hydraulic leak", "worn tires"],
                    "recommendations": ["replace seal"]
                },
                "emailContent": "<p>leaking</p>",
                "requestedBy": "inspector"
            }
        }"#;
        let req: EmailDispatchRequest = serde_json::from_str(raw).expect("parse dispatch request");
        let data = req.email_data.expect("email data present");
        assert_eq!(data.asset_data.id, "A-17");
        assert_eq!(data.issue_analysis.issues.len(), 2);
        assert_eq!(data.requested_by.as_deref(), Some("inspector"));

        let req: EmailDispatchRequest = serde_json::from_str("{}").expect("parse empty");
        assert!(req.email_data.is_none());
    }
}
