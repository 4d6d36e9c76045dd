use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::db;
use crate::error::GatewayError;
use crate::models::{DispatchReceipt, EmailConfig, EmailData, MaintenanceRequest};
use crate::settings::SettingsCache;
use crate::telemetry;

/** \brief 邮件派发涉及的全部设置键。 */
pub const EMAIL_SETTING_KEYS: [&str; 7] = [
    "email_smtp_server",
    "email_port",
    "email_username",
    "email_password",
    "email_from_name",
    "email_to_address",
    "email_cc_address",
];

/**
 * \brief 从设置缓存解析邮件配置。
 * \details SMTP 服务器、用户名、口令、收件地址四项必填，缺一即配置不完整；
 *          端口、发件人显示名、抄送地址可缺省。
 */
pub fn resolve_email_config(cache: &SettingsCache) -> Result<EmailConfig, GatewayError> {
    let values = cache
        .get_many(&EMAIL_SETTING_KEYS)
        .map_err(|e| GatewayError::Configuration(format!("Failed to get email settings: {}", e)))?;

    let required = |key: &str| -> Result<String, GatewayError> {
        values
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                GatewayError::Configuration("Email configuration is incomplete".to_string())
            })
    };
    let optional = |key: &str| -> Option<String> {
        values
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(EmailConfig {
        smtp_server: required("email_smtp_server")?,
        port: optional("email_port"),
        username: required("email_username")?,
        password: required("email_password")?,
        from_name: optional("email_from_name"),
        to_address: required("email_to_address")?,
        cc_address: optional("email_cc_address"),
    })
}

/**
 * \brief 生成邮件主题。
 */
pub fn build_subject(data: &EmailData) -> String {
    format!(
        "Maintenance Request - Asset {} - {} Priority",
        data.asset_data.id, data.issue_analysis.priority
    )
}

/**
 * \brief 待投递的邮件。
 */
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html: String,
    /** \brief X-Priority 头：HIGH 提升为 "1"，其余 "3"。 */
    pub x_priority: &'static str,
}

/**
 * \brief 组装出站邮件。
 */
pub fn build_outbound_email(
    config: &EmailConfig,
    data: &EmailData,
    subject: &str,
) -> OutboundEmail {
    let from = match &config.from_name {
        Some(name) => format!("{} <{}>", name, config.username),
        None => config.username.clone(),
    };
    OutboundEmail {
        from,
        to: vec![config.to_address.clone()],
        cc: config.cc_address.clone().into_iter().collect(),
        subject: subject.to_string(),
        html: data.email_content.clone(),
        x_priority: if data.issue_analysis.priority == "HIGH" {
            "1"
        } else {
            "3"
        },
    }
}

/**
 * \brief 投递出口。
 * \details 当前为模拟投递：只做遥测记录，不真正连 SMTP。接入 Resend/SendGrid
 *          等真实服务时替换此函数即可，调用方语义不变。
 */
fn send_via_transport(config: &EmailConfig, email: &OutboundEmail) -> Result<(), GatewayError> {
    telemetry::log_event(
        "email",
        &format!(
            "simulated delivery via {} from {:?} to {} (cc: {}), X-Priority {}",
            config.smtp_server,
            email.from,
            email.to.join(", "),
            email.cc.join(", "),
            email.x_priority
        ),
    );
    Ok(())
}

/**
 * \brief 派发维修邮件并写入审计记录。
 * \details 审计写入失败只记遥测、不影响回执；配置不全或存储不可读则整体失败。
 */
pub fn dispatch_maintenance_email(
    db_path: &str,
    cache: &SettingsCache,
    data: &EmailData,
) -> Result<DispatchReceipt, GatewayError> {
    let config = resolve_email_config(cache)?;
    let subject = build_subject(data);

    telemetry::log_event(
        "email",
        &format!(
            "attempting to send maintenance email to {} with subject {:?} (priority {})",
            config.to_address, subject, data.issue_analysis.priority
        ),
    );

    let email = build_outbound_email(&config, data, &subject);
    let transport_result = send_via_transport(&config, &email);

    let now = OffsetDateTime::now_utc();
    let timestamp = now
        .format(&Rfc3339)
        .map_err(|e| GatewayError::Internal(e.into()))?;
    let email_id = format!("maintenance_{}", now.unix_timestamp_nanos() / 1_000_000);

    let record = MaintenanceRequest {
        asset_id: data.asset_data.id.clone(),
        asset_name: data.asset_data.name.clone(),
        priority: data.issue_analysis.priority.clone(),
        issues: data.issue_analysis.issues.join("; "),
        recommendations: data.issue_analysis.recommendations.join("; "),
        requested_by: data
            .requested_by
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        requested_at: timestamp.clone(),
        status: if transport_result.is_ok() { "sent" } else { "failed" }.to_string(),
        email_to: config.to_address.clone(),
        email_subject: subject.clone(),
    };

    // 审计不随投递成败走：无论投递结果如何都落一行，且审计失败不阻断回执
    let logged = db::open_db(db_path)
        .and_then(|conn| db::insert_maintenance_request(&conn, &record));
    if let Err(err) = logged {
        telemetry::log_error("email", &format!("failed to log maintenance request: {}", err));
    }

    transport_result?;

    Ok(DispatchReceipt {
        success: true,
        message: "Email sent successfully".to_string(),
        email_id,
        to: config.to_address,
        subject,
        timestamp,
    })
}
