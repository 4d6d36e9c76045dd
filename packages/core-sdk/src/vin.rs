use serde_json::Value;

use crate::error::GatewayError;
use crate::telemetry;

/** \brief 车辆识别码的固定长度。 */
pub const VIN_LENGTH: usize = 17;

/**
 * \brief 校验 VIN 长度（按字符计，不按字节）。
 */
pub fn validate_vin(vin: &str) -> Result<(), GatewayError> {
    if vin.chars().count() != VIN_LENGTH {
        return Err(GatewayError::Validation(
            "Invalid VIN - must be 17 characters".to_string(),
        ));
    }
    Ok(())
}

/**
 * \brief 拼接 vPIC 解码地址。
 */
pub fn build_decode_url(api_base: &str, vin: &str) -> String {
    format!(
        "{}/api/vehicles/decodevin/{}",
        api_base.trim_end_matches('/'),
        vin
    )
}

/**
 * \brief 调用 NHTSA vPIC 解码 VIN，解析成功后原样转发 JSON。
 */
pub async fn decode_vin(
    client: &reqwest::Client,
    api_base: &str,
    vin: &str,
) -> Result<Value, GatewayError> {
    validate_vin(vin)?;
    telemetry::log_event("vin", &format!("decoding VIN {}", vin));

    let resp = client
        .get(build_decode_url(api_base, vin))
        .query(&[("format", "json")])
        .send()
        .await
        .map_err(|_| GatewayError::Upstream("Failed to connect to NHTSA API".to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        return Err(GatewayError::Upstream(format!(
            "NHTSA API request failed with status {}",
            status.as_u16()
        )));
    }

    resp.json::<Value>().await.map_err(|_| {
        GatewayError::MalformedUpstreamResponse("Failed to parse NHTSA response".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vin_length_validation() {
        assert!(validate_vin("1HGBH41JXMN109186").is_ok());

        for bad in ["", "1HGBH41JXMN10918", "1HGBH41JXMN1091866"] {
            match validate_vin(bad) {
                Err(GatewayError::Validation(message)) => {
                    assert_eq!(message, "Invalid VIN - must be 17 characters");
                }
                other => panic!("expected validation error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_vin_length_counts_chars_not_bytes() {
        // 17 个字符、但超过 17 字节
        let vin = "ÅHGBH41JXMN109186";
        assert_eq!(vin.chars().count(), 17);
        assert!(vin.len() > 17);
        assert!(validate_vin(vin).is_ok());
    }

    #[test]
    fn test_decode_url_building() {
        assert_eq!(
            build_decode_url("https://vpic.nhtsa.dot.gov", "1HGBH41JXMN109186"),
            "https://vpic.nhtsa.dot.gov/api/vehicles/decodevin/1HGBH41JXMN109186"
        );
        assert_eq!(
            build_decode_url("https://vpic.nhtsa.dot.gov/", "1HGBH41JXMN109186"),
            "https://vpic.nhtsa.dot.gov/api/vehicles/decodevin/1HGBH41JXMN109186"
        );
    }
}
