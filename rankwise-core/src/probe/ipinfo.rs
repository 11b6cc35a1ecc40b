//! External IP and geolocation lookup.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProbeError;

/// The caller's apparent address as seen by an external service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpInfo {
    pub ip: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub isp: String,
    #[serde(default)]
    pub timezone: String,
}

fn first_str(body: &serde_json::Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| body.get(*k).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

impl IpInfo {
    /// Build from a lookup response, accepting the field names used by the
    /// common providers (`ipapi.co`, `ip-api.com`, `ipinfo.io`).
    pub fn from_json(body: &serde_json::Value) -> Option<Self> {
        let ip = first_str(body, &["ip", "query"]);
        if ip.is_empty() {
            return None;
        }
        let org = first_str(body, &["org", "as"]);
        let isp = first_str(body, &["isp", "org"]);
        Some(Self {
            ip,
            city: first_str(body, &["city"]),
            region: first_str(body, &["regionName", "region"]),
            country: first_str(body, &["country_name", "country"]),
            org,
            isp,
            timezone: first_str(body, &["timezone"]),
        })
    }

    /// The network operator name, preferring `isp` over `org`.
    pub fn provider(&self) -> &str {
        if self.isp.is_empty() {
            &self.org
        } else {
            &self.isp
        }
    }
}

#[async_trait]
pub trait IpInfoProvider: Send + Sync {
    async fn lookup(&self) -> Result<IpInfo, ProbeError>;
}

/// Looks up IP metadata over HTTPS.
pub struct HttpIpInfoProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpIpInfoProvider {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let parsed = url::Url::parse(url).map_err(|_| ProbeError::InvalidEndpoint {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProbeError::InvalidEndpoint {
                url: url.to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Rankwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::NetworkFailure {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: parsed.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IpInfoProvider for HttpIpInfoProvider {
    async fn lookup(&self) -> Result<IpInfo, ProbeError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProbeError::NetworkFailure {
                message: format!("Request to {} failed: {e}", self.url),
            })?;

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| ProbeError::NetworkFailure {
                    message: format!("Failed to parse IP lookup response: {e}"),
                })?;

        debug!(url = %self.url, "IP lookup succeeded");
        IpInfo::from_json(&body).ok_or_else(|| ProbeError::NetworkFailure {
            message: "IP lookup response did not include an address".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_ipapi_co() {
        let body = json!({
            "ip": "198.51.100.4",
            "city": "Austin",
            "region": "Texas",
            "country": "US",
            "country_name": "United States",
            "org": "AS7922 Comcast Cable Communications, LLC",
            "timezone": "America/Chicago"
        });
        let info = IpInfo::from_json(&body).unwrap();
        assert_eq!(info.country, "United States");
        assert_eq!(info.isp, "AS7922 Comcast Cable Communications, LLC");
        assert_eq!(info.provider(), info.isp);
    }

    #[test]
    fn test_from_json_ip_api_com() {
        let body = json!({
            "query": "203.0.113.9",
            "regionName": "Zurich",
            "region": "ZH",
            "country": "Switzerland",
            "isp": "M247 Ltd",
            "org": "Proton AG",
            "as": "AS9009 M247 Ltd"
        });
        let info = IpInfo::from_json(&body).unwrap();
        assert_eq!(info.ip, "203.0.113.9");
        assert_eq!(info.region, "Zurich");
        assert_eq!(info.isp, "M247 Ltd");
        assert_eq!(info.org, "Proton AG");
    }

    #[test]
    fn test_from_json_without_ip() {
        assert!(IpInfo::from_json(&json!({"error": true, "reason": "RateLimited"})).is_none());
    }

    #[test]
    fn test_http_provider_rejects_bad_urls() {
        assert!(matches!(
            HttpIpInfoProvider::new("not a url", Duration::from_secs(1)),
            Err(ProbeError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            HttpIpInfoProvider::new("ftp://example.com/ip", Duration::from_secs(1)),
            Err(ProbeError::InvalidEndpoint { .. })
        ));
        assert!(HttpIpInfoProvider::new("https://ipapi.co/json/", Duration::from_secs(1)).is_ok());
    }
}
