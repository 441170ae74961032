//! Upstream transparency-platform transport.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::data::document::acknowledgement_reason;
use crate::domain::{FetchRequest, MetricKind};
use crate::error::{PipelineError, Result};

pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Anything that can turn a [`FetchRequest`] into a raw market document.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_document(&self, request: &FetchRequest) -> Result<String>;
}

impl MetricKind {
    /// Upstream `documentType` code.
    pub fn document_type(self) -> &'static str {
        match self {
            MetricKind::DayAheadPrice => "A44",
            MetricKind::IntradayPrice => "A61",
            MetricKind::ActualLoad | MetricKind::ForecastedLoad => "A65",
            MetricKind::GenerationByCategory => "A75",
        }
    }
}

/// `YYYYMMDDHHmm` in UTC, as the upstream expects for `periodStart`/`periodEnd`.
pub fn format_period(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%d%H%M").to_string()
}

/// Query parameters for `request`, without the security token.
pub fn query_params(request: &FetchRequest) -> Vec<(&'static str, String)> {
    let area = request.area_code.clone();
    let mut params = vec![
        ("documentType", request.metric.document_type().to_string()),
        ("periodStart", format_period(request.period_start)),
        ("periodEnd", format_period(request.period_end)),
    ];
    match request.metric {
        MetricKind::DayAheadPrice | MetricKind::IntradayPrice => {
            params.push(("in_Domain", area.clone()));
            params.push(("out_Domain", area));
        }
        MetricKind::ActualLoad => {
            params.push(("processType", "A16".to_string()));
            params.push(("outBiddingZone_Domain", area));
        }
        MetricKind::ForecastedLoad => {
            params.push(("processType", "A01".to_string()));
            params.push(("outBiddingZone_Domain", area));
        }
        MetricKind::GenerationByCategory => {
            params.push(("processType", "A16".to_string()));
            params.push(("in_Domain", area));
        }
    }
    params
}

#[derive(Clone)]
pub struct EntsoeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for EntsoeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntsoeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl EntsoeClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration("API key not configured".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.trim().to_string(),
        })
    }

    /// Build from loaded configuration; fails when no API key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| PipelineError::Configuration("API key not configured".to_string()))?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MarketSource for EntsoeClient {
    async fn fetch_document(&self, request: &FetchRequest) -> Result<String> {
        let params = query_params(request);
        let printable: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        debug!("GET {}?{}", self.base_url, printable.join("&"));

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("securityToken", self.api_key.as_str())])
            .query(&params)
            .send()
            .await
            // The query string carries the security token; never let it into messages.
            .map_err(|e| PipelineError::Transport(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Transport(format!("failed to read response body: {}", e.without_url())))?;

        if !status.is_success() {
            let message = match acknowledgement_reason(&body) {
                Some(reason) => format!("upstream responded {status}: {reason}"),
                None => format!("upstream responded {status}"),
            };
            warn!("{} for {} in {}", message, request.metric.key(), request.area_code);
            return Err(PipelineError::Transport(message));
        }

        debug!("Received {} bytes for {}", body.len(), request.metric.key());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::document::fixtures;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};

    fn request(metric: MetricKind) -> FetchRequest {
        FetchRequest::new(
            metric,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            "10YAT-APG------L",
        )
        .unwrap()
    }

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn price_queries_use_the_same_in_and_out_domain() {
        let params = query_params(&request(MetricKind::DayAheadPrice));
        assert_eq!(param(&params, "documentType"), Some("A44"));
        assert_eq!(param(&params, "in_Domain"), Some("10YAT-APG------L"));
        assert_eq!(param(&params, "out_Domain"), Some("10YAT-APG------L"));
        assert_eq!(param(&params, "periodStart"), Some("202401010000"));
        assert_eq!(param(&params, "periodEnd"), Some("202401020000"));
        assert_eq!(param(&params, "processType"), None);

        let params = query_params(&request(MetricKind::IntradayPrice));
        assert_eq!(param(&params, "documentType"), Some("A61"));
    }

    #[test]
    fn load_and_generation_qualifiers() {
        let actual = query_params(&request(MetricKind::ActualLoad));
        assert_eq!(param(&actual, "documentType"), Some("A65"));
        assert_eq!(param(&actual, "processType"), Some("A16"));
        assert_eq!(param(&actual, "outBiddingZone_Domain"), Some("10YAT-APG------L"));

        let forecast = query_params(&request(MetricKind::ForecastedLoad));
        assert_eq!(param(&forecast, "processType"), Some("A01"));

        let generation = query_params(&request(MetricKind::GenerationByCategory));
        assert_eq!(param(&generation, "documentType"), Some("A75"));
        assert_eq!(param(&generation, "processType"), Some("A16"));
        assert_eq!(param(&generation, "in_Domain"), Some("10YAT-APG------L"));
        assert!(generation.iter().all(|(k, _)| *k != "securityToken"));
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let config = Config::default();
        let err = EntsoeClient::from_config(&config).unwrap_err();
        assert_eq!(err, PipelineError::Configuration("API key not configured".to_string()));
        assert!(EntsoeClient::new(DEFAULT_BASE_URL, "  ", Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn fetches_document_body() {
        let mut server = Server::new_async().await;
        let body = fixtures::price_document("2024-01-01T00:00Z", "PT60M", &[42.0]);
        let mock = server
            .mock("GET", "/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("securityToken".into(), "secret".into()),
                Matcher::UrlEncoded("documentType".into(), "A44".into()),
                Matcher::UrlEncoded("in_Domain".into(), "10YAT-APG------L".into()),
                Matcher::UrlEncoded("periodStart".into(), "202401010000".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(body.clone())
            .create_async()
            .await;

        let client = EntsoeClient::new(format!("{}/api", server.url()), "secret", Duration::from_secs(5)).unwrap();
        let raw = client.fetch_document(&request(MetricKind::DayAheadPrice)).await.unwrap();

        assert_eq!(raw, body);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_carries_acknowledgement_reason() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(fixtures::acknowledgement("Invalid bidding zone"))
            .create_async()
            .await;

        let client = EntsoeClient::new(format!("{}/api", server.url()), "secret", Duration::from_secs(5)).unwrap();
        let err = client.fetch_document(&request(MetricKind::ActualLoad)).await.unwrap_err();

        let PipelineError::Transport(msg) = err else {
            panic!("expected a transport error");
        };
        assert!(msg.contains("400"));
        assert!(msg.contains("Invalid bidding zone"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let client = EntsoeClient::new("http://127.0.0.1:1/api", "TOPSECRET", Duration::from_secs(2)).unwrap();
        let err = client.fetch_document(&request(MetricKind::ActualLoad)).await.unwrap_err();
        let PipelineError::Transport(msg) = &err else {
            panic!("expected a transport error");
        };
        assert!(msg.starts_with("request failed"));
        assert!(!msg.contains("TOPSECRET"));
        assert!(!err.to_string().contains("securityToken"));
    }
}
