//! Remote metric endpoints.
//!
//! Eight public endpoints feed one refresh: two ledger supply counters, the
//! daily-stats record, and four governance bucket collections. All eight are
//! fetched concurrently, each with its own bounded retry; the join is the
//! barrier, and a single exhausted endpoint fails the whole refresh.

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::buckets::BucketRecord;
use crate::errors::MetricsError;
use crate::logging::{self, obj, v_num, v_str, Domain, Level};
use crate::state::Config;

pub mod retry;

use retry::{retry_async, RetryConfig};

const USER_AGENT: &str = "icp-supply-dashboard/1.0.0";

/// Ledger supply counter, `{ "supply_e8s": ... }`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SupplyRecord {
    pub supply_e8s: u64,
}

/// One element of the daily-stats series; only the governance and burn fields
/// are consumed, everything else in the record is ignored.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DailyStats {
    pub governance_total_locked_e8s: u64,
    #[serde(default)]
    pub governance_total_staked_maturity_e8s_equivalent: u64,
    pub icp_burned_fees: u64,
    pub total_cycle_burn_till_date: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MaturityRecord {
    pub governance_total_maturity_e8s_equivalent: u64,
}

/// Governance bucket rows arrive with `count` as either a JSON integer or a
/// decimal string depending on magnitude; normalize both to e8s.
#[derive(Debug, Clone, Deserialize)]
pub struct WireBucket {
    pub dissolve_delay_months: i64,
    #[serde(deserialize_with = "de_count")]
    pub count: u64,
}

fn de_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

impl From<WireBucket> for BucketRecord {
    fn from(wire: WireBucket) -> Self {
        BucketRecord {
            dissolve_delay_months: wire.dissolve_delay_months,
            amount_e8s: wire.count,
        }
    }
}

/// Everything one refresh needs, produced only when all eight fetches land.
#[derive(Debug, Clone)]
pub struct RawMetrics {
    pub total_supply_e8s: u64,
    pub circulating_supply_e8s: u64,
    pub daily: DailyStats,
    pub dissolving_neurons: Vec<BucketRecord>,
    pub locked_neurons: Vec<BucketRecord>,
    pub total_maturity_e8s: u64,
    pub dissolving_maturity: Vec<BucketRecord>,
    pub locked_maturity: Vec<BucketRecord>,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub total_supply: String,
    pub circulating_supply: String,
    pub daily_stats: String,
    pub dissolving_neurons: String,
    pub locked_neurons: String,
    pub total_maturity: String,
    pub dissolving_maturity: String,
    pub locked_maturity: String,
}

impl Endpoints {
    pub fn from_config(cfg: &Config) -> Self {
        let ledger = cfg.ledger_api_base.trim_end_matches('/');
        let metrics = cfg.metrics_api_base.trim_end_matches('/');
        let governance = format!("{}/api/v3/governance-metrics", metrics);
        Self {
            total_supply: format!("{}/supply/total/latest", ledger),
            circulating_supply: format!("{}/supply/circulating/latest", ledger),
            daily_stats: format!("{}/api/v3/daily-stats?format=json", metrics),
            dissolving_neurons: format!("{}/governance_dissolving_neurons_e8s", governance),
            locked_neurons: format!("{}/governance_not_dissolving_neurons_e8s", governance),
            total_maturity: format!("{}/governance_total_maturity_e8s_equivalent", governance),
            dissolving_maturity: format!(
                "{}/governance_dissolving_neurons_staked_maturity_e8s_equivalent",
                governance
            ),
            locked_maturity: format!(
                "{}/governance_not_dissolving_neurons_staked_maturity_e8s_equivalent",
                governance
            ),
        }
    }
}

/// Source of raw metric payloads. The production implementation talks HTTP;
/// tests drive the pipeline with fixture sources.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch_all(&self) -> Result<RawMetrics, MetricsError>;
}

pub struct HttpMetricSource {
    client: Client,
    endpoints: Endpoints,
    retry: RetryConfig,
}

impl HttpMetricSource {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(cfg.http_timeout_secs))
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoints: Endpoints::from_config(cfg),
            retry: RetryConfig {
                max_retries: cfg.max_retries,
                base_delay_ms: cfg.retry_delay_ms,
            },
        }
    }

    /// Fetch one endpoint with retries, then decode. Transport failures and
    /// non-2xx statuses are retried and surface as `EndpointUnavailable`;
    /// a body that does not match the expected shape is `MalformedPayload`
    /// and is not worth retrying.
    async fn get_json<T: DeserializeOwned>(
        &self,
        name: &'static str,
        url: &str,
    ) -> Result<T, MetricsError> {
        let body = retry_async(&self.retry, name, || async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(anyhow!("HTTP {}", status));
            }
            let value: serde_json::Value = response.json().await?;
            Ok(value)
        })
        .await
        .map_err(|e| MetricsError::EndpointUnavailable {
            name,
            attempts: self.retry.attempts(),
            reason: e.to_string(),
        })?;

        serde_json::from_value(body).map_err(|e| MetricsError::MalformedPayload {
            name,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn fetch_all(&self) -> Result<RawMetrics, MetricsError> {
        let started = std::time::Instant::now();
        let (
            total_supply,
            circulating_supply,
            daily_stats,
            dissolving_neurons,
            locked_neurons,
            total_maturity,
            dissolving_maturity,
            locked_maturity,
        ) = tokio::join!(
            self.get_json::<SupplyRecord>("total_supply", &self.endpoints.total_supply),
            self.get_json::<SupplyRecord>("circulating_supply", &self.endpoints.circulating_supply),
            self.get_json::<Vec<DailyStats>>("daily_stats", &self.endpoints.daily_stats),
            self.get_json::<Vec<WireBucket>>("dissolving_neurons", &self.endpoints.dissolving_neurons),
            self.get_json::<Vec<WireBucket>>("locked_neurons", &self.endpoints.locked_neurons),
            self.get_json::<MaturityRecord>("total_maturity", &self.endpoints.total_maturity),
            self.get_json::<Vec<WireBucket>>("dissolving_maturity", &self.endpoints.dissolving_maturity),
            self.get_json::<Vec<WireBucket>>("locked_maturity", &self.endpoints.locked_maturity),
        );

        // Most-recent record leads the daily-stats series.
        let daily = daily_stats?
            .into_iter()
            .next()
            .ok_or(MetricsError::MalformedPayload {
                name: "daily_stats",
                reason: "empty daily-stats series".to_string(),
            })?;

        let raw = RawMetrics {
            total_supply_e8s: total_supply?.supply_e8s,
            circulating_supply_e8s: circulating_supply?.supply_e8s,
            daily,
            dissolving_neurons: dissolving_neurons?.into_iter().map(Into::into).collect(),
            locked_neurons: locked_neurons?.into_iter().map(Into::into).collect(),
            total_maturity_e8s: total_maturity?.governance_total_maturity_e8s_equivalent,
            dissolving_maturity: dissolving_maturity?.into_iter().map(Into::into).collect(),
            locked_maturity: locked_maturity?.into_iter().map(Into::into).collect(),
        };

        logging::log(
            Level::Info,
            Domain::Fetch,
            "fetch_ok",
            obj(&[
                ("elapsed_ms", v_num(started.elapsed().as_secs_f64() * 1000.0)),
                (
                    "bucket_rows",
                    v_num(
                        (raw.dissolving_neurons.len()
                            + raw.locked_neurons.len()
                            + raw.dissolving_maturity.len()
                            + raw.locked_maturity.len()) as f64,
                    ),
                ),
                ("msg", v_str("all endpoints fetched")),
            ]),
        );

        Ok(raw)
    }
}
