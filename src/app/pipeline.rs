//! Fetch orchestration shared by the CLI and TUI front-ends.
//!
//! One call fans out to one upstream fetch per dataset, waits for all of them,
//! and only then hands the parsed results to alignment and chart building:
//!
//! requests -> (fetch -> parse) x N, concurrently -> align -> descriptor
//!
//! All-or-nothing: the first failing sub-fetch fails the whole call and the
//! remaining sub-fetches are dropped. Dropping the returned future cancels every
//! outstanding sub-fetch; none of their results is used afterwards.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chart::{self, ChartDescriptor, ChartOptions, LabelStyle, label_style_for_window};
use crate::config::Config;
use crate::data::{DocumentParser, EntsoeClient, MarketSource, ResultCache};
use crate::domain::{FetchRequest, FetchResult, MarketData, MetricKind, Series, area_label, normalize_area_code};
use crate::error::{PipelineError, Result};
use crate::series::{ResolutionClock, collapse_total};

/// One dataset of a comparison chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub metric: MetricKind,
    pub area: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl DatasetSpec {
    pub fn new(metric: MetricKind, area: impl Into<String>) -> Self {
        Self {
            metric,
            area: area.into(),
            label: None,
            color: None,
        }
    }

    /// Caller label, or `"<metric> <area name>"`.
    pub fn display_label(&self) -> String {
        match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("{} {}", self.metric.display_name(), area_label(&self.area)),
        }
    }
}

/// Several (metric, area) datasets over one shared window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub datasets: Vec<DatasetSpec>,
}

pub struct Orchestrator<S> {
    source: S,
    parser: DocumentParser,
    default_area: String,
    cache: Option<ResultCache>,
}

impl Orchestrator<EntsoeClient> {
    /// Orchestrator over the live upstream API. Fails without an API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = EntsoeClient::from_config(config)?;
        Ok(Self::with_config(client, config))
    }
}

impl<S: MarketSource> Orchestrator<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(
            source,
            &Config {
                cache_ttl_secs: 0,
                ..Config::default()
            },
        )
    }

    pub fn with_config(source: S, config: &Config) -> Self {
        let cache = config
            .cache_enabled()
            .then(|| ResultCache::new(Duration::from_secs(config.cache_ttl_secs)));
        Self {
            source,
            parser: DocumentParser::new(ResolutionClock::with_fallback_minutes(
                config.fallback_resolution_minutes,
            )),
            default_area: normalize_area_code(&config.default_area),
            cache,
        }
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn default_area(&self) -> &str {
        &self.default_area
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Build a request, substituting the default area when `area` is blank.
    pub fn request(
        &self,
        metric: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        area: Option<&str>,
    ) -> Result<FetchRequest> {
        let area = match area.map(str::trim) {
            Some(a) if !a.is_empty() => normalize_area_code(a),
            _ => self.default_area.clone(),
        };
        FetchRequest::new(metric, start, end, area)
    }

    /// Fetch and parse one request. The flag is true when served from the cache.
    pub async fn fetch_one(&self, request: &FetchRequest) -> Result<(MarketData, bool)> {
        if let Some(data) = self.cache.as_ref().and_then(|c| c.get(request)) {
            debug!("Cache hit for {} in {}", request.metric.key(), request.area_code);
            return Ok((data, true));
        }

        let raw = self.source.fetch_document(request).await?;
        let data = self.parser.parse(&raw, request.metric)?;

        if let Some(cache) = &self.cache {
            cache.insert(request, data.clone());
        }
        Ok((data, false))
    }

    /// Caller-facing single fetch; failures are reported in the result, not raised.
    pub async fn fetch(
        &self,
        metric: MetricKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        area: Option<&str>,
    ) -> FetchResult {
        let outcome = match self.request(metric, start, end, area) {
            Ok(request) => self.fetch_one(&request).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok((data, cached)) => FetchResult::ok(data, cached),
            Err(err) => {
                warn!("Fetch of {} failed: {err}", metric.key());
                FetchResult::failed(&err)
            }
        }
    }

    /// Fetch every request concurrently; results keep request order.
    pub async fn fetch_all(&self, requests: &[FetchRequest]) -> Result<Vec<MarketData>> {
        if requests.is_empty() {
            return Err(PipelineError::NoDatasets);
        }
        info!("Fetching {} dataset(s)", requests.len());

        let fetches = requests.iter().map(|request| async move {
            self.fetch_one(request).await.map_err(|err| {
                warn!(
                    "Sub-fetch {} in {} failed: {err}",
                    request.metric.key(),
                    request.area_code
                );
                err
            })
        });
        let results = try_join_all(fetches).await?;
        Ok(results.into_iter().map(|(data, _)| data).collect())
    }

    /// Fetch all requests and build one descriptor.
    ///
    /// A single request is charted as-is (categories for a breakdown); several
    /// are aligned onto one axis, with any breakdown collapsed to its total.
    pub async fn fetch_and_build(&self, requests: &[FetchRequest], options: &ChartOptions) -> Result<ChartDescriptor> {
        let results = self.fetch_all(requests).await?;
        let mut options = with_window_label_style(options, requests);

        if let [data] = results.as_slice() {
            return Ok(chart::build(data, &options));
        }
        // Unlabelled series are told apart by area; the metric alone repeats.
        options.labels = requests
            .iter()
            .enumerate()
            .map(|(i, r)| match options.label_for(i) {
                Some(label) => label.to_string(),
                None => DatasetSpec::new(r.metric, r.area_code.as_str()).display_label(),
            })
            .collect();
        let series: Vec<Series> = requests
            .iter()
            .zip(results)
            .map(|(request, data)| comparison_series(request.metric, data))
            .collect();
        chart::build_comparison(&series, &options)
    }

    /// Comparison chart across datasets sharing one window.
    ///
    /// Dataset labels and colours override those in `options`.
    pub async fn compare(&self, request: &ComparisonRequest, options: &ChartOptions) -> Result<ChartDescriptor> {
        if request.datasets.is_empty() {
            return Err(PipelineError::NoDatasets);
        }
        let requests = request
            .datasets
            .iter()
            .map(|d| self.request(d.metric, request.period_start, request.period_end, Some(&d.area)))
            .collect::<Result<Vec<_>>>()?;

        let mut options = with_window_label_style(options, &requests);
        options.labels = request.datasets.iter().map(DatasetSpec::display_label).collect();
        options.colors = request
            .datasets
            .iter()
            .enumerate()
            .map(|(i, d)| d.color.clone().or_else(|| options.colors.get(i).cloned()).unwrap_or_default())
            .collect();

        let results = self.fetch_all(&requests).await?;
        let series: Vec<Series> = requests
            .iter()
            .zip(results)
            .map(|(request, data)| comparison_series(request.metric, data))
            .collect();
        chart::build_comparison(&series, &options)
    }
}

/// A breakdown compares as its total.
fn comparison_series(metric: MetricKind, data: MarketData) -> Series {
    match data {
        MarketData::Single(series) => series,
        MarketData::Categorized(multi) => collapse_total(&multi, metric.display_name()),
    }
}

fn with_window_label_style(options: &ChartOptions, requests: &[FetchRequest]) -> ChartOptions {
    let mut options = options.clone();
    if options.label_style == LabelStyle::Auto {
        let start = requests.iter().map(|r| r.period_start).min();
        let end = requests.iter().map(|r| r.period_end).max();
        if let (Some(start), Some(end)) = (start, end) {
            options.label_style = label_style_for_window(start, end);
        }
    }
    options
}
