//! Prometheus metrics: REST call counts and latencies, upstream LLM calls.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

use crate::state::AppState;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RestCallLabels {
    pub path: String,
    pub status_code: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct PathLabels {
    pub path: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LlmLabels {
    pub provider: String,
    pub model: String,
}

fn duration_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.005, 2.0, 14))
}

pub struct Metrics {
    registry: Registry,
    pub rest_api_calls: Family<RestCallLabels, Counter>,
    pub response_duration: Family<PathLabels, Histogram, fn() -> Histogram>,
    pub llm_calls: Family<LlmLabels, Counter>,
    pub llm_failures: Family<LlmLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("agentgate");

        let rest_api_calls = Family::<RestCallLabels, Counter>::default();
        registry.register(
            "rest_api_calls",
            "REST API calls by path and status code",
            rest_api_calls.clone(),
        );

        let response_duration = Family::<PathLabels, Histogram, fn() -> Histogram>::new_with_constructor(
            duration_histogram,
        );
        registry.register(
            "response_duration_seconds",
            "Time until the response head was produced",
            response_duration.clone(),
        );

        let llm_calls = Family::<LlmLabels, Counter>::default();
        registry.register(
            "llm_calls",
            "Upstream LLM calls by provider and model",
            llm_calls.clone(),
        );

        let llm_failures = Family::<LlmLabels, Counter>::default();
        registry.register(
            "llm_calls_failures",
            "Failed upstream LLM calls by provider and model",
            llm_failures.clone(),
        );

        Self {
            registry,
            rest_api_calls,
            response_duration,
            llm_calls,
            llm_failures,
        }
    }

    pub fn record_llm_call(&self, provider: &str, model: &str) {
        self.llm_calls.get_or_create(&llm_labels(provider, model)).inc();
    }

    pub fn record_llm_failure(&self, provider: &str, model: &str) {
        self.llm_failures.get_or_create(&llm_labels(provider, model)).inc();
    }

    pub fn record_rest_call(&self, path: &str, status: u16, seconds: f64) {
        self.rest_api_calls
            .get_or_create(&RestCallLabels {
                path: path.to_string(),
                status_code: status.to_string(),
            })
            .inc();
        self.response_duration
            .get_or_create(&PathLabels {
                path: path.to_string(),
            })
            .observe(seconds);
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn llm_labels(provider: &str, model: &str) -> LlmLabels {
    LlmLabels {
        provider: provider.to_string(),
        model: model.to_string(),
    }
}

/// Route-level middleware counting every matched REST call except `/metrics`.
pub async fn track_rest_calls(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    if path != "/metrics" {
        state.metrics.record_rest_call(
            &path,
            response.status().as_u16(),
            started.elapsed().as_secs_f64(),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_series() {
        let metrics = Metrics::new();
        metrics.record_llm_call("ollama", "llama3");
        metrics.record_llm_failure("ollama", "llama3");
        metrics.record_rest_call("/v1/query", 200, 0.02);

        let text = metrics.render().unwrap();
        assert!(text.contains("agentgate_llm_calls_total{provider=\"ollama\",model=\"llama3\"} 1"));
        assert!(text.contains("agentgate_llm_calls_failures_total"));
        assert!(text.contains("agentgate_rest_api_calls_total{path=\"/v1/query\",status_code=\"200\"} 1"));
        assert!(text.contains("agentgate_response_duration_seconds_count{path=\"/v1/query\"} 1"));
    }
}
