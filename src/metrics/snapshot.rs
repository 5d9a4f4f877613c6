use serde::Deserialize;
use serde_json::Value;

use crate::error::PipelineError;

use super::aggregate::{TokenNetworkSummary, aggregate_network};
use super::graph::{NetworkGraph, build_network_graph};
use super::model::{RawTokenNetwork, ReportedMetrics};
use super::overall::{OverallMetrics, reduce_overall};
use super::schema::{
    SchemaError, Violation, metrics_schema, network_schema, snapshot_schema, validate,
};

#[derive(Clone, Debug)]
pub struct TokenNetworkView {
    pub summary: TokenNetworkSummary,
    pub graph: NetworkGraph,
}

#[derive(Clone, Debug)]
pub struct MetricsSnapshot {
    pub overall: OverallMetrics,
    /// Totals as the backend computed them, kept for display and cross-checks.
    pub reported: ReportedMetrics,
    /// Sorted by open channel count, busiest first.
    pub networks: Vec<TokenNetworkView>,
}

impl MetricsSnapshot {
    pub fn network(&self, token_address: &str) -> Option<&TokenNetworkView> {
        self.networks
            .iter()
            .find(|view| view.summary.token.address == token_address)
    }
}

#[derive(Deserialize)]
struct Envelope {
    overall_metrics: ReportedMetrics,
    networks: Vec<RawTokenNetwork>,
}

fn collect_violations(
    result: Result<(), SchemaError>,
    prefix: &str,
    violations: &mut Vec<Violation>,
) {
    if let Err(error) = result {
        violations.extend(error.violations.into_iter().map(|mut violation| {
            violation.path.insert_str(0, prefix);
            violation
        }));
    }
}

pub fn validate_snapshot(document: &Value) -> Result<(), SchemaError> {
    let mut violations = Vec::new();
    collect_violations(validate(snapshot_schema(), document), "", &mut violations);

    if let Some(metrics) = document.get("overall_metrics") {
        collect_violations(
            validate(metrics_schema(), metrics),
            ".overall_metrics",
            &mut violations,
        );
    }

    if let Some(networks) = document.get("networks").and_then(Value::as_array) {
        for (index, network) in networks.iter().enumerate() {
            collect_violations(
                validate(network_schema(), network),
                &format!(".networks[{index}]"),
                &mut violations,
            );
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { violations })
    }
}

pub fn process_snapshot(document: Value) -> Result<MetricsSnapshot, PipelineError> {
    validate_snapshot(&document)?;
    build_snapshot(document)
}

/// Aggregates a document that already passed [`validate_snapshot`].
pub fn build_snapshot(document: Value) -> Result<MetricsSnapshot, PipelineError> {
    let envelope = Envelope::deserialize(document)?;

    let mut networks = envelope
        .networks
        .iter()
        .map(|raw| TokenNetworkView {
            summary: aggregate_network(raw),
            graph: build_network_graph(raw),
        })
        .collect::<Vec<_>>();
    networks.sort_by(|a, b| b.summary.opened_channels.cmp(&a.summary.opened_channels));

    let summaries = networks
        .iter()
        .map(|view| view.summary.clone())
        .collect::<Vec<_>>();
    let overall = reduce_overall(&summaries);

    if overall.total_open_channels as u64 != envelope.overall_metrics.num_channels_opened {
        tracing::debug!(
            computed = overall.total_open_channels,
            reported = envelope.overall_metrics.num_channels_opened,
            "open channel total differs from the backend's own count"
        );
    }

    Ok(MetricsSnapshot {
        overall,
        reported: envelope.overall_metrics,
        networks,
    })
}
