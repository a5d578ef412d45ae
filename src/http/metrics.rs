//! `GET /metrics/values`.
//!
//! Output format follows the `Accept` header: JSON when it mentions
//! `application/json`, OpenMetrics-style text otherwise.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::Response;
use serde_json::{Map, Value};

use crate::http::response::{
    error_response, json_response, text_response, RequestInfo, ACCEPT_JSON, MSG_METHOD_NOT_ALLOWED,
};
use crate::http::server::AppState;
use crate::metrics::{Metric, MetricHandle};

pub const METRIC_UPTIME: &str = "uptime";
pub const METRIC_UPTIME_HELP: &str = "Application uptime in nanosec [internal]";

pub(crate) async fn metrics_values(State(host): State<AppState>, request: Request) -> Response {
    let _guard = host.inflight.track();
    let info = RequestInfo::from_request(&request);

    if request.method() != Method::GET {
        return error_response(&info, StatusCode::METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED);
    }

    let accept = request
        .headers()
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(";");

    tracing::debug!(remote = %info.remote, accept = %accept, "Get metrics values");

    host.refresh_runtime_metrics();
    let metrics = host.registry.metrics();
    let uptime = host.uptime();

    if accept.contains(ACCEPT_JSON) {
        json_response(StatusCode::OK, &render_json(&metrics, uptime))
    } else {
        text_response(StatusCode::OK, render_text(&metrics, uptime))
    }
}

fn uptime_nanos(uptime: Duration) -> u64 {
    u64::try_from(uptime.as_nanos()).unwrap_or(u64::MAX)
}

/// JSON document: labels at top level, counters and gauges under `metrics`.
pub fn render_json(metrics: &[MetricHandle], uptime: Duration) -> Value {
    let mut data = Map::new();
    let mut values = Map::new();

    for metric in metrics {
        match metric {
            MetricHandle::Counter(c) => {
                values.insert(c.name().to_string(), Value::from(c.count()));
            }
            MetricHandle::Gauge(g) => {
                values.insert(g.name().to_string(), Value::from(g.value()));
            }
            MetricHandle::Label(l) => {
                data.insert(l.name().to_string(), Value::from(l.value()));
            }
        }
    }

    data.insert(METRIC_UPTIME.to_string(), Value::from(uptime_nanos(uptime)));
    data.insert("metrics".to_string(), Value::Object(values));

    Value::Object(data)
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// OpenMetrics-style text; every label is attached to every sample line.
pub fn render_text(metrics: &[MetricHandle], uptime: Duration) -> String {
    let labels = metrics
        .iter()
        .filter_map(|metric| match metric {
            MetricHandle::Label(l) => Some(format!("{}=\"{}\"", l.name(), escape_label(&l.value()))),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(",");

    let mut out = String::new();
    for metric in metrics {
        let value = match metric {
            MetricHandle::Counter(c) => c.count(),
            MetricHandle::Gauge(g) => g.value(),
            MetricHandle::Label(_) => continue,
        };
        let kind = metric.kind().unwrap_or("gauge");
        push_sample(&mut out, metric.name(), metric.help(), kind, &labels, &value.to_string());
    }

    push_sample(
        &mut out,
        METRIC_UPTIME,
        METRIC_UPTIME_HELP,
        "gauge",
        &labels,
        &uptime_nanos(uptime).to_string(),
    );

    out
}

fn push_sample(out: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: &str) {
    out.push_str(&format!("# HELP {} {}\n", name, help));
    out.push_str(&format!("# TYPE {} {}\n", name, kind));
    out.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
}
