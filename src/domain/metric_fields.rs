//! Declarative table of every metric column in the report.
//!
//! Each entry names the output field, its header title, the JSON pointer it is
//! read from in a `runPagespeed` response and how the raw value is converted.
//! The same table drives extraction and the report header, so a record can
//! never miss a column.

use std::sync::OnceLock;

use serde_json::Value;

use super::metric_record::{MetricRecord, MetricValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Number,
    /// 0..1 ratio reported as 0..100.
    Percent,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Homepage,
    Origin,
}

impl Scope {
    pub fn prefix(&self) -> &'static str {
        match self {
            Scope::Homepage => "homepage",
            Scope::Origin => "origin",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Scope::Homepage => "Homepage",
            Scope::Origin => "Origin",
        }
    }

    /// Top level key of the CrUX block for this scope.
    pub fn response_key(&self) -> &'static str {
        match self {
            Scope::Homepage => "loadingExperience",
            Scope::Origin => "originLoadingExperience",
        }
    }
}

/// Extraction stages. A failure inside one never affects the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lab,
    Field(Scope),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricField {
    pub name: String,
    pub title: String,
    pub pointer: String,
    pub transform: Transform,
    pub stage: Stage,
}

struct CruxMetric {
    key: &'static str,
    short: &'static str,
    label: &'static str,
    has_category: bool,
}

const LAB_FIELDS: [(&str, &str, &str, Transform); 4] = [
    (
        "lighthouse_lcp",
        "Lighthouse LCP",
        "/lighthouseResult/audits/largest-contentful-paint/numericValue",
        Transform::Number,
    ),
    (
        "lighthouse_fcp",
        "Lighthouse FCP",
        "/lighthouseResult/audits/first-contentful-paint/numericValue",
        Transform::Number,
    ),
    (
        "lighthouse_cls",
        "Lighthouse CLS",
        "/lighthouseResult/audits/cumulative-layout-shift/numericValue",
        Transform::Number,
    ),
    (
        "lighthouse_performance_score",
        "Lighthouse Performance Score",
        "/lighthouseResult/categories/performance/score",
        Transform::Percent,
    ),
];

const CRUX_METRICS: [CruxMetric; 5] = [
    CruxMetric {
        key: "LARGEST_CONTENTFUL_PAINT_MS",
        short: "lcp",
        label: "LCP",
        has_category: false,
    },
    CruxMetric {
        key: "INTERACTION_TO_NEXT_PAINT",
        short: "inp",
        label: "INP",
        has_category: false,
    },
    CruxMetric {
        key: "CUMULATIVE_LAYOUT_SHIFT_SCORE",
        short: "cls",
        label: "CLS",
        has_category: false,
    },
    CruxMetric {
        key: "FIRST_CONTENTFUL_PAINT_MS",
        short: "fcp",
        label: "FCP",
        has_category: false,
    },
    CruxMetric {
        key: "EXPERIMENTAL_TIME_TO_FIRST_BYTE",
        short: "ttfb",
        label: "TTFB",
        has_category: true,
    },
];

// Index into `distributions`, output suffix, title suffix.
const BUCKETS: [(usize, &str, &str); 3] = [
    (0, "good", "Good %"),
    (1, "needs_improvement", "Needs Improvement %"),
    (2, "poor", "Poor %"),
];

const SCOPES: [Scope; 2] = [Scope::Homepage, Scope::Origin];

pub fn metric_fields() -> &'static [MetricField] {
    static FIELDS: OnceLock<Vec<MetricField>> = OnceLock::new();
    FIELDS.get_or_init(build_metric_fields)
}

fn build_metric_fields() -> Vec<MetricField> {
    let mut fields: Vec<MetricField> = LAB_FIELDS
        .iter()
        .map(|(name, title, pointer, transform)| MetricField {
            name: name.to_string(),
            title: title.to_string(),
            pointer: pointer.to_string(),
            transform: *transform,
            stage: Stage::Lab,
        })
        .collect();

    for scope in SCOPES {
        fields.extend(scope_fields(scope));
    }

    fields
}

fn scope_fields(scope: Scope) -> Vec<MetricField> {
    let prefix = scope.prefix();
    let scope_title = scope.title();
    let root = format!("/{}", scope.response_key());
    let stage = Stage::Field(scope);

    let mut fields = vec![MetricField {
        name: format!("{}_overall_category", prefix),
        title: format!("{} Overall Category", scope_title),
        pointer: format!("{}/overall_category", root),
        transform: Transform::Text,
        stage,
    }];

    for metric in CRUX_METRICS.iter() {
        let base = format!("{}/metrics/{}", root, metric.key);
        let name = format!("{}_{}", prefix, metric.short);
        let title = format!("{} {}", scope_title, metric.label);

        if metric.has_category {
            fields.push(MetricField {
                name: format!("{}_category", name),
                title: format!("{} Category", title),
                pointer: format!("{}/category", base),
                transform: Transform::Text,
                stage,
            });
        }

        fields.push(MetricField {
            name: format!("{}_75th", name),
            title: format!("{} 75th Percentile", title),
            pointer: format!("{}/percentile", base),
            transform: Transform::Number,
            stage,
        });

        for (index, suffix, title_suffix) in BUCKETS {
            fields.push(MetricField {
                name: format!("{}_{}", name, suffix),
                title: format!("{} {}", title, title_suffix),
                pointer: format!("{}/distributions/{}/proportion", base, index),
                transform: Transform::Percent,
                stage,
            });
        }
    }

    fields
}

/// Maps a `runPagespeed` response onto a full [`MetricRecord`].
///
/// Never fails: every field that is missing or has an unexpected type is left
/// as [`MetricValue::Unavailable`]. A CrUX scope without a `metrics` object is
/// skipped as a whole, overall category included.
pub fn extract_metrics(url: &str, response: &Value) -> MetricRecord {
    let homepage = scope_has_metrics(response, Scope::Homepage);
    let origin = scope_has_metrics(response, Scope::Origin);

    if response.get("lighthouseResult").is_none() {
        log::debug!("No lighthouse result for {}", url);
    }
    if !homepage {
        log::debug!("No homepage field data for {}", url);
    }
    if !origin {
        log::debug!("No origin field data for {}", url);
    }

    let values = metric_fields()
        .iter()
        .map(|field| {
            let enabled = match field.stage {
                Stage::Lab => true,
                Stage::Field(Scope::Homepage) => homepage,
                Stage::Field(Scope::Origin) => origin,
            };
            match enabled {
                true => resolve(url, response, field),
                false => MetricValue::Unavailable,
            }
        })
        .collect();

    MetricRecord::from_values(url, values)
}

fn scope_has_metrics(response: &Value, scope: Scope) -> bool {
    response
        .get(scope.response_key())
        .and_then(|experience| experience.get("metrics"))
        .is_some_and(Value::is_object)
}

fn resolve(url: &str, response: &Value, field: &MetricField) -> MetricValue {
    match lookup(response, field) {
        Some(value) => value,
        None => {
            log::debug!("Missing {} for {} at {}", field.name, url, field.pointer);
            MetricValue::Unavailable
        }
    }
}

fn lookup(response: &Value, field: &MetricField) -> Option<MetricValue> {
    let value = response.pointer(&field.pointer)?;

    match field.transform {
        Transform::Number => value.as_f64().map(MetricValue::Number),
        Transform::Percent => value
            .as_f64()
            .map(|ratio| MetricValue::Number(as_percentage(ratio))),
        Transform::Text => value.as_str().map(|t| MetricValue::Text(t.to_string())),
    }
}

/// Scales a 0..1 ratio to 0..100, rounded to 6 decimals so that `0.91`
/// reports as `91` and not `91.00000000000001`.
pub fn as_percentage(ratio: f64) -> f64 {
    (ratio * 100.0 * 1e6).round() / 1e6
}
