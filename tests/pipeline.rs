//! End-to-end panel pipeline against an in-memory series source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use serde_json::{Value, json};

use lms_dash::app::pipeline::{Selection, build_dashboard, build_panel};
use lms_dash::config::{DashboardConfig, PanelSpec, SeriesSpec};
use lms_dash::data::ons::decode_payload;
use lms_dash::data::{CachedSource, RawPayload, SeriesSource};
use lms_dash::domain::{Frequency, SeriesIdentity};
use lms_dash::error::PipelineError;

/// Serves canned bodies; anything not registered fails like a refused connection.
#[derive(Default)]
struct MemorySource {
    bodies: HashMap<SeriesIdentity, Value>,
    calls: AtomicUsize,
}

impl MemorySource {
    fn with(mut self, dataset: &str, series: &str, body: Value) -> Self {
        self.bodies.insert(SeriesIdentity::new(dataset, series), body);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SeriesSource for MemorySource {
    fn fetch(&self, identity: &SeriesIdentity, frequency: Frequency) -> Result<RawPayload, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self.bodies.get(identity).ok_or_else(|| PipelineError::Network {
            identity: identity.clone(),
            message: "connection refused".to_string(),
        })?;
        decode_payload(identity, frequency, body.to_string().as_bytes())
    }
}

fn body(title: &str, source: &str, updated: &str, rows: &[(&str, &str)]) -> Value {
    let months: Vec<Value> = rows
        .iter()
        .map(|(date, value)| {
            json!({
                "date": date,
                "value": value,
                "sourceDataset": source,
                "updateDate": updated,
            })
        })
        .collect();
    json!({"description": {"title": title, "unit": "%"}, "months": months})
}

fn spec(dataset: &str, series: &str, label: &str) -> SeriesSpec {
    SeriesSpec {
        dataset: dataset.to_string(),
        series: series.to_string(),
        label: label.to_string(),
        frequency: Frequency::Monthly,
    }
}

fn panel(id: &str, title: Option<&str>, series: Vec<SeriesSpec>) -> PanelSpec {
    PanelSpec {
        id: id.to_string(),
        title: title.map(str::to_string),
        show_table: false,
        series,
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn london_wales_source() -> MemorySource {
    MemorySource::default()
        .with(
            "LMS",
            "YCNI",
            body("LFS: London", "LMS", "2023-03-14", &[("2023 JAN", "4.5"), ("2023 FEB", "4.6")]),
        )
        .with(
            "LMS",
            "YCNM",
            body("LFS: Wales", "LMS", "2023-02-14", &[("2023 FEB", "3.9"), ("2023 MAR", "4.0")]),
        )
}

#[test]
fn regional_panel_joins_on_date_union() {
    let source = london_wales_source();
    let regions = panel(
        "regions",
        Some("Regional unemployment"),
        vec![spec("LMS", "YCNI", "London"), spec("LMS", "YCNM", "Wales")],
    );

    let data = build_panel(&source, &regions, false).unwrap();
    assert_eq!(data.title, "Regional unemployment");
    assert_eq!(data.unit.as_deref(), Some("%"));
    assert_eq!(data.table.dates, vec![ymd(2023, 1, 1), ymd(2023, 2, 1), ymd(2023, 3, 1)]);
    assert_eq!(data.table.labels(), vec!["London", "Wales"]);
    assert_eq!(data.table.column("London").unwrap().values, vec![Some(4.5), Some(4.6), None]);
    assert_eq!(data.table.column("Wales").unwrap().values, vec![None, Some(3.9), Some(4.0)]);
}

#[test]
fn metadata_comes_from_the_panels_own_constituents() {
    let source = london_wales_source().with(
        "UNEM",
        "AP2Y",
        body("Vacancies", "UNEM", "2024-01-16", &[("2023 JAN", "1100")]),
    );
    let regions = panel(
        "regions",
        None,
        vec![spec("LMS", "YCNI", "London"), spec("LMS", "YCNM", "Wales")],
    );

    let data = build_panel(&source, &regions, true).unwrap();
    assert_eq!(data.meta.sources, vec!["LMS"]);
    assert_eq!(data.meta.last_updated, Some(ymd(2023, 3, 14)));
    assert_eq!(data.meta.columns.len(), 2);
    // No configured title and several series: falls back to the id.
    assert_eq!(data.title, "regions");
}

#[test]
fn one_failed_constituent_fails_the_panel_without_partial_join() {
    let source = london_wales_source();
    let regions = panel(
        "regions",
        None,
        vec![
            spec("LMS", "YCNI", "London"),
            spec("LMS", "ZZZZ", "Atlantis"),
            spec("LMS", "YCNM", "Wales"),
        ],
    );

    for parallel in [false, true] {
        let err = build_panel(&source, &regions, parallel).unwrap_err();
        assert_eq!(
            err,
            PipelineError::Network {
                identity: SeriesIdentity::new("LMS", "ZZZZ"),
                message: "connection refused".to_string(),
            }
        );
    }
}

#[test]
fn failed_panel_does_not_stop_the_others() {
    let source = london_wales_source().with(
        "LMS",
        "MGSX",
        body("Unemployment rate", "LMS", "2023-03-14", &[("2023 JAN", "3.7")]),
    );
    let config = DashboardConfig {
        panels: vec![
            panel("unemployment", None, vec![spec("LMS", "MGSX", "Unemployment rate")]),
            panel("vacancies", Some("Vacancies"), vec![spec("UNEM", "AP2Y", "Vacancies")]),
            panel(
                "regions",
                None,
                vec![spec("LMS", "YCNI", "London"), spec("LMS", "YCNM", "Wales")],
            ),
        ],
        ..DashboardConfig::default()
    };

    let outcomes = build_dashboard(&source, &config);
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[0].title, "Unemployment rate");
    assert!(matches!(outcomes[1].result, Err(PipelineError::Network { .. })));
    assert_eq!(outcomes[1].title, "Vacancies");
    assert!(outcomes[2].is_ok());
}

#[test]
fn malformed_series_surfaces_as_schema_error() {
    let source = MemorySource::default().with(
        "LMS",
        "MGSX",
        json!({"description": {"title": "Unemployment rate"}, "months": [{"value": "3.7"}]}),
    );
    let single = panel("unemployment", None, vec![spec("LMS", "MGSX", "Unemployment rate")]);
    assert!(matches!(
        build_panel(&source, &single, false),
        Err(PipelineError::Schema { .. })
    ));
}

#[test]
fn cached_source_fetches_each_series_once() {
    let cached = CachedSource::new(london_wales_source());
    let regions = panel(
        "regions",
        None,
        vec![spec("LMS", "YCNI", "London"), spec("LMS", "YCNM", "Wales")],
    );
    let london_only = panel("london", None, vec![spec("LMS", "YCNI", "London")]);

    build_panel(&cached, &regions, true).unwrap();
    build_panel(&cached, &london_only, false).unwrap();
    build_panel(&cached, &regions, false).unwrap();
    assert_eq!(cached.inner().calls(), 2);
    assert_eq!(cached.len(), 2);

    cached.clear();
    build_panel(&cached, &london_only, false).unwrap();
    assert_eq!(cached.inner().calls(), 3);
}

#[test]
fn selection_narrows_a_built_panel() {
    let source = london_wales_source();
    let regions = panel(
        "regions",
        None,
        vec![spec("LMS", "YCNI", "London"), spec("LMS", "YCNM", "Wales")],
    );
    let data = build_panel(&source, &regions, false).unwrap();

    let selection = Selection::from_pairs([("regions".to_string(), vec!["Wales".to_string()])]);
    let table = selection.apply(&data).unwrap();
    assert_eq!(table.labels(), vec!["Wales"]);
    assert_eq!(table.len(), 3);
}
