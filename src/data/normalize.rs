//! Raw payload -> typed `Series`.
//!
//! Policy is strict: one bad observation fails the whole series. There is no
//! silent skipping, because a chart with quietly dropped months is worse than
//! a visible error.

use chrono::{Datelike, Month, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::data::ons::RawPayload;
use crate::domain::{Frequency, Observation, Series, SeriesIdentity};
use crate::error::PipelineError;

/// One record of the frequency-keyed observation array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObservation {
    date: Option<String>,
    /// `null` is kept as present so it reports as a bad value, not a missing key.
    #[serde(default, deserialize_with = "present")]
    value: Option<Value>,
    label: Option<String>,
    source_dataset: Option<String>,
    update_date: Option<String>,
}

fn present<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(de).map(Some)
}

/// Normalize a decoded payload into a date-sorted `Series`.
pub fn normalize(payload: &RawPayload) -> Result<Series, PipelineError> {
    let identity = &payload.identity;
    let schema = |reason: String| PipelineError::Schema {
        identity: identity.clone(),
        reason,
    };

    let title = payload
        .body
        .pointer("/description/title")
        .and_then(Value::as_str)
        .ok_or_else(|| schema("missing description.title".to_string()))?
        .trim()
        .to_string();

    let unit = payload
        .body
        .pointer("/description/unit")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let key = payload.frequency.payload_key();
    let records = payload
        .body
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| schema(format!("missing '{key}' observation array")))?;

    let mut observations = Vec::with_capacity(records.len());
    let mut source_dataset = None;
    let mut last_updated = None;

    for (index, record) in records.iter().enumerate() {
        let raw = RawObservation::deserialize(record)
            .map_err(|e| schema(format!("observation {index} is not a record: {e}")))?;

        let date_raw = raw
            .date
            .ok_or_else(|| schema(format!("observation {index} has no 'date'")))?;
        let value_raw = raw
            .value
            .ok_or_else(|| schema(format!("observation {index} has no 'value'")))?;

        let date = parse_period(&date_raw, payload.frequency)
            .ok_or_else(|| quality(identity, index, "date", &date_raw))?;

        let value_text = match &value_raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let value = parse_value(&value_text).ok_or_else(|| quality(identity, index, "value", &value_text))?;

        // Later records overwrite earlier metadata.
        if let Some(src) = raw.source_dataset.filter(|s| !s.trim().is_empty()) {
            source_dataset = Some(src.trim().to_string());
        }
        if let Some(upd) = raw.update_date.filter(|s| !s.trim().is_empty()) {
            let parsed = parse_update_date(&upd).ok_or_else(|| quality(identity, index, "updateDate", &upd))?;
            last_updated = Some(parsed);
        }

        observations.push(Observation {
            date,
            value,
            label: raw.label.unwrap_or(date_raw),
        });
    }

    // Stable: same-date entries keep document order.
    observations.sort_by_key(|o| o.date);

    debug!(%identity, n_obs = observations.len(), "normalized series");

    Ok(Series {
        identity: identity.clone(),
        frequency: payload.frequency,
        title,
        unit,
        source_dataset,
        last_updated,
        observations,
    })
}

fn quality(identity: &SeriesIdentity, index: usize, field: &'static str, raw: &str) -> PipelineError {
    PipelineError::DataQuality {
        identity: identity.clone(),
        index,
        field,
        raw: raw.to_string(),
    }
}

/// Parse an observation value; only finite decimals are accepted.
pub fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Parse a period label under the given frequency.
///
/// Accepted forms, all normalized to the first day of the period:
/// - monthly `2023 JAN` (month name is case-insensitive)
/// - quarterly `2023 Q1`
/// - annual `2023`
/// - ISO `2023-01-15` or `2023-01` for any frequency
pub fn parse_period(raw: &str, frequency: Frequency) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Some(date) = parse_iso(s) {
        return Some(period_start(date, frequency));
    }

    let mut parts = s.split_whitespace();
    let year_part = parts.next()?;
    if year_part.len() != 4 {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;
    let rest = parts.next();
    if parts.next().is_some() {
        return None;
    }

    match (frequency, rest) {
        (Frequency::Monthly, Some(m)) => {
            let month: Month = title_case(m).parse().ok()?;
            NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)
        }
        (Frequency::Quarterly, Some(q)) => {
            let n: u32 = q.strip_prefix(['Q', 'q'])?.parse().ok()?;
            if !(1..=4).contains(&n) {
                return None;
            }
            NaiveDate::from_ymd_opt(year, (n - 1) * 3 + 1, 1)
        }
        (Frequency::Annual, None) => NaiveDate::from_ymd_opt(year, 1, 1),
        _ => None,
    }
}

/// Parse `updateDate`, which may carry a time part after the date.
pub fn parse_update_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if s.len() == 7 && s.as_bytes().get(4) == Some(&b'-') {
        return NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok();
    }
    None
}

fn period_start(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    let month = match frequency {
        Frequency::Monthly => date.month(),
        Frequency::Quarterly => date.month0() / 3 * 3 + 1,
        Frequency::Annual => 1,
    };
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
