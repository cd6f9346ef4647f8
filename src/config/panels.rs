//! Built-in panel table: the UK labour-market overview.

use super::{PanelSpec, SeriesSpec};
use crate::domain::Frequency;

const REGIONS: [(&str, &str); 12] = [
    ("YCNH", "East"),
    ("YCNF", "East Midlands"),
    ("YCNI", "London"),
    ("YCNC", "North East"),
    ("YCND", "North West"),
    ("ZSFB", "Northern Ireland"),
    ("YCNN", "Scotland"),
    ("YCNJ", "South East"),
    ("YCNK", "South West"),
    ("YCNM", "Wales"),
    ("YCNG", "West Midlands"),
    ("YCNE", "Yorks & the Humber"),
];

const AGE_BANDS: [(&str, &str); 3] = [("MGWY", "16-24"), ("MGXB", "25-49"), ("YBVW", "50+")];

fn lms(series: &str, label: &str) -> SeriesSpec {
    SeriesSpec {
        dataset: "LMS".to_string(),
        series: series.to_string(),
        label: label.to_string(),
        frequency: Frequency::Monthly,
    }
}

fn single(id: &str, spec: SeriesSpec) -> PanelSpec {
    PanelSpec {
        id: id.to_string(),
        title: None,
        show_table: false,
        series: vec![spec],
    }
}

fn group(id: &str, title: &str, members: &[(&str, &str)]) -> PanelSpec {
    PanelSpec {
        id: id.to_string(),
        title: Some(title.to_string()),
        show_table: false,
        series: members.iter().map(|(series, label)| lms(series, label)).collect(),
    }
}

pub fn default_panels() -> Vec<PanelSpec> {
    vec![
        single("unemployment", lms("MGSX", "Unemployment rate")),
        single("employment", lms("LF24", "Employment rate")),
        single("inactivity", lms("LF2S", "Inactivity rate")),
        single(
            "vacancies",
            SeriesSpec {
                dataset: "UNEM".to_string(),
                series: "AP2Y".to_string(),
                label: "Vacancies".to_string(),
                frequency: Frequency::Monthly,
            },
        ),
        group("regions", "Regional unemployment rates (seasonally adjusted)", &REGIONS),
        group("age-bands", "Unemployment rates by age band (seasonally adjusted)", &AGE_BANDS),
    ]
}
