//! JSON input of the report generator.
//!
//! Field names follow the front end that posts the data (`projectName`,
//! `weatherAM`, `section_title`, ...). Text fields also accept numbers, counts also
//! accept numeric strings, and anything missing falls back to an empty value.
use crate::error::SiteSheetError;
use crate::helpers::string::to_number;
use crate::images::ImageSource;
use crate::report::Mode;
use serde::Deserialize;
use serde::Deserializer;

/// Scalar JSON value that is read as text or as a count
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
    Boolean(bool),
}

impl Loose {
    fn into_text(self) -> String {
        match self {
            Loose::Text(text) => text,
            Loose::Number(number) => number.to_string(),
            Loose::Boolean(value) => value.to_string(),
        }
    }

    /// Zero, `false` and the empty string count as no value
    fn is_set(&self) -> bool {
        match self {
            Loose::Text(text) => !text.is_empty(),
            Loose::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
            Loose::Boolean(value) => *value,
        }
    }

    fn into_count(self) -> f64 {
        match self {
            Loose::Text(text) => to_number(&text),
            Loose::Number(number) => number.as_f64().unwrap_or(0.0),
            Loose::Boolean(_) => 0.0,
        }
    }
}

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Loose>::deserialize(deserializer)?.map(Loose::into_text).unwrap_or_default())
}

fn set_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Loose>::deserialize(deserializer)?
        .filter(Loose::is_set)
        .map(Loose::into_text)
        .unwrap_or_default())
}

fn optional_loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Some(loose_text(deserializer)?))
}

fn loose_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<Loose>::deserialize(deserializer)?.map(Loose::into_count).unwrap_or(0.0))
}

fn loose_text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = Option::<Vec<Option<Loose>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values.into_iter().map(|value| value.map(Loose::into_text).unwrap_or_default()).collect())
}

/// `null` keeps its position as an empty source so later pictures stay in their column
fn image_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ImageSource>, D::Error> {
    let values = Option::<Vec<Option<String>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values.into_iter().map(|value| ImageSource::from(value.unwrap_or_default())).collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One line of the management or working team table
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TeamMember {
    #[serde(deserialize_with = "loose_text")]
    pub description: String,
    /// Headcount up to the previous report
    #[serde(deserialize_with = "loose_count")]
    pub prev: f64,
    #[serde(deserialize_with = "loose_count")]
    pub today: f64,
}

/// One line of the materials or machinery table
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SupplyItem {
    #[serde(deserialize_with = "loose_text")]
    pub description: String,
    #[serde(deserialize_with = "loose_text")]
    pub unit: String,
    #[serde(deserialize_with = "loose_count")]
    pub prev: f64,
    #[serde(deserialize_with = "loose_count")]
    pub today: f64,
}

/// A photo entry of the reference sheet: up to two pictures with a caption each
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReferenceEntry {
    /// Entries with the same consecutive title share one section heading
    #[serde(deserialize_with = "loose_text")]
    pub section_title: String,
    #[serde(deserialize_with = "image_list")]
    pub images: Vec<ImageSource>,
    #[serde(deserialize_with = "loose_text_list")]
    pub footers: Vec<String>,
}

/// Everything the front end sends for one report.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportInput {
    /// `None` when the field is absent from the input
    #[serde(deserialize_with = "optional_loose_text")]
    pub project_name: Option<String>,
    /// ISO date or date-time; anything else is printed as given
    #[serde(deserialize_with = "loose_text")]
    pub report_date: String,
    #[serde(rename = "weatherAM", deserialize_with = "loose_text")]
    pub weather_am: String,
    #[serde(rename = "weatherPM", deserialize_with = "loose_text")]
    pub weather_pm: String,
    #[serde(rename = "tempAM", deserialize_with = "set_text")]
    pub temp_am: String,
    #[serde(rename = "tempPM", deserialize_with = "set_text")]
    pub temp_pm: String,
    #[serde(deserialize_with = "loose_text")]
    pub activity_today: String,
    #[serde(deserialize_with = "loose_text")]
    pub work_plan_next_day: String,
    #[serde(deserialize_with = "null_as_default")]
    pub management_team: Vec<TeamMember>,
    #[serde(deserialize_with = "null_as_default")]
    pub working_team: Vec<TeamMember>,
    #[serde(deserialize_with = "null_as_default")]
    pub materials: Vec<SupplyItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub machinery: Vec<SupplyItem>,
    /// `None` when the field is absent from the input
    pub reference: Option<Vec<ReferenceEntry>>,
    #[serde(rename = "table_title")]
    pub table_title: Option<String>,
}

/// A generation request
#[derive(Clone, Debug, Default)]
pub struct Payload {
    pub mode: Mode,
    pub data: ReportInput,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    mode: Option<Mode>,
    #[serde(default)]
    data: Option<ReportInput>,
}

impl Payload {
    pub fn new(mode: Mode, data: ReportInput) -> Payload {
        Payload { mode, data }
    }

    /// Parses either `{"mode": ..., "data": {...}}` or a bare data object.
    ///
    /// # Arguments
    /// * `json` - Request body
    /// * `mode` - Mode that takes precedence over the one in the body
    pub fn from_json(json: &str, mode: Option<Mode>) -> Result<Payload, SiteSheetError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let is_envelope = value.get("data").is_some_and(|data| data.is_object() || data.is_null());
        let (body_mode, data) = if is_envelope {
            let envelope: Envelope = serde_json::from_value(value)?;
            (envelope.mode, envelope.data.unwrap_or_default())
        } else {
            (None, serde_json::from_value::<ReportInput>(value)?)
        };
        Ok(Payload {
            mode: mode.or(body_mode).unwrap_or_default(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_loosely_typed_fields() {
        let input: ReportInput = serde_json::from_str(
            r#"{
                "projectName": "Tower B",
                "tempAM": 27,
                "tempPM": null,
                "managementTeam": [{"description": "Engineer", "prev": "3", "today": 1}],
                "materials": [{"description": "Cement", "unit": "bag", "prev": "", "today": "x"}]
            }"#,
        )
        .unwrap();
        assert_eq!(input.project_name.as_deref(), Some("Tower B"));
        assert_eq!(input.temp_am, "27");
        assert_eq!(input.temp_pm, "");
        assert_eq!(input.management_team[0], TeamMember { description: "Engineer".to_owned(), prev: 3.0, today: 1.0 });
        assert_eq!((input.materials[0].prev, input.materials[0].today), (0.0, 0.0));
        assert!(input.reference.is_none());
    }

    #[test]
    fn zero_temperatures_read_as_unset() {
        let input: ReportInput = serde_json::from_str(r#"{"tempAM": 0, "tempPM": false}"#).unwrap();
        assert_eq!((input.temp_am.as_str(), input.temp_pm.as_str()), ("", ""));
        let input: ReportInput = serde_json::from_str(r#"{"tempAM": "0", "tempPM": -2.5}"#).unwrap();
        assert_eq!((input.temp_am.as_str(), input.temp_pm.as_str()), ("0", "-2.5"));
    }

    #[test]
    fn absent_project_name_differs_from_blank() {
        let absent: ReportInput = serde_json::from_str("{}").unwrap();
        let blank: ReportInput = serde_json::from_str(r#"{"projectName": ""}"#).unwrap();
        assert_eq!(absent.project_name, None);
        assert_eq!(blank.project_name, Some(String::new()));
    }

    #[test]
    fn reads_reference_entries() {
        let input: ReportInput = serde_json::from_str(
            r#"{"reference": [{"section_title": "Site A", "images": [null, "a.png"], "footers": ["Fig 1", 2]}],
                "table_title": "PHOTOS"}"#,
        )
        .unwrap();
        let entry = &input.reference.unwrap()[0];
        assert_eq!(entry.section_title, "Site A");
        assert!(entry.images[0].is_empty());
        assert_eq!(entry.images[1].name_hint(), Some("a.png"));
        assert_eq!(entry.footers, vec!["Fig 1", "2"]);
        assert_eq!(input.table_title.as_deref(), Some("PHOTOS"));
    }

    #[test]
    fn parses_envelopes_and_bare_objects() {
        let payload = Payload::from_json(r#"{"mode": "combined", "data": {"projectName": "Tower"}}"#, None).unwrap();
        assert_eq!(payload.mode, Mode::Combined);
        assert_eq!(payload.data.project_name.as_deref(), Some("Tower"));

        let payload = Payload::from_json(r#"{"reference": []}"#, Some(Mode::Reference)).unwrap();
        assert_eq!(payload.mode, Mode::Reference);
        assert_eq!(payload.data.reference.map(|entries| entries.len()), Some(0));

        let payload = Payload::from_json(r#"{"mode": "report", "data": null}"#, Some(Mode::Combined)).unwrap();
        assert_eq!(payload.mode, Mode::Combined);
        assert!(payload.data.project_name.is_none());

        assert!(Payload::from_json(r#"{"mode": "poster", "data": {}}"#, None).is_err());
    }
}
