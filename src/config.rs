use crate::error::ResultMessage;
use crate::error::SiteSheetError;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// What to do when the input lacks the fields a mode relies on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingInputPolicy {
    /// Log a warning and fill a best-effort document
    #[default]
    Proceed,
    /// Fail with [`crate::report::EngineError::MissingInput`]
    Reject,
}

/// Engine settings, loaded from a JSON file and overridden from the command line
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Two-sheet template workbook, read fresh for every report
    pub template_path: PathBuf,
    /// Characters per activity line
    pub wrap_width: usize,
    /// Rows available for each activity column
    pub activity_rows: u32,
    pub missing_input: MissingInputPolicy,
    /// Reference sheet title used when the input carries none
    pub reference_title: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            template_path: PathBuf::from("templates/template.xlsx"),
            wrap_width: 110,
            activity_rows: 10,
            missing_input: MissingInputPolicy::default(),
            reference_title: String::from("PHOTO REFERENCE"),
        }
    }
}

impl EngineConfig {
    /// Reads a configuration file. Missing or invalid fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<EngineConfig, SiteSheetError> {
        let text = std::fs::read_to_string(path)
            .map_err(SiteSheetError::from)
            .with_prefix(&format!("Read config file '{}'", path.display()))?;
        EngineConfig::from_json(&text).with_prefix(&format!("Parse config file '{}'", path.display()))
    }

    pub fn from_json(text: &str) -> Result<EngineConfig, SiteSheetError> {
        let partial: serde_json::Value = serde_json::from_str(text)?;
        let mut config = EngineConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                match partial.get(stringify!($field)) {
                    Some(value) => match serde_json::from_value(value.clone()) {
                        Ok(parsed) => config.$field = parsed,
                        Err(error) => log::warn!(
                            "Config invalid value for '{}' ({}), using default: {:?}",
                            stringify!($field),
                            error,
                            config.$field
                        ),
                    },
                    None => log::debug!("Config missing field '{}', using default: {:?}", stringify!($field), config.$field),
                }
            };
        }

        load_or_default!(template_path);
        load_or_default!(wrap_width);
        load_or_default!(activity_rows);
        load_or_default!(missing_input);
        load_or_default!(reference_title);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_files_keep_defaults() {
        let config = EngineConfig::from_json(r#"{"wrap_width": 80, "missing_input": "reject", "activity_rows": "many"}"#).unwrap();
        assert_eq!(config.wrap_width, 80);
        assert_eq!(config.missing_input, MissingInputPolicy::Reject);
        assert_eq!(config.activity_rows, 10);
        assert_eq!(config.template_path, PathBuf::from("templates/template.xlsx"));
        assert_eq!(config.reference_title, "PHOTO REFERENCE");
    }

    #[test]
    fn reads_files_and_names_them_in_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"template_path": "/srv/site/template.xlsx"}"#).unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.template_path, PathBuf::from("/srv/site/template.xlsx"));

        let error = EngineConfig::from_file(Path::new("/no/such/sitesheet.json")).unwrap_err();
        assert!(error.to_string().starts_with("Read config file '/no/such/sitesheet.json'"));
    }
}
