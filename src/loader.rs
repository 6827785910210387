//! Dataset loading: fetch a CSV by URL, path or stdin, then remap gender codes.

use crate::data::{RecordTable, Value};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader};

/// NHANES 2015-2016 extract used by the built-in report.
pub const NHANES_URL: &str =
    "https://raw.githubusercontent.com/ftarantuviez/Data/main/nhanes_2015_2016.csv";

/// What to do with a gender code that is neither 1 nor 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedCodePolicy {
    /// Keep the raw value.
    PassThrough,
    /// Replace it with the label `"Unknown"`.
    #[default]
    Unknown,
    /// Refuse the whole table.
    Fail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Column holding numeric gender codes.
    pub gender_column: String,
    /// Derived column receiving the labels.
    pub gender_label_column: String,
    pub unmapped: UnmappedCodePolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            gender_column: "RIAGENDR".to_string(),
            gender_label_column: "RIAGENDRx".to_string(),
            unmapped: UnmappedCodePolicy::default(),
        }
    }
}

/// Load a table from `source` and apply the gender remap.
///
/// `source` is an `http(s)://` URL, `-` for stdin, or a file path.
pub fn load(source: &str, config: &LoaderConfig) -> Result<RecordTable> {
    log::info!("Loading dataset from {source}");
    let table = fetch(source)?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers().len(),
        source
    );
    remap_gender(table, config).map_err(|e| match e {
        Error::DataUnavailable { reason, .. } => Error::unavailable(source, reason),
        other => other,
    })
}

fn fetch(source: &str) -> Result<RecordTable> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = ureq::get(source)
            .call()
            .map_err(|e| Error::unavailable(source, e))?;
        RecordTable::from_csv_reader(response.into_reader(), source)
    } else if source == "-" {
        RecordTable::from_csv_reader(io::stdin().lock(), "<stdin>")
    } else {
        let file = File::open(source).map_err(|e| Error::unavailable(source, e))?;
        RecordTable::from_csv_reader(BufReader::new(file), source)
    }
}

/// Write `1 -> "Male"`, `2 -> "Female"` into the label column.
pub fn remap_gender(table: RecordTable, config: &LoaderConfig) -> Result<RecordTable> {
    let codes = match table.column(&config.gender_column) {
        Ok(codes) => codes,
        Err(_) => {
            log::warn!(
                "Column '{}' not present, skipping gender remap",
                config.gender_column
            );
            return Ok(table);
        }
    };

    let mut unmapped = 0usize;
    let mut labels = Vec::with_capacity(codes.len());
    for code in codes {
        let label = match code.as_f64() {
            Some(n) if n == 1.0 => Value::Text("Male".to_string()),
            Some(n) if n == 2.0 => Value::Text("Female".to_string()),
            _ if code.is_missing() => Value::Missing,
            _ => {
                unmapped += 1;
                match config.unmapped {
                    UnmappedCodePolicy::PassThrough => code.clone(),
                    UnmappedCodePolicy::Unknown => Value::Text("Unknown".to_string()),
                    UnmappedCodePolicy::Fail => {
                        return Err(Error::unavailable(
                            "<memory>",
                            format!(
                                "unexpected code {:?} in column '{}'",
                                code, config.gender_column
                            ),
                        ))
                    }
                }
            }
        };
        labels.push(label);
    }

    if unmapped > 0 {
        log::warn!(
            "{} value(s) in '{}' are not 1 or 2 (policy: {:?})",
            unmapped,
            config.gender_column,
            config.unmapped
        );
    }

    table.with_column(&config.gender_label_column, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(csv: &str) -> RecordTable {
        RecordTable::from_csv_reader(csv.as_bytes(), "test").unwrap()
    }

    fn labels(table: &RecordTable) -> Vec<Value> {
        table.column("RIAGENDRx").unwrap().into_iter().cloned().collect()
    }

    #[test]
    fn test_remap_gender_basic() {
        let t = remap_gender(table("RIAGENDR\n1\n2\n\n"), &LoaderConfig::default()).unwrap();
        assert_eq!(
            labels(&t),
            vec![
                Value::Text("Male".into()),
                Value::Text("Female".into()),
                Value::Missing
            ]
        );
        // source column is kept
        assert!(t.has_column("RIAGENDR"));
    }

    #[test]
    fn test_remap_gender_unknown_policy() {
        let t = remap_gender(table("RIAGENDR\n1\n7\n"), &LoaderConfig::default()).unwrap();
        assert_eq!(labels(&t)[1], Value::Text("Unknown".into()));
    }

    #[test]
    fn test_remap_gender_pass_through_policy() {
        let config = LoaderConfig {
            unmapped: UnmappedCodePolicy::PassThrough,
            ..Default::default()
        };
        let t = remap_gender(table("RIAGENDR\n9\n"), &config).unwrap();
        assert_eq!(labels(&t)[0], Value::Number(9.0));
    }

    #[test]
    fn test_remap_gender_fail_policy() {
        let config = LoaderConfig {
            unmapped: UnmappedCodePolicy::Fail,
            ..Default::default()
        };
        let result = remap_gender(table("RIAGENDR\n1\n3\n"), &config);
        assert!(matches!(result, Err(Error::DataUnavailable { .. })));
    }

    #[test]
    fn test_remap_gender_missing_column_is_skipped() {
        let t = remap_gender(table("a\n1\n"), &LoaderConfig::default()).unwrap();
        assert!(!t.has_column("RIAGENDRx"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "BMXLEG,BMXARML,RIAGENDR\n40,35,1\n38,33,2\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let t = load(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.has_column("RIAGENDRx"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load("/definitely/not/here.csv", &LoaderConfig::default());
        match result {
            Err(Error::DataUnavailable { source_id, .. }) => {
                assert_eq!(source_id, "/definitely/not/here.csv")
            }
            other => panic!("Expected DataUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_load_fail_policy_reports_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "RIAGENDR\n5\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let config = LoaderConfig {
            unmapped: UnmappedCodePolicy::Fail,
            ..Default::default()
        };
        match load(&path, &config) {
            Err(Error::DataUnavailable { source_id, .. }) => assert_eq!(source_id, path),
            other => panic!("Expected DataUnavailable, got {other:?}"),
        }
    }
}
