//! Per-playlist label columns.
//!
//! A label set is the caller's annotation for one playlist, e.g.
//! `{ Decade = "1970" }`. It is either used whole or dropped whole.

use std::collections::BTreeMap;
use std::fmt;

use super::record::format_float;
use super::DatasetError;

/// An allowed label value.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelValue {
    String(String),
    Float(f64),
    Integer(i64),
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Integer(v) => write!(f, "{v}"),
        }
    }
}

impl LabelValue {
    /// Parse a command-line value: integer, then float, else string.
    pub fn parse(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            Self::Integer(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            Self::Float(f)
        } else {
            Self::String(raw.to_string())
        }
    }
}

/// A label as supplied, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelEntry {
    Value(LabelValue),
    /// Anything else (booleans, arrays, tables, datetimes). Holds the type name.
    Unsupported(&'static str),
}

/// Ordered label set for one playlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    entries: Vec<(String, LabelEntry)>,
}

/// Outcome of [`LabelSet::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum LabelValidation {
    /// No labels given.
    Empty,
    /// Label columns keyed and sorted by name.
    Accepted(BTreeMap<String, LabelValue>),
    /// At least one entry had a disallowed type; the whole set is dropped.
    Rejected { key: String, found: &'static str },
}

impl LabelValidation {
    /// Column names and values to append to every row, sorted by name.
    pub fn columns(&self) -> Vec<(String, LabelValue)> {
        match self {
            Self::Accepted(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Self::Empty | Self::Rejected { .. } => Vec::new(),
        }
    }
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: LabelEntry) {
        let key = key.into();
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Add a scalar label.
    pub fn with(mut self, key: impl Into<String>, value: LabelValue) -> Self {
        self.insert(key, LabelEntry::Value(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Build a label set from a TOML value, which must be a table.
    pub fn from_toml(playlist_id: &str, value: &toml::Value) -> Result<Self, DatasetError> {
        let table = value.as_table().ok_or_else(|| DatasetError::MalformedLabels {
            playlist: playlist_id.to_string(),
            reason: format!(
                "expected a table such as {{ Decade = \"1970\" }}, found {}",
                value.type_str()
            ),
        })?;

        let mut labels = Self::new();
        for (key, value) in table {
            let entry = match value {
                toml::Value::String(s) => LabelEntry::Value(LabelValue::String(s.clone())),
                toml::Value::Integer(i) => LabelEntry::Value(LabelValue::Integer(*i)),
                toml::Value::Float(f) => LabelEntry::Value(LabelValue::Float(*f)),
                other => LabelEntry::Unsupported(other.type_str()),
            };
            labels.insert(key.clone(), entry);
        }
        Ok(labels)
    }

    /// Parse `KEY=VALUE` pairs as given on the command line.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self, DatasetError> {
        let mut labels = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .filter(|(k, _)| !k.trim().is_empty())
                .ok_or_else(|| DatasetError::MalformedLabels {
                    playlist: "<command line>".to_string(),
                    reason: format!("expected KEY=VALUE, got '{pair}'"),
                })?;
            labels.insert(key.trim(), LabelEntry::Value(LabelValue::parse(value.trim())));
        }
        Ok(labels)
    }

    /// Decide which label columns this set contributes.
    pub fn validate(&self) -> LabelValidation {
        if self.entries.is_empty() {
            return LabelValidation::Empty;
        }

        let mut columns = BTreeMap::new();
        for (key, entry) in &self.entries {
            match entry {
                LabelEntry::Value(v) => {
                    columns.insert(key.clone(), v.clone());
                }
                LabelEntry::Unsupported(found) => {
                    return LabelValidation::Rejected {
                        key: key.clone(),
                        found: *found,
                    };
                }
            }
        }
        LabelValidation::Accepted(columns)
    }
}

/// Read an ordered `playlist id -> label table` mapping, e.g. the
/// `[playlists]` section of a config file. Fails on the first entry that is
/// not a table, before anything touches the network.
pub fn playlists_from_table(table: &toml::Table) -> Result<Vec<(String, LabelSet)>, DatasetError> {
    table
        .iter()
        .map(|(id, value)| Ok((id.clone(), LabelSet::from_toml(id, value)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_table(s: &str) -> toml::Value {
        toml::Value::Table(toml::from_str::<toml::Table>(s).unwrap())
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(LabelSet::new().validate(), LabelValidation::Empty);
        assert!(LabelSet::new().validate().columns().is_empty());
    }

    #[test]
    fn test_accepted_columns_sorted() {
        let labels = LabelSet::new()
            .with("Year", LabelValue::Integer(1971))
            .with("Decade", LabelValue::String("1970".into()))
            .with("Mood", LabelValue::Float(0.5));

        let cols = labels.validate().columns();
        let names: Vec<&str> = cols.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["Decade", "Mood", "Year"]);
        // Values stay with their own key
        assert_eq!(cols[0].1, LabelValue::String("1970".into()));
        assert_eq!(cols[1].1, LabelValue::Float(0.5));
        assert_eq!(cols[2].1, LabelValue::Integer(1971));
    }

    #[test]
    fn test_one_bad_entry_rejects_all() {
        let value = parse_table(
            r#"
            Decade = "1970"
            Live = true
            "#,
        );
        let labels = LabelSet::from_toml("pl", &value).unwrap();
        let validation = labels.validate();
        assert!(matches!(
            &validation,
            LabelValidation::Rejected { key, found } if key == "Live" && *found == "boolean"
        ));
        assert!(validation.columns().is_empty());
    }

    #[test]
    fn test_from_toml_scalars() {
        let value = parse_table(
            r#"
            Decade = "1970"
            Year = 1971
            Weight = 1.5
            "#,
        );
        let labels = LabelSet::from_toml("pl", &value).unwrap();
        assert_eq!(labels.len(), 3);
        assert!(matches!(labels.validate(), LabelValidation::Accepted(m) if m.len() == 3));
    }

    #[test]
    fn test_from_toml_not_a_table() {
        let err = LabelSet::from_toml("pl", &toml::Value::String("1970".into())).unwrap_err();
        assert!(matches!(err, DatasetError::MalformedLabels { .. }));
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_from_pairs() {
        let labels = LabelSet::from_pairs(&["Decade=1970", "Mood=happy", "Weight=0.25"]).unwrap();
        let cols = labels.validate().columns();
        assert_eq!(cols[0], ("Decade".to_string(), LabelValue::Integer(1970)));
        assert_eq!(cols[1], ("Mood".to_string(), LabelValue::String("happy".into())));
        assert_eq!(cols[2], ("Weight".to_string(), LabelValue::Float(0.25)));
    }

    #[test]
    fn test_from_pairs_malformed() {
        assert!(LabelSet::from_pairs(&["Decade"]).is_err());
        assert!(LabelSet::from_pairs(&["=1970"]).is_err());
    }

    #[test]
    fn test_playlists_keep_file_order() {
        let table: toml::Table = toml::from_str(
            r#"
            "37i9dQZF1DWWmGB2u14f8m" = { Decade = "1950" }
            "37i9dQZF1DX4joPVMjBCAo" = { Decade = "1960" }
            "37i9dQZF1DWTJ7xPn4vNaz" = {}
            "#,
        )
        .unwrap();
        let playlists = playlists_from_table(&table).unwrap();
        let ids: Vec<&str> = playlists.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["37i9dQZF1DWWmGB2u14f8m", "37i9dQZF1DX4joPVMjBCAo", "37i9dQZF1DWTJ7xPn4vNaz"]
        );
        assert!(playlists[2].1.is_empty());
    }

    #[test]
    fn test_playlists_malformed_entry() {
        let table: toml::Table = toml::from_str(r#""37i9dQZF1DWWmGB2u14f8m" = "1950""#).unwrap();
        let err = playlists_from_table(&table).unwrap_err();
        assert!(matches!(err, DatasetError::MalformedLabels { ref playlist, .. } if playlist == "37i9dQZF1DWWmGB2u14f8m"));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(LabelValue::String("1970".into()).to_string(), "1970");
        assert_eq!(LabelValue::Integer(-3).to_string(), "-3");
        assert_eq!(LabelValue::Float(0.5).to_string(), "0.5");
        assert_eq!(LabelValue::Float(1970.0).to_string(), "1970.0");
        assert_ne!(LabelValue::Float(1970.0).to_string(), LabelValue::Integer(1970).to_string());
    }
}
