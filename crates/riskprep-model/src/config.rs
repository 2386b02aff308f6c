//! The pipeline configuration document.
//!
//! ```json
//! {
//!   "configuration": {
//!     "attributes": { "dtype": { "loan_id": "int", "balance": "float" } },
//!     "data_specific_functions": {
//!       "date_columns": { "as_of": { "date_format": "XMYYYY", "separator": ["/"] } },
//!       "replace_values": [
//!         { "column_name": "grade", "values_to_replace": ["?"], "values_to_replace_with": ["NR"] }
//!       ],
//!       "missing_values": {
//!         "method": "mean", "subset": ["grade"], "drop_all_nulls": true, "null_threshold": 40
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Every level is optional. Accessors on [`PipelineConfig`] return `None` when
//! the corresponding path is absent so each stage can degrade to a no-op.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Root of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
}

/// The `configuration` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_specific_functions: Option<DataSpecificFunctions>,
}

/// `configuration.attributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Column name to target type identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<ColumnMap<String>>,
}

/// `configuration.data_specific_functions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSpecificFunctions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_columns: Option<ColumnMap<DateColumnConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_values: Option<Vec<ReplaceDirective>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_values: Option<MissingValuesConfig>,
}

/// Date handling for one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateColumnConfig {
    /// A stock strftime pattern, the `ISO8601` sentinel, or a custom format code.
    #[serde(default)]
    pub date_format: Option<String>,
    /// Characters stripped from raw values before a custom format is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<Separators>,
}

impl DateColumnConfig {
    /// Creates a date column entry for the given format.
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: Some(date_format.into()),
            separator: None,
        }
    }

    /// Sets the separators stripped before custom parsing.
    #[must_use]
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separator = Some(Separators(
            separators.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

/// Ordered separator sequence.
///
/// Accepts either a list of strings or a single string; a single string is
/// split into its characters, each of which is a separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SeparatorRepr")]
pub struct Separators(pub Vec<String>);

impl Separators {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Removes every separator from `value`.
    pub fn strip(&self, value: &str) -> String {
        let mut stripped = value.to_string();
        for sep in self.iter().filter(|sep| !sep.is_empty()) {
            stripped = stripped.replace(sep, "");
        }
        stripped
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeparatorRepr {
    Text(String),
    List(Vec<String>),
}

impl From<SeparatorRepr> for Separators {
    fn from(repr: SeparatorRepr) -> Self {
        match repr {
            SeparatorRepr::Text(text) => Separators(text.chars().map(String::from).collect()),
            SeparatorRepr::List(list) => Separators(list),
        }
    }
}

/// One `replace_values` entry.
///
/// Keys are individually optional; the replacer skips a directive with an
/// absent key instead of failing the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceDirective {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_to_replace: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_to_replace_with: Option<Vec<Value>>,
}

impl ReplaceDirective {
    /// Names of the keys this directive lacks, in document order.
    pub fn absent_keys(&self) -> Vec<&'static str> {
        let mut absent = Vec::new();
        if self.column_name.is_none() {
            absent.push("column_name");
        }
        if self.values_to_replace.is_none() {
            absent.push("values_to_replace");
        }
        if self.values_to_replace_with.is_none() {
            absent.push("values_to_replace_with");
        }
        absent
    }
}

/// `data_specific_functions.missing_values`.
///
/// All four keys must be present (`null` counts as present) for the stage to
/// run; the outer `Option` records presence, the inner one the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingValuesConfig {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub method: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub subset: Option<Option<Vec<String>>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub drop_all_nulls: Option<Option<bool>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub null_threshold: Option<Option<NullThreshold>>,
}

/// Marks a key as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl MissingValuesConfig {
    /// Names of the keys absent from the record, in document order.
    pub fn absent_keys(&self) -> Vec<&'static str> {
        let mut absent = Vec::new();
        if self.method.is_none() {
            absent.push("method");
        }
        if self.subset.is_none() {
            absent.push("subset");
        }
        if self.drop_all_nulls.is_none() {
            absent.push("drop_all_nulls");
        }
        if self.null_threshold.is_none() {
            absent.push("null_threshold");
        }
        absent
    }

    /// The imputation method name, if set.
    pub fn method(&self) -> Option<&str> {
        self.method.as_ref()?.as_deref()
    }

    pub fn drop_all_nulls(&self) -> bool {
        self.drop_all_nulls.flatten().unwrap_or(false)
    }

    /// The threshold percentage, or `None` when it is absent, zero or `false`.
    pub fn null_threshold_percent(&self) -> Option<f64> {
        self.null_threshold.flatten().and_then(NullThreshold::percent)
    }

    /// The subset columns, or `None` when absent or empty.
    pub fn subset(&self) -> Option<&[String]> {
        self.subset
            .as_ref()?
            .as_deref()
            .filter(|subset| !subset.is_empty())
    }
}

/// Null threshold as written in the document: a percentage or a boolean flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NullThreshold {
    Percent(f64),
    Flag(bool),
}

impl NullThreshold {
    /// Effective percentage. Zero and `false` disable the threshold; `true` counts as 1.
    pub fn percent(self) -> Option<f64> {
        match self {
            NullThreshold::Percent(value) if value != 0.0 => Some(value),
            NullThreshold::Flag(true) => Some(1.0),
            NullThreshold::Percent(_) | NullThreshold::Flag(false) => None,
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration document from JSON text.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Builds a configuration from an already-parsed JSON value.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    fn functions(&self) -> Option<&DataSpecificFunctions> {
        self.configuration.as_ref()?.data_specific_functions.as_ref()
    }

    /// `configuration.attributes.dtype`
    pub fn dtype(&self) -> Option<&ColumnMap<String>> {
        self.configuration.as_ref()?.attributes.as_ref()?.dtype.as_ref()
    }

    /// `configuration.data_specific_functions.date_columns`
    pub fn date_columns(&self) -> Option<&ColumnMap<DateColumnConfig>> {
        self.functions()?.date_columns.as_ref()
    }

    /// `configuration.data_specific_functions.replace_values`
    pub fn replace_values(&self) -> Option<&[ReplaceDirective]> {
        self.functions()?.replace_values.as_deref()
    }

    /// `configuration.data_specific_functions.missing_values`
    pub fn missing_values(&self) -> Option<&MissingValuesConfig> {
        self.functions()?.missing_values.as_ref()
    }
}

/// Loads a configuration document.
///
/// Returns `Ok(None)` when the file does not exist, so callers run the
/// pipeline without configuration.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<Option<PipelineConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = PipelineConfig::from_json_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

/// A JSON object keyed by column name, kept in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for ColumnMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> ColumnMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `column`, keeping its first position.
    pub fn insert(&mut self, column: impl Into<String>, value: T) {
        let column = column.into();
        if let Some(slot) = self.entries.iter_mut().find(|(name, _)| *name == column) {
            slot.1 = value;
        } else {
            self.entries.push((column, value));
        }
    }

    pub fn get(&self, column: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for ColumnMap<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for (column, value) in iter {
            map.insert(column, value);
        }
        map
    }
}

impl<T: Serialize> Serialize for ColumnMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ColumnMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(ColumnMapVisitor(PhantomData))
    }
}

struct ColumnMapVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for ColumnMapVisitor<T> {
    type Value = ColumnMap<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by column name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut map = ColumnMap::new();
        while let Some((name, value)) = access.next_entry::<String, T>()? {
            map.insert(name, value);
        }
        Ok(map)
    }
}
