use std::path::Path;

use indexmap::IndexMap;
use snafu::ResultExt;

use super::{ConfigSource, Error, ParseSnafu, ReadSnafu};

/// Flat, ordered key/value properties.
///
/// Loaded from TOML, with nested tables flattened into dotted keys, so
///
/// ```toml
/// [spark.kubernetes.auth]
/// oauthTokenFile = "/etc/token"
/// ```
///
/// is looked up as `spark.kubernetes.auth.oauthTokenFile`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties(IndexMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        let properties = Self::from_toml_str(&text)?;
        debug!(
            message = "Loaded configuration properties.",
            path = ?path,
            count = properties.len()
        );
        Ok(properties)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let table: toml::Table = toml::from_str(text).context(ParseSnafu)?;
        let mut properties = Self::new();
        flatten_into(&mut properties.0, None, table);
        Ok(properties)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl ConfigSource for Properties {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn flatten_into(out: &mut IndexMap<String, String>, prefix: Option<&str>, table: toml::Table) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            toml::Value::Table(inner) => flatten_into(out, Some(key.as_str()), inner),
            toml::Value::String(s) => {
                out.insert(key, s);
            }
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}
