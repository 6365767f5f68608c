//! Key/value configuration sources that credentials are resolved from.

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
    path::PathBuf,
};

use indexmap::IndexMap; // IndexMap preserves insertion order, so dumps come out in file order
use snafu::Snafu;

mod loading;

pub use loading::Properties;

/// Read-only lookup of configuration values by exact key.
pub trait ConfigSource {
    /// Returns the value stored under `key`, if any. A key that is present
    /// with an empty value is still present.
    fn get(&self, key: &str) -> Option<String>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<S: BuildHasher> ConfigSource for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl<S: BuildHasher> ConfigSource for IndexMap<String, String, S> {
    fn get(&self, key: &str) -> Option<String> {
        IndexMap::get(self, key).cloned()
    }
}

/// An error returned when loading a properties file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not read configuration file {:?}: {}", path, source))]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Could not parse configuration: {}", source))]
    Parse { source: toml::de::Error },
}
