use std::{fmt, time::Duration};

use snafu::ResultExt;

use super::{Error, InvalidTimeoutSnafu};
use crate::config::ConfigSource;

/// Which component a client is built for. Each kind carries its own
/// connection and request timeouts; when unset the transport's defaults
/// apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClientType {
    #[default]
    Driver,
    Submission,
    Executor,
}

impl ClientType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Submission => "submission",
            Self::Executor => "executor",
        }
    }

    pub fn connection_timeout_key(&self) -> String {
        format!("spark.kubernetes.{}.connectionTimeout", self.as_str())
    }

    pub fn request_timeout_key(&self) -> String {
        format!("spark.kubernetes.{}.requestTimeout", self.as_str())
    }

    pub fn connection_timeout(
        &self,
        source: &(impl ConfigSource + ?Sized),
    ) -> Result<Option<Duration>, Error> {
        timeout_millis(source, self.connection_timeout_key())
    }

    pub fn request_timeout(
        &self,
        source: &(impl ConfigSource + ?Sized),
    ) -> Result<Option<Duration>, Error> {
        timeout_millis(source, self.request_timeout_key())
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn timeout_millis(
    source: &(impl ConfigSource + ?Sized),
    key: String,
) -> Result<Option<Duration>, Error> {
    let Some(value) = source.get(&key) else {
        return Ok(None);
    };
    let millis = value
        .trim()
        .parse::<u64>()
        .context(InvalidTimeoutSnafu { key, value: &value })?;
    Ok(Some(Duration::from_millis(millis)))
}
