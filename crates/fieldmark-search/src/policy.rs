//! Handling of documents that are missing from the backend.

use std::fmt;
use std::str::FromStr;

use fieldmark_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// What to do when a document targeted for deletion does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotFoundPolicy {
    /// Ignore silently.
    #[serde(rename = "none")]
    Ignore,
    /// Propagate the not-found error.
    #[default]
    #[serde(rename = "throw")]
    Fail,
    /// Log at error level and continue.
    #[serde(rename = "log")]
    Log,
}

impl NotFoundPolicy {
    /// Resolve a not-found error according to this policy.
    ///
    /// Other errors are returned unchanged.
    pub fn resolve(self, error: Error) -> Result<()> {
        if !error.is_not_found() {
            return Err(error);
        }
        match self {
            NotFoundPolicy::Ignore => Ok(()),
            NotFoundPolicy::Fail => Err(error),
            NotFoundPolicy::Log => {
                log::error!("{error}");
                Ok(())
            }
        }
    }

    /// Apply the policy to the outcome of an operation.
    pub fn apply<T>(self, outcome: Result<T>) -> Result<Option<T>> {
        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(error) => self.resolve(error).map(|()| None),
        }
    }

    /// Configuration spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundPolicy::Ignore => "none",
            NotFoundPolicy::Fail => "throw",
            NotFoundPolicy::Log => "log",
        }
    }
}

impl fmt::Display for NotFoundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotFoundPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(NotFoundPolicy::Ignore),
            "throw" => Ok(NotFoundPolicy::Fail),
            "log" => Ok(NotFoundPolicy::Log),
            other => Err(Error::config(format!(
                "Unknown not-found policy \"{other}\"; expected none, throw or log"
            ))),
        }
    }
}
