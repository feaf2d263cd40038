//! Config extraction errors.

use figment::providers::{Format, Toml};
use std::{collections::HashSet, error::Error, fmt};

/// Prefix of every rendered extraction failure.
pub const FAILED_TO_EXTRACT_CONFIG_MSG: &str = "failed to extract neoconnect config:";

/// A failed attempt to extract [`BridgeConfig`](crate::BridgeConfig) from a `Figment`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractConfigError {
    pub(crate) error: figment::Error,
}

impl ExtractConfigError {
    pub fn new(error: figment::Error) -> Self {
        Self { error }
    }
}

impl fmt::Display for ExtractConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut unique = HashSet::with_capacity(self.error.count());
        writeln!(f, "{FAILED_TO_EXTRACT_CONFIG_MSG}")?;
        for err in self.error.clone() {
            let from_toml = err
                .metadata
                .as_ref()
                .map(|meta| meta.name.contains(Toml::NAME))
                .unwrap_or_default();
            let mut line = if from_toml { format!("neoconnect.toml error: {err}") } else { err.to_string() };
            if !err.path.is_empty() {
                line.push_str(&format!(" for setting `{}`", err.path.join(".")));
            }
            if unique.insert(line.clone()) {
                writeln!(f, "{line}")?;
            }
        }
        Ok(())
    }
}

impl Error for ExtractConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Error::source(&self.error)
    }
}
