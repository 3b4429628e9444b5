use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decoding::DecodePolicy;
use crate::error::TinyRnnError;
use crate::utils::io;

/// Settings for a transform run, loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub decoding: DecodePolicy,
    pub threads: Option<usize>,     // Worker threads for batch runs, None: rayon default
}

impl RunConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TinyRnnError> {
        let config: RunConfig = io::deserialize_from_json(path.as_ref()).map_err(|e| {
            if e.is_filesystem() {
                TinyRnnError::Io(e)
            } else {
                TinyRnnError::Config(e.to_string())
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TinyRnnError> {
        self.decoding
            .validate()
            .map_err(|e| TinyRnnError::Config(e.to_string()))?;
        if self.threads == Some(0) {
            return Err(TinyRnnError::Config("threads must be positive".into()));
        }
        Ok(())
    }
}
