use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::resample::FilterTable;
use crate::audio::resample::design;
use crate::common::errors::{ConfigError, FilterFileError};

/// A filter table stored as TOML, either as explicit coefficients or as
/// Kaiser design parameters.
///
/// ```toml
/// nmult = 13
/// lp_scl = 13123
/// imp = [32767, 32766, ...]
/// ```
///
/// ```toml
/// nmult = 17
///
/// [design]
/// rolloff = 0.9
/// beta = 8.0
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FilterFile {
    pub nmult: u16,
    pub nwing: Option<u16>,
    pub imp: Option<Vec<i16>>,
    pub imp_d: Option<Vec<i16>>,
    pub lp_scl: Option<u16>,
    pub design: Option<DesignParams>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct DesignParams {
    pub rolloff: f64,
    pub beta: f64,
}

impl FilterFile {
    pub fn load(path: &Path) -> Result<FilterTable, FilterFileError> {
        let name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| FilterFileError::Io {
            path: name.clone(),
            source,
        })?;
        let file: FilterFile = toml::from_str(&text).map_err(|source| FilterFileError::Parse {
            path: name.clone(),
            source,
        })?;

        let table = file.into_table(&name)?;
        debug!("Loaded filter table from {}: {:?}", name, table);
        Ok(table)
    }

    pub fn into_table(self, name: &str) -> Result<FilterTable, FilterFileError> {
        match (self.imp, self.lp_scl, self.design) {
            (Some(imp), Some(lp_scl), _) => {
                let imp_d = match self.imp_d {
                    Some(imp_d) => imp_d,
                    None => design::differences(&imp)?,
                };
                let nwing = match self.nwing {
                    Some(n) => n,
                    None => u16::try_from(imp.len()).map_err(|_| {
                        ConfigError::InvalidTable(format!("{} coefficients in {name}", imp.len()))
                    })?,
                };
                Ok(FilterTable::new(nwing, self.nmult, imp, imp_d, lp_scl)?)
            }
            (None, _, Some(DesignParams { rolloff, beta })) => {
                Ok(FilterTable::design(self.nmult, rolloff, beta)?)
            }
            _ => Err(FilterFileError::Incomplete(name.to_string())),
        }
    }
}
