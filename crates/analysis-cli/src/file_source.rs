//! JSON file backed data sources for offline runs.
//!
//! Company data lives in `<data-dir>/<SYMBOL>.json`, one provider-style object
//! per file. Macro indicators live in `<data-dir>/macro.json` as an object of
//! indicator name to chronological series.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use analysis_core::{AnalysisError, DataProvider, MacroIndicatorSource, RawRecord};
use async_trait::async_trait;
use serde_json::Value;

pub const MACRO_FILE: &str = "macro.json";

pub struct JsonFileProvider {
    data_dir: PathBuf,
}

impl JsonFileProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `<data_dir>/<SYMBOL>.json`. Symbols that could name a file outside
    /// the data directory are rejected.
    fn path_for(&self, symbol: &str) -> Result<PathBuf, AnalysisError> {
        let plain = !symbol.is_empty()
            && symbol != "."
            && !symbol.contains("..")
            && !symbol.contains(['/', '\\', ':', '\0']);
        if !plain {
            return Err(AnalysisError::ProviderError(format!(
                "invalid symbol {:?} for a file lookup",
                symbol
            )));
        }
        Ok(self.data_dir.join(format!("{}.json", symbol)))
    }
}

#[async_trait]
impl DataProvider for JsonFileProvider {
    async fn fetch_company_data(&self, symbol: &str) -> Result<RawRecord, AnalysisError> {
        let path = self.path_for(symbol)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AnalysisError::ProviderError(format!("{}: {}", path.display(), e)))?;

        let mut record = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(AnalysisError::ProviderError(format!(
                    "{}: expected a JSON object",
                    path.display()
                )))
            }
            Err(e) => {
                return Err(AnalysisError::ProviderError(format!("{}: {}", path.display(), e)))
            }
        };

        // the file name identifies the company when the body does not
        record
            .entry("symbol")
            .or_insert_with(|| Value::String(symbol.to_string()));
        Ok(record)
    }
}

/// Macro indicator series loaded once from `macro.json`.
pub struct JsonFileMacroSource {
    series: HashMap<String, Vec<f64>>,
}

impl JsonFileMacroSource {
    pub fn from_series(series: HashMap<String, Vec<f64>>) -> Self {
        Self { series }
    }

    /// Load `<data_dir>/macro.json`. `Ok(None)` when the file does not exist.
    pub async fn load(data_dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = data_dir.join(MACRO_FILE);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let raw: HashMap<String, Vec<Value>> = serde_json::from_slice(&bytes)?;
        let series = raw
            .into_iter()
            .map(|(name, values)| {
                let numbers = values.iter().filter_map(Value::as_f64).collect();
                (name, numbers)
            })
            .collect();
        Ok(Some(Self::from_series(series)))
    }
}

#[async_trait]
impl MacroIndicatorSource for JsonFileMacroSource {
    async fn fetch_indicator(
        &self,
        name: &str,
        periods: usize,
    ) -> Result<Option<Vec<f64>>, AnalysisError> {
        Ok(self.series.get(name).map(|values| {
            let start = values.len().saturating_sub(periods);
            values[start..].to_vec()
        }))
    }
}
