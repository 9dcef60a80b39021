use std::fs;
use std::path::Path;

use tracing::debug;

use super::redaction::{Redactor, SensitiveData};
use super::HistoryStore;
use crate::errors::HistoryError;

impl HistoryStore {
    /// Serialize to a JSON document, optionally redacting secret literals.
    /// The in-memory store is never modified.
    pub fn to_json(&self, sensitive: Option<&SensitiveData>) -> Result<String, HistoryError> {
        let mut document = serde_json::to_value(self)?;
        if let Some(data) = sensitive {
            let changed = Redactor::new(&data.secrets())?.redact_value(&mut document);
            debug!(changed, "redacted history document");
        }
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn from_json(text: &str) -> Result<Self, HistoryError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save_to_file(
        &self,
        path: impl AsRef<Path>,
        sensitive: Option<&SensitiveData>,
    ) -> Result<(), HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json(sensitive)?)?;
        debug!(path = %path.display(), records = self.len(), "saved history");
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }
}
