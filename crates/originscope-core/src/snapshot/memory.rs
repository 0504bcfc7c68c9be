//! In-memory catalog source, for embedding and tests.

use parking_lot::Mutex;

use super::CatalogSource;
use crate::error::SourceError;
use crate::types::CatalogData;

/// A [`CatalogSource`] serving a fixed in-memory catalog.
///
/// `replace` swaps the data the next `load` returns, which makes it easy to
/// simulate a changing upstream database between refreshes.
pub struct MemoryCatalogSource {
    data: Mutex<CatalogData>,
    fail_with: Mutex<Option<String>>,
}

impl MemoryCatalogSource {
    pub fn new(data: CatalogData) -> Self {
        Self {
            data: Mutex::new(data),
            fail_with: Mutex::new(None),
        }
    }

    /// Replace the catalog served by subsequent loads.
    pub fn replace(&self, data: CatalogData) {
        *self.data.lock() = data;
    }

    /// Make subsequent loads fail with this message, until cleared with
    /// `replace` semantics (`set_failure(None)`).
    pub fn set_failure(&self, message: Option<String>) {
        *self.fail_with.lock() = message;
    }
}

impl CatalogSource for MemoryCatalogSource {
    fn load(&self) -> Result<CatalogData, SourceError> {
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(SourceError::new(message));
        }
        Ok(self.data.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_returns_data() {
        let source = MemoryCatalogSource::new(CatalogData::default());
        assert!(source.load().is_ok());
    }

    #[test]
    fn test_failure_injection() {
        let source = MemoryCatalogSource::new(CatalogData::default());
        source.set_failure(Some("connection lost".into()));
        let err = source.load().unwrap_err();
        assert_eq!(err.to_string(), "connection lost");
        source.set_failure(None);
        assert!(source.load().is_ok());
    }
}
