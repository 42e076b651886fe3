//! Expression library - parameter-set documents, fetched once per expression

use std::collections::HashMap;
use std::sync::Arc;

use marionette_core::{AssetSource, ExpressionDef, MarionetteResult, ParameterSetDocument};
use tracing::debug;

/// Parsed parameter-set documents, cached by expression name
pub struct ExpressionLibrary {
    source: Arc<dyn AssetSource>,
    documents: HashMap<String, Arc<ParameterSetDocument>>,
}

impl ExpressionLibrary {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            documents: HashMap::new(),
        }
    }

    /// Document for an expression, fetched and parsed on first use.
    /// Failures are not cached, so a later call retries.
    pub fn document(&mut self, def: &ExpressionDef) -> MarionetteResult<Arc<ParameterSetDocument>> {
        if let Some(doc) = self.documents.get(&def.name) {
            return Ok(Arc::clone(doc));
        }

        let bytes = self.source.fetch(&def.source_ref)?;
        let doc = Arc::new(ParameterSetDocument::from_slice(&bytes, &def.source_ref)?);
        debug!(
            expression = %def.name,
            parameters = doc.parameters.len(),
            "expression document loaded"
        );
        self.documents.insert(def.name.clone(), Arc::clone(&doc));
        Ok(doc)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    pub fn cached(&self) -> usize {
        self.documents.len()
    }
}

impl std::fmt::Debug for ExpressionLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionLibrary")
            .field("cached", &self.documents.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::{ErrorKind, MemoryAssetSource};

    #[test]
    fn test_fetch_once() {
        let source = MemoryAssetSource::new().with_asset(
            "smile.exp3.json",
            r#"{"Parameters": [{"Id": "ParamMouthForm", "Value": 1.0}]}"#,
        );
        let mut library = ExpressionLibrary::new(Arc::new(source));
        let def = ExpressionDef::new("smile", "smile.exp3.json");

        let doc = library.document(&def).unwrap();
        assert!(doc.references("ParamMouthForm"));
        assert!(library.is_cached("smile"));
        assert_eq!(library.cached(), 1);
    }

    #[test]
    fn test_failures() {
        let source = MemoryAssetSource::new().with_asset("bad.exp3.json", "{not json");
        let mut library = ExpressionLibrary::new(Arc::new(source));

        let err = library
            .document(&ExpressionDef::new("gone", "gone.exp3.json"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Asset);

        let err = library
            .document(&ExpressionDef::new("bad", "bad.exp3.json"))
            .unwrap_err();
        assert!(matches!(err, marionette_core::MarionetteError::AssetParse { .. }));
        assert_eq!(library.cached(), 0);
    }
}
