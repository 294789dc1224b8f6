//! [`EngineStore`]: lock-free holder of the current transform engine.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use fpe::catalog::loader::ParsedCatalog;
use fpe::{CatalogWarning, FpeError, Key, TransformOptions, Transformer};

/// A ready-to-use transformer and what is known about how it was built.
#[derive(Debug)]
pub struct Engine {
    /// Ciphers plus the catalog they classify with.
    pub transformer: Transformer,
    /// Warnings from the catalog load.
    pub warnings: Vec<CatalogWarning>,
    /// [`Key::fingerprint`] of the key behind `transformer`.
    pub key_fingerprint: String,
}

impl Engine {
    /// Build an engine from a key, cipher options and a parsed catalog.
    ///
    /// # Errors
    ///
    /// Propagates [`Transformer::new`] errors.
    pub fn build(
        key: &Key,
        options: TransformOptions,
        (catalog, warnings): ParsedCatalog,
    ) -> Result<Self, FpeError> {
        Ok(Self {
            transformer: Transformer::new(key, Arc::new(catalog), options)?,
            warnings,
            key_fingerprint: key.fingerprint(),
        })
    }

    /// `true` if the configured catalog could not be used and the builtin
    /// one is in effect.
    pub fn fell_back(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, CatalogWarning::LoadFailure { .. }))
    }
}

/// Shared, lock-free slot holding the current [`Engine`].
///
/// Readers never block; the catalog refresh task swaps in a whole new engine.
#[derive(Clone, Debug)]
pub struct EngineStore {
    inner: Arc<ArcSwapOption<Engine>>,
}

impl EngineStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Create a store already holding `engine`.
    pub fn with_engine(engine: Engine) -> Self {
        let store = Self::new();
        store.replace(engine);
        store
    }

    /// The current engine, if any. Holding the `Arc` keeps that engine alive
    /// across a concurrent swap.
    pub fn current(&self) -> Option<Arc<Engine>> {
        self.inner.load_full()
    }

    /// Atomically replace the current engine.
    pub fn replace(&self, engine: Engine) {
        self.inner.store(Some(Arc::new(engine)));
    }
}

impl Default for EngineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpe::FieldCatalog;

    fn key() -> Key {
        Key::from_bytes(b"0123456789abcdef".to_vec()).unwrap()
    }

    fn engine(catalog: FieldCatalog, warnings: Vec<CatalogWarning>) -> Engine {
        Engine::build(&key(), TransformOptions::default(), (catalog, warnings)).unwrap()
    }

    #[test]
    fn initially_empty() {
        assert!(EngineStore::new().current().is_none());
    }

    #[test]
    fn replace_swaps_whole_engine() {
        let store = EngineStore::with_engine(engine(FieldCatalog::builtin(), vec![]));
        let before = store.current().unwrap();
        assert_eq!(before.transformer.catalog().len(), 14);

        store.replace(engine(FieldCatalog::new(), vec![]));
        assert_eq!(store.current().unwrap().transformer.catalog().len(), 0);
        // Readers holding the old engine keep it.
        assert_eq!(before.transformer.catalog().len(), 14);
    }

    #[test]
    fn fell_back_only_on_load_failure() {
        let dup = engine(
            FieldCatalog::builtin(),
            vec![CatalogWarning::DuplicateField { field: "ssn".into() }],
        );
        assert!(!dup.fell_back());

        let failed = engine(
            FieldCatalog::builtin(),
            vec![CatalogWarning::LoadFailure {
                source: "fields.csv".into(),
                reason: "missing column".into(),
            }],
        );
        assert!(failed.fell_back());
    }

    #[test]
    fn fingerprint_recorded() {
        let e = engine(FieldCatalog::builtin(), vec![]);
        assert_eq!(e.key_fingerprint, key().fingerprint());
    }

    #[test]
    fn zero_rounds_rejected() {
        let options = TransformOptions {
            rounds: 0,
            ..TransformOptions::default()
        };
        assert!(Engine::build(&key(), options, (FieldCatalog::builtin(), vec![])).is_err());
    }
}
