//! Key loading, field catalog loading, and the transform engine lifecycle.
//!
//! # Responsibilities
//!
//! - Fetch the key once at startup. The key never changes while the process
//!   runs: ciphertext from one key only decrypts under that key.
//! - Fetch and parse the field catalog at startup and on a refresh interval,
//!   swapping a freshly built [`Engine`] into the [`EngineStore`].
//!
//! # Module invariants
//!
//! - Catalog problems never stop the service. At startup they fall back to
//!   the builtin catalog; during refresh the previous engine is retained.
//! - Key bytes are never logged; only [`Key::fingerprint`] is.

pub mod store;

pub use store::{Engine, EngineStore};

use std::time::Duration;

use anyhow::{Context, Result};
use fpe::catalog::loader::ParsedCatalog;
use fpe::{CatalogWarning, FieldCatalog, Key, TransformOptions, RECOMMENDED_KEY_LEN};
use tokio::time;
use tracing::{info, warn};

use crate::blob::{BlobFetcher, BlobSource};

/// Fetch the key material from `source`.
///
/// # Errors
///
/// Returns an error if the blob cannot be fetched or is empty.
pub async fn load_key(fetcher: &BlobFetcher, source: &BlobSource) -> Result<Key> {
    let bytes = fetcher
        .fetch(source)
        .await
        .context("failed to fetch key material")?;
    let key = Key::from_bytes(bytes.to_vec())
        .with_context(|| format!("key material from {source} is unusable"))?;

    if key.is_short() {
        warn!(
            source = %source,
            len = key.len(),
            recommended = RECOMMENDED_KEY_LEN,
            "key is shorter than recommended"
        );
    }
    info!(source = %source, fingerprint = %key.fingerprint(), "key loaded");
    Ok(key)
}

/// Fetch and parse the field catalog. `None` selects the builtin catalog.
///
/// Never fails: fetch and parse errors become a
/// [`CatalogWarning::LoadFailure`] next to the builtin catalog.
pub async fn load_catalog(fetcher: &BlobFetcher, source: Option<&BlobSource>) -> ParsedCatalog {
    let Some(source) = source else {
        info!("no catalog configured; using builtin catalog");
        return (FieldCatalog::builtin(), Vec::new());
    };

    let name = source.to_string();
    let (catalog, warnings) = match fetcher.fetch(source).await {
        Ok(bytes) => FieldCatalog::load_or_builtin(&name, &bytes),
        Err(e) => (
            FieldCatalog::builtin(),
            vec![CatalogWarning::LoadFailure {
                source: name.clone(),
                reason: e.to_string(),
            }],
        ),
    };

    for warning in &warnings {
        warn!(source = %name, warning = %warning, "catalog warning");
    }
    info!(
        source = %name,
        fields = catalog.len(),
        warnings = warnings.len(),
        "field catalog loaded"
    );
    (catalog, warnings)
}

/// Spawn a background task that periodically reloads the catalog from
/// `source` and swaps a new engine into `store`.
///
/// A reload that cannot use the catalog keeps the previous engine; the
/// builtin fallback only applies at startup.
pub fn refresh_task(
    fetcher: BlobFetcher,
    source: BlobSource,
    key: Key,
    options: TransformOptions,
    store: EngineStore,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately; startup already loaded the catalog.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let parsed = load_catalog(&fetcher, Some(&source)).await;
            if parsed
                .1
                .iter()
                .any(|w| matches!(w, CatalogWarning::LoadFailure { .. }))
            {
                warn!(source = %source, "catalog refresh failed; retaining previous engine");
                continue;
            }
            match Engine::build(&key, options, parsed) {
                Ok(engine) => {
                    store.replace(engine);
                    info!(source = %source, "transform engine refreshed");
                }
                Err(e) => warn!(error = %e, "failed to rebuild transform engine"),
            }
        }
    })
}
