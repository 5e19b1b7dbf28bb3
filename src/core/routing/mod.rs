//! Tenant number routing.
//!
//! Maps a dialed number to the tenant that owns it. The source of truth is a
//! JSON routing file maintained by the provisioning system; this core only
//! reads it. Entries are cached in memory keyed by normalized E.164 number
//! and the cache is refreshed lazily when the file's modification time
//! changes, so steady-state lookups never touch the filesystem beyond a
//! metadata stat.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::utils::phone::normalize_e164;

/// One routing entry from the provisioning system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRouting {
    pub tenant_id: String,
    pub number_id: String,
    /// E.164 (normalized on load; the source may be sloppier)
    pub phone_number: String,
    pub active: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    /// Active routings keyed by normalized E.164 number
    by_number: HashMap<String, TenantRouting>,
    /// Modification time of the source file when the cache was built
    version: Option<SystemTime>,
}

/// In-process routing cache. Many concurrent readers; refresh swaps the map
/// under a short write lock with all file I/O done outside it, so readers
/// keep seeing the previous cache while a reload is in flight. A failed
/// reload leaves the previous cache intact.
pub struct RoutingTable {
    source_path: Option<PathBuf>,
    cache: RwLock<CacheState>,
}

impl RoutingTable {
    /// Creates a table backed by a JSON routing file. The file is loaded on
    /// first access, not at construction, so startup never fails on a
    /// missing or malformed source.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: Some(path.into()),
            cache: RwLock::new(CacheState::default()),
        }
    }

    /// Creates a table with a fixed in-memory entry set (no backing file).
    pub fn from_entries(entries: Vec<TenantRouting>) -> Self {
        let table = Self {
            source_path: None,
            cache: RwLock::new(CacheState::default()),
        };
        table.cache.write().by_number = index_entries(entries);
        table
    }

    /// Creates an empty table that resolves nothing. Used when no routing
    /// source is configured; every call is then rejected as unroutable.
    pub fn unconfigured() -> Self {
        Self {
            source_path: None,
            cache: RwLock::new(CacheState::default()),
        }
    }

    /// Resolves a dialed number to its active tenant routing.
    ///
    /// The number is normalized to E.164 before lookup. Unmapped numbers and
    /// numbers whose only routing is inactive both resolve to `None`.
    pub async fn resolve(&self, to_number: &str) -> Option<TenantRouting> {
        let normalized = normalize_e164(to_number)?;
        self.refresh_if_stale().await;
        self.cache.read().by_number.get(&normalized).cloned()
    }

    /// Reloads the cache when the source file's mtime no longer matches the
    /// cached version. All I/O happens before the write lock is taken; the
    /// lock only covers the map swap.
    async fn refresh_if_stale(&self) {
        let Some(path) = &self.source_path else {
            return;
        };

        let modified = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "routing source unreadable, serving previous cache");
                return;
            }
        };

        if self.cache.read().version == Some(modified) {
            return;
        }

        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "routing source read failed, serving previous cache");
                return;
            }
        };

        let entries: Vec<TenantRouting> = match serde_json::from_slice(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "routing source malformed, serving previous cache");
                return;
            }
        };

        let by_number = index_entries(entries);
        let count = by_number.len();

        let mut cache = self.cache.write();
        // Another task may have refreshed to the same version concurrently;
        // the swap is idempotent either way.
        cache.by_number = by_number;
        cache.version = Some(modified);
        drop(cache);

        info!(path = %path.display(), routings = count, "tenant routing cache refreshed");
    }
}

/// Builds the lookup map from raw entries: numbers are normalized, inactive
/// routings are dropped, and a duplicate active routing for the same number
/// keeps the first entry (the source invariant is at most one).
fn index_entries(entries: Vec<TenantRouting>) -> HashMap<String, TenantRouting> {
    let mut by_number: HashMap<String, TenantRouting> = HashMap::with_capacity(entries.len());
    for mut entry in entries {
        if !entry.active {
            continue;
        }
        let Some(normalized) = normalize_e164(&entry.phone_number) else {
            warn!(
                number_id = %entry.number_id,
                "skipping routing entry with unnormalizable phone number"
            );
            continue;
        };
        entry.phone_number = normalized.clone();
        if let Some(existing) = by_number.get(&normalized) {
            warn!(
                phone_number = %normalized,
                kept_tenant = %existing.tenant_id,
                dropped_tenant = %entry.tenant_id,
                "duplicate active routing for number, keeping first entry"
            );
            continue;
        }
        debug!(phone_number = %normalized, tenant_id = %entry.tenant_id, "routing entry indexed");
        by_number.insert(normalized, entry);
    }
    by_number
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn routing(tenant: &str, number: &str, active: bool) -> TenantRouting {
        TenantRouting {
            tenant_id: tenant.to_string(),
            number_id: format!("num_{tenant}"),
            phone_number: number.to_string(),
            active,
        }
    }

    #[tokio::test]
    async fn test_resolve_active_routing() {
        let table = RoutingTable::from_entries(vec![routing("tenant_abc", "+14255550100", true)]);
        let resolved = table.resolve("+14255550100").await.unwrap();
        assert_eq!(resolved.tenant_id, "tenant_abc");
    }

    #[tokio::test]
    async fn test_resolve_normalizes_before_lookup() {
        let table = RoutingTable::from_entries(vec![routing("tenant_abc", "+14255550100", true)]);
        for raw in ["(425) 555-0100", "1-425-555-0100", "+1 425 555 0100"] {
            let resolved = table.resolve(raw).await;
            assert_eq!(
                resolved.map(|r| r.tenant_id),
                Some("tenant_abc".to_string()),
                "format {raw:?} should resolve"
            );
        }
    }

    #[tokio::test]
    async fn test_unmapped_number_not_found() {
        let table = RoutingTable::from_entries(vec![routing("tenant_abc", "+14255550100", true)]);
        assert!(table.resolve("+19999999999").await.is_none());
    }

    #[tokio::test]
    async fn test_inactive_routing_not_found() {
        let table = RoutingTable::from_entries(vec![routing("tenant_abc", "+14255550100", false)]);
        assert!(table.resolve("+14255550100").await.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_table_resolves_nothing() {
        let table = RoutingTable::unconfigured();
        assert!(table.resolve("+14255550100").await.is_none());
    }

    #[tokio::test]
    async fn test_file_backed_load_and_reload_on_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routing.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&vec![routing("tenant_abc", "+14255550100", true)]).unwrap(),
        )
        .unwrap();

        let table = RoutingTable::from_file(&path);
        assert_eq!(
            table.resolve("+14255550100").await.map(|r| r.tenant_id),
            Some("tenant_abc".to_string())
        );

        // Rewrite with a different tenant and a bumped mtime.
        std::fs::write(
            &path,
            serde_json::to_vec(&vec![routing("tenant_xyz", "+14255550100", true)]).unwrap(),
        )
        .unwrap();
        let newer = SystemTime::now() + std::time::Duration::from_secs(2);
        let file = std::fs::File::options().append(true).open(&path).unwrap();
        file.set_modified(newer).unwrap();

        assert_eq!(
            table.resolve("+14255550100").await.map(|r| r.tenant_id),
            Some("tenant_xyz".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routing.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&vec![routing("tenant_abc", "+14255550100", true)]).unwrap(),
        )
        .unwrap();

        let table = RoutingTable::from_file(&path);
        assert!(table.resolve("+14255550100").await.is_some());

        // Corrupt the file; the previous cache must keep serving.
        let mut file = std::fs::File::options().write(true).open(&path).unwrap();
        file.write_all(b"{ this is not json").unwrap();
        file.set_modified(SystemTime::now() + std::time::Duration::from_secs(2))
            .unwrap();
        drop(file);

        assert_eq!(
            table.resolve("+14255550100").await.map(|r| r.tenant_id),
            Some("tenant_abc".to_string())
        );
    }

    #[tokio::test]
    async fn test_duplicate_active_routing_keeps_first() {
        let table = RoutingTable::from_entries(vec![
            routing("tenant_abc", "+14255550100", true),
            routing("tenant_xyz", "+14255550100", true),
        ]);
        assert_eq!(
            table.resolve("+14255550100").await.map(|r| r.tenant_id),
            Some("tenant_abc".to_string())
        );
    }
}
