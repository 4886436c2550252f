/*
 * Lazy, cached resolution of OS entry points. Most of the theming surface
 * this crate drives is exported without a public name, so a symbol is
 * identified by (module, optional export name, optional ordinal) and the
 * backend tries the name before falling back to the ordinal.
 *
 * Resolution is attempted at most once per identity; both success and
 * absence are cached for the process lifetime, so a missing symbol is never
 * re-queried. The cache itself is platform-agnostic and takes the actual
 * lookup as a closure: production passes the loader-based backend from
 * `os_theme`, tests pass a counting table.
 */
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

/// Identity of one OS entry point. Addresses are cached per distinct key,
/// so the same function probed under two identities resolves twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    pub module: &'static str,
    pub name: Option<&'static str>,
    pub ordinal: Option<u16>,
}

impl SymbolKey {
    pub const fn named(module: &'static str, name: &'static str) -> Self {
        Self {
            module,
            name: Some(name),
            ordinal: None,
        }
    }

    /// Name plus ordinal fallback, for exports that lost (or never had) a
    /// public name on some OS revisions.
    pub const fn named_or_ordinal(module: &'static str, name: &'static str, ordinal: u16) -> Self {
        Self {
            module,
            name: Some(name),
            ordinal: Some(ordinal),
        }
    }

    pub fn describe(&self) -> String {
        match (self.name, self.ordinal) {
            (Some(name), Some(ordinal)) => format!("{}!{name} (#{ordinal})", self.module),
            (Some(name), None) => format!("{}!{name}", self.module),
            (None, Some(ordinal)) => format!("{}!#{ordinal}", self.module),
            (None, None) => format!("{}!<unspecified>", self.module),
        }
    }
}

/// Resolved addresses, keyed by symbol identity. A `None` value records a
/// lookup that was attempted and failed; it is never retried.
#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: Mutex<HashMap<SymbolKey, Option<usize>>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /*
     * Returns the cached address for `key`, running `lookup` only if this
     * identity has never been attempted. The computation happens under the
     * cache lock, so an entry is published exactly once and never observed
     * half-written; the backends do nothing slower than a loader query, so
     * holding the lock across the call is fine.
     */
    pub fn resolve_with(
        &self,
        key: SymbolKey,
        lookup: impl FnOnce(&SymbolKey) -> Option<usize>,
    ) -> Option<usize> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.entry(key) {
            Entry::Occupied(slot) => *slot.get(),
            Entry::Vacant(slot) => {
                let resolved = lookup(&key);
                if resolved.is_none() {
                    log::debug!("Symbol {} did not resolve; caching absence.", key.describe());
                }
                *slot.insert(resolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const SHOULD_APPS: SymbolKey =
        SymbolKey::named_or_ordinal("uxtheme.dll", "ShouldAppsUseDarkMode", 132);

    #[test]
    fn resolution_runs_once_per_identity() {
        let cache = SymbolCache::new();
        let calls = Cell::new(0u32);

        let lookup = |_: &SymbolKey| {
            calls.set(calls.get() + 1);
            Some(0x1234usize)
        };

        assert_eq!(cache.resolve_with(SHOULD_APPS, lookup), Some(0x1234));
        assert_eq!(cache.resolve_with(SHOULD_APPS, lookup), Some(0x1234));
        assert_eq!(cache.resolve_with(SHOULD_APPS, lookup), Some(0x1234));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn absence_is_cached_and_never_retried() {
        let cache = SymbolCache::new();
        let calls = Cell::new(0u32);

        let lookup = |_: &SymbolKey| {
            calls.set(calls.get() + 1);
            None
        };

        assert_eq!(cache.resolve_with(SHOULD_APPS, lookup), None);
        assert_eq!(cache.resolve_with(SHOULD_APPS, lookup), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn distinct_identities_resolve_independently() {
        let cache = SymbolCache::new();
        let by_name = SymbolKey::named("uxtheme.dll", "FlushMenuThemes");
        let with_fallback = SymbolKey::named_or_ordinal("uxtheme.dll", "FlushMenuThemes", 136);

        let first = cache.resolve_with(by_name, |_| Some(0xA));
        let second = cache.resolve_with(with_fallback, |_| Some(0xB));
        assert_eq!(first, Some(0xA));
        assert_eq!(second, Some(0xB));
    }

    #[test]
    fn describe_names_both_identifiers() {
        assert_eq!(
            SHOULD_APPS.describe(),
            "uxtheme.dll!ShouldAppsUseDarkMode (#132)"
        );
        assert_eq!(
            SymbolKey::named("ntdll.dll", "RtlGetNtVersionNumbers").describe(),
            "ntdll.dll!RtlGetNtVersionNumbers"
        );
    }
}
