/*
 * Opt-in registry for dark scroll-bar treatment. The host registers a
 * top-level window once; the redirected visual-style open then matches the
 * registered window itself or any descendant, because the query also tests
 * the window's root ancestor. Registration can arrive from setup code while
 * the UI thread is inside the redirected call, hence the lock.
 *
 * There is deliberately no removal: window destruction is never observed
 * here, entries outlive their windows, and a long-running process that
 * churns top-level windows will grow the set (and could collide on a reused
 * handle value). Hosts are expected to register a small, fixed set of frame
 * windows.
 */
use std::collections::HashSet;
use std::sync::Mutex;

/// Window identities are stored as the raw handle value, keeping this
/// module free of Win32 types.
#[derive(Debug, Default)]
pub struct DarkScrollBarRegistry {
    windows: Mutex<HashSet<isize>>,
}

impl DarkScrollBarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert.
    pub fn register(&self, window: isize) {
        match self.windows.lock() {
            Ok(mut guard) => {
                guard.insert(window);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(window);
            }
        }
    }

    /*
     * Membership test with ancestor inheritance: true when `window` itself
     * is registered, or when its root ancestor (as reported by `root_of`)
     * is. The ancestor lookup is injected so the rule is testable without
     * live window handles; the native layer passes `GetAncestor(GA_ROOT)`.
     */
    pub fn is_dark_treated(&self, window: isize, root_of: impl FnOnce(isize) -> isize) -> bool {
        let guard = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.contains(&window) {
            return true;
        }
        let root = root_of(window);
        root != window && guard.contains(&root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_a_root_covers_its_descendants() {
        let registry = DarkScrollBarRegistry::new();
        registry.register(0x1000);

        // Descendant whose root ancestor is the registered window.
        assert!(registry.is_dark_treated(0x2468, |_| 0x1000));
        // The registered window itself.
        assert!(registry.is_dark_treated(0x1000, |w| w));
        // Unrelated window under a different root.
        assert!(!registry.is_dark_treated(0x3000, |_| 0x9999));
    }

    #[test]
    fn registration_is_idempotent() {
        let registry = DarkScrollBarRegistry::new();
        registry.register(0x42);
        registry.register(0x42);
        assert!(registry.is_dark_treated(0x42, |w| w));
    }

    #[test]
    fn empty_registry_treats_nothing() {
        let registry = DarkScrollBarRegistry::new();
        assert!(!registry.is_dark_treated(0x42, |w| w));
    }
}
