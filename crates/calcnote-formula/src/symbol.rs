//! Symbol handles and the per-pass symbol registry

use ahash::AHashMap;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A name-addressed handle for a variable or function
///
/// Handles are cheap to clone and compare by name. Two handles minted by the
/// same [`SymbolRegistry`] for the same name share one allocation, see
/// [`Symbol::is_same`].
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }

    /// True when both handles come from the same registry entry
    pub fn is_same(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints and caches one [`Symbol`] per name
///
/// A registry is owned by one evaluation context and dropped with it, so
/// symbols never leak from one pass into the next.
#[derive(Default)]
pub struct SymbolRegistry {
    symbols: RefCell<AHashMap<Rc<str>, Symbol>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle for `name`, creating it on first use
    pub fn resolve(&self, name: &str) -> Symbol {
        if let Some(symbol) = self.symbols.borrow().get(name) {
            return symbol.clone();
        }
        let symbol = Symbol(Rc::from(name));
        self.symbols
            .borrow_mut()
            .insert(symbol.0.clone(), symbol.clone());
        symbol
    }

    /// Get the handle for `name` without creating one
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.symbols.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.borrow().is_empty()
    }
}

impl fmt::Debug for SymbolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_idempotent() {
        let registry = SymbolRegistry::new();
        let a = registry.resolve("x");
        let b = registry.resolve("x");
        assert!(a.is_same(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_names_distinct_handles() {
        let registry = SymbolRegistry::new();
        let x = registry.resolve("x");
        let y = registry.resolve("y");
        assert!(!x.is_same(&y));
        assert_ne!(x, y);
        assert_eq!(registry.get("y").map(|s| s.name().to_string()), Some("y".into()));
        assert!(registry.get("z").is_none());
    }

    #[test]
    fn test_registries_do_not_share_handles() {
        let first = SymbolRegistry::new().resolve("x");
        let second = SymbolRegistry::new().resolve("x");
        assert_eq!(first, second);
        assert!(!first.is_same(&second));
    }
}
