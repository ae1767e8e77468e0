//! Resource provider: symbol type → display asset

use std::collections::HashSet;

use crate::error::{ReelError, ReelResult};
use crate::symbols::{DisplayHandle, SymbolCatalog, SymbolType};

/// Resolves a symbol type to something displayable.
///
/// Injected into every reel; failures are absorbed per symbol.
pub trait ResourceProvider: Send + Sync {
    fn resolve(&self, symbol_type: SymbolType) -> ReelResult<DisplayHandle>;
}

/// Provider backed by the catalog's asset names
#[derive(Debug, Clone)]
pub struct CatalogResources {
    catalog: SymbolCatalog,
    missing: HashSet<SymbolType>,
}

impl CatalogResources {
    pub fn new(catalog: SymbolCatalog) -> Self {
        Self {
            catalog,
            missing: HashSet::new(),
        }
    }

    /// Mark assets as unavailable (failed loads)
    pub fn without(mut self, missing: impl IntoIterator<Item = SymbolType>) -> Self {
        self.missing.extend(missing);
        self
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }
}

impl ResourceProvider for CatalogResources {
    fn resolve(&self, symbol_type: SymbolType) -> ReelResult<DisplayHandle> {
        if self.missing.contains(&symbol_type) {
            return Err(ReelError::ResourceUnavailable(format!(
                "asset for {} failed to load",
                symbol_type
            )));
        }
        self.catalog
            .name(symbol_type)
            .map(DisplayHandle::new)
            .ok_or_else(|| {
                ReelError::ResourceUnavailable(format!("{} is not in the catalog", symbol_type))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_catalog_entry() {
        let resources = CatalogResources::new(SymbolCatalog::ocean());
        let handle = resources.resolve(SymbolType(5)).unwrap();
        assert_eq!(handle.asset, "M05_000.jpg");
    }

    #[test]
    fn test_unknown_and_missing_are_unavailable() {
        let resources = CatalogResources::new(SymbolCatalog::with_size(2)).without([SymbolType(1)]);
        assert!(matches!(
            resources.resolve(SymbolType(1)),
            Err(ReelError::ResourceUnavailable(_))
        ));
        assert!(matches!(
            resources.resolve(SymbolType(7)),
            Err(ReelError::ResourceUnavailable(_))
        ));
    }
}
