//! Symbol definitions and the symbol catalog

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resources::ResourceProvider;

/// Symbol type identifier (index into a [`SymbolCatalog`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolType(pub u16);

impl SymbolType {
    /// Catalog index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}", self.0)
    }
}

/// Unique identity of a single symbol instance
pub type SymbolId = Uuid;

/// Fixed, finite catalog of symbol types.
///
/// Each entry is the asset name the resource provider resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolCatalog {
    entries: Vec<String>,
}

impl SymbolCatalog {
    /// Create a catalog from asset names
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Reference 13-symbol ocean set
    ///
    /// M00..M04 are the high paying creatures, M05..M10 the card royals,
    /// M11 pearl and M12 fish.
    pub fn ocean() -> Self {
        Self::with_size(13)
    }

    /// Catalog of `count` generated asset names (`M00_000.jpg`, ...)
    pub fn with_size(count: u16) -> Self {
        Self::new((0..count).map(|i| format!("M{:02}_000.jpg", i)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Asset name for a symbol type
    pub fn name(&self, symbol_type: SymbolType) -> Option<&str> {
        self.entries.get(symbol_type.index()).map(String::as_str)
    }

    /// Is this symbol type part of the catalog?
    pub fn contains(&self, symbol_type: SymbolType) -> bool {
        symbol_type.index() < self.entries.len()
    }

    /// All symbol types in catalog order
    pub fn types(&self) -> impl Iterator<Item = SymbolType> + '_ {
        (0..self.entries.len()).map(|i| SymbolType(i as u16))
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::ocean()
    }
}

/// Opaque handle to a resolved display asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayHandle {
    pub asset: String,
}

impl DisplayHandle {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
        }
    }
}

/// How a symbol is drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolDisplay {
    Resolved(DisplayHandle),
    /// Asset could not be resolved; drawn degraded
    Placeholder,
}

/// A symbol instance owned by exactly one reel buffer.
///
/// Not `Clone`: the id is the symbol's identity in the display tree.
#[derive(Debug)]
pub struct Symbol {
    id: SymbolId,
    symbol_type: SymbolType,
    display: SymbolDisplay,
    x: f64,
    y: f64,
}

impl Symbol {
    /// Create a symbol with a known display
    pub fn new(symbol_type: SymbolType, display: SymbolDisplay) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol_type,
            display,
            x: 0.0,
            y: 0.0,
        }
    }

    /// Create a symbol, resolving its asset.
    ///
    /// An unresolvable asset never fails: the symbol keeps its type (and still
    /// takes part in win evaluation) but is drawn as a placeholder.
    pub fn resolve(symbol_type: SymbolType, resources: &dyn ResourceProvider, reel: usize) -> Self {
        let display = match resources.resolve(symbol_type) {
            Ok(handle) => SymbolDisplay::Resolved(handle),
            Err(err) => {
                log::warn!("[Reel {}] {} drawn as placeholder: {}", reel, symbol_type, err);
                SymbolDisplay::Placeholder
            }
        };
        Self::new(symbol_type, display)
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn symbol_type(&self) -> SymbolType {
        self.symbol_type
    }

    pub fn display(&self) -> &SymbolDisplay {
        &self.display
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.display, SymbolDisplay::Placeholder)
    }

    /// Current display position (x, y)
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::CatalogResources;

    #[test]
    fn test_ocean_catalog() {
        let catalog = SymbolCatalog::ocean();
        assert_eq!(catalog.len(), 13);
        assert_eq!(catalog.name(SymbolType(0)), Some("M00_000.jpg"));
        assert_eq!(catalog.name(SymbolType(12)), Some("M12_000.jpg"));
        assert_eq!(catalog.name(SymbolType(13)), None);
        assert_eq!(catalog.types().count(), 13);
    }

    #[test]
    fn test_symbol_ids_are_unique() {
        let a = Symbol::new(SymbolType(1), SymbolDisplay::Placeholder);
        let b = Symbol::new(SymbolType(1), SymbolDisplay::Placeholder);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_unresolved_symbol_is_placeholder() {
        let resources = CatalogResources::new(SymbolCatalog::ocean()).without([SymbolType(3)]);

        let ok = Symbol::resolve(SymbolType(2), &resources, 0);
        assert!(!ok.is_degraded());

        let degraded = Symbol::resolve(SymbolType(3), &resources, 0);
        assert!(degraded.is_degraded());
        assert_eq!(degraded.symbol_type(), SymbolType(3));
    }

    #[test]
    fn test_catalog_serde_is_plain_list() {
        let catalog = SymbolCatalog::new(["a.png", "b.png"]);
        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(json, r#"["a.png","b.png"]"#);
    }
}
