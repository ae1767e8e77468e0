//! Machine configuration (load-time only)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::symbols::SymbolCatalog;
use crate::timing::SpinTiming;

/// Padding around the reels inside the machine frame
const FRAME_PADDING: f64 = 40.0;

/// Full machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Number of reels (columns)
    pub reels: usize,
    /// Visible rows per reel
    pub rows: usize,

    pub symbol_width: f64,
    pub symbol_height: f64,
    /// Horizontal gap between reels
    pub reel_spacing: f64,
    /// Vertical gap between symbols
    pub symbol_spacing: f64,

    /// Symbols held by each reel buffer
    pub buffer_len: usize,
    /// Buffer index of the first visible row
    pub lookahead: usize,
    /// Symbols moved tail→head per recycle; also the recycle threshold in cells
    pub recycle_count: usize,

    /// Scroll distance per tick while spinning
    pub base_speed: f64,

    pub timing: SpinTiming,

    pub catalog: SymbolCatalog,
}

impl MachineConfig {
    /// Reference 5×3 ocean cabinet
    pub fn standard_5x3() -> Self {
        Self {
            reels: 5,
            rows: 3,
            symbol_width: 80.0,
            symbol_height: 80.0,
            reel_spacing: 10.0,
            symbol_spacing: 5.0,
            buffer_len: 8,
            lookahead: 5,
            recycle_count: 5,
            base_speed: 20.0,
            timing: SpinTiming::reference(),
            catalog: SymbolCatalog::ocean(),
        }
    }

    pub fn with_timing(mut self, timing: SpinTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_catalog(mut self, catalog: SymbolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Vertical distance between consecutive symbols
    pub fn cell_pitch(&self) -> f64 {
        self.symbol_height + self.symbol_spacing
    }

    /// Horizontal distance between reel centres
    pub fn reel_pitch(&self) -> f64 {
        self.symbol_width + self.reel_spacing
    }

    /// Centre x of a reel, with the reel block centred on 0
    pub fn reel_x(&self, index: usize) -> f64 {
        let start = -(self.reels.saturating_sub(1) as f64) * self.reel_pitch() / 2.0;
        start + index as f64 * self.reel_pitch()
    }

    /// Height of the visible window (mask)
    pub fn viewport_height(&self) -> f64 {
        self.rows as f64 * self.cell_pitch() - self.symbol_spacing
    }

    /// Background frame size (width, height)
    pub fn frame_size(&self) -> (f64, f64) {
        let reels = self.reels as f64;
        let rows = self.rows as f64;
        let width = reels * self.symbol_width
            + (reels - 1.0).max(0.0) * self.reel_spacing
            + FRAME_PADDING;
        let height = rows * self.symbol_height
            + (rows - 1.0).max(0.0) * self.symbol_spacing
            + FRAME_PADDING;
        (width, height)
    }

    /// Check that the configuration can drive a machine
    pub fn validate(&self) -> ReelResult<()> {
        let invalid = |msg: String| Err(ReelError::InvalidConfig(msg));

        if self.reels == 0 {
            return invalid("reels must be at least 1".into());
        }
        if self.rows == 0 {
            return invalid("rows must be at least 1".into());
        }
        if self.catalog.is_empty() {
            return invalid("symbol catalog is empty".into());
        }
        if self.catalog.len() > u16::MAX as usize {
            return invalid(format!("symbol catalog too large: {}", self.catalog.len()));
        }
        let pitch = self.cell_pitch();
        if !(pitch.is_finite() && pitch > 0.0) {
            return invalid(format!("cell pitch must be positive, got {}", pitch));
        }
        if !(self.base_speed.is_finite() && self.base_speed > 0.0) {
            return invalid(format!("base_speed must be positive, got {}", self.base_speed));
        }
        if self.lookahead + self.rows > self.buffer_len {
            return invalid(format!(
                "buffer_len {} cannot hold lookahead {} + {} visible rows",
                self.buffer_len, self.lookahead, self.rows
            ));
        }
        if self.recycle_count == 0 || self.recycle_count > self.buffer_len {
            return invalid(format!(
                "recycle_count must be in 1..={}, got {}",
                self.buffer_len, self.recycle_count
            ));
        }
        self.timing.validate().map_err(ReelError::InvalidConfig)
    }

    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReelError::Parse(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> ReelResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| ReelError::Parse(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(ReelError::Parse(format!(
                "unsupported config format {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    pub fn to_json(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReelError::Parse(e.to_string()))
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingProfile;

    #[test]
    fn test_reference_geometry() {
        let config = MachineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cell_pitch(), 85.0);
        assert_eq!(config.reel_x(0), -180.0);
        assert_eq!(config.reel_x(2), 0.0);
        assert_eq!(config.reel_x(4), 180.0);
        assert_eq!(config.viewport_height(), 250.0);
        assert_eq!(config.frame_size(), (480.0, 290.0));
    }

    #[test]
    fn test_validate_buffer_bounds() {
        let mut config = MachineConfig::default();
        config.lookahead = 6;
        assert!(matches!(config.validate(), Err(ReelError::InvalidConfig(_))));

        let mut config = MachineConfig::default();
        config.recycle_count = 9;
        assert!(config.validate().is_err());

        let mut config = MachineConfig::default();
        config.recycle_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_degenerate() {
        let mut config = MachineConfig::default();
        config.reels = 0;
        assert!(config.validate().is_err());

        let config = MachineConfig::default().with_catalog(SymbolCatalog::new(Vec::<String>::new()));
        assert!(config.validate().is_err());

        let mut config = MachineConfig::default();
        config.base_speed = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_symbol_catalog_is_valid() {
        let config = MachineConfig::default().with_catalog(SymbolCatalog::with_size(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = MachineConfig::from_json_str(r#"{ "reels": 3, "timing": { "hold_ms": 250 } }"#).unwrap();
        assert_eq!(config.reels, 3);
        assert_eq!(config.rows, 3);
        assert_eq!(config.timing.hold_ms, 250.0);
        assert_eq!(config.timing.settle_ms, 100.0);
        assert_eq!(config.catalog.len(), 13);
    }

    #[test]
    fn test_yaml_config() {
        let yaml = "reels: 4\nrows: 2\ncatalog: [a.png, b.png, c.png]\ntiming:\n  profile: turbo\n  hold_ms: 500\n";
        let config = MachineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.reels, 4);
        assert_eq!(config.rows, 2);
        assert_eq!(config.catalog.len(), 3);
        assert_eq!(config.timing.profile, TimingProfile::Turbo);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            MachineConfig::from_json_str("{ reels: "),
            Err(ReelError::Parse(_))
        ));
        assert!(matches!(
            MachineConfig::from_json_str(r#"{ "rows": 0 }"#),
            Err(ReelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = MachineConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(MachineConfig::from_json_str(&json).unwrap(), config);
    }
}
