//! Solver configuration, loadable from TOML.
//!
//! ```
//! use slider_pdb::config::SolverConfig;
//! use slider_pdb::pattern::Layout;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     layout = "5-5-5"
//!     progress_interval_ms = 250
//! "#).unwrap();
//!
//! assert_eq!(config.layout, Layout::FiveFiveFive);
//! assert!(config.persist);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::heuristic::HeuristicKind;
use crate::pattern::Layout;
use crate::store::{self, FileStore, MemoryStore, PdbStore};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverConfig {
    /// Which tiles each pattern database tracks.
    pub layout: Layout,

    /// `pdb` (default) or `manhattan`.
    pub heuristic: HeuristicKind,

    /// Where built tables are kept; the platform cache directory when unset.
    pub cache_dir: Option<PathBuf>,

    /// Keep tables on disk between runs.
    pub persist: bool,

    /// Minimum time between progress lines.
    pub progress_interval_ms: u64,

    /// Operations between cancellation checks in the build and search loops.
    pub checkpoint_interval: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            heuristic: HeuristicKind::default(),
            cache_dir: None,
            persist: true,
            progress_interval_ms: 120,
            checkpoint_interval: 4096,
        }
    }
}

impl SolverConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(store::default_cache_dir)
    }

    /// The store this configuration asks for: files when persisting and a
    /// directory is known, memory otherwise.
    pub fn open_store(&self) -> Arc<dyn PdbStore> {
        match self.resolved_cache_dir() {
            Some(dir) if self.persist => Arc::new(FileStore::new(dir)),
            _ => Arc::new(MemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = SolverConfig::from_toml_str("checkpoint_interval = 10").unwrap();
        assert_eq!(config.checkpoint_interval, 10);
        assert_eq!(config.layout, Layout::FourFourFourThree);
        assert_eq!(config.progress_interval(), Duration::from_millis(120));
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }

    #[test]
    fn selects_the_heuristic() {
        assert_eq!(SolverConfig::default().heuristic, HeuristicKind::Pdb);
        let config = SolverConfig::from_toml_str(r#"heuristic = "manhattan""#).unwrap();
        assert_eq!(config.heuristic, HeuristicKind::Manhattan);
        assert!(SolverConfig::from_toml_str(r#"heuristic = "gaschnig""#).is_err());
    }

    #[test]
    fn rejects_unknown_layout() {
        let err = SolverConfig::from_toml_str(r#"layout = "8-7""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solver.toml");
        std::fs::write(&path, "persist = false\ncache_dir = \"/tmp/pdb\"\n").unwrap();
        let config = SolverConfig::load(&path).unwrap();
        assert!(!config.persist);
        assert_eq!(config.resolved_cache_dir(), Some(PathBuf::from("/tmp/pdb")));
        assert!(matches!(SolverConfig::load(dir.path().join("missing.toml")), Err(Error::Io(_))));
    }
}
