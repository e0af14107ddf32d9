use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use circ_policy::LoanPolicy;
use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the data directory.
pub const CONFIG_FILE: &str = "circ.toml";

/// Default ledger snapshot file name.
pub const DEFAULT_LEDGER_FILE: &str = "ledger.json";

/// Command-line configuration, read from TOML.
///
/// ```toml
/// ledger_file = "ledger.json"
///
/// [policy]
/// loan_period_days = 14
/// fine_rate_per_day = "0.50"
/// enforce_fine_block = true
/// due_soon_days = 3
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Ledger snapshot, relative to the data directory unless absolute.
    pub ledger_file: PathBuf,
    pub policy: LoanPolicy,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ledger_file: PathBuf::from(DEFAULT_LEDGER_FILE),
            policy: LoanPolicy::default(),
        }
    }
}

impl CliConfig {
    /// Load `explicit` if given (it must exist), otherwise
    /// `<data_dir>/circ.toml` if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>, data_dir: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = data_dir.join(CONFIG_FILE);
                if !candidate.exists() {
                    return Ok(Self::default());
                }
                candidate
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config
            .policy
            .validate()
            .with_context(|| format!("invalid policy in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Absolute location of the ledger snapshot.
    pub fn ledger_path(&self, data_dir: &Path) -> PathBuf {
        if self.ledger_file.is_absolute() {
            self.ledger_file.clone()
        } else {
            data_dir.join(&self.ledger_file)
        }
    }
}
