use std::path::Path;

use serde::{Deserialize, Serialize};
use statepatch_diff::{Equality, OpaquePaths, PathPolicy};

use crate::codec::JsonCodec;
use crate::error::{SyncError, SyncResult};
use crate::message::MAX_MESSAGE_SIZE;
use crate::strategy::{BoxedStrategy, DeepStrategy, ShallowStrategy, StrategyKind};

/// Sync settings, usually read from a TOML file. Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub strategy: StrategyKind,
    pub equality: Equality,
    /// Deepest key path the tree differ recurses into.
    pub max_depth: Option<usize>,
    /// Dotted key paths that are always sent whole.
    pub opaque_paths: Vec<String>,
    pub max_message_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Deep,
            equality: Equality::Identity,
            max_depth: None,
            opaque_paths: Vec::new(),
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(text: &str) -> SyncResult<Self> {
        let config: SyncConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SyncResult<String> {
        toml::to_string_pretty(self).map_err(|e| SyncError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.max_message_size == 0 {
            return Err(SyncError::Config("max_message_size must be positive".into()));
        }
        if let Some(path) = self.opaque_paths.iter().find(|p| p.split('.').any(str::is_empty)) {
            return Err(SyncError::Config(format!("malformed opaque path `{path}`")));
        }
        if self.strategy == StrategyKind::Shallow
            && (self.max_depth.is_some() || !self.opaque_paths.is_empty())
        {
            return Err(SyncError::Config(
                "max_depth and opaque_paths only apply to the deep strategy".into(),
            ));
        }
        Ok(())
    }

    pub fn path_policy(&self) -> PathPolicy {
        PathPolicy::new(self.max_depth, OpaquePaths::new(&self.opaque_paths))
    }

    pub fn build_strategy(&self) -> BoxedStrategy {
        match self.strategy {
            StrategyKind::Deep => Box::new(
                DeepStrategy::with_continuation(self.path_policy()).equality(self.equality),
            ),
            StrategyKind::Shallow => Box::new(ShallowStrategy::new().equality(self.equality)),
        }
    }

    pub fn codec(&self) -> JsonCodec {
        JsonCodec::with_max_message_size(self.max_message_size)
    }
}
