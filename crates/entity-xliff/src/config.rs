//! Configuration loaded from environment variables, plus the optional
//! translatable-info file that extends the built-in registries.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::field::FieldHandlerKind;
use crate::translatable::{Paradigm, StrategyKind};

/// Default limit on nested entity references followed by one walk.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Translatable-info YAML file (`ENTITY_XLIFF_REGISTRY`, optional).
    pub registry_path: Option<PathBuf>,

    /// Maximum reference nesting followed during extract and merge
    /// (`ENTITY_XLIFF_MAX_DEPTH`, default: 32).
    pub max_depth: usize,

    /// Abort a merge before saving anything when a translated branch no
    /// longer matches the entity (`ENTITY_XLIFF_STRICT_STRUCTURE`, default:
    /// false).
    pub strict_structure: bool,

    /// Tracing filter used when `RUST_LOG` is unset (`ENTITY_XLIFF_LOG`,
    /// default: "info").
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: None,
            max_depth: DEFAULT_MAX_DEPTH,
            strict_structure: false,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let registry_path = lookup("ENTITY_XLIFF_REGISTRY")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let max_depth = lookup("ENTITY_XLIFF_MAX_DEPTH")
            .unwrap_or_else(|| DEFAULT_MAX_DEPTH.to_string())
            .parse()
            .context("ENTITY_XLIFF_MAX_DEPTH must be a valid usize")?;

        let strict_structure = match lookup("ENTITY_XLIFF_STRICT_STRUCTURE") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("ENTITY_XLIFF_STRICT_STRUCTURE must be a boolean, got '{raw}'"))?,
            None => false,
        };

        let log_filter = lookup("ENTITY_XLIFF_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            registry_path,
            max_depth,
            strict_structure,
            log_filter,
        })
    }

    /// Read the translatable-info file, if one is configured.
    pub fn load_translatable_info(&self) -> Result<TranslatableInfo> {
        match &self.registry_path {
            Some(path) => TranslatableInfo::load(path),
            None => Ok(TranslatableInfo::default()),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Registry extensions read from YAML.
///
/// ```yaml
/// translatables:
///   node:
///     content_translation: content
///     entity_translation: entity_field
/// field_handlers:
///   addressfield: structured
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslatableInfo {
    #[serde(default)]
    pub translatables: HashMap<String, HashMap<Paradigm, StrategyKind>>,
    #[serde(default)]
    pub field_handlers: HashMap<String, FieldHandlerKind>,
}

impl TranslatableInfo {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read translatable info {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid translatable info {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content).context("invalid translatable info YAML")
    }
}
