use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FormulaError, FormulaResult};

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "pixeq.toml";

/// Deepest expression tree the compiler will build.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Number of image slots a formula may reference (`I0` .. `I<n-1>`).
    pub max_image_slots: u32,
    /// Nesting limit for calls, signs and operators. Formulas nested
    /// deeper fail to compile instead of exhausting the stack.
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_image_slots: 16,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    pub level: String, // "error" | "warn" | "info" | "debug" | "trace"
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PixeqConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl PixeqConfig {
    pub fn from_toml_str(contents: &str) -> FormulaResult<Self> {
        toml::from_str(contents).map_err(|e| FormulaError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> FormulaResult<String> {
        toml::to_string_pretty(self).map_err(|e| FormulaError::Config(e.to_string()))
    }

    pub fn load_from_file(path: &Path) -> FormulaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: &Path) -> FormulaResult<()> {
        let contents = self.to_toml_string()?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load `path` if given, otherwise `pixeq.toml` from the working directory
    /// when present, otherwise defaults. An explicit path must exist.
    pub fn load_or_default(path: Option<&Path>) -> FormulaResult<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load_from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = PixeqConfig::default();
        assert_eq!(config.compiler.max_image_slots, 16);
        assert_eq!(config.compiler.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PixeqConfig::from_toml_str("[compiler]\nmax_image_slots = 4\n").unwrap();
        assert_eq!(config.compiler.max_image_slots, 4);
        assert_eq!(config.compiler.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_max_depth_alone() {
        let config = PixeqConfig::from_toml_str("[compiler]\nmax_depth = 32\n").unwrap();
        assert_eq!(config.compiler.max_depth, 32);
        assert_eq!(config.compiler.max_image_slots, 16);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = PixeqConfig::default();
        config.log.level = "debug".to_string();
        let text = config.to_toml_string().unwrap();
        let back = PixeqConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.log.level, "debug");
    }

    #[test]
    fn test_invalid_toml() {
        let err = PixeqConfig::from_toml_str("[compiler]\nmax_image_slots = \"many\"\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = PixeqConfig::load_or_default(Some(Path::new("/nonexistent/pixeq.toml")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
