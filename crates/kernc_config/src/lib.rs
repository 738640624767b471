use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The optional config filename looked up in the working directory.
pub const CONFIG_FILE: &str = "kernc.toml";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DumpKind {
  Kir,
  Mir,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugTrace {
  Lower,
  Mir,
  Interp,
  Driver,
}

/// Settings of the lowering pass.
///
/// Expected format in kernc.toml:
/// ```toml
/// [lower]
/// verify = true
/// workers = 4
/// module_name = "kernel"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerOptions {
  /// Run the machine IR verifier on every lowered function.
  pub verify: bool,
  /// Worker threads; 0 and 1 both mean sequential lowering.
  pub workers: usize,
  /// Module name; the input module's own name when empty.
  pub module_name: String,
}

impl Default for LowerOptions {
  fn default() -> Self {
    Self {
      verify: false,
      workers: 1,
      module_name: String::new(),
    }
  }
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KerncToml {
  #[serde(default)]
  pub lower: LowerOptions,
}

#[derive(Debug, Clone, Default)]
pub struct KerncConfig {
  pub debug: bool,
  pub debug_trace: Vec<DebugTrace>,
  pub quiet: bool,
  pub verbose: u8,
  pub dump: Vec<DumpKind>,
  pub lower: LowerOptions,
}

impl KerncConfig {
  pub fn new_basic(
    debug: bool,
    debug_trace: Vec<DebugTrace>,
    quiet: bool,
    verbose: u8,
  ) -> Self {
    Self {
      debug,
      debug_trace,
      quiet,
      verbose,
      ..Default::default()
    }
  }

  /// Configuration that prints nothing; used by library callers and tests.
  pub fn silent() -> Self {
    Self::new_basic(false, Vec::new(), true, 0)
  }

  pub fn wants_dump(
    &self,
    kind: DumpKind,
  ) -> bool {
    self.dump.contains(&kind)
  }
}

#[derive(Debug)]
pub enum ConfigError {
  /// I/O error while reading the config file.
  IoError { path: PathBuf, source: std::io::Error },

  /// Failed to parse the config file.
  TomlParseError { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      ConfigError::IoError { path, source } => {
        write!(f, "failed to read '{}': {}", path.display(), source)
      },
      ConfigError::TomlParseError { path, message } => {
        write!(f, "failed to parse '{}': {}", path.display(), message)
      },
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ConfigError::IoError { source, .. } => Some(source),
      ConfigError::TomlParseError { .. } => None,
    }
  }
}

pub fn parse_config(
  path: &Path,
  content: &str,
) -> Result<KerncToml, ConfigError> {
  toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
    path: path.to_path_buf(),
    message: e.to_string(),
  })
}

/// Load and parse a kernc.toml file.
pub fn load_config_file(path: &Path) -> Result<KerncToml, ConfigError> {
  let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
    path: path.to_path_buf(),
    source: e,
  })?;

  parse_config(path, &content)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_keys_fall_back_to_defaults() {
    let parsed = parse_config(Path::new(CONFIG_FILE), "[lower]\nverify = true\n").unwrap();
    assert!(parsed.lower.verify);
    assert_eq!(parsed.lower.workers, 1);
    assert_eq!(parsed.lower.module_name, "");

    let empty = parse_config(Path::new(CONFIG_FILE), "").unwrap();
    assert_eq!(empty, KerncToml::default());
  }

  #[test]
  fn malformed_files_report_their_path() {
    let error = parse_config(Path::new("conf/kernc.toml"), "[lower]\nworkers = \"many\"\n").unwrap_err();
    assert!(error.to_string().starts_with("failed to parse 'conf/kernc.toml'"));
  }

  #[test]
  fn unreadable_files_are_io_errors() {
    let path = std::env::temp_dir().join("kernc_config_test_missing").join(CONFIG_FILE);
    assert!(matches!(load_config_file(&path), Err(ConfigError::IoError { .. })));
  }
}
