#![allow(dead_code)]

use std::path::PathBuf;

use kernc_config::KerncConfig;
use tempfile::TempDir;

pub fn demo_path() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/kernel.json")
}

pub fn quiet_config() -> KerncConfig {
  let mut config = KerncConfig::silent();
  config.lower.verify = true;
  config
}

/// Write `content` to `name` inside a fresh temporary directory.
pub fn write_temp(
  name: &str,
  content: &str,
) -> (TempDir, PathBuf) {
  let dir = tempfile::tempdir().expect("create temp dir");
  let path = dir.path().join(name);
  std::fs::write(&path, content).expect("write temp file");
  (dir, path)
}
