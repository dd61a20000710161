#![allow(clippy::expect_used, reason = "Fine in tests")]
use std::fs;

use quire_config::Config;
use tempfile::TempDir;

#[test]
fn files_merge_in_order_then_overrides_apply() {
  let dir = TempDir::new().expect("temp dir");
  let base = dir.path().join("base.toml");
  fs::write(
    &base,
    "[editor]\nmin_media_width = 60\nwords_per_minute = 200\n\n[autosave]\nenable = false\n",
  )
  .expect("write base");
  let local = dir.path().join("local.json");
  fs::write(&local, r#"{"editor": {"min_media_width": 90}}"#).expect("write local");

  let config = Config::load(&[base, local], &["analysis.debounce_ms=50".to_string()])
    .expect("config loads");

  assert_eq!(config.editor.min_media_width, 90);
  assert_eq!(config.editor.words_per_minute, 200);
  assert!(!config.autosave.enable);
  assert_eq!(config.analysis.debounce_ms, 50);
  assert_eq!(config.upload, quire_config::config::UploadConfig::default());
}

#[test]
fn generated_defaults_load_back() {
  let dir = TempDir::new().expect("temp dir");
  for format in ["toml", "json"] {
    let path = dir.path().join(format!("nested/quire.{format}"));
    Config::generate_default_config(format, &path).expect("config is written");
    let config = Config::from_file(&path).expect("generated config parses");
    assert_eq!(config, Config::default(), "{format} defaults differ");
  }
}

#[test]
fn unsupported_and_invalid_files_are_errors() {
  let dir = TempDir::new().expect("temp dir");
  let yaml = dir.path().join("quire.yaml");
  fs::write(&yaml, "editor: {}").expect("write");
  assert!(Config::from_file(&yaml).is_err());

  let broken = dir.path().join("quire.toml");
  fs::write(&broken, "[editor\nmin_media_width = ").expect("write");
  assert!(Config::from_file(&broken).is_err());

  let invalid = dir.path().join("zero.toml");
  fs::write(&invalid, "[upload]\nmax_bytes = 0\n").expect("write");
  assert!(Config::load(&[invalid], &[]).is_err());
}

#[test]
fn session_options_follow_the_config() {
  let mut config = Config::default();
  config
    .apply_overrides(&[
      "editor.min_media_height=40".to_string(),
      "analysis.deduplicate_anchors=true".to_string(),
    ])
    .expect("valid overrides");
  let options = config.session_options();
  assert_eq!(options.resize.min_height, 40);
  assert!(options.indexer.deduplicate_anchors);
}
