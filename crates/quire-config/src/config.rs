use std::{
  fs,
  path::{Path, PathBuf},
  time::Duration,
};

use quire_editor::{
  AutosaveOptions,
  IndexerOptions,
  ResizeLimits,
  SessionOptions,
  UploadLimits,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Configuration files looked for in the working directory, in order.
const CONFIG_CANDIDATES: [&str; 4] = [
  "quire.toml",
  "quire.json",
  ".quire/config.toml",
  ".quire/config.json",
];

/// Editing behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
  /// Smallest width a resize drag may produce.
  pub min_media_width:  u32,
  /// Smallest height a resize drag may produce.
  pub min_media_height: u32,
  pub words_per_minute: u32,
}

impl Default for EditorConfig {
  fn default() -> Self {
    let limits = ResizeLimits::default();
    Self {
      min_media_width:  limits.min_width,
      min_media_height: limits.min_height,
      words_per_minute: 225,
    }
  }
}

/// Image upload limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
  pub max_bytes:     usize,
  pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
  fn default() -> Self {
    let limits = UploadLimits::default();
    Self {
      max_bytes:     limits.max_bytes,
      allowed_types: limits.allowed_types,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
  pub enable:        bool,
  pub interval_secs: u64,
  pub snapshot_path: PathBuf,
}

impl Default for AutosaveConfig {
  fn default() -> Self {
    let options = AutosaveOptions::default();
    Self {
      enable:        options.enable,
      interval_secs: options.interval.as_secs(),
      snapshot_path: options.snapshot_path,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
  /// Quiet period before live analysis reruns.
  pub debounce_ms:         u64,
  /// Give headings with identical text distinct anchors.
  pub deduplicate_anchors: bool,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      debounce_ms:         300,
      deduplicate_anchors: false,
    }
  }
}

/// Configuration for the quire editor and CLI.
///
/// Every section falls back to its defaults, so a config file only needs the
/// keys it changes. Fields are loaded from TOML or JSON files and can be
/// overridden with `KEY=VALUE` strings from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub editor:   EditorConfig,
  pub upload:   UploadConfig,
  pub autosave: AutosaveConfig,
  pub analysis: AnalysisConfig,
}

/// Recursively merge `other` into `base`; scalars and arrays in `other`
/// replace those in `base`.
fn merge_values(base: &mut Value, other: Value) {
  match (base, other) {
    (Value::Object(base), Value::Object(other)) => {
      for (key, value) in other {
        match base.get_mut(&key) {
          Some(existing) => merge_values(existing, value),
          None => {
            base.insert(key, value);
          },
        }
      }
    },
    (base, other) => *base = other,
  }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_lowercase().as_str() {
    "true" | "yes" | "1" | "on" => Ok(true),
    "false" | "no" | "0" | "off" => Ok(false),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid boolean value for '{key}': '{value}'. Expected true/false, \
         yes/no, 1/0 or on/off"
      )))
    },
  }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
  T::Err: std::fmt::Display,
{
  value.parse().map_err(|e| {
    ConfigError::Config(format!("Invalid numeric value for '{key}': '{value}' ({e})"))
  })
}

impl Config {
  /// Read a config file as an untyped tree, dispatching on its extension.
  #[allow(
    clippy::option_if_let_else,
    reason = "Clearer with explicit match on extension"
  )]
  fn read_value(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to read config file: {}: {}",
        path.display(),
        e
      ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) => {
        match ext.to_lowercase().as_str() {
          "json" => {
            serde_json::from_str(&content).map_err(|e| {
              ConfigError::Config(format!(
                "Failed to parse JSON config from {}: {}",
                path.display(),
                e
              ))
            })
          },
          "toml" => {
            toml::from_str(&content).map_err(|e| {
              ConfigError::Config(format!(
                "Failed to parse TOML config from {}: {}",
                path.display(),
                e
              ))
            })
          },
          _ => {
            Err(ConfigError::Config(format!(
              "Unsupported config file format: {}",
              path.display()
            )))
          },
        }
      },
      None => {
        Err(ConfigError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Load configuration from a single TOML or JSON file.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let value = Self::read_value(path.as_ref())?;
    Ok(serde_json::from_value(value)?)
  }

  /// Load and merge config files in order, then apply `KEY=VALUE` overrides.
  ///
  /// Later files win key by key. Without any file, a config discovered in the
  /// working directory is used, and the defaults otherwise.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded, an override is malformed, or
  /// the result fails validation.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let discovered;
    let files = if config_files.is_empty() {
      discovered = Self::find_config_file();
      if let Some(path) = &discovered {
        log::info!("Using discovered config file: {}", path.display());
      }
      discovered.as_slice()
    } else {
      config_files
    };

    let mut merged = Value::Object(serde_json::Map::new());
    for path in files {
      let value = Self::read_value(path).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          path.display(),
          e
        ))
      })?;
      merge_values(&mut merged, value);
    }
    if files.len() > 1 {
      log::info!("Loaded and merged {} config files", files.len());
    }

    let mut config: Self = serde_json::from_value(merged)?;
    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }
    config.validate()?;
    Ok(config)
  }

  /// Look for a config file in the working directory.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_CANDIDATES
      .iter()
      .map(PathBuf::from)
      .find(|path| path.is_file())
  }

  /// Apply configuration overrides from KEY=VALUE strings.
  ///
  /// Keys are dotted `section.field` paths, e.g. `editor.min_media_width=80`
  /// or `upload.allowed_types=image/png,image/jpeg`.
  ///
  /// # Errors
  ///
  /// Returns an error if an override is not in KEY=VALUE format, the key is
  /// unknown, or the value cannot be parsed as the field's type.
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
      "editor.min_media_width" => self.editor.min_media_width = parse_number(key, value)?,
      "editor.min_media_height" => self.editor.min_media_height = parse_number(key, value)?,
      "editor.words_per_minute" => self.editor.words_per_minute = parse_number(key, value)?,
      "upload.max_bytes" => self.upload.max_bytes = parse_number(key, value)?,
      "upload.allowed_types" => {
        self.upload.allowed_types = value
          .split(',')
          .map(str::trim)
          .filter(|t| !t.is_empty())
          .map(String::from)
          .collect();
      },
      "autosave.enable" => self.autosave.enable = parse_bool(key, value)?,
      "autosave.interval_secs" => self.autosave.interval_secs = parse_number(key, value)?,
      "autosave.snapshot_path" => self.autosave.snapshot_path = PathBuf::from(value),
      "analysis.debounce_ms" => self.analysis.debounce_ms = parse_number(key, value)?,
      "analysis.deduplicate_anchors" => {
        self.analysis.deduplicate_anchors = parse_bool(key, value)?;
      },
      _ => {
        return Err(ConfigError::Config(format!(
          "Unknown config key: '{key}'"
        )));
      },
    }
    Ok(())
  }

  /// Check values that parse but make no sense.
  ///
  /// # Errors
  ///
  /// Returns an error naming the first offending field.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let zero = |name: &str| {
      Err(ConfigError::Config(format!("'{name}' must be greater than zero")))
    };
    if self.editor.min_media_width == 0 {
      return zero("editor.min_media_width");
    }
    if self.editor.min_media_height == 0 {
      return zero("editor.min_media_height");
    }
    if self.editor.words_per_minute == 0 {
      return zero("editor.words_per_minute");
    }
    if self.upload.max_bytes == 0 {
      return zero("upload.max_bytes");
    }
    if self.autosave.enable && self.autosave.interval_secs == 0 {
      return zero("autosave.interval_secs");
    }
    if let Some(bad) = self
      .upload
      .allowed_types
      .iter()
      .find(|t| !t.starts_with("image/"))
    {
      return Err(ConfigError::Config(format!(
        "'upload.allowed_types' may only list image types, found '{bad}'"
      )));
    }
    Ok(())
  }

  #[must_use]
  pub const fn resize_limits(&self) -> ResizeLimits {
    ResizeLimits {
      min_width:  self.editor.min_media_width,
      min_height: self.editor.min_media_height,
    }
  }

  #[must_use]
  pub fn upload_limits(&self) -> UploadLimits {
    UploadLimits {
      max_bytes:     self.upload.max_bytes,
      allowed_types: self.upload.allowed_types.clone(),
    }
  }

  #[must_use]
  pub fn autosave_options(&self) -> AutosaveOptions {
    AutosaveOptions {
      enable:        self.autosave.enable,
      interval:      Duration::from_secs(self.autosave.interval_secs),
      snapshot_path: self.autosave.snapshot_path.clone(),
    }
  }

  #[must_use]
  pub const fn indexer_options(&self) -> IndexerOptions {
    IndexerOptions {
      deduplicate_anchors: self.analysis.deduplicate_anchors,
    }
  }

  #[must_use]
  pub const fn debounce(&self) -> Duration {
    Duration::from_millis(self.analysis.debounce_ms)
  }

  /// Everything an editing session needs.
  #[must_use]
  pub fn session_options(&self) -> SessionOptions {
    SessionOptions {
      resize:           self.resize_limits(),
      upload:           self.upload_limits(),
      indexer:          self.indexer_options(),
      words_per_minute: self.editor.words_per_minute,
    }
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)
      .map_err(|e| ConfigError::Template(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}
