use std::fmt;

/// Error type for template operations.
#[derive(Debug)]
pub enum TemplateError {
  /// The requested configuration format is not supported.
  UnsupportedFormat(String),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnsupportedFormat(format) => {
        write!(f, "Unsupported config format: {format}")
      },
    }
  }
}

impl std::error::Error for TemplateError {}

/// Default configuration in TOML, commented so that a new user can find their
/// way around. Values match [`crate::Config::default`].
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# quire configuration file

[editor]
# Smallest size a resize drag may produce, in pixels
min_media_width = 50
min_media_height = 30

# Reading speed used for the estimated reading time
words_per_minute = 225

[upload]
# Largest accepted image, in bytes (5 MiB)
max_bytes = 5242880

# Accepted image types
allowed_types = ["image/png", "image/jpeg", "image/gif", "image/webp", "image/svg+xml"]

[autosave]
# Periodically write the current markup to a snapshot file
enable = true
interval_secs = 30
snapshot_path = ".quire/autosave.html"

[analysis]
# Quiet period before live scores are recomputed while typing
debounce_ms = 300

# Give headings with identical text distinct anchors (-1, -2, ...).
# When false, such headings share one anchor.
deduplicate_anchors = false
"#;

/// Default configuration in JSON.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "editor": {
    "min_media_width": 50,
    "min_media_height": 30,
    "words_per_minute": 225
  },
  "upload": {
    "max_bytes": 5242880,
    "allowed_types": [
      "image/png",
      "image/jpeg",
      "image/gif",
      "image/webp",
      "image/svg+xml"
    ]
  },
  "autosave": {
    "enable": true,
    "interval_secs": 30,
    "snapshot_path": ".quire/autosave.html"
  },
  "analysis": {
    "debounce_ms": 300,
    "deduplicate_anchors": false
  }
}
"#;

/// Get the correct configuration template based on the requested format.
///
/// # Errors
///
/// Returns an error if the requested format is not supported.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;
  use crate::Config;

  #[test]
  fn templates_match_the_defaults() {
    let from_toml: Config =
      toml::from_str(DEFAULT_TOML_TEMPLATE).expect("TOML template parses");
    let from_json: Config =
      serde_json::from_str(DEFAULT_JSON_TEMPLATE).expect("JSON template parses");
    assert_eq!(from_toml, Config::default());
    assert_eq!(from_json, Config::default());
  }

  #[test]
  fn unknown_format_is_rejected() {
    assert!(get_template("yaml").is_err());
  }
}
