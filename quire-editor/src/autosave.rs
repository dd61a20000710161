//! Best-effort periodic snapshots of the canonical markup.
//!
//! The host calls [`Autosave::tick`] from its own timer. A tick saves only
//! when the interval has elapsed and the markup changed since the last
//! successful save. Failures never propagate: they are logged, recorded as a
//! transient [`AutosaveNotice`], and the next due tick simply tries again.
use std::{
  fs,
  io::Write,
  path::{Path, PathBuf},
  time::{Duration, Instant},
};

use jiff::Zoned;
use log::{debug, warn};
use serde::Serialize;

use crate::error::AutosaveError;

/// Destination for snapshots.
pub trait SnapshotSink {
  /// Persist `markup`, replacing the previous snapshot.
  ///
  /// # Errors
  ///
  /// Returns [`AutosaveError`] when the snapshot could not be stored.
  fn save(&mut self, markup: &str) -> Result<(), AutosaveError>;
}

/// Writes snapshots to a file, atomically replacing the previous one.
#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
  path: PathBuf,
}

impl FileSnapshotSink {
  #[must_use]
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  #[must_use]
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl SnapshotSink for FileSnapshotSink {
  fn save(&mut self, markup: &str) -> Result<(), AutosaveError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }

    let mut staging = self.path.clone().into_os_string();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let written = fs::File::create(&staging)
      .and_then(|mut file| {
        file.write_all(markup.as_bytes())?;
        file.sync_all()
      })
      .and_then(|()| fs::rename(&staging, &self.path));

    if let Err(e) = written {
      if staging.exists() {
        if let Err(cleanup) = fs::remove_file(&staging) {
          warn!("Failed to remove {}: {cleanup}", staging.display());
        }
      }
      return Err(e.into());
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveOptions {
  pub enable:        bool,
  pub interval:      Duration,
  pub snapshot_path: PathBuf,
}

impl Default for AutosaveOptions {
  fn default() -> Self {
    Self {
      enable:        true,
      interval:      Duration::from_secs(30),
      snapshot_path: PathBuf::from(".quire/autosave.html"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
  Saved,
  Failed,
}

/// A short-lived status message for the author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutosaveNotice {
  pub kind:    NoticeKind,
  pub message: String,
  #[serde(serialize_with = "serialize_zoned")]
  pub at:      Zoned,
}

fn serialize_zoned<S: serde::Serializer>(at: &Zoned, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(&at.strftime("%Y-%m-%d %H:%M:%S"))
}

/// Autosave driver around a [`SnapshotSink`].
#[derive(Debug)]
pub struct Autosave<S> {
  sink:         S,
  enable:       bool,
  interval:     Duration,
  last_attempt: Option<Instant>,
  last_saved:   Option<String>,
  notice:       Option<AutosaveNotice>,
}

impl Autosave<FileSnapshotSink> {
  /// File-backed autosave as configured.
  #[must_use]
  pub fn to_file(options: &AutosaveOptions) -> Self {
    Self::new(FileSnapshotSink::new(&options.snapshot_path), options)
  }
}

impl<S: SnapshotSink> Autosave<S> {
  #[must_use]
  pub const fn new(sink: S, options: &AutosaveOptions) -> Self {
    Self {
      sink,
      enable: options.enable,
      interval: options.interval,
      last_attempt: None,
      last_saved: None,
      notice: None,
    }
  }

  #[must_use]
  pub const fn sink(&self) -> &S {
    &self.sink
  }

  /// The latest notice, until dismissed or replaced.
  #[must_use]
  pub const fn notice(&self) -> Option<&AutosaveNotice> {
    self.notice.as_ref()
  }

  pub fn dismiss_notice(&mut self) {
    self.notice = None;
  }

  fn is_due(&self, now: Instant) -> bool {
    self
      .last_attempt
      .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
  }

  /// Timer callback. Returns the new notice when a save was attempted.
  pub fn tick(&mut self, now: Instant, markup: &str) -> Option<&AutosaveNotice> {
    if !self.enable || !self.is_due(now) {
      return None;
    }
    if self.last_saved.as_deref() == Some(markup) {
      return None;
    }
    self.last_attempt = Some(now);

    let notice = match self.sink.save(markup) {
      Ok(()) => {
        debug!("Autosaved {} bytes", markup.len());
        self.last_saved = Some(markup.to_string());
        AutosaveNotice {
          kind:    NoticeKind::Saved,
          message: "Draft saved".to_string(),
          at:      Zoned::now(),
        }
      },
      Err(e) => {
        warn!("Autosave failed, retrying on the next tick: {e}");
        AutosaveNotice {
          kind:    NoticeKind::Failed,
          message: format!("Autosave failed: {e}"),
          at:      Zoned::now(),
        }
      },
    };
    self.notice = Some(notice);
    self.notice.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Fails a set number of times, then records what it is given.
  #[derive(Default)]
  struct FlakySink {
    failures: usize,
    saved:    Vec<String>,
  }

  impl SnapshotSink for FlakySink {
    fn save(&mut self, markup: &str) -> Result<(), AutosaveError> {
      if self.failures > 0 {
        self.failures -= 1;
        return Err(AutosaveError::Sink("disk full".to_string()));
      }
      self.saved.push(markup.to_string());
      Ok(())
    }
  }

  fn options() -> AutosaveOptions {
    AutosaveOptions {
      interval: Duration::from_secs(30),
      ..AutosaveOptions::default()
    }
  }

  #[test]
  fn saves_only_when_due_and_changed() {
    let start = Instant::now();
    let mut autosave = Autosave::new(FlakySink::default(), &options());

    assert!(autosave.tick(start, "<p>a</p>").is_some());
    assert!(autosave.tick(start + Duration::from_secs(5), "<p>b</p>").is_none());
    assert!(autosave.tick(start + Duration::from_secs(31), "<p>b</p>").is_some());
    assert!(autosave.tick(start + Duration::from_secs(70), "<p>b</p>").is_none());
    assert_eq!(autosave.sink().saved, vec!["<p>a</p>", "<p>b</p>"]);
  }

  #[test]
  fn failure_is_retried_on_next_due_tick() {
    let start = Instant::now();
    let sink = FlakySink {
      failures: 1,
      ..FlakySink::default()
    };
    let mut autosave = Autosave::new(sink, &options());

    let kind = autosave.tick(start, "<p>x</p>").map(|n| n.kind);
    assert_eq!(kind, Some(NoticeKind::Failed));
    let kind = autosave
      .tick(start + Duration::from_secs(30), "<p>x</p>")
      .map(|n| n.kind);
    assert_eq!(kind, Some(NoticeKind::Saved));
  }

  #[test]
  fn disabled_autosave_never_saves() {
    let options = AutosaveOptions {
      enable: false,
      ..options()
    };
    let mut autosave = Autosave::new(FlakySink::default(), &options);
    assert!(autosave.tick(Instant::now(), "<p>x</p>").is_none());
  }
}
