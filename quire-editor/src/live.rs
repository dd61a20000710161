//! Debounced re-analysis while the author types.
//!
//! Scoring and the accessibility pass both re-walk the whole body, so the
//! host reports every change with [`LiveAnalysis::changed`] and polls from its
//! event loop; the passes run once the input has been quiet for the
//! configured period.
use std::time::{Duration, Instant};

use log::trace;
use serde::Serialize;

use crate::{
  a11y::{AccessibilityReport, check_facts},
  analysis::{BodyFacts, ContentAnalysis, ContentInput, DocumentStats, analyze_with_facts},
};

/// Trailing-edge debouncer: fires once, `quiet` after the last event.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
  quiet:    Duration,
  deadline: Option<Instant>,
}

impl Debouncer {
  #[must_use]
  pub const fn new(quiet: Duration) -> Self {
    Self {
      quiet,
      deadline: None,
    }
  }

  /// Note an event, pushing the deadline back.
  pub fn record(&mut self, now: Instant) {
    self.deadline = Some(now + self.quiet);
  }

  #[must_use]
  pub const fn is_pending(&self) -> bool {
    self.deadline.is_some()
  }

  /// True exactly once per burst, when the deadline has passed.
  pub fn take_ready(&mut self, now: Instant) -> bool {
    match self.deadline {
      Some(deadline) if deadline <= now => {
        self.deadline = None;
        true
      },
      _ => false,
    }
  }
}

/// The three derived views of a post, computed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveReport {
  pub analysis:      ContentAnalysis,
  pub accessibility: AccessibilityReport,
  pub stats:         DocumentStats,
}

impl LiveReport {
  /// Run every pass over `input` now.
  #[must_use]
  pub fn compute(input: &ContentInput, words_per_minute: u32) -> Self {
    let facts = BodyFacts::extract(&input.body);
    Self {
      analysis:      analyze_with_facts(input, &facts),
      accessibility: check_facts(&facts),
      stats:         DocumentStats::from_facts(&facts, words_per_minute),
    }
  }
}

#[derive(Debug)]
pub struct LiveAnalysis {
  debouncer:        Debouncer,
  words_per_minute: u32,
  pending:          Option<ContentInput>,
  latest:           Option<LiveReport>,
}

impl LiveAnalysis {
  #[must_use]
  pub const fn new(quiet: Duration, words_per_minute: u32) -> Self {
    Self {
      debouncer: Debouncer::new(quiet),
      words_per_minute,
      pending: None,
      latest: None,
    }
  }

  /// Record the latest state of the post's fields.
  pub fn changed(&mut self, now: Instant, input: ContentInput) {
    self.pending = Some(input);
    self.debouncer.record(now);
  }

  /// Recompute if the quiet period has passed. Returns the fresh report when
  /// one was computed.
  pub fn poll(&mut self, now: Instant) -> Option<&LiveReport> {
    if !self.debouncer.take_ready(now) {
      return None;
    }
    self.recompute()
  }

  /// Recompute immediately, e.g. before saving.
  pub fn flush(&mut self) -> Option<&LiveReport> {
    if !self.debouncer.is_pending() {
      return self.latest.as_ref();
    }
    self.debouncer = Debouncer::new(self.debouncer.quiet);
    self.recompute()
  }

  fn recompute(&mut self) -> Option<&LiveReport> {
    let input = self.pending.take()?;
    trace!("Recomputing live analysis for {} bytes of markup", input.body.len());
    self.latest = Some(LiveReport::compute(&input, self.words_per_minute));
    self.latest.as_ref()
  }

  /// The last computed report.
  #[must_use]
  pub const fn latest(&self) -> Option<&LiveReport> {
    self.latest.as_ref()
  }
}
