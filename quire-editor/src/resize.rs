//! Pointer-driven resizing of media nodes.
//!
//! The UI layer maps device pointer events onto [`ResizeEvent`]s; everything
//! else (transitions, aspect locking, the size floor) lives here and is free
//! of any rendering framework.
//!
//! ```text
//! Idle --DragStart--> Dragging --DragEnd--> Committing --finish_commit--> Idle
//!                        |
//!                        +--Cancel / PointerLeave--> Idle (reverted)
//! ```
use log::trace;
use serde::Serialize;

use crate::document::{Dimensions, MediaAttrs};

/// The smallest size a drag may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResizeLimits {
  pub min_width:  u32,
  pub min_height: u32,
}

impl Default for ResizeLimits {
  fn default() -> Self {
    Self {
      min_width:  50,
      min_height: 30,
    }
  }
}

impl ResizeLimits {
  #[must_use]
  pub const fn admits(&self, size: Dimensions) -> bool {
    size.width >= self.min_width && size.height >= self.min_height
  }
}

/// The corner handle being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
  NorthWest,
  NorthEast,
  SouthWest,
  SouthEast,
}

impl Corner {
  /// Signs applied to the pointer delta along x and y.
  #[must_use]
  pub const fn signs(self) -> (f64, f64) {
    match self {
      Self::NorthWest => (-1.0, -1.0),
      Self::NorthEast => (1.0, -1.0),
      Self::SouthWest => (-1.0, 1.0),
      Self::SouthEast => (1.0, 1.0),
    }
  }
}

/// A pointer position in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  #[must_use]
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Input to the resize state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeEvent {
  /// Pointer-down on a corner handle. `intrinsic` is the rendered size, used
  /// when the node has no explicit dimensions yet.
  DragStart {
    corner:    Corner,
    pointer:   Point,
    intrinsic: Dimensions,
  },
  /// Pointer-move while a handle is held.
  DragMove { pointer: Point, free_aspect: bool },
  /// Pointer-up.
  DragEnd,
  /// Escape key or any other explicit abort.
  Cancel,
  /// The pointer left the viewport mid-drag.
  PointerLeave,
}

/// What a single event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
  /// The event does not apply in the current state.
  Ignored,
  /// A drag began from the given size.
  Started(Dimensions),
  /// New preview size to render.
  Preview(Dimensions),
  /// The move would go below the floor; the previous preview stands.
  Rejected,
  /// Write these dimensions into the node, then call
  /// [`ResizeMachine::finish_commit`].
  Commit(Dimensions),
  /// The drag was abandoned; the node keeps its pre-drag attributes.
  Reverted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
  corner:  Corner,
  origin:  Point,
  start:   Dimensions,
  preview: Dimensions,
  moved:   bool,
}

/// Current state of a media node's resize behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeState {
  Idle,
  Dragging(DragSnapshot),
  Committing(Dimensions),
}

/// Read-only view of an active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSnapshot {
  pub corner:  Corner,
  pub start:   Dimensions,
  pub preview: Dimensions,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
  Idle,
  Dragging(Drag),
  Committing(Dimensions),
}

/// Resize behavior attached to one media node instance.
#[derive(Debug, Clone)]
pub struct ResizeMachine {
  state:  State,
  limits: ResizeLimits,
}

impl ResizeMachine {
  #[must_use]
  pub const fn new(limits: ResizeLimits) -> Self {
    Self {
      state: State::Idle,
      limits,
    }
  }

  #[must_use]
  pub const fn state(&self) -> ResizeState {
    match self.state {
      State::Idle => ResizeState::Idle,
      State::Dragging(drag) => {
        ResizeState::Dragging(DragSnapshot {
          corner:  drag.corner,
          start:   drag.start,
          preview: drag.preview,
        })
      },
      State::Committing(size) => ResizeState::Committing(size),
    }
  }

  /// Whether move/up handlers should stay subscribed.
  ///
  /// False as soon as a commit starts, so late pointer events never reach a
  /// node that is being written.
  #[must_use]
  pub const fn wants_pointer_events(&self) -> bool {
    matches!(self.state, State::Dragging(_))
  }

  /// Feed one event. `media` is the node's current attributes and is only
  /// consulted on `DragStart`.
  pub fn handle(
    &mut self,
    event: ResizeEvent,
    media: &MediaAttrs,
  ) -> ResizeOutcome {
    match (self.state, event) {
      (
        State::Idle,
        ResizeEvent::DragStart {
          corner,
          pointer,
          intrinsic,
        },
      ) => {
        let start = media.size.unwrap_or(intrinsic);
        self.state = State::Dragging(Drag {
          corner,
          origin: pointer,
          start,
          preview: start,
          moved: false,
        });
        trace!("resize started at {}x{}", start.width, start.height);
        ResizeOutcome::Started(start)
      },
      (
        State::Dragging(mut drag),
        ResizeEvent::DragMove {
          pointer,
          free_aspect,
        },
      ) => {
        let Some(size) = drag_size(&drag, pointer, free_aspect) else {
          return ResizeOutcome::Rejected;
        };
        if !self.limits.admits(size) {
          trace!(
            "resize to {}x{} is below the {}x{} floor",
            size.width,
            size.height,
            self.limits.min_width,
            self.limits.min_height
          );
          return ResizeOutcome::Rejected;
        }
        drag.preview = size;
        drag.moved = true;
        self.state = State::Dragging(drag);
        ResizeOutcome::Preview(size)
      },
      (State::Dragging(drag), ResizeEvent::DragEnd) => {
        if drag.moved && drag.preview != drag.start {
          self.state = State::Committing(drag.preview);
          ResizeOutcome::Commit(drag.preview)
        } else {
          self.state = State::Idle;
          ResizeOutcome::Reverted
        }
      },
      (State::Dragging(_), ResizeEvent::Cancel | ResizeEvent::PointerLeave) => {
        self.state = State::Idle;
        ResizeOutcome::Reverted
      },
      _ => ResizeOutcome::Ignored,
    }
  }

  /// Leave `Committing` once the dimensions have been written.
  pub fn finish_commit(&mut self) {
    if matches!(self.state, State::Committing(_)) {
      self.state = State::Idle;
    }
  }

  /// Drop any in-flight drag or commit.
  pub fn reset(&mut self) {
    self.state = State::Idle;
  }
}

fn drag_size(drag: &Drag, pointer: Point, free_aspect: bool) -> Option<Dimensions> {
  let (sx, sy) = drag.corner.signs();
  let dx = (pointer.x - drag.origin.x) * sx;
  let dy = (pointer.y - drag.origin.y) * sy;
  let start_w = f64::from(drag.start.width);
  let start_h = f64::from(drag.start.height);

  let width = (start_w + dx).round();
  let height = if free_aspect || drag.start.width == 0 {
    (start_h + dy).round()
  } else {
    (width * start_h / start_w).round()
  };

  if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
    return None;
  }
  if width > f64::from(u32::MAX) || height > f64::from(u32::MAX) {
    return None;
  }
  Some(Dimensions::new(width as u32, height as u32))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn start(machine: &mut ResizeMachine, corner: Corner, media: &MediaAttrs) {
    let outcome = machine.handle(
      ResizeEvent::DragStart {
        corner,
        pointer: Point::new(0.0, 0.0),
        intrinsic: Dimensions::new(400, 300),
      },
      media,
    );
    assert!(matches!(outcome, ResizeOutcome::Started(_)), "got {outcome:?}");
  }

  fn drag(machine: &mut ResizeMachine, x: f64, y: f64) -> ResizeOutcome {
    machine.handle(
      ResizeEvent::DragMove {
        pointer:     Point::new(x, y),
        free_aspect: false,
      },
      &MediaAttrs::default(),
    )
  }

  #[test]
  fn corner_signs_flip_the_delta() {
    let media = MediaAttrs::new("a.png").with_size(Dimensions::new(200, 100));
    for (corner, x, expected_width) in [
      (Corner::SouthEast, 50.0, 250),
      (Corner::NorthEast, 50.0, 250),
      (Corner::SouthWest, -50.0, 250),
      (Corner::NorthWest, -50.0, 250),
      (Corner::SouthWest, 50.0, 150),
    ] {
      let mut machine = ResizeMachine::new(ResizeLimits::default());
      start(&mut machine, corner, &media);
      let outcome = drag(&mut machine, x, 0.0);
      assert_eq!(
        outcome,
        ResizeOutcome::Preview(Dimensions::new(
          expected_width,
          expected_width / 2
        )),
        "corner {corner:?}"
      );
    }
  }

  #[test]
  fn free_aspect_uses_both_axes() {
    let media = MediaAttrs::new("a.png").with_size(Dimensions::new(200, 100));
    let mut machine = ResizeMachine::new(ResizeLimits::default());
    start(&mut machine, Corner::SouthEast, &media);
    let outcome = machine.handle(
      ResizeEvent::DragMove {
        pointer:     Point::new(10.0, 40.0),
        free_aspect: true,
      },
      &media,
    );
    assert_eq!(outcome, ResizeOutcome::Preview(Dimensions::new(210, 140)));
  }

  #[test]
  fn intrinsic_size_is_used_without_explicit_dimensions() {
    let mut machine = ResizeMachine::new(ResizeLimits::default());
    let outcome = machine.handle(
      ResizeEvent::DragStart {
        corner:    Corner::SouthEast,
        pointer:   Point::new(5.0, 5.0),
        intrinsic: Dimensions::new(640, 480),
      },
      &MediaAttrs::new("a.png"),
    );
    assert_eq!(outcome, ResizeOutcome::Started(Dimensions::new(640, 480)));
  }

  #[test]
  fn below_floor_keeps_last_preview() {
    let media = MediaAttrs::new("a.png").with_size(Dimensions::new(200, 100));
    let mut machine = ResizeMachine::new(ResizeLimits::default());
    start(&mut machine, Corner::SouthEast, &media);
    assert_eq!(
      drag(&mut machine, -100.0, 0.0),
      ResizeOutcome::Preview(Dimensions::new(100, 50))
    );
    assert_eq!(drag(&mut machine, -160.0, 0.0), ResizeOutcome::Rejected);
    assert_eq!(
      machine.handle(ResizeEvent::DragEnd, &media),
      ResizeOutcome::Commit(Dimensions::new(100, 50))
    );
  }

  #[test]
  fn committing_ignores_late_events() {
    let media = MediaAttrs::new("a.png").with_size(Dimensions::new(200, 100));
    let mut machine = ResizeMachine::new(ResizeLimits::default());
    start(&mut machine, Corner::SouthEast, &media);
    drag(&mut machine, 20.0, 0.0);
    assert!(matches!(
      machine.handle(ResizeEvent::DragEnd, &media),
      ResizeOutcome::Commit(_)
    ));
    assert!(!machine.wants_pointer_events());
    assert_eq!(drag(&mut machine, 90.0, 0.0), ResizeOutcome::Ignored);
    assert_eq!(
      machine.handle(ResizeEvent::DragEnd, &media),
      ResizeOutcome::Ignored
    );
    machine.finish_commit();
    assert_eq!(machine.state(), ResizeState::Idle);
  }

  #[test]
  fn cancel_and_leave_revert() {
    let media = MediaAttrs::new("a.png").with_size(Dimensions::new(200, 100));
    for abort in [ResizeEvent::Cancel, ResizeEvent::PointerLeave] {
      let mut machine = ResizeMachine::new(ResizeLimits::default());
      start(&mut machine, Corner::NorthWest, &media);
      drag(&mut machine, -30.0, -30.0);
      assert_eq!(machine.handle(abort, &media), ResizeOutcome::Reverted);
      assert_eq!(machine.state(), ResizeState::Idle);
    }
  }

  #[test]
  fn click_without_move_commits_nothing() {
    let media = MediaAttrs::new("a.png").with_size(Dimensions::new(200, 100));
    let mut machine = ResizeMachine::new(ResizeLimits::default());
    start(&mut machine, Corner::SouthEast, &media);
    assert_eq!(
      machine.handle(ResizeEvent::DragEnd, &media),
      ResizeOutcome::Reverted
    );
  }
}
