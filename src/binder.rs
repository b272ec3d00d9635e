//! Interaction binding: default shape styling plus pointer hit-testing.
//!
//! A binding belongs to one document instance. Whenever the document is
//! replaced (load, undo, redo, clear) the old binding is stale and
//! [`Bindings::bind`] has to run again on the new document.

use crate::document::{Document, ShapeId};
use crate::log_warn;
use crate::render::PickBuffer;

/// Fill given to shapes that have none.
pub const BLANK_FILL: &str = "white";
pub const STROKE_COLOR: &str = "#333";
pub const STROKE_WIDTH: &str = "2";
/// Opacity of the shape under the pointer.
pub const HOVER_OPACITY: f32 = 0.8;

/// Normalize every shape: missing or `none` fill becomes white, stroke is
/// forced to the line-art style. Returns the number of shapes touched.
pub fn apply_default_styling(doc: &mut Document) -> usize {
    let ids: Vec<ShapeId> = doc.shape_ids().collect();
    for &id in &ids {
        let Some(shape) = doc.shape_mut(id) else { continue };
        let needs_fill = match shape.attr("fill") {
            None => true,
            Some(fill) => fill.trim().eq_ignore_ascii_case("none"),
        };
        if needs_fill {
            shape.set_attr("fill", BLANK_FILL);
        }
        shape.set_attr("stroke", STROKE_COLOR);
        shape.set_attr("stroke-width", STROKE_WIDTH);
    }
    ids.len()
}

/// Hover transition produced by pointer movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverChange {
    Enter(ShapeId),
    Leave(ShapeId),
    /// Moved directly from one shape to another.
    Switch { from: ShapeId, to: ShapeId },
}

#[derive(Clone, Debug, Default)]
pub struct Bindings {
    pick: Option<PickBuffer>,
    hovered: Option<ShapeId>,
    shape_count: usize,
}

impl Bindings {
    /// Style the document and build the hit-test buffer for it.
    pub fn bind(doc: &mut Document) -> Self {
        let shape_count = apply_default_styling(doc);
        let pick = match PickBuffer::build(doc) {
            Ok(pick) => Some(pick),
            Err(e) => {
                log_warn!("Hit-testing unavailable for this image: {}", e);
                None
            }
        };
        Self {
            pick,
            hovered: None,
            shape_count,
        }
    }

    pub fn shape_count(&self) -> usize {
        self.shape_count
    }

    pub fn is_bound(&self) -> bool {
        self.pick.is_some()
    }

    /// Shape at an image-space point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<ShapeId> {
        self.pick.as_ref()?.shape_at(x, y)
    }

    pub fn hovered(&self) -> Option<ShapeId> {
        self.hovered
    }

    pub fn pointer_enter(&mut self, id: ShapeId) {
        if id.0 < self.shape_count {
            self.hovered = Some(id);
        }
    }

    /// Leaving a shape that is not the hovered one is ignored.
    pub fn pointer_leave(&mut self, id: ShapeId) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }

    /// Feed a pointer position (`None` when the pointer left the image) and
    /// fire the matching enter/leave transitions.
    pub fn pointer_moved(&mut self, pos: Option<(f32, f32)>) -> Option<HoverChange> {
        let target = pos.and_then(|(x, y)| self.hit_test(x, y));
        let change = match (self.hovered, target) {
            (Some(from), Some(to)) if from != to => Some(HoverChange::Switch { from, to }),
            (Some(from), None) => Some(HoverChange::Leave(from)),
            (None, Some(to)) => Some(HoverChange::Enter(to)),
            _ => None,
        };
        match change {
            Some(HoverChange::Enter(to)) => self.pointer_enter(to),
            Some(HoverChange::Leave(from)) => self.pointer_leave(from),
            Some(HoverChange::Switch { from, to }) => {
                self.pointer_leave(from);
                self.pointer_enter(to);
            }
            None => {}
        }
        change
    }
}
