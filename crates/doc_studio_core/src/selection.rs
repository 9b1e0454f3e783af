//! Selection tracking for editable regions.
//!
//! The rendering layer reports each selection as a `SelectionEvent` (the
//! selected string plus the bounding rectangle of its range). The tracker
//! turns that into a `SelectionContext` with the floating menu's anchor.

use serde::{Deserialize, Serialize};

use crate::domain::RegionId;

/// How far above the selection's top edge the menu anchor sits.
pub const ANCHOR_OFFSET: f64 = 10.0;

/// A rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

/// Horizontal centre of the range, slightly above its top edge.
pub fn compute_anchor(rect: &Rect) -> Anchor {
    Anchor {
        x: rect.left + rect.width / 2.0,
        y: rect.top - ANCHOR_OFFSET,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub text: String,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionContext {
    pub selected_text: String,
    pub anchor: Anchor,
    pub region: RegionId,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Option<SelectionContext>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a selection made inside `region`. A blank selection hides the menu.
    pub fn on_selection(&mut self, event: &SelectionEvent, region: RegionId) -> Option<&SelectionContext> {
        let text = event.text.trim();
        if text.is_empty() {
            self.current = None;
            return None;
        }
        self.current = Some(SelectionContext {
            selected_text: text.to_string(),
            anchor: compute_anchor(&event.bounds),
            region,
        });
        self.current.as_ref()
    }

    /// A click landed outside every editable region (and outside the menu).
    pub fn on_outside_click(&mut self) {
        self.current = None;
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn context(&self) -> Option<&SelectionContext> {
        self.current.as_ref()
    }

    pub fn is_menu_visible(&self) -> bool {
        self.current.is_some()
    }
}
