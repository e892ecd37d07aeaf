//! View-side geometry: the fixed canvas frame, the treemap-to-screen
//! projection, and the per-zoom-level `Layer` the painter draws. Kept free
//! of DOM types; the actual canvas calls live in `main.rs`.

use crate::color::rate_color;
use crate::layout::Rect;
use crate::model::{NodeId, Tree};

/// Plot area in logical units; the header band sits above it.
pub const WIDTH: f64 = 1100.0;
pub const HEIGHT: f64 = 650.0;
pub const MARGIN_TOP: f64 = 50.0;

pub const LABEL_MIN_PX: f64 = 5.0;
pub const LABEL_MAX_PX: f64 = 30.0;

/// Linear mapping from treemap coordinates to the plot area for one zoom
/// target: the target's rectangle stretched over WIDTH x HEIGHT.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Viewport {
    pub fn of(tree: &Tree, id: NodeId) -> Self {
        let n = tree.get(id);
        Self {
            x: n.x,
            y: n.y,
            dx: n.dx,
            dy: n.dy,
        }
    }

    /// Screen rectangle (plot-area coordinates) of a treemap rectangle.
    pub fn project(&self, r: Rect) -> Rect {
        Rect {
            x: (r.x - self.x) / self.dx * WIDTH,
            y: (r.y - self.y) / self.dy * HEIGHT,
            dx: r.dx / self.dx * WIDTH,
            dy: r.dy / self.dy * HEIGHT,
        }
    }

    /// Inverse of `project` for a point, used for hit-testing.
    pub fn unproject(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            self.x + sx / WIDTH * self.dx,
            self.y + sy / HEIGHT * self.dy,
        )
    }
}

pub fn lerp_rect(a: Rect, b: Rect, t: f64) -> Rect {
    Rect {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
        dx: a.dx + (b.dx - a.dx) * t,
        dy: a.dy + (b.dy - a.dy) * t,
    }
}

/// One fill rectangle, at leaf granularity within the current view.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub node: NodeId,
    pub rect: Rect,
    pub color: &'static str,
}

/// One centered label (and group outline) per direct child of the view.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub node: NodeId,
    pub rect: Rect,
    pub text: String,
}

/// Everything rendered for one zoom level. `depth` orders stacked layers
/// while a transition is in flight (deeper view on top).
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub target: NodeId,
    pub depth: u32,
    pub cells: Vec<Cell>,
    pub labels: Vec<Label>,
}

/// Builds the layer for a zoom target: fills come from each direct
/// child's children when it has them, else from the child itself; labels
/// and outlines come from the direct children.
pub fn build_layer(tree: &Tree, target: NodeId) -> Layer {
    let mut cells = Vec::new();
    let mut labels = Vec::new();
    for &child in tree.get(target).child_ids() {
        let c = tree.get(child);
        let rect = node_rect(tree, child);
        labels.push(Label {
            node: child,
            rect,
            text: c.name.clone(),
        });
        if c.is_leaf() {
            cells.push(Cell {
                node: child,
                rect,
                color: rate_color(c.rate.unwrap_or(f64::NAN)),
            });
        } else {
            for &grandchild in c.child_ids() {
                let g = tree.get(grandchild);
                cells.push(Cell {
                    node: grandchild,
                    rect: node_rect(tree, grandchild),
                    color: rate_color(g.rate.unwrap_or(f64::NAN)),
                });
            }
        }
    }
    Layer {
        target,
        depth: tree.get(target).depth,
        cells,
        labels,
    }
}

fn node_rect(tree: &Tree, id: NodeId) -> Rect {
    let n = tree.get(id);
    Rect {
        x: n.x,
        y: n.y,
        dx: n.dx,
        dy: n.dy,
    }
}

/// Direct child of `target` containing the treemap-space point, if any.
pub fn child_at(tree: &Tree, target: NodeId, x: f64, y: f64) -> Option<NodeId> {
    tree.get(target)
        .child_ids()
        .iter()
        .copied()
        .find(|&c| node_rect(tree, c).contains(x, y))
}

/// Label size for a rectangle of `w` x `h` screen units: scaled down for
/// long names, clamped at LABEL_MAX_PX, suppressed (0) below LABEL_MIN_PX.
pub fn label_font_size(w: f64, h: f64, name_len: usize) -> f64 {
    let t = name_len as f64 / 1.3;
    let size = (w / t).floor().min(h / 3.0);
    if size >= LABEL_MIN_PX {
        size.min(LABEL_MAX_PX)
    } else {
        0.0
    }
}

/// Header band title for the current zoom target.
pub fn header_title(tree: &Tree, id: NodeId) -> String {
    let n = tree.get(id);
    if n.parent.is_some() {
        format!("Sector: {} (back to main menu)", n.name)
    } else {
        format!("Main Menu of {}", n.name)
    }
}
