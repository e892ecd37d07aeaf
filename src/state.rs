//! Interaction state for the heatmap view, mutated from the canvas event
//! closures through an `Rc<RefCell<_>>` handle.

use crate::layout::{self, Squarify, canvas_ratio};
use crate::model::{NodeId, Tree};
use crate::render::{self, HEIGHT, Layer, MARGIN_TOP, Viewport, WIDTH, build_layer};
use crate::transition::TransitionController;

/// What a canvas coordinate points at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hit {
    Header,
    Child(NodeId),
    Background,
}

pub struct HeatmapState {
    pub tree: Tree,
    /// Current zoom root.
    pub target: NodeId,
    pub layer: Layer,
    pub viewport: Viewport,
    /// Outgoing layer, kept only while a transition is in flight.
    pub old_layer: Option<Layer>,
    pub old_viewport: Viewport,
    pub transition: TransitionController,
    squarify: Squarify,
}

impl HeatmapState {
    pub fn new(mut tree: Tree) -> Self {
        let root = tree.get_mut(Tree::ROOT);
        root.x = 0.0;
        root.y = 0.0;
        root.dx = WIDTH;
        root.dy = HEIGHT;
        let squarify = Squarify::new(canvas_ratio(WIDTH, HEIGHT));
        layout::layout(&mut tree, Tree::ROOT, &squarify);
        let layer = build_layer(&tree, Tree::ROOT);
        let viewport = Viewport::of(&tree, Tree::ROOT);
        Self {
            tree,
            target: Tree::ROOT,
            layer,
            viewport,
            old_layer: None,
            old_viewport: viewport,
            transition: TransitionController::new(),
            squarify,
        }
    }

    pub fn hit_test(&self, sx: f64, sy: f64) -> Hit {
        if sy < MARGIN_TOP {
            return Hit::Header;
        }
        let (x, y) = self.viewport.unproject(sx, sy - MARGIN_TOP);
        match render::child_at(&self.tree, self.target, x, y) {
            Some(c) => Hit::Child(c),
            None => Hit::Background,
        }
    }

    /// Routes a canvas click: header zooms to the parent, a child with
    /// children of its own zooms in, anything else carries no target. The
    /// controller drops every click while an animation is in flight.
    pub fn click(&mut self, sx: f64, sy: f64) {
        let target = match self.hit_test(sx, sy) {
            Hit::Header => self.tree.get(self.target).parent,
            Hit::Child(c) if !self.tree.get(c).is_leaf() => Some(c),
            _ => None,
        };
        self.zoom_to(target);
    }

    /// Node the tooltip should describe for a hover position, if any.
    /// Suppressed while animating and at the top-level view.
    pub fn hover(&self, sx: f64, sy: f64) -> Option<NodeId> {
        if self.transition.is_transitioning() || self.target == Tree::ROOT {
            return None;
        }
        match self.hit_test(sx, sy) {
            Hit::Child(c) => Some(c),
            _ => None,
        }
    }

    fn zoom_to(&mut self, target: Option<NodeId>) {
        let Some(to) = self.transition.request(target) else {
            return;
        };
        // lazy per-drill-down layout of the subtree that becomes visible
        layout::layout(&mut self.tree, to, &self.squarify);
        let new_layer = build_layer(&self.tree, to);
        self.old_layer = Some(std::mem::replace(&mut self.layer, new_layer));
        self.old_viewport = self.viewport;
        self.viewport = Viewport::of(&self.tree, to);
        self.target = to;
    }

    /// Advances the animation clock; the outgoing layer is removed on the
    /// tick that settles the transition.
    pub fn advance(&mut self, dt_ms: f64) {
        if self.transition.tick(dt_ms) {
            self.old_layer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Rect;
    use crate::model::RawNode;
    use crate::transition::DURATION_MS;

    fn state() -> HeatmapState {
        let json = r#"{
            "name": "Mercado",
            "rate": 0.87,
            "children": [
                { "name": "TECNOLOGIA", "children": [
                    { "name": "LUAN1", "value": 600.84, "rate": -2.31 },
                    { "name": "LUAN2", "value": 399.16, "rate": 2.31 }
                ] },
                { "name": "ENERGIA", "children": [
                    { "name": "PETRA", "value": 1500.0, "rate": 0.4 }
                ] },
                { "name": "CAIXA", "value": 300.0, "rate": 0.0 }
            ]
        }"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        HeatmapState::new(Tree::from_raw(&raw))
    }

    fn screen_center(st: &HeatmapState, id: NodeId) -> (f64, f64) {
        let n = st.tree.get(id);
        let r = st.viewport.project(Rect {
            x: n.x,
            y: n.y,
            dx: n.dx,
            dy: n.dy,
        });
        (r.x + r.dx / 2.0, MARGIN_TOP + r.y + r.dy / 2.0)
    }

    #[test]
    fn click_on_drillable_child_starts_transition_and_settles() {
        let mut st = state();
        let sector = st.tree.get(Tree::ROOT).child_ids()[0];
        let (sx, sy) = screen_center(&st, sector);
        st.click(sx, sy);
        assert!(st.transition.is_transitioning());
        assert_eq!(st.target, sector);
        assert!(st.old_layer.is_some());

        st.advance(DURATION_MS + 1.0);
        assert!(!st.transition.is_transitioning());
        assert!(st.old_layer.is_none());
        assert_eq!(st.target, sector);
        assert_eq!(st.layer.target, sector);
    }

    #[test]
    fn clicks_mid_transition_are_dropped() {
        let mut st = state();
        let sector = st.tree.get(Tree::ROOT).child_ids()[0];
        let other = st.tree.get(Tree::ROOT).child_ids()[1];
        let (sx, sy) = screen_center(&st, sector);
        st.click(sx, sy);
        assert_eq!(st.target, sector);

        let (ox, oy) = screen_center(&st, other);
        st.click(ox, oy);
        st.click(10.0, 10.0); // header
        assert_eq!(st.target, sector);
        assert!(st.transition.is_transitioning());
    }

    #[test]
    fn header_click_zooms_to_parent_and_is_a_no_op_at_root() {
        let mut st = state();
        let sector = st.tree.get(Tree::ROOT).child_ids()[0];
        let (sx, sy) = screen_center(&st, sector);
        st.click(sx, sy);
        st.advance(DURATION_MS + 1.0);

        st.click(10.0, MARGIN_TOP / 2.0);
        assert!(st.transition.is_transitioning());
        assert_eq!(st.target, Tree::ROOT);
        st.advance(DURATION_MS + 1.0);

        // at the true root the header has no parent to go to
        st.click(10.0, MARGIN_TOP / 2.0);
        assert!(!st.transition.is_transitioning());
        assert_eq!(st.target, Tree::ROOT);
    }

    #[test]
    fn leaf_click_is_a_no_op() {
        let mut st = state();
        let leaf = st.tree.get(Tree::ROOT).child_ids()[2];
        assert!(st.tree.get(leaf).is_leaf());
        let (sx, sy) = screen_center(&st, leaf);
        st.click(sx, sy);
        assert!(!st.transition.is_transitioning());
        assert_eq!(st.target, Tree::ROOT);
    }

    #[test]
    fn hover_is_suppressed_at_root_and_while_animating() {
        let mut st = state();
        let sector = st.tree.get(Tree::ROOT).child_ids()[0];
        let (sx, sy) = screen_center(&st, sector);
        assert_eq!(st.hover(sx, sy), None);

        st.click(sx, sy);
        assert_eq!(st.hover(sx, sy), None); // animating
        st.advance(DURATION_MS + 1.0);

        let leaf = st.tree.get(sector).child_ids()[0];
        let (lx, ly) = screen_center(&st, leaf);
        assert_eq!(st.hover(lx, ly), Some(leaf));
        assert_eq!(st.hover(10.0, MARGIN_TOP / 2.0), None);
    }

    #[test]
    fn drilled_layer_shows_the_sector_leaves() {
        let mut st = state();
        let sector = st.tree.get(Tree::ROOT).child_ids()[0];
        let (sx, sy) = screen_center(&st, sector);
        st.click(sx, sy);
        st.advance(DURATION_MS + 1.0);

        assert_eq!(st.layer.cells.len(), 2);
        assert_eq!(st.layer.labels.len(), 2);
        assert_eq!(st.layer.depth, 1);
        // the new viewport stretches the sector over the whole plot area
        let r = st.viewport.project(Rect {
            x: st.tree.get(sector).x,
            y: st.tree.get(sector).y,
            dx: st.tree.get(sector).dx,
            dy: st.tree.get(sector).dy,
        });
        assert!((r.dx - WIDTH).abs() < 1e-9);
        assert!((r.dy - HEIGHT).abs() < 1e-9);
    }
}
