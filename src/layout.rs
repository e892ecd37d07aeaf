//! Squarified treemap partitioning and the recursive layout driver.
//! The primitive tiles the unit square; the driver scales the normalized
//! cells into the parent's absolute rectangle and recurses.

use crate::model::{NodeId, Tree};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.dx * self.dy
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.dx && y >= self.y && y < self.y + self.dy
    }
}

/// Aspect-ratio target for a canvas of the given proportions:
/// `height / width * 0.5 * (1 + sqrt(5))`.
pub fn canvas_ratio(width: f64, height: f64) -> f64 {
    height / width * 0.5 * (1.0 + 5.0_f64.sqrt())
}

/// Squarified row packing (Bruls et al.) over the unit square, with the
/// worst-aspect score weighted by a target ratio. Rows are laid along the
/// shorter side of the remaining rectangle; siblings are ordered ascending
/// by weight and consumed largest-first; the last item of a row absorbs
/// floating-point slack. No rounding.
pub struct Squarify {
    ratio: f64,
}

impl Squarify {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    /// Partitions the unit square among `weights`. Returns one rectangle
    /// per weight, in input order. Zero or non-finite weights produce
    /// degenerate cells rather than errors.
    pub fn partition(&self, weights: &[f64]) -> Vec<Rect> {
        let mut out = vec![Rect::default(); weights.len()];
        if weights.is_empty() {
            return out;
        }
        let total: f64 = weights.iter().sum();
        let mut remaining: Vec<(usize, f64)> = weights
            .iter()
            .map(|&w| w / total)
            .enumerate()
            .collect();
        remaining.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut rect = Rect {
            x: 0.0,
            y: 0.0,
            dx: 1.0,
            dy: 1.0,
        };
        let mut row: Vec<(usize, f64)> = Vec::new();
        let mut row_area = 0.0_f64;
        let mut best = f64::INFINITY;
        let mut u = rect.dx.min(rect.dy);

        while let Some(&entry) = remaining.last() {
            row.push(entry);
            row_area += entry.1;
            let score = self.worst(&row, row_area, u);
            if score <= best {
                remaining.pop();
                best = score;
            } else {
                let (_, dropped) = row.pop().unwrap();
                row_area -= dropped;
                Self::position(&row, row_area, u, &mut rect, false, &mut out);
                u = rect.dx.min(rect.dy);
                row.clear();
                row_area = 0.0;
                best = f64::INFINITY;
            }
        }
        if !row.is_empty() {
            Self::position(&row, row_area, u, &mut rect, true, &mut out);
        }
        out
    }

    /// Worst aspect ratio of the row if laid along a side of length `u`.
    fn worst(&self, row: &[(usize, f64)], row_area: f64, u: f64) -> f64 {
        let mut rmax = 0.0_f64;
        let mut rmin = f64::INFINITY;
        for &(_, area) in row {
            if area == 0.0 || area.is_nan() {
                continue;
            }
            if area < rmin {
                rmin = area;
            }
            if area > rmax {
                rmax = area;
            }
        }
        let s = row_area * row_area;
        let uu = u * u;
        if s > 0.0 {
            (uu * rmax * self.ratio / s).max(s / (uu * rmin * self.ratio))
        } else {
            f64::INFINITY
        }
    }

    /// Lays a finished row as a strip along the shorter side of the
    /// remaining rectangle and shrinks the rectangle by the strip.
    fn position(
        row: &[(usize, f64)],
        row_area: f64,
        u: f64,
        rect: &mut Rect,
        flush: bool,
        out: &mut [Rect],
    ) {
        let mut v = if u > 0.0 { row_area / u } else { 0.0 };
        if u == rect.dx {
            if flush || v > rect.dy {
                v = rect.dy;
            }
            let mut x = rect.x;
            let mut last = 0;
            for &(i, area) in row {
                let span = if v > 0.0 { area / v } else { 0.0 };
                let span = span.min(rect.x + rect.dx - x);
                out[i] = Rect {
                    x,
                    y: rect.y,
                    dx: span,
                    dy: v,
                };
                x += span;
                last = i;
            }
            out[last].dx += rect.x + rect.dx - x;
            rect.y += v;
            rect.dy -= v;
        } else {
            if flush || v > rect.dx {
                v = rect.dx;
            }
            let mut y = rect.y;
            let mut last = 0;
            for &(i, area) in row {
                let span = if v > 0.0 { area / v } else { 0.0 };
                let span = span.min(rect.y + rect.dy - y);
                out[i] = Rect {
                    x: rect.x,
                    y,
                    dx: v,
                    dy: span,
                };
                y += span;
                last = i;
            }
            out[last].dy += rect.y + rect.dy - y;
            rect.x += v;
            rect.dx -= v;
        }
    }
}

/// Assigns absolute rectangles to every descendant of `id`, whose own
/// rectangle must already be set: partition the child weights, scale each
/// normalized cell against the parent's rectangle, recurse into children
/// that have children of their own. Invoked once on the root at startup
/// and again on each subtree that becomes the drill-down target.
pub fn layout(tree: &mut Tree, id: NodeId, squarify: &Squarify) {
    let children = tree.get(id).child_ids().to_vec();
    if children.is_empty() {
        return;
    }
    let (px, py, pdx, pdy) = {
        let p = tree.get(id);
        (p.x, p.y, p.dx, p.dy)
    };
    let weights: Vec<f64> = children.iter().map(|&c| tree.get(c).value).collect();
    let cells = squarify.partition(&weights);
    for (&child, cell) in children.iter().zip(&cells) {
        let node = tree.get_mut(child);
        node.x = px + cell.x * pdx;
        node.y = py + cell.y * pdy;
        node.dx = cell.dx * pdx;
        node.dy = cell.dy * pdy;
        if !tree.get(child).is_leaf() {
            layout(tree, child, squarify);
        }
    }
}
