//! The beachline: the parabolic arcs currently bordering the swept region.
//!
//! Arcs are stored left-to-right in an [`RbTree`]. Their breakpoints are never
//! stored, because they move with the sweep line; instead we recompute them
//! from the arcs' foci whenever we need to compare against them.

use crate::{
    diagram::{EdgeIdx, SiteIdx},
    geom::{breakpoint_x, Point},
    rbtree::{NodeIdx, RbTree},
};

pub type ArcIdx = NodeIdx;

/// A handle to a scheduled circle event. See [`CircleQueue`](crate::events::CircleQueue).
pub type EventIdx = NodeIdx;

/// One parabolic arc of the beachline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    /// The focus of this arc.
    pub site: SiteIdx,
    /// The circle event that will squeeze this arc out, if one is scheduled.
    pub circle: Option<EventIdx>,
    /// The edge traced out by this arc's left breakpoint.
    pub edge: Option<EdgeIdx>,
}

impl Arc {
    pub fn new(site: SiteIdx) -> Self {
        Arc {
            site,
            circle: None,
            edge: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Beachline<'a> {
    sites: &'a [Point],
    tree: RbTree<Arc>,
}

impl std::ops::Index<ArcIdx> for Beachline<'_> {
    type Output = Arc;

    fn index(&self, index: ArcIdx) -> &Arc {
        &self.tree[index]
    }
}

impl std::ops::IndexMut<ArcIdx> for Beachline<'_> {
    fn index_mut(&mut self, index: ArcIdx) -> &mut Arc {
        &mut self.tree[index]
    }
}

impl<'a> Beachline<'a> {
    pub fn new(sites: &'a [Point]) -> Self {
        Beachline {
            sites,
            tree: RbTree::new(),
        }
    }

    /// The focus of an arc.
    pub fn focus(&self, arc: ArcIdx) -> Point {
        self.sites[self[arc].site.0]
    }

    pub fn prev(&self, arc: ArcIdx) -> Option<ArcIdx> {
        self.tree.prev(arc)
    }

    pub fn next(&self, arc: ArcIdx) -> Option<ArcIdx> {
        self.tree.next(arc)
    }

    /// All arcs, left to right.
    #[cfg(test)]
    pub fn arcs(&self) -> impl Iterator<Item = ArcIdx> + '_ {
        self.tree.iter()
    }

    pub fn insert_after(&mut self, pred: Option<ArcIdx>, arc: Arc) -> ArcIdx {
        self.tree.insert_after(pred, arc)
    }

    pub fn remove(&mut self, arc: ArcIdx) -> Arc {
        self.tree.remove(arc)
    }

    /// The `x` coordinate of the left end of an arc, when the sweep line is at
    /// `directrix`.
    pub fn left_breakpoint(&self, arc: ArcIdx, directrix: f64) -> f64 {
        let focus = self.focus(arc);
        if focus.y == directrix {
            return focus.x;
        }
        match self.prev(arc) {
            None => f64::NEG_INFINITY,
            Some(prev) => {
                let left = self.focus(prev);
                if left.y == directrix {
                    return left.x;
                }
                breakpoint_x(left, focus, directrix)
            }
        }
    }

    /// The `x` coordinate of the right end of an arc, when the sweep line is at
    /// `directrix`.
    pub fn right_breakpoint(&self, arc: ArcIdx, directrix: f64) -> f64 {
        match self.next(arc) {
            Some(next) => self.left_breakpoint(next, directrix),
            None => {
                let focus = self.focus(arc);
                if focus.y == directrix {
                    focus.x
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    /// Is the left breakpoint of `arc` known exactly?
    ///
    /// This is the case when it is infinite, or when one of the two foci is on
    /// the directrix (so that its arc is still a vertical ray).
    fn exact_left_breakpoint(&self, arc: ArcIdx, directrix: f64) -> bool {
        self.focus(arc).y == directrix
            || self
                .prev(arc)
                .map_or(true, |prev| self.focus(prev).y == directrix)
    }

    /// Finds the arcs above a new site at horizontal position `x`, with the
    /// sweep line at `directrix`.
    ///
    /// Returns `(left, right)`:
    ///
    /// - if both are the same arc, `x` is strictly inside it;
    /// - if they're different arcs, `x` is on the breakpoint between them;
    /// - if only `left` is present, `x` is to the right of everything;
    /// - if only `right` is present, `x` is on the left end of the first arc;
    /// - if neither is present, the beachline is empty.
    ///
    /// Computed breakpoints within `eps` of `x` count as hits. Exact ones
    /// (see [`Beachline::exact_left_breakpoint`]) have to match exactly.
    pub fn locate(
        &self,
        x: f64,
        directrix: f64,
        eps: f64,
    ) -> (Option<ArcIdx>, Option<ArcIdx>) {
        let tolerance = |arc| {
            if self.exact_left_breakpoint(arc, directrix) {
                0.0
            } else {
                eps
            }
        };

        let mut node = self.tree.root();
        while let Some(n) = node {
            let tol_l = tolerance(n);
            let dxl = self.left_breakpoint(n, directrix) - x;
            if dxl > tol_l {
                // `x` is left of this arc.
                node = self.tree.left(n);
                if node.is_none() {
                    return (self.prev(n), Some(n));
                }
                continue;
            }

            let tol_r = self.next(n).map_or(0.0, tolerance);
            let dxr = x - self.right_breakpoint(n, directrix);
            if dxr > tol_r {
                // `x` is right of this arc.
                match self.tree.right(n) {
                    Some(right) => node = Some(right),
                    None => return (Some(n), None),
                }
            } else if dxl >= -tol_l {
                return (self.prev(n), Some(n));
            } else if dxr >= -tol_r {
                return (Some(n), self.next(n));
            } else {
                return (Some(n), Some(n));
            }
        }
        (None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::EPSILON;

    fn beachline<'a>(sites: &'a [Point], order: &[usize]) -> (Beachline<'a>, Vec<ArcIdx>) {
        let mut line = Beachline::new(sites);
        let mut last = None;
        let mut handles = Vec::new();
        for &i in order {
            let idx = line.insert_after(last, Arc::new(SiteIdx(i)));
            handles.push(idx);
            last = Some(idx);
        }
        (line, handles)
    }

    #[test]
    fn empty() {
        let sites: [Point; 0] = [];
        let line = Beachline::new(&sites);
        assert_eq!(line.locate(0.0, 0.0, EPSILON), (None, None));
    }

    #[test]
    fn single_arc() {
        let sites = [Point::new(5.0, 0.0)];
        let (line, arcs) = beachline(&sites, &[0]);
        assert_eq!(line.left_breakpoint(arcs[0], 1.0), f64::NEG_INFINITY);
        assert_eq!(line.right_breakpoint(arcs[0], 1.0), f64::INFINITY);
        assert_eq!(line.locate(3.0, 1.0, EPSILON), (Some(arcs[0]), Some(arcs[0])));

        // While the sweep line is still on the focus, the arc is a vertical ray.
        assert_eq!(line.left_breakpoint(arcs[0], 0.0), 5.0);
        assert_eq!(line.right_breakpoint(arcs[0], 0.0), 5.0);
        assert_eq!(line.locate(8.0, 0.0, EPSILON), (Some(arcs[0]), None));
        assert_eq!(line.locate(5.0, 0.0, EPSILON), (None, Some(arcs[0])));
    }

    #[test]
    fn split_arc() {
        // The arc of site 0 was split by site 1.
        let sites = [Point::new(5.0, 0.0), Point::new(5.0, 4.0)];
        let (line, arcs) = beachline(&sites, &[0, 1, 0]);
        let directrix = 8.0;

        let l = line.right_breakpoint(arcs[0], directrix);
        let r = line.left_breakpoint(arcs[2], directrix);
        assert!(l < 5.0 && r > 5.0);
        assert!((l + r - 10.0).abs() < 1e-9);

        assert_eq!(line.locate(5.0, directrix, EPSILON), (Some(arcs[1]), Some(arcs[1])));
        assert_eq!(line.locate(-100.0, directrix, EPSILON), (Some(arcs[0]), Some(arcs[0])));
        assert_eq!(line.locate(100.0, directrix, EPSILON), (Some(arcs[2]), Some(arcs[2])));
        assert_eq!(line.locate(l, directrix, EPSILON), (Some(arcs[0]), Some(arcs[1])));
        assert_eq!(line.locate(r, directrix, EPSILON), (Some(arcs[1]), Some(arcs[2])));
    }

    #[test]
    fn first_row() {
        // Sites on the first sweep row give side-by-side vertical rays.
        let sites = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let (line, arcs) = beachline(&sites, &[0, 1]);
        assert_eq!(line.locate(20.0, 0.0, EPSILON), (Some(arcs[1]), None));

        // Rays are compared exactly, so even a very close neighbor goes after.
        assert_eq!(line.locate(10.0 + 1e-12, 0.0, EPSILON), (Some(arcs[1]), None));
    }
}
