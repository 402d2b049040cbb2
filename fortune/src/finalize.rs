//! Turning the sweep's output into closed cells.
//!
//! When the sweep finishes, some edges still run off to infinity and others
//! poke out of the bounding box. We first connect the unbounded ones to the
//! box and clip everything to it, and then walk around the box to close off
//! the cells that touch it.

use tracing::trace;

use crate::{
    builder::DiagramBuilder,
    diagram::{EdgeIdx, Halfedge, SiteIdx, VertexIdx},
    geom::{BoundingBox, Point},
    num::{eq_eps, gt_eps, lt_eps},
    Error,
};

/// A side of the bounding box.
///
/// The order of the variants is the order in which we walk around a cell:
/// down the left side, along the bottom, up the right side and then back
/// along the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Bottom,
    Right,
    Top,
}

impl Side {
    fn next(self) -> Side {
        match self {
            Side::Left => Side::Bottom,
            Side::Bottom => Side::Right,
            Side::Right => Side::Top,
            Side::Top => Side::Left,
        }
    }

    /// The side that a border walk starting at `p` runs along, if `p` is on the
    /// box at all.
    ///
    /// Corners belong to the side that leaves them, so the bottom-left corner
    /// starts a walk along the bottom.
    fn starting_at(p: Point, bbox: &BoundingBox, eps: f64) -> Option<Side> {
        if eq_eps(p.x, bbox.xl, eps) && lt_eps(p.y, bbox.yb, eps) {
            Some(Side::Left)
        } else if eq_eps(p.y, bbox.yb, eps) && lt_eps(p.x, bbox.xr, eps) {
            Some(Side::Bottom)
        } else if eq_eps(p.x, bbox.xr, eps) && gt_eps(p.y, bbox.yt, eps) {
            Some(Side::Right)
        } else if eq_eps(p.y, bbox.yt, eps) && gt_eps(p.x, bbox.xl, eps) {
            Some(Side::Top)
        } else {
            None
        }
    }

    /// Is `p` on this side (or on the line extending it)?
    fn holds(self, p: Point, bbox: &BoundingBox, eps: f64) -> bool {
        match self {
            Side::Left => eq_eps(p.x, bbox.xl, eps),
            Side::Bottom => eq_eps(p.y, bbox.yb, eps),
            Side::Right => eq_eps(p.x, bbox.xr, eps),
            Side::Top => eq_eps(p.y, bbox.yt, eps),
        }
    }

    /// The corner at which a walk along this side ends.
    fn end_corner(self, bbox: &BoundingBox) -> Point {
        match self {
            Side::Left => Point::new(bbox.xl, bbox.yb),
            Side::Bottom => Point::new(bbox.xr, bbox.yb),
            Side::Right => Point::new(bbox.xr, bbox.yt),
            Side::Top => Point::new(bbox.xl, bbox.yt),
        }
    }
}

// The longest walk we ever need starts and ends on the same side.
const MAX_WALK: usize = 5;

impl DiagramBuilder<'_> {
    /// Gives an edge with a missing endpoint a finite extent, by running it
    /// into the bounding box.
    ///
    /// Returns `false` if the edge misses the box entirely, in which case the
    /// edge is left as it was.
    pub(crate) fn connect_edge(&mut self, idx: EdgeIdx, bbox: &BoundingBox) -> bool {
        let edge = self.edges[idx.0];
        if edge.end.is_some() {
            return true;
        }
        // unwrap: only border edges lack a right site, and they're born finished.
        let right = edge.right.unwrap();
        let l = self.site(edge.left);
        let r = self.site(right);
        self.cells[edge.left.0].needs_closing = true;
        self.cells[right.0].needs_closing = true;

        let fx = (l.x + r.x) / 2.0;
        let fy = (l.y + r.y) / 2.0;
        let BoundingBox { xl, xr, yt, yb } = *bbox;

        let endpoints = if r.y == l.y {
            // The bisector is vertical.
            if fx < xl || fx >= xr {
                return false;
            }
            if l.x > r.x {
                self.connect_from(
                    edge.start,
                    |p| p.y < yt,
                    |p| p.y >= yb,
                    Point::new(fx, yt),
                    Point::new(fx, yb),
                )
            } else {
                self.connect_from(
                    edge.start,
                    |p| p.y > yb,
                    |p| p.y < yt,
                    Point::new(fx, yb),
                    Point::new(fx, yt),
                )
            }
        } else {
            let fm = (l.x - r.x) / (r.y - l.y);
            let fb = fy - fm * fx;
            if !(-1.0..=1.0).contains(&fm) {
                // Steep: the bisector enters and leaves through the top and bottom.
                if l.x > r.x {
                    self.connect_from(
                        edge.start,
                        |p| p.y < yt,
                        |p| p.y >= yb,
                        Point::new((yt - fb) / fm, yt),
                        Point::new((yb - fb) / fm, yb),
                    )
                } else {
                    self.connect_from(
                        edge.start,
                        |p| p.y > yb,
                        |p| p.y < yt,
                        Point::new((yb - fb) / fm, yb),
                        Point::new((yt - fb) / fm, yt),
                    )
                }
            } else if l.y < r.y {
                self.connect_from(
                    edge.start,
                    |p| p.x < xl,
                    |p| p.x >= xr,
                    Point::new(xl, fm * xl + fb),
                    Point::new(xr, fm * xr + fb),
                )
            } else {
                self.connect_from(
                    edge.start,
                    |p| p.x > xr,
                    |p| p.x < xl,
                    Point::new(xr, fm * xr + fb),
                    Point::new(xl, fm * xl + fb),
                )
            }
        };

        match endpoints {
            Some((start, end)) => {
                let edge = &mut self.edges[idx.0];
                edge.start = Some(start);
                edge.end = Some(end);
                true
            }
            None => false,
        }
    }

    /// Picks the endpoints of an edge running from `entry` to `exit`.
    ///
    /// An existing `start` is kept unless it comes `before` the entry point.
    /// If it's already `past` the exit point, the edge doesn't make it into
    /// the box.
    fn connect_from(
        &mut self,
        start: Option<VertexIdx>,
        before: impl Fn(Point) -> bool,
        past: impl Fn(Point) -> bool,
        entry: Point,
        exit: Point,
    ) -> Option<(VertexIdx, VertexIdx)> {
        let start = match start {
            Some(v) if !before(self.vertex(v)) => {
                if past(self.vertex(v)) {
                    return None;
                }
                v
            }
            _ => self.create_vertex(entry),
        };
        Some((start, self.create_vertex(exit)))
    }

    /// Trims a finished edge to the bounding box.
    ///
    /// Returns `false` if nothing of the edge is inside the box.
    pub(crate) fn clip_edge(&mut self, idx: EdgeIdx, bbox: &BoundingBox) -> bool {
        let edge = self.edges[idx.0];
        let (Some(start), Some(end)) = (edge.start, edge.end) else {
            return false;
        };
        let a = self.vertex(start);
        let b = self.vertex(end);
        let dx = b.x - a.x;
        let dy = b.y - a.y;

        // Liang-Barsky: each wall is a half-plane `p * t <= q`.
        let mut t0 = 0.0;
        let mut t1 = 1.0;
        let walls = [
            (-dx, a.x - bbox.xl),
            (dx, bbox.xr - a.x),
            (-dy, a.y - bbox.yt),
            (dy, bbox.yb - a.y),
        ];
        for (p, q) in walls {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t > t1 {
                    return false;
                }
                if t > t0 {
                    t0 = t;
                }
            } else {
                if t < t0 {
                    return false;
                }
                if t < t1 {
                    t1 = t;
                }
            }
        }

        if t0 > 0.0 {
            let v = self.create_vertex(a.affine(&b, t0));
            self.edges[idx.0].start = Some(v);
        }
        if t1 < 1.0 {
            let v = self.create_vertex(a.affine(&b, t1));
            self.edges[idx.0].end = Some(v);
        }
        if t0 > 0.0 || t1 < 1.0 {
            self.cells[edge.left.0].needs_closing = true;
            if let Some(right) = edge.right {
                self.cells[right.0].needs_closing = true;
            }
        }
        true
    }

    /// Connects and clips every edge, discarding the ones that end up outside
    /// the box or shrink to a point.
    pub(crate) fn clip_edges(&mut self, bbox: &BoundingBox, eps: f64) {
        for i in 0..self.edges.len() {
            let idx = EdgeIdx(i);
            let keep = self.connect_edge(idx, bbox) && self.clip_edge(idx, bbox) && {
                let edge = &self.edges[i];
                match (edge.start, edge.end) {
                    (Some(s), Some(e)) => !self.vertex(s).coincides(&self.vertex(e), eps),
                    _ => false,
                }
            };
            if !keep {
                trace!(edge = ?idx, "discarding edge");
                let edge = &mut self.edges[i];
                edge.start = None;
                edge.end = None;
            }
        }
    }

    /// Puts every cell's half-edges in counterclockwise order, and adds border
    /// edges wherever a cell's boundary runs along the bounding box.
    pub(crate) fn close_cells(&mut self, bbox: &BoundingBox, eps: f64) -> Result<(), Error> {
        // If no edge made it into the box, the whole box belongs to one cell: the
        // one that owns its center.
        let center = bbox.center();
        let center_owner = (0..self.cells.len())
            .filter(|&i| self.cells[i].swept)
            .min_by(|&i, &j| {
                self.sites[i]
                    .dist_sq(&center)
                    .total_cmp(&self.sites[j].dist_sq(&center))
            });

        for i in 0..self.cells.len() {
            let site = SiteIdx(i);
            let mut halfedges = std::mem::take(&mut self.cells[i].halfedges);
            halfedges.retain(|h| !self.edges[h.edge.0].is_dead());
            halfedges.sort_by(|a, b| b.angle.total_cmp(&a.angle));

            if halfedges.is_empty() {
                if center_owner == Some(i) {
                    halfedges = self.whole_box(site, bbox);
                }
            } else if self.cells[i].needs_closing {
                self.close_cell(site, &mut halfedges, bbox, eps)?;
            }

            let cell = &mut self.cells[i];
            cell.halfedges = halfedges;
            cell.needs_closing = false;
        }
        Ok(())
    }

    fn whole_box(&mut self, site: SiteIdx, bbox: &BoundingBox) -> Vec<Halfedge> {
        let corners = bbox.corners().map(|c| self.create_vertex(c));
        (0..4)
            .map(|i| self.create_border_edge(site, corners[i], corners[(i + 1) % 4]))
            .collect()
    }

    fn close_cell(
        &mut self,
        site: SiteIdx,
        halfedges: &mut Vec<Halfedge>,
        bbox: &BoundingBox,
        eps: f64,
    ) -> Result<(), Error> {
        let mut i = 0;
        while i < halfedges.len() {
            let next = &halfedges[(i + 1) % halfedges.len()];
            let mut va = self
                .halfedge_end(&halfedges[i])
                .expect("dead half-edges were removed");
            let vz = self
                .halfedge_start(next)
                .expect("dead half-edges were removed");

            if !self.vertex(va).coincides(&self.vertex(vz), eps) {
                let mut side = Side::starting_at(self.vertex(va), bbox, eps)
                    .ok_or(Error::UnclosedCell(site))?;
                let z = self.vertex(vz);
                let mut closed = false;

                for _ in 0..MAX_WALK {
                    let last = side.holds(z, bbox, eps);
                    let vb = if last {
                        vz
                    } else {
                        self.create_vertex(side.end_corner(bbox))
                    };
                    i += 1;
                    halfedges.insert(i, self.create_border_edge(site, va, vb));
                    if last {
                        closed = true;
                        break;
                    }
                    va = vb;
                    side = side.next();
                }

                if !closed {
                    return Err(Error::UnclosedCell(site));
                }
            }
            i += 1;
        }
        Ok(())
    }
}
