//! The finished, immutable Voronoi diagram.

use serde::{Deserialize, Serialize};

use crate::geom::{BoundingBox, Point};

/// An index into the input sites.
///
/// Cells are indexed by the same value: `diagram.cells[i]` is the cell of the
/// `i`th input site.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteIdx(pub usize);

impl std::fmt::Debug for SiteIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s_{}", self.0)
    }
}

/// An index into [`Diagram::vertices`].
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexIdx(pub usize);

impl std::fmt::Debug for VertexIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v_{}", self.0)
    }
}

/// An index into [`Diagram::edges`].
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeIdx(pub usize);

impl std::fmt::Debug for EdgeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e_{}", self.0)
    }
}

/// A segment of the diagram.
///
/// Most edges lie on the perpendicular bisector of `left` and `right`. Edges
/// with no `right` site are border edges, running along the bounding box on
/// the boundary of `left`'s cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub left: SiteIdx,
    pub right: Option<SiteIdx>,
    pub start: VertexIdx,
    pub end: VertexIdx,
}

impl Edge {
    pub fn is_border(&self) -> bool {
        self.right.is_none()
    }
}

/// One side of an [`Edge`], as seen from one of the cells it bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Halfedge {
    pub edge: EdgeIdx,
    /// The site whose cell this half-edge belongs to.
    pub site: SiteIdx,
    /// The sort key for half-edges around a cell.
    ///
    /// For a bisector this is the direction from `site` towards the site on
    /// the other side. For a border edge it is the edge's outward normal.
    pub angle: f64,
}

/// The region of the bounding box closest to one site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub site: SiteIdx,
    /// The boundary, in counterclockwise order. Each half-edge ends where the
    /// next one starts.
    pub halfedges: Vec<Halfedge>,
    /// If this site was an exact duplicate of an earlier one, the site that
    /// owns the cell. Merged cells have no half-edges.
    pub merged_into: Option<SiteIdx>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.halfedges.is_empty()
    }
}

/// Where a point sits relative to a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Inside,
    OnBoundary,
    Outside,
}

/// A Voronoi diagram clipped to a bounding box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub bbox: BoundingBox,
    pub sites: Vec<Point>,
    pub cells: Vec<Cell>,
    pub edges: Vec<Edge>,
    pub vertices: Vec<Point>,
}

impl Diagram {
    pub fn cell(&self, site: SiteIdx) -> &Cell {
        &self.cells[site.0]
    }

    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx.0]
    }

    pub fn vertex(&self, idx: VertexIdx) -> Point {
        self.vertices[idx.0]
    }

    /// The vertex a half-edge starts at, going counterclockwise around its cell.
    pub fn halfedge_start(&self, halfedge: &Halfedge) -> VertexIdx {
        let edge = self.edge(halfedge.edge);
        if edge.left == halfedge.site {
            edge.start
        } else {
            edge.end
        }
    }

    pub fn halfedge_end(&self, halfedge: &Halfedge) -> VertexIdx {
        let edge = self.edge(halfedge.edge);
        if edge.left == halfedge.site {
            edge.end
        } else {
            edge.start
        }
    }

    /// The corners of a cell, in counterclockwise order.
    ///
    /// Empty cells (like the ones of merged duplicates, or of sites whose cells
    /// miss the bounding box) give an empty polygon.
    pub fn polygon(&self, site: SiteIdx) -> Vec<Point> {
        self.cell(site)
            .halfedges
            .iter()
            .map(|h| self.vertex(self.halfedge_start(h)))
            .collect()
    }

    /// The sites whose cells share an edge with this one.
    pub fn neighbors(&self, site: SiteIdx) -> Vec<SiteIdx> {
        self.cell(site)
            .halfedges
            .iter()
            .filter_map(|h| {
                let edge = self.edge(h.edge);
                if edge.left != site {
                    Some(edge.left)
                } else {
                    edge.right
                }
            })
            .collect()
    }

    /// The smallest axis-aligned box containing a cell, or `None` if the cell
    /// is empty.
    pub fn cell_bounds(&self, site: SiteIdx) -> Option<BoundingBox> {
        let polygon = self.polygon(site);
        let first = polygon.first()?;
        let mut bounds = BoundingBox::new(first.x, first.x, first.y, first.y);
        for p in &polygon[1..] {
            bounds.xl = bounds.xl.min(p.x);
            bounds.xr = bounds.xr.max(p.x);
            bounds.yt = bounds.yt.min(p.y);
            bounds.yb = bounds.yb.max(p.y);
        }
        Some(bounds)
    }

    /// Classifies `p` against the polygon of `site`'s cell.
    ///
    /// This is an exact test against the stored vertices, so points within
    /// rounding error of an edge can land on either side of it.
    pub fn locate(&self, site: SiteIdx, p: Point) -> Location {
        let cell = self.cell(site);
        if cell.is_empty() {
            return Location::Outside;
        }
        for h in &cell.halfedges {
            let p0 = self.vertex(self.halfedge_start(h));
            let p1 = self.vertex(self.halfedge_end(h));
            let r = (p.y - p0.y) * (p1.x - p0.x) - (p.x - p0.x) * (p1.y - p0.y);
            if r == 0.0 {
                return Location::OnBoundary;
            }
            if r > 0.0 {
                return Location::Outside;
            }
        }
        Location::Inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two cells splitting the box [0, 10] x [0, 10] down the middle.
    fn halves() -> Diagram {
        let v = |x, y| Point::new(x, y);
        let h = |edge, site, angle| Halfedge {
            edge: EdgeIdx(edge),
            site: SiteIdx(site),
            angle,
        };
        let e = |left, right: Option<usize>, start, end| Edge {
            left: SiteIdx(left),
            right: right.map(SiteIdx),
            start: VertexIdx(start),
            end: VertexIdx(end),
        };
        let pi = std::f64::consts::PI;
        Diagram {
            bbox: BoundingBox::new(0.0, 10.0, 0.0, 10.0),
            sites: vec![v(2.0, 5.0), v(8.0, 5.0)],
            vertices: vec![
                v(5.0, 10.0),
                v(5.0, 0.0),
                v(0.0, 0.0),
                v(0.0, 10.0),
                v(10.0, 10.0),
                v(10.0, 0.0),
            ],
            edges: vec![
                e(0, Some(1), 0, 1),
                e(0, None, 1, 2),
                e(0, None, 2, 3),
                e(0, None, 3, 0),
                e(1, None, 0, 4),
                e(1, None, 4, 5),
                e(1, None, 5, 1),
            ],
            cells: vec![
                Cell {
                    site: SiteIdx(0),
                    halfedges: vec![h(0, 0, 0.0), h(1, 0, -pi / 2.0), h(2, 0, pi), h(3, 0, pi / 2.0)],
                    merged_into: None,
                },
                Cell {
                    site: SiteIdx(1),
                    halfedges: vec![h(0, 1, pi), h(4, 1, pi / 2.0), h(5, 1, 0.0), h(6, 1, -pi / 2.0)],
                    merged_into: None,
                },
            ],
        }
    }

    #[test]
    fn polygon_follows_halfedges() {
        let d = halves();
        assert_eq!(
            d.polygon(SiteIdx(0)),
            vec![
                Point::new(5.0, 10.0),
                Point::new(5.0, 0.0),
                Point::new(0.0, 0.0),
                Point::new(0.0, 10.0)
            ]
        );
        // The shared edge is traversed backwards by the right cell.
        let shared = d.cell(SiteIdx(1)).halfedges[0];
        assert_eq!(d.halfedge_start(&shared), VertexIdx(1));
        assert_eq!(d.halfedge_end(&shared), VertexIdx(0));
    }

    #[test]
    fn neighbors_skip_border_edges() {
        let d = halves();
        assert_eq!(d.neighbors(SiteIdx(0)), vec![SiteIdx(1)]);
        assert_eq!(d.neighbors(SiteIdx(1)), vec![SiteIdx(0)]);
    }

    #[test]
    fn bounds_and_locate() {
        let d = halves();
        assert_eq!(
            d.cell_bounds(SiteIdx(1)),
            Some(BoundingBox::new(5.0, 10.0, 0.0, 10.0))
        );

        assert_eq!(d.locate(SiteIdx(0), Point::new(2.0, 5.0)), Location::Inside);
        assert_eq!(d.locate(SiteIdx(0), Point::new(5.0, 5.0)), Location::OnBoundary);
        assert_eq!(d.locate(SiteIdx(0), Point::new(8.0, 5.0)), Location::Outside);
        assert_eq!(d.locate(SiteIdx(1), Point::new(8.0, 5.0)), Location::Inside);
    }

    #[test]
    fn empty_cells() {
        let mut d = halves();
        d.cells[1].halfedges.clear();
        assert!(d.polygon(SiteIdx(1)).is_empty());
        assert_eq!(d.cell_bounds(SiteIdx(1)), None);
        assert_eq!(d.locate(SiteIdx(1), Point::new(8.0, 5.0)), Location::Outside);
    }
}
