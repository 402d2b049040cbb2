//! Accumulates the pieces of a diagram while the sweep runs.
//!
//! Edges are created before we know where they end, so during the sweep (and
//! until the finalizer has done its work) everything here is allowed to be
//! partial. [`DiagramBuilder::finish`] drops whatever didn't survive and packs
//! the rest into a [`Diagram`].

use crate::{
    diagram::{Cell, Diagram, Edge, EdgeIdx, Halfedge, SiteIdx, VertexIdx},
    geom::{BoundingBox, Point},
};

/// An edge whose endpoints might not be known yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PartialEdge {
    pub left: SiteIdx,
    pub right: Option<SiteIdx>,
    pub start: Option<VertexIdx>,
    pub end: Option<VertexIdx>,
}

impl PartialEdge {
    /// Has this edge been thrown away (or never finished)?
    pub fn is_dead(&self) -> bool {
        self.start.is_none() || self.end.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PartialCell {
    pub halfedges: Vec<Halfedge>,
    /// Set when one of our edges was connected to, or clipped by, the
    /// bounding box. Such cells need border edges to be closed.
    pub needs_closing: bool,
    /// Whether the sweep inserted this cell's site into the beachline.
    pub swept: bool,
    pub merged_into: Option<SiteIdx>,
}

#[derive(Clone, Debug)]
pub(crate) struct DiagramBuilder<'a> {
    pub sites: &'a [Point],
    pub vertices: Vec<Point>,
    pub edges: Vec<PartialEdge>,
    pub cells: Vec<PartialCell>,
}

impl<'a> DiagramBuilder<'a> {
    pub fn new(sites: &'a [Point]) -> Self {
        DiagramBuilder {
            sites,
            vertices: Vec::new(),
            edges: Vec::new(),
            cells: vec![PartialCell::default(); sites.len()],
        }
    }

    pub fn site(&self, idx: SiteIdx) -> Point {
        self.sites[idx.0]
    }

    pub fn vertex(&self, idx: VertexIdx) -> Point {
        self.vertices[idx.0]
    }

    pub fn create_vertex(&mut self, p: Point) -> VertexIdx {
        self.vertices.push(p);
        VertexIdx(self.vertices.len() - 1)
    }

    /// Creates a new edge on the bisector of `left` and `right`, and gives each
    /// of the two cells a half-edge for it.
    pub fn create_edge(&mut self, left: SiteIdx, right: SiteIdx) -> EdgeIdx {
        let idx = EdgeIdx(self.edges.len());
        self.edges.push(PartialEdge {
            left,
            right: Some(right),
            start: None,
            end: None,
        });

        let l = self.site(left);
        let r = self.site(right);
        self.cells[left.0].halfedges.push(Halfedge {
            edge: idx,
            site: left,
            angle: (r.y - l.y).atan2(r.x - l.x),
        });
        self.cells[right.0].halfedges.push(Halfedge {
            edge: idx,
            site: right,
            angle: (l.y - r.y).atan2(l.x - r.x),
        });
        idx
    }

    /// Sets the first endpoint to be discovered for an edge, or the other
    /// endpoint if one is already known.
    ///
    /// `left` and `right` are the sites on either side of the edge as seen in
    /// the direction the sweep discovered it. If the edge has no vertices yet,
    /// they become the edge's orientation.
    pub fn set_edge_start(&mut self, edge: EdgeIdx, left: SiteIdx, right: SiteIdx, v: VertexIdx) {
        let edge = &mut self.edges[edge.0];
        if edge.start.is_none() && edge.end.is_none() {
            edge.start = Some(v);
            edge.left = left;
            edge.right = Some(right);
        } else if edge.left == right {
            edge.end = Some(v);
        } else {
            edge.start = Some(v);
        }
    }

    pub fn set_edge_end(&mut self, edge: EdgeIdx, left: SiteIdx, right: SiteIdx, v: VertexIdx) {
        self.set_edge_start(edge, right, left, v);
    }

    /// Creates an edge along the bounding box, running from `start` to `end` on
    /// the boundary of `site`'s cell.
    ///
    /// The caller is responsible for putting the returned half-edge into the
    /// cell, because its position in the cell matters.
    pub fn create_border_edge(
        &mut self,
        site: SiteIdx,
        start: VertexIdx,
        end: VertexIdx,
    ) -> Halfedge {
        let idx = EdgeIdx(self.edges.len());
        self.edges.push(PartialEdge {
            left: site,
            right: None,
            start: Some(start),
            end: Some(end),
        });
        let a = self.vertex(start);
        let b = self.vertex(end);
        Halfedge {
            edge: idx,
            site,
            angle: (b.x - a.x).atan2(a.y - b.y),
        }
    }

    /// The start of a half-edge, if its edge has one.
    pub fn halfedge_start(&self, h: &Halfedge) -> Option<VertexIdx> {
        let edge = &self.edges[h.edge.0];
        if edge.left == h.site {
            edge.start
        } else {
            edge.end
        }
    }

    pub fn halfedge_end(&self, h: &Halfedge) -> Option<VertexIdx> {
        let edge = &self.edges[h.edge.0];
        if edge.left == h.site {
            edge.end
        } else {
            edge.start
        }
    }

    /// Packs everything into a diagram, dropping unfinished edges and the
    /// vertices that nothing refers to.
    pub fn finish(self, bbox: BoundingBox) -> Diagram {
        let mut edge_map = vec![None; self.edges.len()];
        let mut vertex_map = vec![None; self.vertices.len()];
        let mut edges = Vec::new();

        for (old_idx, e) in self.edges.iter().enumerate() {
            if let (Some(start), Some(end)) = (e.start, e.end) {
                edge_map[old_idx] = Some(EdgeIdx(edges.len()));
                edges.push((e.left, e.right, start, end));
                vertex_map[start.0] = Some(VertexIdx(0));
                vertex_map[end.0] = Some(VertexIdx(0));
            }
        }

        // Renumber the surviving vertices, keeping their creation order.
        let mut vertices = Vec::new();
        for (old_idx, slot) in vertex_map.iter_mut().enumerate() {
            if slot.is_some() {
                *slot = Some(VertexIdx(vertices.len()));
                vertices.push(self.vertices[old_idx]);
            }
        }
        // unwrap: every endpoint of a surviving edge was marked above.
        let remap = |v: VertexIdx| vertex_map[v.0].unwrap();
        let edges = edges
            .into_iter()
            .map(|(left, right, start, end)| Edge {
                left,
                right,
                start: remap(start),
                end: remap(end),
            })
            .collect();

        let cells = self
            .cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| Cell {
                site: SiteIdx(i),
                halfedges: cell
                    .halfedges
                    .into_iter()
                    .filter_map(|h| {
                        Some(Halfedge {
                            edge: edge_map[h.edge.0]?,
                            ..h
                        })
                    })
                    .collect(),
                merged_into: cell.merged_into,
            })
            .collect();

        Diagram {
            bbox,
            sites: self.sites.to_vec(),
            cells,
            edges,
            vertices,
        }
    }
}
