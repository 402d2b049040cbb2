//! The sweep-line itself.
//!
//! The sweep line moves from small `y` to large `y`, stopping at every site
//! and at every point where an arc of the beachline gets squeezed out of
//! existence. Site events split arcs (or add new ones at the ends); circle
//! events remove arcs and create vertices. Edges are born when two arcs
//! first meet and get their endpoints as vertices are found.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{
    beachline::{Arc, ArcIdx, Beachline},
    builder::DiagramBuilder,
    diagram::SiteIdx,
    events::{CircleEvent, CircleQueue, SiteQueue},
    geom::{circle_event, circumcenter, Point},
};

pub(crate) struct Sweep<'a> {
    sites: &'a [Point],
    eps: f64,
    beachline: Beachline<'a>,
    circles: CircleQueue,
    out: DiagramBuilder<'a>,
}

impl<'a> Sweep<'a> {
    pub fn new(sites: &'a [Point], eps: f64) -> Self {
        Sweep {
            sites,
            eps,
            beachline: Beachline::new(sites),
            circles: CircleQueue::new(),
            out: DiagramBuilder::new(sites),
        }
    }

    /// Processes all the events, returning the (unclipped) edges that were found.
    pub fn run(mut self, mut queue: SiteQueue) -> DiagramBuilder<'a> {
        // The most recently swept site. Exact duplicates are adjacent in the
        // queue, so this is all we need to catch them.
        let mut last_swept: Option<SiteIdx> = None;

        loop {
            let circle = self.circles.first();
            let site_first = match (queue.peek(), circle) {
                (None, None) => break,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(s), Some(c)) => {
                    let p = self.sites[s.0];
                    p.y < c.y || (p.y == c.y && p.x < c.x)
                }
            };

            if site_first {
                // unwrap: we just peeked at it.
                let site = queue.pop().unwrap();
                match last_swept {
                    Some(first) if self.sites[first.0] == self.sites[site.0] => {
                        debug!(?site, into = ?first, "merging duplicate site");
                        self.out.cells[site.0].merged_into = Some(first);
                    }
                    _ => {
                        trace!(?site, p = ?self.sites[site.0], "site event");
                        self.add_site(site);
                        last_swept = Some(site);
                    }
                }
            } else if let Some(circle) = circle {
                trace!(arc = ?circle.arc, center = ?circle.center(), y = circle.y, "circle event");
                self.remove_arc(circle);
            }
        }

        self.out
    }

    fn add_site(&mut self, site: SiteIdx) {
        let p = self.sites[site.0];
        self.out.cells[site.0].swept = true;

        match self.beachline.locate(p.x, p.y, self.eps) {
            (None, None) => {
                self.beachline.insert_after(None, Arc::new(site));
            }
            (Some(a), Some(b)) if a == b => {
                // The new arc lands in the middle of an existing one, splitting it
                // in two. Both new breakpoints trace out the same edge.
                self.detach_circle_event(a);
                let old_site = self.beachline[a].site;
                let new = self.beachline.insert_after(Some(a), Arc::new(site));
                let copy = self.beachline.insert_after(Some(new), Arc::new(old_site));
                let edge = self.out.create_edge(old_site, site);
                self.beachline[new].edge = Some(edge);
                self.beachline[copy].edge = Some(edge);
                self.attach_circle_event(a);
                self.attach_circle_event(copy);
            }
            (Some(a), None) => {
                // Off the right end. This only happens while the sweep line is
                // still on the first row of sites.
                let new = self.beachline.insert_after(Some(a), Arc::new(site));
                let edge = self.out.create_edge(self.beachline[a].site, site);
                self.beachline[new].edge = Some(edge);
            }
            (None, Some(b)) => {
                self.beachline.insert_after(None, Arc::new(site));
                let edge = self.out.create_edge(site, self.beachline[b].site);
                self.beachline[b].edge = Some(edge);
            }
            (Some(a), Some(b)) => {
                // Right on a breakpoint. The breakpoint's edge ends here, and two
                // new edges start.
                self.detach_circle_event(a);
                self.detach_circle_event(b);
                let new = self.beachline.insert_after(Some(a), Arc::new(site));

                let a_site = self.beachline[a].site;
                let b_site = self.beachline[b].site;
                let center = circumcenter(self.sites[a_site.0], p, self.sites[b_site.0]);
                let old_edge = self.beachline[b]
                    .edge
                    .expect("an arc with a left neighbor has a left edge");

                // If a circle event just made this very vertex, the breakpoint's
                // edge already starts there. Reusing it leaves that edge with
                // zero length, and it gets discarded when clipping.
                let existing = &self.out.edges[old_edge.0];
                let v = existing
                    .start
                    .or(existing.end)
                    .filter(|&v| self.out.vertex(v).coincides(&center, self.eps))
                    .unwrap_or_else(|| self.out.create_vertex(center));
                self.out.set_edge_start(old_edge, a_site, b_site, v);

                let left_edge = self.out.create_edge(a_site, site);
                self.out.set_edge_end(left_edge, a_site, site, v);
                let right_edge = self.out.create_edge(site, b_site);
                self.out.set_edge_end(right_edge, site, b_site, v);
                self.beachline[new].edge = Some(left_edge);
                self.beachline[b].edge = Some(right_edge);

                self.attach_circle_event(a);
                self.attach_circle_event(b);
            }
        }
    }

    /// Handles a circle event, removing the squeezed arc along with any
    /// neighbors that vanish at the same point.
    fn remove_arc(&mut self, circle: CircleEvent) {
        let center = circle.center();
        let v = self.out.create_vertex(center);

        let mut left = self
            .beachline
            .prev(circle.arc)
            .expect("a squeezed arc has two neighbors");
        let mut right = self
            .beachline
            .next(circle.arc)
            .expect("a squeezed arc has two neighbors");

        // All the arcs that meet at `v`, from left to right. The outer two
        // survive; everything in between disappears.
        let mut meeting = VecDeque::new();
        meeting.push_back(self.detach_arc(circle.arc));

        while self.vanishes_at(left, center) {
            let prev = self
                .beachline
                .prev(left)
                .expect("a squeezed arc has two neighbors");
            debug!(arc = ?left, "removing coincident arc");
            meeting.push_front(self.detach_arc(left));
            left = prev;
        }
        self.detach_circle_event(left);
        meeting.push_front(self.beachline[left]);

        while self.vanishes_at(right, center) {
            let next = self
                .beachline
                .next(right)
                .expect("a squeezed arc has two neighbors");
            debug!(arc = ?right, "removing coincident arc");
            meeting.push_back(self.detach_arc(right));
            right = next;
        }
        self.detach_circle_event(right);
        meeting.push_back(self.beachline[right]);

        // Every breakpoint between two of the meeting arcs ends here.
        for (l, r) in meeting.iter().zip(meeting.iter().skip(1)) {
            let edge = r.edge.expect("an arc with a left neighbor has a left edge");
            self.out.set_edge_start(edge, l.site, r.site, v);
        }

        // ...and one new one begins, between the two survivors.
        let left_site = self.beachline[left].site;
        let right_site = self.beachline[right].site;
        let edge = self.out.create_edge(left_site, right_site);
        self.out.set_edge_end(edge, left_site, right_site, v);
        self.beachline[right].edge = Some(edge);

        self.attach_circle_event(left);
        self.attach_circle_event(right);
    }

    /// Does `arc` have a circle event centered at `center`?
    fn vanishes_at(&self, arc: ArcIdx, center: Point) -> bool {
        self.beachline[arc]
            .circle
            .is_some_and(|ev| self.circles[ev].center().coincides(&center, self.eps))
    }

    fn detach_arc(&mut self, arc: ArcIdx) -> Arc {
        self.detach_circle_event(arc);
        self.beachline.remove(arc)
    }

    /// Schedules the disappearance of `arc`, if its neighbors are converging on it.
    fn attach_circle_event(&mut self, arc: ArcIdx) {
        let (Some(l), Some(r)) = (self.beachline.prev(arc), self.beachline.next(arc)) else {
            return;
        };
        let site = self.beachline[arc].site;
        let l_site = self.beachline[l].site;
        let r_site = self.beachline[r].site;
        // Two pieces of the same arc never converge.
        if l_site == r_site {
            return;
        }

        let Some(circle) = circle_event(
            self.sites[l_site.0],
            self.sites[site.0],
            self.sites[r_site.0],
        ) else {
            return;
        };
        let idx = self.circles.insert(CircleEvent {
            arc,
            site,
            x: circle.center.x,
            y: circle.bottom(),
            y_center: circle.center.y,
        });
        self.beachline[arc].circle = Some(idx);
    }

    fn detach_circle_event(&mut self, arc: ArcIdx) {
        if let Some(ev) = self.beachline[arc].circle.take() {
            self.circles.remove(ev);
        }
    }

    /// The sites of the arcs on the beachline, from left to right.
    #[cfg(test)]
    fn beachline_sites(&self) -> Vec<usize> {
        self.beachline
            .arcs()
            .map(|a| self.beachline[a].site.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diagram::VertexIdx, num::EPSILON};

    fn sweep(sites: &[Point]) -> DiagramBuilder<'_> {
        let queue = SiteQueue::new(sites).unwrap();
        Sweep::new(sites, EPSILON).run(queue)
    }

    #[test]
    fn split_then_squeeze() {
        let sites = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 8.66),
        ];
        let out = sweep(&sites);

        // The vertex is found right away, because the third site lands on the
        // breakpoint between the first two.
        assert_eq!(out.edges.len(), 3);
        let v = out.vertices[0];
        assert!((v.x - 5.0).abs() < 1e-9);
        assert!((v.y - 2.886_582).abs() < 1e-5);
        for e in &out.edges {
            assert!(e.start.is_some() || e.end.is_some());
        }
    }

    #[test]
    fn circle_event_makes_vertex() {
        let sites = [
            Point::new(5.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 6.0),
        ];
        let out = sweep(&sites);
        assert_eq!(out.vertices.len(), 1);
        let v = out.vertices[0];
        // The vertex is equidistant from all three sites.
        let d0 = v.dist_sq(&sites[0]);
        assert!((v.dist_sq(&sites[1]) - d0).abs() < 1e-9);
        assert!((v.dist_sq(&sites[2]) - d0).abs() < 1e-9);
        // Each pair of sites got an edge, and each edge has the vertex at one end.
        assert_eq!(out.edges.len(), 3);
        for e in &out.edges {
            assert!(e.start.is_some() != e.end.is_some());
        }
    }

    #[test]
    fn duplicates_are_merged() {
        let sites = [
            Point::new(3.0, 3.0),
            Point::new(1.0, 1.0),
            Point::new(3.0, 3.0),
        ];
        let out = sweep(&sites);
        assert_eq!(out.cells[2].merged_into, Some(SiteIdx(0)));
        assert!(!out.cells[2].swept);
        assert_eq!(out.edges.len(), 1);
    }

    #[test]
    fn site_on_a_fresh_vertex() {
        // The circle through the first three sites bottoms out exactly on the
        // fourth, so the fourth site lands on the vertex that was just made.
        let sites = [
            Point::new(4.0, 5.0),
            Point::new(8.0, 8.0),
            Point::new(4.0, 8.0),
            Point::new(6.0, 9.0),
        ];
        let out = sweep(&sites);
        assert_eq!(out.vertices, vec![Point::new(6.0, 6.5)]);
        // The breakpoint that the fourth site hit has shrunk to a point.
        assert!(out
            .edges
            .iter()
            .any(|e| e.start == Some(VertexIdx(0)) && e.end == Some(VertexIdx(0))));
    }

    #[test]
    fn beachline_after_a_split() {
        let sites = [Point::new(5.0, 0.0), Point::new(5.0, 4.0)];
        let mut sweep = Sweep::new(&sites, EPSILON);
        sweep.add_site(SiteIdx(0));
        sweep.add_site(SiteIdx(1));
        assert_eq!(sweep.beachline_sites(), vec![0, 1, 0]);
        // The two halves of the same arc can't squeeze the new one.
        assert_eq!(sweep.circles.first(), None);
    }
}
