//! The two event queues driving the sweep.

use ordered_float::NotNan;

use crate::{
    beachline::{ArcIdx, EventIdx},
    diagram::SiteIdx,
    geom::Point,
    rbtree::RbTree,
};

/// The sweep-line ordering of a site: by `y`, and then by `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SiteKey {
    pub y: NotNan<f64>,
    pub x: NotNan<f64>,
}

impl SiteKey {
    /// Returns `None` if either coordinate is NaN.
    pub fn new(p: Point) -> Option<Self> {
        Some(SiteKey {
            y: NotNan::new(p.y).ok()?,
            x: NotNan::new(p.x).ok()?,
        })
    }
}

/// All site events, known up front.
///
/// They're kept sorted in reverse sweep order so that the next one can be
/// popped off the end.
#[derive(Clone, Debug)]
pub struct SiteQueue {
    sites: Vec<(SiteKey, SiteIdx)>,
}

impl SiteQueue {
    /// Builds the queue, or returns `None` if one of the sites has a NaN
    /// coordinate.
    pub fn new(sites: &[Point]) -> Option<Self> {
        let mut keyed = sites
            .iter()
            .enumerate()
            .map(|(i, p)| Some((SiteKey::new(*p)?, SiteIdx(i))))
            .collect::<Option<Vec<_>>>()?;
        keyed.sort_unstable_by(|a, b| b.cmp(a));
        Some(SiteQueue { sites: keyed })
    }

    pub fn peek(&self) -> Option<SiteIdx> {
        self.sites.last().map(|(_, idx)| *idx)
    }

    pub fn pop(&mut self) -> Option<SiteIdx> {
        self.sites.pop().map(|(_, idx)| idx)
    }
}

/// A scheduled disappearance of an arc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleEvent {
    /// The arc that gets squeezed out.
    pub arc: ArcIdx,
    /// The focus of `arc`.
    pub site: SiteIdx,
    pub x: f64,
    /// The sweep position at which this event happens: the bottom of the circle.
    pub y: f64,
    /// The `y` coordinate of the circle's center, where the new vertex goes.
    pub y_center: f64,
}

impl CircleEvent {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y_center)
    }
}

/// Pending circle events, ordered by `y` and then by `x`.
///
/// Unlike site events, these come and go during the sweep. The smallest event
/// is cached, since the sweep asks for it every iteration.
#[derive(Clone, Debug, Default)]
pub struct CircleQueue {
    tree: RbTree<CircleEvent>,
    first: Option<EventIdx>,
}

impl std::ops::Index<EventIdx> for CircleQueue {
    type Output = CircleEvent;

    fn index(&self, index: EventIdx) -> &CircleEvent {
        &self.tree[index]
    }
}

impl CircleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first(&self) -> Option<CircleEvent> {
        self.first.map(|idx| self.tree[idx])
    }

    #[cfg(test)]
    pub fn first_idx(&self) -> Option<EventIdx> {
        self.first
    }

    /// Schedules an event. A new event goes before any existing event at the
    /// same position.
    pub fn insert(&mut self, ev: CircleEvent) -> EventIdx {
        let mut pred = None;
        let mut node = self.tree.root();
        while let Some(n) = node {
            let other = &self.tree[n];
            if ev.y < other.y || (ev.y == other.y && ev.x <= other.x) {
                match self.tree.left(n) {
                    Some(left) => node = Some(left),
                    None => {
                        pred = self.tree.prev(n);
                        break;
                    }
                }
            } else {
                match self.tree.right(n) {
                    Some(right) => node = Some(right),
                    None => {
                        pred = Some(n);
                        break;
                    }
                }
            }
        }

        let idx = self.tree.insert_after(pred, ev);
        if pred.is_none() {
            self.first = Some(idx);
        }
        idx
    }

    pub fn remove(&mut self, idx: EventIdx) -> CircleEvent {
        if self.tree.prev(idx).is_none() {
            self.first = self.tree.next(idx);
        }
        self.tree.remove(idx)
    }

    /// All pending events, earliest first.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &CircleEvent> + '_ {
        self.tree.iter().map(|idx| &self.tree[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sites_pop_in_sweep_order() {
        let sites = [
            Point::new(3.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(5.0, -1.0),
            Point::new(1.0, 1.0),
        ];
        let mut queue = SiteQueue::new(&sites).unwrap();
        assert_eq!(queue.peek(), Some(SiteIdx(3)));
        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(
            order,
            vec![SiteIdx(3), SiteIdx(1), SiteIdx(4), SiteIdx(0), SiteIdx(2)]
        );
        assert_eq!(queue.peek(), None);

        assert!(SiteQueue::new(&[Point::new(f64::NAN, 0.0)]).is_none());
    }

    // Arc handles only matter to the sweep, so any handle will do here.
    fn dummy_arc() -> ArcIdx {
        let mut tree = RbTree::new();
        tree.insert_after(None, ())
    }

    fn event(x: f64, y: f64) -> CircleEvent {
        CircleEvent {
            arc: dummy_arc(),
            site: SiteIdx(0),
            x,
            y,
            y_center: y - 1.0,
        }
    }

    #[test]
    fn circle_queue_tracks_first() {
        let mut queue = CircleQueue::new();
        assert_eq!(queue.first(), None);

        let a = queue.insert(event(0.0, 5.0));
        let b = queue.insert(event(1.0, 3.0));
        let c = queue.insert(event(-1.0, 3.0));
        assert_eq!(queue.first_idx(), Some(c));

        // Ties on both coordinates: the newcomer goes first.
        let d = queue.insert(event(-1.0, 3.0));
        assert_eq!(queue.first_idx(), Some(d));

        queue.remove(d);
        assert_eq!(queue.first_idx(), Some(c));
        queue.remove(b);
        assert_eq!(queue.first_idx(), Some(c));
        queue.remove(c);
        assert_eq!(queue.first_idx(), Some(a));
        queue.remove(a);
        assert_eq!(queue.first(), None);
    }

    proptest! {
        #[test]
        fn circle_queue_is_sorted(
            coords in prop::collection::vec((0..10u8, 0..10u8), 1..50),
            removals in prop::collection::vec(any::<prop::sample::Index>(), 0..25),
        ) {
            let mut queue = CircleQueue::new();
            let mut live: Vec<EventIdx> = coords
                .iter()
                .map(|&(x, y)| queue.insert(event(f64::from(x), f64::from(y))))
                .collect();
            for r in removals {
                if live.is_empty() {
                    break;
                }
                let idx = live.swap_remove(r.index(live.len()));
                queue.remove(idx);
            }

            let events: Vec<_> = queue.iter().map(|ev| (ev.y, ev.x)).collect();
            prop_assert_eq!(events.len(), live.len());
            for pair in events.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            prop_assert_eq!(queue.first().map(|ev| (ev.y, ev.x)), events.first().copied());
        }
    }
}
