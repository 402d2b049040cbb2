//! Bounded Voronoi diagrams, computed with Fortune's sweep-line algorithm.
//!
//! Given a collection of sites and a bounding box, [`compute`] partitions the
//! box into convex cells, one per site, such that every point of a cell is at
//! least as close to that cell's site as to any other site.
//!
//! ```
//! use fortune::{compute, BoundingBox, SiteIdx};
//!
//! let bbox = BoundingBox::new(0.0, 10.0, 0.0, 10.0);
//! let diagram = compute([(2.0, 5.0), (8.0, 5.0)], bbox).unwrap();
//! assert_eq!(diagram.cells.len(), 2);
//! assert_eq!(diagram.neighbors(SiteIdx(0)), vec![SiteIdx(1)]);
//! ```
//!
//! Coordinates use screen orientation: `y` grows downwards, the "top" of a
//! [`BoundingBox`] is its smallest `y`, and "counterclockwise" means
//! counterclockwise as drawn on the screen.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

mod beachline;
mod builder;
mod diagram;
mod events;
mod finalize;
mod geom;
mod num;
mod rbtree;
mod sweep;

pub use diagram::{Cell, Diagram, Edge, EdgeIdx, Halfedge, Location, SiteIdx, VertexIdx};
pub use geom::{BoundingBox, Point};
pub use num::EPSILON;

use events::SiteQueue;
use sweep::Sweep;

/// The ways in which computing a diagram can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    #[error("no sites")]
    NoSites,
    #[error("the bounding box is empty or not finite")]
    EmptyBoundingBox,
    #[error("a site has a NaN coordinate")]
    NaN,
    #[error("a site has an infinite coordinate")]
    Infinity,
    #[error("the tolerance must be finite and positive")]
    InvalidEpsilon,
    /// Closing off a cell along the bounding box went wrong.
    ///
    /// This indicates a bug, not a problem with the input.
    #[error("failed to close the cell of site {0:?}")]
    UnclosedCell(SiteIdx),
}

/// Tuning for [`compute_with`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The tolerance used when comparing computed coordinates.
    ///
    /// Breakpoints closer than this to a new site count as hits, circle events
    /// closer than this to one another happen together, and edges shorter than
    /// this are dropped.
    pub epsilon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config { epsilon: EPSILON }
    }
}

impl Config {
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

/// Computes the Voronoi diagram of some sites, clipped to `bbox`.
///
/// `diagram.cells[i]` is the cell of the `i`th site. Exact duplicates of an
/// earlier site get an empty cell that is marked as merged into the first
/// occurrence. Cells are clipped to the box, so a site whose cell misses the
/// box entirely gets an empty cell.
pub fn compute<P: Into<Point>>(
    sites: impl IntoIterator<Item = P>,
    bbox: BoundingBox,
) -> Result<Diagram, Error> {
    compute_with(sites, bbox, &Config::default())
}

/// Like [`compute`], but with a custom configuration.
pub fn compute_with<P: Into<Point>>(
    sites: impl IntoIterator<Item = P>,
    bbox: BoundingBox,
    config: &Config,
) -> Result<Diagram, Error> {
    let sites: Vec<Point> = sites.into_iter().map(Into::into).collect();
    let _span = debug_span!("compute", sites = sites.len()).entered();
    let start = Instant::now();

    if sites.is_empty() {
        return Err(Error::NoSites);
    }
    if !bbox.is_valid() {
        return Err(Error::EmptyBoundingBox);
    }
    let eps = config.epsilon;
    check_epsilon(eps)?;
    for p in &sites {
        if p.x.is_nan() || p.y.is_nan() {
            return Err(Error::NaN);
        }
        if p.x.is_infinite() || p.y.is_infinite() {
            return Err(Error::Infinity);
        }
    }

    let queue = SiteQueue::new(&sites).ok_or(Error::NaN)?;
    let mut builder = Sweep::new(&sites, eps).run(queue);
    builder.clip_edges(&bbox, eps);
    builder.close_cells(&bbox, eps)?;
    let diagram = builder.finish(bbox);

    debug!(
        cells = diagram.cells.len(),
        edges = diagram.edges.len(),
        vertices = diagram.vertices.len(),
        elapsed = ?start.elapsed(),
        "computed diagram"
    );
    Ok(diagram)
}

/// Snaps every coordinate down to a multiple of `epsilon`.
///
/// Sites that are almost (but not exactly) on top of one another are the
/// hardest input for the sweep. Quantizing first turns them into exact
/// duplicates, which get merged.
pub fn quantize_sites(sites: &mut [Point], epsilon: f64) -> Result<(), Error> {
    check_epsilon(epsilon)?;
    for p in sites {
        p.x = (p.x / epsilon).floor() * epsilon;
        p.y = (p.y / epsilon).floor() * epsilon;
    }
    Ok(())
}

fn check_epsilon(eps: f64) -> Result<(), Error> {
    if eps.is_finite() && eps > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidEpsilon)
    }
}
