use serde::{Deserialize, Serialize};

use crate::num::eq_eps;

/// Anything at least this close to zero (on the negative side) counts as a
/// non-converging triple in [`circle_event`].
const CONVERGENCE_THRESHOLD: f64 = -2e-12;

/// A point in the plane.
///
/// The crate uses screen orientation throughout: `y` grows downwards, so the
/// sweep line moves "down" from small `y` to large `y`.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn dist_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Do both coordinates agree to within `eps`?
    pub fn coincides(&self, other: &Point, eps: f64) -> bool {
        eq_eps(self.x, other.x, eps) && eq_eps(self.y, other.y, eps)
    }

    /// The point at parameter `t` on the segment from `self` to `other`.
    pub fn affine(&self, other: &Self, t: f64) -> Self {
        Point {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for robust::Coord<f64> {
    fn from(p: Point) -> Self {
        robust::Coord { x: p.x, y: p.y }
    }
}

/// An axis-aligned rectangle.
///
/// `xl`/`xr` are the left and right walls, `yt`/`yb` the top and bottom
/// walls. Because `y` grows downwards, a valid box has `xl < xr` and `yt < yb`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xl: f64,
    pub xr: f64,
    pub yt: f64,
    pub yb: f64,
}

impl BoundingBox {
    pub fn new(xl: f64, xr: f64, yt: f64, yb: f64) -> Self {
        BoundingBox { xl, xr, yt, yb }
    }

    /// Does this box have finite, strictly positive extent?
    pub fn is_valid(&self) -> bool {
        [self.xl, self.xr, self.yt, self.yb]
            .iter()
            .all(|v| v.is_finite())
            && self.xl < self.xr
            && self.yt < self.yb
    }

    pub fn width(&self) -> f64 {
        self.xr - self.xl
    }

    pub fn height(&self) -> f64 {
        self.yb - self.yt
    }

    /// Is `p` inside the box or on its boundary?
    pub fn center(&self) -> Point {
        Point::new((self.xl + self.xr) / 2.0, (self.yt + self.yb) / 2.0)
    }

    pub fn contains(&self, p: &Point) -> bool {
        (self.xl..=self.xr).contains(&p.x) && (self.yt..=self.yb).contains(&p.y)
    }

    /// The corners, starting at the top-left one and running down the left
    /// wall, along the bottom, up the right wall and back along the top.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.xl, self.yt),
            Point::new(self.xl, self.yb),
            Point::new(self.xr, self.yb),
            Point::new(self.xr, self.yt),
        ]
    }
}

/// A circle given by its center and radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    /// The lowest point of the circle, which is where the sweep line is when it
    /// leaves the circle behind.
    pub fn bottom(&self) -> f64 {
        self.center.y + self.radius
    }
}

/// The `x` coordinate at which the parabola with focus `left` meets the
/// parabola with focus `right`, both parabolas sharing the horizontal
/// `directrix`.
///
/// A focus lying on the directrix degenerates into a vertical ray, in which
/// case the breakpoint is that focus's `x`. If both foci are equally far from
/// the directrix the breakpoint is midway between them.
pub fn breakpoint_x(left: Point, right: Point, directrix: f64) -> f64 {
    let pby2 = right.y - directrix;
    if pby2 == 0.0 {
        return right.x;
    }
    let plby2 = left.y - directrix;
    if plby2 == 0.0 {
        return left.x;
    }

    // The height difference is taken from the foci themselves: for nearly level
    // foci, `1 / pby2 - 1 / plby2` can round to zero or to the wrong sign.
    let dy = left.y - right.y;
    if dy == 0.0 {
        return (right.x + left.x) / 2.0;
    }
    let hl = left.x - right.x;
    let aby2 = dy / (pby2 * plby2);
    let b = hl / plby2;
    let c = -hl * hl / (2.0 * plby2) - dy / 2.0;
    let disc = (b * b - 2.0 * aby2 * c).max(0.0).sqrt();
    let root = if b > 0.0 {
        // The same root, rearranged so that nothing cancels when `aby2` is tiny.
        2.0 * c / (-b - disc)
    } else {
        (-b + disc) / aby2
    };
    root + right.x
}

/// The center of the circle through `a`, `b` and `c`.
///
/// The result is computed relative to `a`. Collinear inputs give non-finite
/// coordinates.
pub fn circumcenter(a: Point, b: Point, c: Point) -> Point {
    let bx = b.x - a.x;
    let by = b.y - a.y;
    let cx = c.x - a.x;
    let cy = c.y - a.y;
    let d = 2.0 * (bx * cy - by * cx);
    let hb = bx * bx + by * by;
    let hc = cx * cx + cy * cy;
    Point::new((cy * hb - by * hc) / d + a.x, (bx * hc - cx * hb) / d + a.y)
}

/// The circle through three consecutive beachline foci, if the middle arc is
/// being squeezed out.
///
/// Returns `None` when the triple is collinear or the breakpoints around `mid`
/// are moving apart, since then the middle arc never disappears.
pub fn circle_event(left: Point, mid: Point, right: Point) -> Option<Circle> {
    // The orientation predicate is exact in sign, which keeps nearly collinear
    // triples from flipping.
    let d = 2.0 * robust::orient2d(left.into(), right.into(), mid.into());
    if d >= CONVERGENCE_THRESHOLD {
        return None;
    }

    let ax = left.x - mid.x;
    let ay = left.y - mid.y;
    let cx = right.x - mid.x;
    let cy = right.y - mid.y;
    let ha = ax * ax + ay * ay;
    let hc = cx * cx + cy * cy;
    let x = (cy * ha - ay * hc) / d;
    let y = (ax * hc - cx * ha) / d;

    Some(Circle {
        center: Point::new(x + mid.x, y + mid.y),
        radius: (x * x + y * y).sqrt(),
    })
}
