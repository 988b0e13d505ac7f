//! Planar clipping and intersection primitives.
//!
//! Pure, allocation-free helpers used by zone assignment (segment vs. rect)
//! and tile rendering (Liang-Barsky segment clipping).

/// A point (or 2D vector) in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned rectangle in layout space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Closed containment test (boundary points count as inside).
    pub fn contains(&self, p: Point) -> bool {
        self.min_x <= p.x && p.x <= self.max_x && self.min_y <= p.y && p.y <= self.max_y
    }

    /// The rectangle grown by `dx`/`dy` on each side.
    pub fn expand(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(
            self.min_x - dx,
            self.min_y - dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// The four sides as segments, walked around the perimeter.
    pub fn sides(&self) -> [(Point, Point); 4] {
        let bl = Point::new(self.min_x, self.min_y);
        let br = Point::new(self.max_x, self.min_y);
        let tr = Point::new(self.max_x, self.max_y);
        let tl = Point::new(self.min_x, self.max_y);
        [(bl, br), (br, tr), (tr, tl), (tl, bl)]
    }
}

/// Clip the segment `a`->`b` against `rect` using the Liang-Barsky
/// parametric method.
///
/// Returns the clipped endpoints, or `None` when the parameter interval is
/// empty (the segment lies entirely outside). A segment fully inside the
/// rectangle comes back unchanged.
pub fn clip_segment(a: Point, b: Point, rect: &Rect) -> Option<(Point, Point)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    // One entry per half-plane constraint: left, right, bottom, top.
    let p = [-dx, dx, -dy, dy];
    let q = [
        a.x - rect.min_x,
        rect.max_x - a.x,
        a.y - rect.min_y,
        rect.max_y - a.y,
    ];

    let mut u1 = 0.0_f32;
    let mut u2 = 1.0_f32;
    for i in 0..4 {
        if p[i] == 0.0 {
            // Parallel to this boundary: outside means no intersection at all.
            if q[i] < 0.0 {
                return None;
            }
        } else {
            let t = q[i] / p[i];
            if p[i] < 0.0 {
                if t > u2 {
                    return None;
                }
                if t > u1 {
                    u1 = t;
                }
            } else {
                if t < u1 {
                    return None;
                }
                if t < u2 {
                    u2 = t;
                }
            }
        }
    }

    if u1 < u2 {
        Some((
            Point::new(a.x + u1 * dx, a.y + u1 * dy),
            Point::new(a.x + u2 * dx, a.y + u2 * dy),
        ))
    } else {
        None
    }
}

/// Orientation of the ordered triple (p, q, r).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether `q` lies on the segment p->r, assuming the three are collinear.
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    p.x.min(r.x) <= q.x && q.x <= p.x.max(r.x) && p.y.min(r.y) <= q.y && q.y <= p.y.max(r.y)
}

/// Whether segments p1->q1 and p2->q2 intersect, including touching
/// endpoints and collinear overlap.
pub fn segments_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    // Collinear special cases.
    if o1 == Orientation::Collinear && on_segment(p1, p2, q1) {
        return true;
    }
    if o2 == Orientation::Collinear && on_segment(p1, q2, q1) {
        return true;
    }
    if o3 == Orientation::Collinear && on_segment(p2, p1, q2) {
        return true;
    }
    if o4 == Orientation::Collinear && on_segment(p2, q1, q2) {
        return true;
    }
    false
}

/// Whether the segment `a`->`b` crosses (or touches) the rectangle boundary.
///
/// A segment fully inside the rectangle does not cross any side and returns
/// false; callers pair this with a containment check.
pub fn segment_intersects_rect(a: Point, b: Point, rect: &Rect) -> bool {
    rect.sides()
        .iter()
        .any(|&(s, e)| segments_intersect(a, b, s, e))
}
