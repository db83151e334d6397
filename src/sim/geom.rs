//! Segment and polygon geometry for arena walls
//!
//! Walls are simple polygons wound counter-clockwise, so the outward normal
//! of edge `a -> b` is the right-hand perpendicular of `b - a`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A directed line segment from `p` to `q`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p: Vec2,
    pub q: Vec2,
}

impl Segment {
    pub fn new(p: Vec2, q: Vec2) -> Self {
        Self { p, q }
    }

    #[inline]
    pub fn dir(&self) -> Vec2 {
        self.q - self.p
    }

    /// Intersection point with another segment, if the two cross
    ///
    /// Parallel and collinear segments never intersect.
    pub fn intersect(&self, other: &Segment) -> Option<Vec2> {
        let r = self.dir();
        let s = other.dir();
        let denom = r.perp_dot(s);
        if denom.abs() < 1.0e-9 {
            return None;
        }

        let qp = other.p - self.p;
        let t = qp.perp_dot(s) / denom;
        let u = qp.perp_dot(r) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.p + r * t)
        } else {
            None
        }
    }

    /// Distance from `point` to the infinite line through this segment
    pub fn distance_from_line(&self, point: Vec2) -> f32 {
        let d = self.dir();
        let len = d.length();
        if len < 1.0e-6 {
            return (point - self.p).length();
        }
        d.perp_dot(point - self.p).abs() / len
    }

    /// Distance from `point` to the nearest point on the segment
    pub fn distance_to_point(&self, point: Vec2) -> f32 {
        let d = self.dir();
        let len_sq = d.length_squared();
        if len_sq < 1.0e-12 {
            return (point - self.p).length();
        }
        let t = ((point - self.p).dot(d) / len_sq).clamp(0.0, 1.0);
        (point - (self.p + d * t)).length()
    }

    /// Shift both endpoints by `offset`
    pub fn translated(&self, offset: Vec2) -> Segment {
        Segment::new(self.p + offset, self.q + offset)
    }
}

/// A simple polygon, counter-clockwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub verts: Vec<Vec2>,
}

impl Polygon {
    pub fn new(verts: Vec<Vec2>) -> Self {
        let mut poly = Self { verts };
        if poly.signed_area() < 0.0 {
            poly.verts.reverse();
        }
        poly
    }

    /// Axis-aligned rectangle with corners `min` and `max`
    pub fn rect(min: Vec2, max: Vec2) -> Self {
        Self::new(vec![
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    /// Twice the signed area; positive for counter-clockwise winding
    pub fn signed_area(&self) -> f32 {
        let n = self.verts.len();
        (0..n)
            .map(|i| self.verts[i].perp_dot(self.verts[(i + 1) % n]))
            .sum()
    }

    pub fn is_degenerate(&self) -> bool {
        self.verts.len() < 3 || self.signed_area().abs() < 1.0e-6
    }

    /// Edge `i` as a segment from vertex `i` to vertex `i + 1`
    pub fn edge(&self, i: usize) -> Segment {
        let n = self.verts.len();
        Segment::new(self.verts[i], self.verts[(i + 1) % n])
    }

    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.verts.len()).map(move |i| self.edge(i))
    }

    /// Unit normal of edge `i` pointing out of the polygon
    pub fn outward_normal(&self, i: usize) -> Vec2 {
        let d = self.edge(i).dir();
        Vec2::new(d.y, -d.x).normalize_or_zero()
    }

    /// True if `point` lies on the outer side of edge `i`
    pub fn is_front_facing(&self, i: usize, point: Vec2) -> bool {
        self.outward_normal(i).dot(point - self.verts[i]) > 0.0
    }

    /// Even-odd containment test
    pub fn contains(&self, point: Vec2) -> bool {
        let mut inside = false;
        let n = self.verts.len();
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = self.verts[i];
            let b = self.verts[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_intersect() {
        let a = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Segment::new(Vec2::new(0.0, 10.0), Vec2::new(10.0, 0.0));
        let hit = a.intersect(&b).unwrap();
        assert!((hit - Vec2::new(5.0, 5.0)).length() < 0.001);
    }

    #[test]
    fn test_segment_miss_and_parallel() {
        let a = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let b = Segment::new(Vec2::new(2.0, -1.0), Vec2::new(2.0, 1.0));
        assert!(a.intersect(&b).is_none());
        let c = Segment::new(Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0));
        assert!(a.intersect(&c).is_none());
    }

    #[test]
    fn test_distance_from_line() {
        let s = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert!((s.distance_from_line(Vec2::new(50.0, 3.0)) - 3.0).abs() < 0.001);
        assert!((s.distance_to_point(Vec2::new(13.0, 4.0)) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_polygon_winding_normalized() {
        let cw = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 0.0),
        ]);
        assert!(cw.signed_area() > 0.0);
        // Bottom edge of a CCW square faces -y
        let bottom = (0..4)
            .find(|&i| cw.edge(i).p.y == 0.0 && cw.edge(i).q.y == 0.0)
            .unwrap();
        assert!((cw.outward_normal(bottom) - Vec2::new(0.0, -1.0)).length() < 0.001);
    }

    #[test]
    fn test_polygon_contains() {
        let sq = Polygon::rect(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(sq.contains(Vec2::new(5.0, 5.0)));
        assert!(!sq.contains(Vec2::new(15.0, 5.0)));
        assert!(sq.is_front_facing(0, Vec2::new(5.0, -1.0)));
        assert!(!sq.is_front_facing(0, Vec2::new(5.0, 1.0)));
    }
}
