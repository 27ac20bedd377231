//! Tagged collision surfaces and ray casting
//!
//! The court is a handful of axis-aligned rectangles. Each carries a tag that
//! decides how a contact is treated by the collision resolver and the
//! legality checks.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// What kind of object a ray hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceTag {
    Floor,
    Wall,
    Grid,
    Net,
    Racket,
    Other,
}

impl SurfaceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceTag::Floor => "Floor",
            SurfaceTag::Wall => "Wall",
            SurfaceTag::Grid => "Grid",
            SurfaceTag::Net => "Net",
            SurfaceTag::Racket => "Racket",
            SurfaceTag::Other => "Other",
        }
    }
}

impl std::fmt::Display for SurfaceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Contact point on the surface
    pub point: Vec3,
    /// Unit surface normal, facing the incoming ray
    pub normal: Vec3,
    /// Distance along the ray
    pub distance: f32,
    pub tag: SurfaceTag,
}

/// Anything the ball can collide with
pub trait SurfaceProvider {
    /// Nearest hit along `direction` (unit) within `max_distance` of `origin`
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Axis a rectangle is perpendicular to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Two-sided axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub tag: SurfaceTag,
    /// Axis the plane is perpendicular to
    pub axis: Axis,
    /// Plane coordinate along `axis`
    pub offset: f32,
    /// Inclusive bounds of the rectangle (the `axis` component is ignored)
    pub min: Vec3,
    pub max: Vec3,
}

impl Rect {
    pub fn new(tag: SurfaceTag, axis: Axis, offset: f32, min: Vec3, max: Vec3) -> Self {
        Self {
            tag,
            axis,
            offset,
            min,
            max,
        }
    }

    /// Ray/rectangle intersection
    pub fn intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let a = self.axis.index();
        let denom = direction[a];
        if denom.abs() < 1e-9 {
            return None; // Parallel to the plane
        }

        let t = (self.offset - origin[a]) / denom;
        if !(0.0..=max_distance).contains(&t) {
            return None;
        }

        let point = origin + direction * t;
        let inside = (0..3)
            .filter(|&i| i != a)
            .all(|i| point[i] >= self.min[i] && point[i] <= self.max[i]);
        if !inside {
            return None;
        }

        // Face the normal towards the side the ray came from
        let n = self.axis.unit();
        let normal = if denom > 0.0 { -n } else { n };
        let mut point = point;
        point[a] = self.offset;

        Some(RayHit {
            point,
            normal,
            distance: t,
            tag: self.tag,
        })
    }
}

/// A set of tagged rectangles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Court {
    pub surfaces: Vec<Rect>,
}

impl Court {
    pub fn new(surfaces: Vec<Rect>) -> Self {
        Self { surfaces }
    }

    /// Standard enclosed padel court: 10m x 20m floor, glass back walls with
    /// grid above, glass side panels near each back wall with grid in the
    /// middle section, and the net across z = 0.
    pub fn standard() -> Self {
        let w = COURT_HALF_WIDTH;
        let l = COURT_HALF_LENGTH;
        let mut surfaces = vec![Rect::new(
            SurfaceTag::Floor,
            Axis::Y,
            0.0,
            Vec3::new(-w, 0.0, -l),
            Vec3::new(w, 0.0, l),
        )];

        for side in [-1.0f32, 1.0] {
            let z = side * l;
            // Back wall
            surfaces.push(Rect::new(
                SurfaceTag::Wall,
                Axis::Z,
                z,
                Vec3::new(-w, 0.0, z),
                Vec3::new(w, GLASS_HEIGHT, z),
            ));
            surfaces.push(Rect::new(
                SurfaceTag::Grid,
                Axis::Z,
                z,
                Vec3::new(-w, GLASS_HEIGHT, z),
                Vec3::new(w, BACK_GRID_TOP, z),
            ));

            let x = side * w;
            let glass_start = l - SIDE_GLASS_LENGTH;
            // Side glass near both back walls
            for end in [-1.0f32, 1.0] {
                let (z0, z1) = if end < 0.0 {
                    (-l, -glass_start)
                } else {
                    (glass_start, l)
                };
                surfaces.push(Rect::new(
                    SurfaceTag::Wall,
                    Axis::X,
                    x,
                    Vec3::new(x, 0.0, z0),
                    Vec3::new(x, GLASS_HEIGHT, z1),
                ));
            }
            // Side grid in the middle section
            surfaces.push(Rect::new(
                SurfaceTag::Grid,
                Axis::X,
                x,
                Vec3::new(x, 0.0, -glass_start),
                Vec3::new(x, GLASS_HEIGHT, glass_start),
            ));
        }

        surfaces.push(Rect::new(
            SurfaceTag::Net,
            Axis::Z,
            0.0,
            Vec3::new(-w, 0.0, 0.0),
            Vec3::new(w, NET_HEIGHT, 0.0),
        ));

        Self { surfaces }
    }

    /// Add a surface (builder style)
    #[cfg(test)]
    pub(crate) fn with(mut self, surface: Rect) -> Self {
        self.surfaces.push(surface);
        self
    }
}

impl SurfaceProvider for Court {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.surfaces
            .iter()
            .filter_map(|s| s.intersect(origin, direction, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
