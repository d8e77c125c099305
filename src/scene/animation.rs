//! Path Animation
//!
//! A looping closed path through control points, evaluated as a chain of
//! cubic Bézier segments whose inner controls come from the neighboring
//! points (Catmull-Rom tangents). Sampling takes elapsed time explicitly and
//! wraps it modulo the loop duration.

use glam::{Mat3, Quat, Vec3};

/// Tangents shorter than this are treated as zero.
const MIN_TANGENT_LENGTH: f32 = 1e-5;
/// Parameter step used for the finite-difference fallback direction.
const FALLBACK_STEP: f32 = 1e-3;
/// Above this `|forward . up|` the alternate up axis is used.
const PARALLEL_UP_THRESHOLD: f32 = 0.999;

/// Position and orientation at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub position: Vec3,
    /// Unit direction of travel.
    pub forward: Vec3,
    /// Rotation taking `-Z` onto `forward` with `+Y` kept as up where possible.
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathAnimation {
    points: Vec<Vec3>,
    duration: f32,
}

impl PathAnimation {
    /// `duration` is the time for one full loop; non-positive values are
    /// raised to a small minimum.
    #[must_use]
    pub fn new(points: Vec<Vec3>, duration: f32) -> Self {
        Self {
            points,
            duration: duration.max(f32::EPSILON),
        }
    }

    /// Horizontal circle of `radius` around `center` approximated by
    /// `segments` points.
    #[must_use]
    pub fn circle(center: Vec3, radius: f32, segments: usize, duration: f32) -> Self {
        let segments = segments.max(3);
        let points = (0..segments)
            .map(|i| {
                let angle = std::f32::consts::TAU * i as f32 / segments as f32;
                center + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
            })
            .collect();
        Self::new(points, duration)
    }

    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Loop parameter in `[0, 1)` for `elapsed` seconds.
    #[must_use]
    pub fn phase(&self, elapsed: f32) -> f32 {
        elapsed.rem_euclid(self.duration) / self.duration
    }

    /// Position along the loop at parameter `t` (wrapped into `[0, 1)`).
    #[must_use]
    pub fn position_at(&self, t: f32) -> Vec3 {
        match self.points.len() {
            0 => Vec3::ZERO,
            1 => self.points[0],
            n => {
                let (segment, local) = self.locate(t, n);
                let [p0, c1, c2, p1] = self.segment_controls(segment);
                cubic_bezier(p0, c1, c2, p1, local)
            }
        }
    }

    /// Unnormalized derivative at parameter `t`.
    #[must_use]
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        if n < 2 {
            return Vec3::ZERO;
        }
        let (segment, local) = self.locate(t, n);
        let [p0, c1, c2, p1] = self.segment_controls(segment);
        cubic_bezier_derivative(p0, c1, c2, p1, local)
    }

    /// Position and orientation `elapsed` seconds into the loop.
    #[must_use]
    pub fn sample(&self, elapsed: f32) -> PathSample {
        let t = self.phase(elapsed);
        let position = self.position_at(t);
        let forward = self.forward_at(t, position);
        PathSample {
            position,
            forward,
            rotation: orientation(forward),
        }
    }

    /// Travel direction with fallbacks: the chord from slightly earlier on
    /// the path, then `-Z`.
    fn forward_at(&self, t: f32, position: Vec3) -> Vec3 {
        let tangent = self.tangent_at(t);
        if tangent.length() > MIN_TANGENT_LENGTH {
            return tangent.normalize();
        }
        let chord = position - self.position_at(t - FALLBACK_STEP);
        if chord.length() > MIN_TANGENT_LENGTH {
            return chord.normalize();
        }
        Vec3::NEG_Z
    }

    fn locate(&self, t: f32, n: usize) -> (usize, f32) {
        let scaled = t.rem_euclid(1.0) * n as f32;
        let segment = (scaled.floor() as usize).min(n - 1);
        (segment, scaled - segment as f32)
    }

    fn segment_controls(&self, segment: usize) -> [Vec3; 4] {
        let n = self.points.len();
        let at = |offset: isize| self.points[(segment as isize + offset).rem_euclid(n as isize) as usize];
        let (prev, p0, p1, next) = (at(-1), at(0), at(1), at(2));
        let c1 = p0 + (p1 - prev) / 6.0;
        let c2 = p1 - (next - p0) / 6.0;
        [p0, c1, c2, p1]
    }
}

fn cubic_bezier(p0: Vec3, c1: Vec3, c2: Vec3, p1: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
}

fn cubic_bezier_derivative(p0: Vec3, c1: Vec3, c2: Vec3, p1: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    (c1 - p0) * (3.0 * u * u) + (c2 - c1) * (6.0 * u * t) + (p1 - c2) * (3.0 * t * t)
}

/// Rotation facing `forward`. Uses `+Z` as up when `forward` is vertical.
#[must_use]
pub fn orientation(forward: Vec3) -> Quat {
    let world_up = if forward.dot(Vec3::Y).abs() > PARALLEL_UP_THRESHOLD {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let right = forward.cross(world_up).normalize();
    let up = right.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward))
}
