//! Gradient Noise
//!
//! Improved Perlin noise over a seeded permutation table. The table is built
//! once and never mutated, so a [`NoiseField`] can be sampled from any number
//! of call sites (or threads) through a shared reference.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Size of the base permutation.
const TABLE_SIZE: usize = 256;

/// Seeded 3D gradient noise.
///
/// Output lies in approximately `[-1, 1]`.
#[derive(Clone)]
pub struct NoiseField {
    /// The shuffled base sequence, stored twice so corner hashing never wraps.
    permutation: [u8; TABLE_SIZE * 2],
}

impl NoiseField {
    /// Builds the permutation table from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut base: [u8; TABLE_SIZE] = std::array::from_fn(|i| i as u8);

        // Fisher-Yates
        let mut rng = StdRng::seed_from_u64(seed);
        for i in (1..TABLE_SIZE).rev() {
            let j = rng.random_range(0..=i);
            base.swap(i, j);
        }

        let mut permutation = [0u8; TABLE_SIZE * 2];
        permutation[..TABLE_SIZE].copy_from_slice(&base);
        permutation[TABLE_SIZE..].copy_from_slice(&base);
        Self { permutation }
    }

    #[inline]
    fn perm(&self, value: usize) -> usize {
        usize::from(self.permutation[value & 255])
    }

    /// Samples the noise at `(x, y, z)`.
    #[must_use]
    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());

        // Lattice cell, wrapped into the table (two's complement keeps negatives periodic).
        let xi = (x0 as i64 & 255) as usize;
        let yi = (y0 as i64 & 255) as usize;
        let zi = (z0 as i64 & 255) as usize;

        let (xf, yf, zf) = (x - x0, y - y0, z - z0);
        let (u, v, w) = (fade(xf), fade(yf), fade(zf));

        let corner = |dx: usize, dy: usize, dz: usize| {
            self.perm(self.perm(self.perm(xi + dx) + yi + dy) + zi + dz)
        };

        let aaa = corner(0, 0, 0);
        let aba = corner(0, 1, 0);
        let aab = corner(0, 0, 1);
        let abb = corner(0, 1, 1);
        let baa = corner(1, 0, 0);
        let bba = corner(1, 1, 0);
        let bab = corner(1, 0, 1);
        let bbb = corner(1, 1, 1);

        let x1 = lerp(u, grad(aaa, xf, yf, zf), grad(baa, xf - 1.0, yf, zf));
        let x2 = lerp(
            u,
            grad(aba, xf, yf - 1.0, zf),
            grad(bba, xf - 1.0, yf - 1.0, zf),
        );
        let y1 = lerp(v, x1, x2);

        let x3 = lerp(
            u,
            grad(aab, xf, yf, zf - 1.0),
            grad(bab, xf - 1.0, yf, zf - 1.0),
        );
        let x4 = lerp(
            u,
            grad(abb, xf, yf - 1.0, zf - 1.0),
            grad(bbb, xf - 1.0, yf - 1.0, zf - 1.0),
        );
        let y2 = lerp(v, x3, x4);

        lerp(w, y1, y2)
    }

    /// Raw permutation table (512 entries).
    #[must_use]
    pub fn permutation(&self) -> &[u8] {
        &self.permutation
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").finish_non_exhaustive()
    }
}

/// Smootherstep: `t³(t(6t − 15) + 10)`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product with one of 12 edge gradients picked by the low hash bits.
#[inline]
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}
