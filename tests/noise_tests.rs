//! Noise Field Tests
//!
//! Tests for:
//! - Permutation table construction
//! - Determinism per seed
//! - Output range over random sample points
//! - Lattice behavior (zero at integer points, continuity)

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use tidelight::water::NoiseField;

const EPSILON: f64 = 1e-9;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Permutation Table
// ============================================================================

#[test]
fn permutation_is_duplicated_shuffle_of_0_to_255() {
    let field = NoiseField::new(42);
    let table = field.permutation();
    assert_eq!(table.len(), 512);
    assert_eq!(&table[..256], &table[256..]);

    let mut sorted = table[..256].to_vec();
    sorted.sort_unstable();
    let expected: Vec<u8> = (0..=255).collect();
    assert_eq!(sorted, expected);
}

#[test]
fn different_seeds_shuffle_differently() {
    let a = NoiseField::new(1);
    let b = NoiseField::new(2);
    assert_ne!(a.permutation(), b.permutation());
}

#[test]
fn default_uses_seed_zero() {
    assert_eq!(
        NoiseField::default().permutation(),
        NoiseField::new(0).permutation()
    );
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn same_seed_same_output_bitwise() {
    let a = NoiseField::new(7);
    let b = NoiseField::new(7);
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..1000 {
        let x = rng.random_range(-100.0..100.0);
        let y = rng.random_range(-100.0..100.0);
        let z = rng.random_range(-100.0..100.0);
        assert_eq!(a.noise(x, y, z).to_bits(), b.noise(x, y, z).to_bits());
    }
}

#[test]
fn repeated_calls_are_stable() {
    let field = NoiseField::new(3);
    let first = field.noise(1.25, -3.5, 8.75);
    for _ in 0..10 {
        assert_eq!(field.noise(1.25, -3.5, 8.75).to_bits(), first.to_bits());
    }
}

// ============================================================================
// Range & Shape
// ============================================================================

#[test]
fn output_stays_within_unit_range() {
    let field = NoiseField::new(0);
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..10_000 {
        let x = rng.random_range(-1000.0..1000.0);
        let y = rng.random_range(-1000.0..1000.0);
        let z = rng.random_range(-1000.0..1000.0);
        let n = field.noise(x, y, z);
        assert!(n.is_finite());
        assert!((-1.05..=1.05).contains(&n), "noise({x}, {y}, {z}) = {n}");
    }
}

#[test]
fn zero_at_lattice_points() {
    let field = NoiseField::new(5);
    for (x, y, z) in [(0.0, 0.0, 0.0), (3.0, -2.0, 7.0), (-256.0, 512.0, 1.0)] {
        assert!(approx(field.noise(x, y, z), 0.0));
    }
}

#[test]
fn output_is_continuous() {
    let field = NoiseField::new(11);
    let base = field.noise(4.3, 1.7, -2.2);
    let nudged = field.noise(4.3 + 1e-6, 1.7, -2.2);
    assert!((base - nudged).abs() < 1e-4);
}

#[test]
fn output_is_not_constant() {
    let field = NoiseField::new(0);
    let samples: Vec<f64> = (0..50)
        .map(|i| field.noise(f64::from(i) * 0.37 + 0.5, 0.25, 0.75))
        .collect();
    assert!(samples.iter().any(|&n| n.abs() > 0.01));
}

#[test]
fn periodic_with_table_size() {
    let field = NoiseField::new(9);
    let a = field.noise(1.3, 2.6, 3.9);
    let b = field.noise(1.3 + 256.0, 2.6, 3.9);
    assert!((a - b).abs() < 1e-6);
}
