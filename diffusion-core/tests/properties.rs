//! End-to-end properties of the stepping engine: fixed points, boundary
//! invariants, thread-count independence and stability at the bound.

use approx::assert_relative_eq;
use diffusion_core::{
    BoundaryKind, DiffusionEngine, EngineConfig, EngineError, Field, MAX_STABLE_ALPHA, Scalar,
    partition,
};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn engine<T: Scalar>(
    nx: usize,
    ny: usize,
    alpha: f64,
    boundary: BoundaryKind,
    threads: usize,
) -> DiffusionEngine<T> {
    DiffusionEngine::new(EngineConfig {
        nx,
        ny,
        alpha,
        boundary,
        threads,
    })
    .unwrap()
}

fn single_hot_cell<T: Scalar>(nx: usize, ny: usize, value: f64) -> Vec<T> {
    let mut v = vec![T::zero(); nx * ny];
    v[(nx / 2) * ny + ny / 2] = T::from_f64(value).unwrap();
    v
}

/// Seeded uniform field in `[0, 100)`.
fn seeded_field(nx: usize, ny: usize, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..nx * ny).map(|_| rng.gen_range(0.0f32..100.0)).collect()
}

fn borders_of<T: Scalar>(f: &Field<T>) -> Vec<T> {
    let mut out = Vec::new();
    for i in 0..f.nx() {
        for j in 0..f.ny() {
            if f.is_border(i, j) {
                out.push(f.get(i, j));
            }
        }
    }
    out
}

// ---- Scenarios ----

#[test]
fn hot_center_one_step() {
    let mut e = engine::<f32>(5, 5, 0.2, BoundaryKind::Fixed, 2);
    e.set_initial_field(&single_hot_cell::<f32>(5, 5, 100.0)).unwrap();
    let field = e.run_steps(1).field;

    assert_relative_eq!(field.get(2, 2), 20.0, epsilon = 1e-4);
    for (i, j) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
        assert_relative_eq!(field.get(i, j), 20.0, epsilon = 1e-4);
    }
    for (i, j) in [(1, 1), (1, 3), (3, 1), (3, 3)] {
        assert_eq!(field.get(i, j), 0.0);
    }
    assert!(borders_of(field).iter().all(|&v| v == 0.0));
}

#[test]
fn stability_bound_never_gains_heat() {
    let mut e = engine::<f64>(10, 10, MAX_STABLE_ALPHA, BoundaryKind::Fixed, 3);
    e.set_initial_field(&single_hot_cell::<f64>(10, 10, 100.0)).unwrap();
    let initial = e.field().sum();

    for _ in 0..1000 {
        e.step();
        let f = e.field();
        assert!(f.is_finite());
        assert!(f.min() >= 0.0);
        assert!(f.sum() <= initial + 1e-9, "sum {} > {}", f.sum(), initial);
    }
}

#[test]
fn fixed_zero_border_drains_monotonically() {
    let mut e = engine::<f64>(16, 12, 0.2, BoundaryKind::Fixed, 4);
    let mut init = vec![0.0; 16 * 12];
    for i in 1..15 {
        for j in 1..11 {
            init[i * 12 + j] = 10.0;
        }
    }
    e.set_initial_field(&init).unwrap();

    let mut prev = e.field().sum();
    for _ in 0..200 {
        e.step();
        let s = e.field().sum();
        assert!(s <= prev + 1e-9);
        prev = s;
    }
    assert!(prev < 10.0 * 14.0 * 10.0);
}

#[test]
fn heat_conserved_until_front_reaches_border() {
    for boundary in [BoundaryKind::Fixed, BoundaryKind::Clamped] {
        let mut e = engine::<f64>(21, 21, 0.2, boundary, 4);
        e.set_initial_field(&single_hot_cell::<f64>(21, 21, 100.0)).unwrap();

        // Front spreads one cell per step; row/col 1 is 9 cells from centre.
        let outcome = e.run_steps(8);
        assert_eq!(outcome.steps, 8);
        assert_relative_eq!(outcome.field.sum(), 100.0, max_relative = 1e-12);
    }
}

#[test]
fn rejects_invalid_construction() {
    assert!(matches!(
        DiffusionEngine::<f32>::construct(2, 10, 0.2, BoundaryKind::Fixed, 1),
        Err(EngineError::InvalidDimension { nx: 2, ny: 10 })
    ));
    assert!(matches!(
        DiffusionEngine::<f32>::construct(10, 10, 0.3, BoundaryKind::Fixed, 1),
        Err(EngineError::InvalidCoefficient { .. })
    ));
}

#[test]
fn snapshot_and_into_field_agree_with_view() {
    let mut e = engine::<f32>(8, 9, 0.15, BoundaryKind::Clamped, 2);
    e.set_initial_field(&seeded_field(8, 9, 7)).unwrap();
    e.run_steps(5);

    let snap = e.snapshot();
    assert_eq!(&snap, e.field());
    assert_eq!(e.steps_taken(), 5);
    assert_eq!(e.into_field(), snap);
}

#[test]
fn border_invariant_holds_every_step() {
    let init = seeded_field(12, 7, 99);
    let initial_field = Field::from_values(12, 7, init.clone()).unwrap();

    for boundary in [BoundaryKind::Fixed, BoundaryKind::Clamped] {
        let mut e = engine::<f32>(12, 7, 0.25, boundary, 3);
        e.set_initial_field(&init).unwrap();
        assert_eq!(e.boundary_kind(), boundary);

        let mut prev_border = borders_of(e.field());
        for _ in 0..25 {
            e.step();
            let border = borders_of(e.field());
            match boundary {
                BoundaryKind::Fixed => assert_eq!(border, borders_of(&initial_field)),
                BoundaryKind::Clamped => assert_eq!(border, prev_border),
            }
            prev_border = border;
        }
    }
}

#[test]
fn reinstalling_initial_field_resnapshots_border() {
    let mut e = engine::<f32>(6, 6, 0.2, BoundaryKind::Fixed, 1);
    e.run_steps(3);
    let hot = vec![5.0f32; 36];
    e.set_initial_field(&hot).unwrap();
    assert_eq!(e.steps_taken(), 0);

    e.run_steps(10);
    assert!(e.field().as_slice().iter().all(|&v| v == 5.0));
}

// ---- Properties ----

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn constant_field_is_a_fixed_point(
        nx in 3usize..24,
        ny in 3usize..24,
        alpha in 0.01f64..=0.25,
        value in -1.0e3f32..1.0e3,
        steps in 1usize..20,
        clamped in any::<bool>(),
    ) {
        let boundary = if clamped { BoundaryKind::Clamped } else { BoundaryKind::Fixed };
        let mut e = engine::<f32>(nx, ny, alpha, boundary, 2);
        e.set_initial_field(&vec![value; nx * ny]).unwrap();
        let field = e.run_steps(steps).field;
        prop_assert!(field.as_slice().iter().all(|&v| v == value));
    }

    #[test]
    fn thread_count_does_not_change_results(
        nx in 3usize..40,
        ny in 3usize..40,
        threads in 2usize..9,
        seed in any::<u64>(),
        steps in 1usize..12,
    ) {
        let init = seeded_field(nx, ny, seed);

        let mut serial = engine::<f32>(nx, ny, 0.2, BoundaryKind::Fixed, 1);
        serial.set_initial_field(&init).unwrap();
        serial.run_steps(steps);

        let mut parallel = engine::<f32>(nx, ny, 0.2, BoundaryKind::Fixed, threads);
        parallel.set_initial_field(&init).unwrap();
        parallel.run_steps(steps);

        let a: Vec<u32> = serial.field().as_slice().iter().map(|v| v.to_bits()).collect();
        let b: Vec<u32> = parallel.field().as_slice().iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn tiles_partition_interior_exactly(nx in 0usize..500, threads in 0usize..64) {
        let tiles = partition(nx, threads);
        prop_assert_eq!(tiles.len(), threads.max(1));

        let mut expected_start = 1;
        for t in &tiles {
            prop_assert_eq!(t.start, expected_start);
            prop_assert!(t.end >= t.start);
            expected_start = t.end;
        }
        prop_assert_eq!(expected_start, 1 + nx.saturating_sub(2));

        // Sizes are non-increasing and differ by at most one.
        let lens: Vec<usize> = tiles.iter().map(|t| t.len()).collect();
        prop_assert!(lens.windows(2).all(|w| w[0] >= w[1]));
        prop_assert!(lens[0] - lens[lens.len() - 1] <= 1);
    }
}
