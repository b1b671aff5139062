//! Partitioned evaluation must agree with the single-call kernel.

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mdmsm_metric::{Coordinates, Metric, Partitioned, Rmsd};

/// Random frames scattered around a common template, so RMSDs are non-trivial.
fn jittered_frames(n_frames: usize, n_atoms: usize, seed: u64) -> Coordinates {
    let mut rng = StdRng::seed_from_u64(seed);
    let template: Vec<f32> = (0..n_atoms * 3)
        .map(|_| rng.random_range(-2.0..2.0))
        .collect();
    let mut xyz = Vec::with_capacity(n_frames * n_atoms * 3);
    for _ in 0..n_frames {
        for &t in &template {
            xyz.push(t + rng.random_range(-0.3..0.3));
        }
    }
    Coordinates::from_flat(n_frames, n_atoms, xyz).unwrap()
}

#[test]
fn partitioned_matches_single_call_for_all_partition_counts() {
    let coords = jittered_frames(37, 6, 11);
    let reference = coords.frame(5);
    let expected = Rmsd::new().distances(coords.view(), reference).unwrap();

    for p in 1..=40 {
        let metric = Partitioned::new(Rmsd::new()).with_partitions(p);
        let got = metric.distances(coords.view(), reference).unwrap();
        assert_eq!(got.len(), expected.len(), "P = {p}");
        for (g, e) in got.iter().zip(&expected) {
            assert_abs_diff_eq!(*g, *e, epsilon = 1e-12);
        }
    }
}

#[test]
fn unpartitioned_adapter_is_passthrough() {
    let coords = jittered_frames(10, 4, 3);
    let expected = Rmsd::new().distances(coords.view(), coords.frame(0)).unwrap();
    let got = Partitioned::new(Rmsd::new())
        .distances(coords.view(), coords.frame(0))
        .unwrap();
    assert_eq!(got, expected);
}

#[test]
fn reference_frame_distance_is_zero() {
    let coords = jittered_frames(20, 5, 7);
    let d = Partitioned::new(Rmsd::new())
        .with_partitions(4)
        .distances(coords.view(), coords.frame(13))
        .unwrap();
    assert_abs_diff_eq!(d[13], 0.0, epsilon = 1e-6);
    assert!(d.iter().all(|&v| v >= 0.0 && v.is_finite()));
}

#[test]
fn segment_views_match_whole_array() {
    let coords = jittered_frames(12, 3, 5);
    let whole = Rmsd::new().distances(coords.view(), coords.frame(0)).unwrap();
    let tail = Partitioned::new(Rmsd::new())
        .with_partitions(2)
        .distances(coords.frames(4..12), coords.frame(0))
        .unwrap();
    assert_eq!(tail.as_slice(), &whole[4..12]);
}
