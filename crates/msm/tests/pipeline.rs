use approx::assert_abs_diff_eq;
use mdmsm_msm::{
    Estimator, Method, Msm, MsmConfig, SparseMatrix, assigns_to_counts, eq_probs,
    trim_disconnected,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Samples a discrete trajectory from a row-stochastic matrix.
fn sample_chain(p: &[Vec<f64>], n_steps: usize, start: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut state = start;
    let mut traj = Vec::with_capacity(n_steps);
    for _ in 0..n_steps {
        traj.push(state);
        let u: f64 = rng.random();
        let mut cumulative = 0.0;
        for (next, &pij) in p[state].iter().enumerate() {
            cumulative += pij;
            if u <= cumulative {
                state = next;
                break;
            }
        }
    }
    traj
}

fn four_state() -> Vec<Vec<f64>> {
    vec![
        vec![0.7, 0.3, 0.0, 0.0],
        vec![0.2, 0.6, 0.2, 0.0],
        vec![0.0, 0.2, 0.6, 0.2],
        vec![0.0, 0.0, 0.3, 0.7],
    ]
}

fn random_trajectories(seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..4)
        .map(|i| sample_chain(&four_state(), 500 + 37 * i, i % 4, &mut rng))
        .collect()
}

#[test]
fn count_totals_match_window_arithmetic() {
    let trajs = random_trajectories(1);
    for lag in [1, 2, 5] {
        let sliding = assigns_to_counts(&trajs, lag, true).unwrap();
        let strided = assigns_to_counts(&trajs, lag, false).unwrap();
        let expected_sliding: usize = trajs.iter().map(|t| t.len() - lag).sum();
        let expected_strided: usize = trajs.iter().map(|t| (t.len() - 1) / lag).sum();
        assert_eq!(sliding.sum(), expected_sliding as f64);
        assert_eq!(strided.sum(), expected_strided as f64);
    }
}

#[test]
fn trimmed_set_is_strongly_connected() {
    // states 4 and 5 are visited once and never returned to
    let mut trajs = random_trajectories(2);
    trajs.push(vec![4, 0, 1]);
    trajs.push(vec![2, 5]);
    let counts = assigns_to_counts(&trajs, 1, true).unwrap();
    let (mapping, reduced) = trim_disconnected(&counts).unwrap();
    assert_eq!(mapping.originals(), &[0, 1, 2, 3]);
    assert_eq!(mapping.trimmed(4), None);
    assert_eq!(mapping.trimmed(5), None);

    // every retained state reaches every other retained state
    let n = reduced.n_rows();
    for start in 0..n {
        let mut seen = vec![false; n];
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut seen[i], true) {
                continue;
            }
            stack.extend(reduced.row(i).map(|(j, _)| j));
        }
        assert!(seen.iter().all(|&s| s), "state {start} does not reach all");
    }
}

#[test]
fn every_method_is_row_stochastic_and_stationary() {
    let trajs = random_trajectories(3);
    let counts = assigns_to_counts(&trajs, 1, true).unwrap();
    for method in Method::ALL {
        let p = method.normalize(&counts).unwrap();
        for sum in p.row_sums() {
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-8);
        }
        let pi = eq_probs(&p).unwrap();
        assert_abs_diff_eq!(pi.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        for (a, b) in pi.iter().zip(p.left_mul(&pi)) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-9);
        }
    }
}

#[test]
fn estimate_approaches_generating_chain() {
    let mut rng = StdRng::seed_from_u64(4);
    let traj = sample_chain(&four_state(), 50_000, 0, &mut rng);
    let mut msm = Msm::new(MsmConfig::new(1)).unwrap();
    msm.fit(&[traj]).unwrap();
    let p = msm.tprobs().unwrap();
    for (i, row) in four_state().iter().enumerate() {
        for (j, &expected) in row.iter().enumerate() {
            assert_abs_diff_eq!(p.get(i, j), expected, epsilon = 0.02);
        }
    }
    // detailed balance of the generator gives pi = (2, 3, 3, 2) / 10
    let eq = msm.eq_probs().unwrap();
    for (got, want) in eq.iter().zip([0.2, 0.3, 0.3, 0.2]) {
        assert_abs_diff_eq!(*got, want, epsilon = 0.03);
    }
}

#[test]
fn zero_count_rows_stay_empty() {
    let counts = SparseMatrix::from_dense(&[
        vec![1.0, 1.0, 0.0],
        vec![1.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0],
    ])
    .unwrap();
    let p = Method::MaximumLikelihood.normalize(&counts).unwrap();
    assert_eq!(p.row(2).count(), 0);
    assert_eq!(p.nnz(), 4);
}

#[test]
fn sliding_window_flag_is_honoured() {
    let traj = vec![0, 1, 0, 1, 0, 1, 0];
    let mut sliding = Msm::new(MsmConfig::new(2)).unwrap();
    sliding.fit(&[traj.clone()]).unwrap();
    let mut strided = Msm::new(MsmConfig::new(2).with_sliding_window(false)).unwrap();
    strided.fit(&[traj]).unwrap();
    assert_eq!(sliding.tcounts().unwrap().sum(), 5.0);
    assert_eq!(strided.tcounts().unwrap().sum(), 3.0);
}
