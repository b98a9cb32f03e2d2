//! Integration test: curve construction, areas and operating points

use ndarray::{array, Array1};
use rand::prelude::*;
use rand::rngs::StdRng;
use roc_calibrate::prelude::*;

/// Mann-Whitney estimate of the AUC, ties counted as one half
fn pairwise_auc(labels: &Array1<f64>, scores: &Array1<f64>) -> f64 {
    let mut wins = 0.0;
    let mut pairs = 0.0;
    for (&lp, &sp) in labels.iter().zip(scores.iter()) {
        if lp != 1.0 {
            continue;
        }
        for (&ln, &sn) in labels.iter().zip(scores.iter()) {
            if ln != 0.0 {
                continue;
            }
            pairs += 1.0;
            if sp > sn {
                wins += 1.0;
            } else if sp == sn {
                wins += 0.5;
            }
        }
    }
    wins / pairs
}

fn random_scores(n: usize, seed: u64, levels: u32) -> (Array1<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let labels: Array1<f64> = (0..n).map(|i| (i % 3 == 0) as u8 as f64).collect();
    let scores: Array1<f64> = labels
        .iter()
        .map(|&l| (rng.gen_range(0..levels) as f64 + l * 2.0) / levels as f64)
        .collect();
    (labels, scores)
}

#[test]
fn test_six_sample_example_matches_pairwise_auc() {
    let target = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    let score = array![0.0, 0.1, 0.4, 0.35, 0.8, 1.0];

    let curve = roc_curve(&target, &score, None, &CurveConfig::default()).unwrap();
    let area = full_auc(&curve);
    assert!((area - pairwise_auc(&target, &score)).abs() < 1e-6);
    assert!((area - 8.0 / 9.0).abs() < 1e-12);
}

#[test]
fn test_random_data_with_ties_matches_pairwise_auc() {
    for seed in 0..5 {
        let (labels, scores) = random_scores(200, seed, 7);
        let curve = roc_curve(&labels, &scores, None, &CurveConfig::default()).unwrap();
        let expected = pairwise_auc(&labels, &scores);
        assert!((full_auc(&curve) - expected).abs() < 1e-9, "seed {}", seed);

        let thin = roc_curve(
            &labels,
            &scores,
            None,
            &CurveConfig::new().with_drop_intermediate(true),
        )
        .unwrap();
        assert!(thin.len() <= curve.len());
        assert!((full_auc(&thin) - expected).abs() < 1e-9);
    }
}

#[test]
fn test_curve_invariants() {
    let (labels, scores) = random_scores(150, 42, 20);
    let curve = roc_curve(&labels, &scores, None, &CurveConfig::default()).unwrap();
    let n = curve.len();

    assert_eq!((curve.fpr()[0], curve.tpr()[0]), (0.0, 0.0));
    assert_eq!((curve.fpr()[n - 1], curve.tpr()[n - 1]), (1.0, 1.0));
    let max_score = scores.fold(f64::NEG_INFINITY, |m, &s| m.max(s));
    assert_eq!(curve.thresholds()[0], max_score + 1.0);
    for i in 1..n {
        assert!(curve.fpr()[i] >= curve.fpr()[i - 1]);
        assert!(curve.tpr()[i] >= curve.tpr()[i - 1]);
        assert!(curve.thresholds()[i] < curve.thresholds()[i - 1]);
    }
}

#[test]
fn test_partial_auc_windows() {
    let (labels, scores) = random_scores(120, 7, 10);
    let curve = roc_curve(&labels, &scores, None, &CurveConfig::default()).unwrap();
    let full = full_auc(&curve);

    for kind in [RateKind::Sensitivity, RateKind::Specificity] {
        assert_eq!(partial_auc(&curve, 0.0, 1.0, kind).unwrap(), full);
        let part = partial_auc(&curve, 0.8, 1.0, kind).unwrap();
        assert!(part >= -1e-12 && part <= 0.2 + 1e-12, "{:?} {}", kind, part);
        assert!(matches!(
            partial_auc(&curve, 0.6, 0.6, kind),
            Err(RocError::DomainError(_))
        ));
    }
}

#[test]
fn test_standard_error_shrinks_with_sample_size() {
    let small = ClassCounts::new(10.0, 10.0).unwrap();
    let large = ClassCounts::new(1000.0, 1000.0).unwrap();
    assert!(auc_standard_error(0.8, large) < auc_standard_error(0.8, small));
}

#[test]
fn test_operating_points_on_random_curve() {
    let (labels, scores) = random_scores(300, 3, 50);
    let dataset = Dataset::new(&labels, &scores).unwrap();
    let curve = RocCurve::from_dataset(&dataset, false).unwrap();
    let counts = dataset.class_counts().unwrap();

    let j = max_youden_j(&curve);
    let scan = curve
        .points()
        .map(|p| p.tpr + (1.0 - p.fpr) - 1.0)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(j.value, scan);

    let ppv = best_ppv(&curve, counts, 1.0).unwrap();
    let top_ppv = curve
        .points()
        .filter(|p| p.tpr > 0.0)
        .map(|p| roc_calibrate::operating::positive_predictive_value(p.tpr, p.fpr, counts))
        .fold(0.0, f64::max);
    assert_eq!(ppv.value, top_ppv);

    let npv = best_npv(&curve, counts, 1.0).unwrap();
    let top_npv = curve
        .points()
        .filter(|p| p.fpr < 1.0)
        .map(|p| roc_calibrate::operating::negative_predictive_value(p.tpr, p.fpr, counts))
        .fold(0.0, f64::max);
    assert_eq!(npv.value, top_npv);

    let np = neyman_pearson(&curve, 0.9, RateKind::Sensitivity).unwrap();
    assert!(np.tpr >= 0.9);
    let err = bayes_error(&curve, counts);
    assert!(err.value >= 0.0 && err.value <= 0.5 + 1e-12);
}

#[test]
fn test_single_class_is_rejected() {
    let result = roc_curve(&array![1.0, 1.0], &array![0.2, 0.3], None, &CurveConfig::default());
    assert!(matches!(result, Err(RocError::InputError(_))));
}
