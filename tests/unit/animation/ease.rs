use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in [Ease::Linear, Ease::OutCubic, Ease::OutElastic] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}

#[test]
fn out_cubic_is_monotonic() {
    let mut prev = Ease::OutCubic.apply(0.0);
    for i in 1..=100 {
        let v = Ease::OutCubic.apply(i as f64 / 100.0);
        assert!(v >= prev);
        prev = v;
    }
}

#[test]
fn out_elastic_overshoots_then_settles() {
    let samples: Vec<f64> = (1..100).map(|i| Ease::OutElastic.apply(i as f64 / 100.0)).collect();
    let max = samples.iter().cloned().fold(f64::MIN, f64::max);
    assert!(max > 1.0, "expected overshoot, max was {max}");
    assert!((samples[98] - 1.0).abs() < 0.01);
    assert!(samples.iter().all(|v| *v >= 0.0));
}

#[test]
fn out_of_range_inputs_clamp() {
    assert_eq!(Ease::OutCubic.apply(-3.0), 0.0);
    assert_eq!(Ease::OutElastic.apply(7.0), 1.0);
}
