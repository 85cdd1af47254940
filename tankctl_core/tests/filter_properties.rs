use proptest::prelude::*;
use tankctl_core::filter::{AverageFilter, ComposableFilter, EmaFilter, Filter, MedianFilter};

proptest! {
    #[test]
    fn average_is_mean_of_last_n(xs in prop::collection::vec(-1.0e3f64..1.0e3, 1..40)) {
        let mut f = AverageFilter::<4>::new();
        let mut out = 0.0;
        for &x in &xs {
            out = f.filter(x);
        }
        // zero-filled before the window is full
        let tail: Vec<f64> = xs.iter().rev().take(4).copied().collect();
        let expected = tail.iter().sum::<f64>() / 4.0;
        prop_assert!((out - expected).abs() < 1e-9, "out={out} expected={expected}");
        prop_assert_eq!(f.output(), out);
    }

    #[test]
    fn composable_equals_nested_application(xs in prop::collection::vec(-1.0e3f64..1.0e3, 1..40)) {
        let mut chain = ComposableFilter::new()
            .with_filter(AverageFilter::<3>::new())
            .with_filter(EmaFilter::new(0.5).unwrap())
            .with_filter(MedianFilter::<3>::new());
        let mut a = AverageFilter::<3>::new();
        let mut b = EmaFilter::new(0.5).unwrap();
        let mut c = MedianFilter::<3>::new();

        for &x in &xs {
            let nested = c.filter(b.filter(a.filter(x)));
            let chained = chain.filter(x);
            prop_assert_eq!(chained, nested);
        }
        prop_assert_eq!(chain.output(), c.output());
    }

    #[test]
    fn empty_chain_always_outputs_zero(xs in prop::collection::vec(any::<f64>(), 0..20)) {
        let mut chain = ComposableFilter::new();
        for &x in &xs {
            prop_assert_eq!(chain.filter(x), 0.0);
        }
        prop_assert_eq!(chain.output(), 0.0);
    }
}

#[test]
fn shared_stage_is_observable_outside_the_chain() {
    let stage = tankctl_core::filter::shared(AverageFilter::<2>::new());
    let mut chain = ComposableFilter::new();
    chain.add_filter(stage.clone());
    chain.filter(6.0);
    assert_eq!(stage.lock().output(), 3.0);
}
