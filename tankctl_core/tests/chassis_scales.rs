use rstest::rstest;
use tankctl_core::chassis::ChassisScales;
use tankctl_core::error::ControlError;
use tankctl_core::units::{INCH, METER, UnitExt};

fn assert_invalid(err: eyre::Report) {
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::InvalidConfiguration(_)) => {}
        other => panic!("expected InvalidConfiguration, got: {other:?}"),
    }
}

#[rstest]
#[case(4.0, 12.0, 900)]
#[case(4.0, 11.5, 360)]
#[case(3.25, 10.0, 1800)]
#[case(2.75, 15.0, 300)]
fn measurements_round_trip_through_ratios(
    #[case] diameter_in: f64,
    #[case] track_in: f64,
    #[case] tpr: u32,
) {
    let m = ChassisScales::from_measurements(&[diameter_in.inch(), track_in.inch()], tpr).unwrap();
    let r = ChassisScales::from_ratios(&[m.straight(), m.turn()], tpr).unwrap();

    assert!((r.wheel_diameter().convert(INCH) - diameter_in).abs() < 1e-9);
    assert!((r.track_width().convert(INCH) - track_in).abs() < 1e-9);
    assert!((r.straight() - m.straight()).abs() < 1e-9);
}

#[test]
fn straight_scale_is_ticks_per_meter() {
    let s = ChassisScales::from_measurements(&[4.0.inch(), 12.0.inch()], 900).unwrap();
    let expected = 900.0 / (4.0 * 0.0254 * std::f64::consts::PI);
    assert!((s.straight() - expected).abs() < 1e-9);
    assert!((s.turn() - 3.0).abs() < 1e-12);
    assert!((s.wheel_diameter().convert(METER) - 0.1016).abs() < 1e-12);
}

#[rstest]
#[case::none(&[])]
#[case::one(&[4.0])]
fn too_few_measurements_is_invalid(#[case] inches: &[f64]) {
    let dims: Vec<_> = inches.iter().map(|v| v.inch()).collect();
    assert_invalid(ChassisScales::from_measurements(&dims, 900).unwrap_err());
}

#[rstest]
#[case::one(&[1000.0])]
#[case::three(&[1000.0, 3.0, 0.1])]
fn bad_ratio_count_is_invalid(#[case] ratios: &[f64]) {
    assert_invalid(ChassisScales::from_ratios(ratios, 900).unwrap_err());
}

#[test]
fn three_measurements_set_middle_distance_only() {
    let s =
        ChassisScales::from_measurements(&[4.0.inch(), 12.0.inch(), 2.0.inch()], 360).unwrap();
    assert!((s.middle_wheel_distance().convert(INCH) - 2.0).abs() < 1e-12);
    assert_eq!(s.middle_wheel_diameter(), s.wheel_diameter());
}
