use rstest::rstest;
use tankctl_hardware::error::HwError;
use tankctl_hardware::{MotorMode, SimulatedChassis, SimulatedMotor, SimulatedSensor};
use tankctl_traits::{
    ChassisModel, ControllerInput, ControllerOutput, EncoderUnits, Gearset, PositionMotor,
};

#[test]
fn position_mode_slews_and_lands_exactly() {
    let mut m = SimulatedMotor::new(Gearset::Green)
        .with_max_ticks_per_read(10.0)
        .unwrap();
    m.move_absolute(25.0, 200);
    assert_eq!(m.position(), 10.0);
    assert_eq!(m.position(), 20.0);
    assert_eq!(m.position(), 25.0);
    assert_eq!(m.position(), 25.0);
}

#[test]
fn half_velocity_halves_slew() {
    let mut m = SimulatedMotor::new(Gearset::Green)
        .with_max_ticks_per_read(10.0)
        .unwrap();
    m.move_absolute(-100.0, 100);
    assert_eq!(m.position(), -5.0);
}

#[test]
fn voltage_output_drives_position() {
    let mut m = SimulatedMotor::default();
    m.controller_set(-0.5);
    assert_eq!(m.controller_get(), -10.0);
    m.move_velocity(0);
    assert_eq!(m.mode(), MotorMode::Idle);
    assert_eq!(m.controller_get(), -10.0);
}

#[test]
fn clones_share_state() {
    let m = SimulatedMotor::default();
    let mut handle = m.clone();
    handle.move_absolute(5.0, 200);
    assert_eq!(m.position(), 5.0);
    assert_eq!(handle.peek_position(), 5.0);
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(f64::NAN)]
fn rejects_non_positive_slew(#[case] ticks: f64) {
    let err = SimulatedMotor::default()
        .with_max_ticks_per_read(ticks)
        .unwrap_err();
    assert!(matches!(err, HwError::InvalidParameter(_)));
}

#[test]
fn scripted_sensor_holds_last_value() {
    let mut s = SimulatedSensor::new(vec![1.0, 2.0]).unwrap();
    assert_eq!(s.controller_get(), 1.0);
    assert_eq!(s.controller_get(), 2.0);
    assert_eq!(s.controller_get(), 2.0);
    assert_eq!(s.remaining(), 0);
    assert_eq!(SimulatedSensor::new(Vec::new()).unwrap_err(), HwError::EmptyScript);
}

#[test]
fn chassis_configures_both_sides() {
    let mut c = SimulatedChassis::default();
    c.set_gearing(Gearset::Blue);
    c.set_encoder_units(EncoderUnits::Counts);
    assert_eq!(c.left().gearing(), Gearset::Blue);
    assert_eq!(c.right().encoder_units(), EncoderUnits::Counts);
}

#[test]
fn arcade_normalises_outputs() {
    let mut c = SimulatedChassis::default();
    c.arcade(1.0, 1.0);
    assert_eq!(c.left().mode(), MotorMode::Voltage(1.0));
    assert_eq!(c.right().mode(), MotorMode::Voltage(0.0));
}

#[test]
fn stop_idles_and_reset_tares() {
    let mut c = SimulatedChassis::default();
    c.forward(1.0);
    let v = c.sensor_vals();
    assert_eq!((v.left, v.right), (20.0, 20.0));
    c.stop();
    assert_eq!(c.left().mode(), MotorMode::Idle);
    c.reset_sensors();
    assert_eq!(c.sensor_vals().left, 0.0);
}
