use rstest::rstest;
use tankctl_config::{Cartridge, load_toml};

const MEASURED: &str = r#"
[chassis]
wheel_diameter_in = 4.0
track_width_in = 11.5
"#;

#[test]
fn minimal_config_uses_defaults() {
    let cfg = load_toml(MEASURED).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.chassis.ticks_per_rev(), 360);
    assert_eq!(cfg.gearset.cartridge, Cartridge::Green);
    assert_eq!(cfg.gearset.ratio, 1.0);
    assert_eq!(cfg.settle.at_target_error, 50.0);
    assert_eq!(cfg.settle.at_target_derivative, 5.0);
    assert_eq!(cfg.settle.at_target_time_ms, 250);
    assert_eq!(cfg.timing.loop_period_ms, 10);
    assert!(cfg.filter.ema_alpha.is_none());
}

#[test]
fn parses_full_config() {
    let toml = r#"
[chassis]
ticks_per_rev = 900
straight = 1400.0
turn = 2.875
middle_wheel_distance_in = 3.0
middle = 1200.0

[gearset]
cartridge = "blue"
ratio = 0.6

[settle]
at_target_error = 20.0
at_target_derivative = 2.0
at_target_time_ms = 100

[timing]
loop_period_ms = 5

[pid]
kp = 0.002
ki = 0.0
kd = 0.0

[filter]
ema_alpha = 0.5

[logging]
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.gearset.cartridge, Cartridge::Blue);
    assert!(cfg.chassis.is_ratios());
    assert_eq!(cfg.pid.kp, 0.002);
    assert_eq!(cfg.filter.ema_alpha, Some(0.5));
}

#[test]
fn rejects_missing_chassis_table() {
    assert!(load_toml("[gearset]\nratio = 1.0\n").is_err());
}

#[test]
fn rejects_unknown_cartridge() {
    let toml = format!("{MEASURED}\n[gearset]\ncartridge = \"purple\"\n");
    assert!(load_toml(&toml).is_err());
}

#[rstest]
#[case::zero_ratio("[gearset]\nratio = 0.0", "gearset.ratio must be > 0")]
#[case::negative_ratio("[gearset]\nratio = -2.0", "gearset.ratio must be > 0")]
#[case::zero_period("[timing]\nloop_period_ms = 0", "timing.loop_period_ms must be >= 1")]
#[case::bad_alpha("[filter]\nema_alpha = 1.5", "filter.ema_alpha must be in (0.0, 1.0]")]
#[case::bad_rotation("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
#[case::neg_error("[settle]\nat_target_error = -1.0", "settle.at_target_error must be >= 0")]
#[case::zero_slew("[sim]\nmax_ticks_per_read = 0.0", "sim.max_ticks_per_read must be > 0")]
fn rejects_invalid_sections(#[case] extra: &str, #[case] msg: &str) {
    let toml = format!("{MEASURED}\n{extra}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(msg), "got: {err}");
}

#[rstest]
#[case::neither("[chassis]\nticks_per_rev = 360", "chassis requires either")]
#[case::both(
    "[chassis]\nwheel_diameter_in = 4.0\ntrack_width_in = 12.0\nstraight = 1.0\nturn = 1.0",
    "not both"
)]
#[case::zero_tpr(
    "[chassis]\nticks_per_rev = 0\nwheel_diameter_in = 4.0\ntrack_width_in = 12.0",
    "chassis.ticks_per_rev must be > 0"
)]
#[case::zero_diameter(
    "[chassis]\nwheel_diameter_in = 0.0\ntrack_width_in = 12.0",
    "chassis.wheel_diameter_in must be > 0"
)]
#[case::partial_middle(
    "[chassis]\nstraight = 1000.0\nturn = 3.0\nmiddle = 900.0",
    "must be given together"
)]
fn rejects_invalid_chassis(#[case] toml: &str, #[case] msg: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(msg), "got: {err}");
}

#[test]
fn rejects_unknown_chassis_key() {
    let toml = "[chassis]\nwheel_diameter_in = 4.0\ntrack_width_in = 12.0\nwheelbase = 3.0\n";
    assert!(load_toml(toml).is_err());
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tankctl.toml");
    std::fs::write(&path, MEASURED).expect("write");
    let text = std::fs::read_to_string(&path).expect("read");
    let cfg = load_toml(&text).expect("parse");
    assert!(cfg.chassis.is_measurements());
}
