#![no_main]
use libfuzzer_sys::fuzz_target;

use tankctl_core::chassis::ChassisScales;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must either be rejected or yield a config whose
    // validation and scale derivation never panic.
    let Ok(cfg) = tankctl_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    let _ = ChassisScales::try_from(&cfg.chassis);
});
