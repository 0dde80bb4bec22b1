#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary TOML must either fail to parse, fail validation, or yield a
// config whose derived address lists respect the 7-bit bound. Never panic.
fuzz_target!(|data: &str| {
    let Ok(cfg) = probe_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        assert!(cfg.explore_addresses().iter().all(|&a| a <= 0x7f));
        assert!(cfg.csv_addresses().iter().all(|&a| a <= 0x7f));
        assert!(!cfg.explore.registers.is_empty());
    }
});
