use std::fs;
use std::path::PathBuf;

/// Minimal sim-mode config: fast sampling, two scale hypotheses.
pub const BASE_CONFIG: &str = r#"
[bus]
address = 0x4f

[sampling]
samples_per_point = 5
discard_extremes = 1
interval_ms = 0

[decode]
scales = [["per_10", 10.0], ["per_16", 16.0]]
expected_f = 70.0
tolerance_f = 12.0

[rate]
duration_ms = 50
"#;

pub fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("probe.toml");
    fs::write(&path, format!("{BASE_CONFIG}\n{extra}")).unwrap();
    path
}
