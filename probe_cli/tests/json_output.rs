use assert_cmd::prelude::*;
use rstest::rstest;
use std::process::Command;
use tempfile::tempdir;

mod common;
use common::write_config;

fn run_json(args: &[&str], env: &[(&str, &str)]) -> (i32, String) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let mut cmd = Command::cargo_bin("probe").unwrap();
    cmd.arg("--json").arg("--config").arg(&cfg).args(args);
    for (k, v) in env {
        cmd.env(k, v);
    }
    let out = cmd.output().unwrap();
    (
        out.status.code().unwrap_or(-1),
        String::from_utf8(out.stdout).unwrap(),
    )
}

fn parse_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON {l:?}: {e}")))
        .collect()
}

#[rstest]
fn decode_emits_one_object_per_candidate() {
    let (code, stdout) = run_json(&["decode", "--bytes", "0x01", "0x90"], &[]);
    assert_eq!(code, 0);
    let rows = parse_lines(&stdout);
    // 2 byte orders × 2 signedness × 2 scales
    assert_eq!(rows.len(), 8);
    for r in &rows {
        for key in [
            "byte_order",
            "signedness",
            "scale",
            "divisor",
            "raw",
            "value",
            "celsius",
            "fahrenheit",
            "plausible",
            "bytes",
        ] {
            assert!(r.get(key).is_some(), "missing {key} in {r}");
        }
    }
    assert_eq!(rows[0]["byte_order"], "as_read");
    assert_eq!(rows[0]["signedness"], "unsigned");
    assert_eq!(rows[0]["raw"], 400);
    let plausible: Vec<_> = rows.iter().filter(|r| r["plausible"] == true).collect();
    assert_eq!(plausible.len(), 2);
    assert!(plausible.iter().all(|r| r["scale"] == "per_16"));
}

#[rstest]
fn sample_reports_counts() {
    let (code, stdout) = run_json(&["sample"], &[]);
    assert_eq!(code, 0);
    let rows = parse_lines(&stdout);
    assert_eq!(rows.len(), 1);
    let v = &rows[0];
    assert_eq!(v["mean"], 400.0);
    assert_eq!(v["attempted"], 5);
    assert_eq!(v["valid"], 5);
    assert_eq!(v["discarded"], 2);
    assert_eq!(v["low_confidence"], false);
}

#[rstest]
fn rate_reports_intervals() {
    let (code, stdout) = run_json(&["rate", "--duration-ms", "30"], &[("PROBE_SIM_STEP", "1")]);
    assert_eq!(code, 0);
    let v = &parse_lines(&stdout)[0];
    assert!(v["changes"].as_u64().unwrap() >= 1);
    assert!(v["rate_hz"].as_f64().unwrap() > 0.0);
    assert!(v["succeeded"].as_u64().unwrap() <= v["attempted"].as_u64().unwrap());
}

#[rstest]
#[case(&["sample"], &[("PROBE_SIM_FAIL", "1")], 3, "InsufficientSamples")]
#[case(&["rate"], &[], 4, "InsufficientChanges")]
#[case(&["calibrate", "--no-prompt"], &[], 5, "DegenerateFit")]
fn failures_are_structured(
    #[case] args: &[&str],
    #[case] env: &[(&str, &str)],
    #[case] code: i32,
    #[case] reason: &str,
) {
    let (got, stdout) = run_json(args, env);
    assert_eq!(got, code);
    let v = parse_lines(&stdout).pop().unwrap();
    assert_eq!(v["reason"], reason);
    assert!(v["details"].is_object());
    assert!(v["message"].as_str().unwrap().starts_with("What happened"));
}

#[rstest]
fn explore_reports_single_byte_reads_undecoded() {
    let (code, stdout) = run_json(&["explore"], &[]);
    assert_eq!(code, 0);
    let rows = parse_lines(&stdout);
    let bytes: Vec<_> = rows.iter().filter(|r| r.get("byte").is_some()).collect();
    assert_eq!(bytes.len(), 2);
    for r in bytes {
        assert_eq!(r["byte"], 1);
        assert_eq!(r["location"]["mode"], "byte");
        assert!(r.get("celsius").is_none());
    }
}

#[rstest]
fn read_failures_report_hardware_reason() {
    let (code, stdout) = run_json(&["self-check"], &[("PROBE_SIM_FAIL", "1")]);
    assert_eq!(code, 1);
    let v = parse_lines(&stdout).pop().unwrap();
    assert_eq!(v["reason"], "Hardware");
    assert!(v["message"].as_str().unwrap().contains("simulated read failure"));
}
