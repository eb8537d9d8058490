use std::process::{Command, Output};

#[derive(Debug)]
struct Report {
    total_energy_kwh: f64,
    theoretical_max_kw: f64,
    actual_max_kw: f64,
    concurrency_pct: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_reports() {
    let baseline = run_and_parse_report(&["--scenario", "scenarios/baseline.toml"]);
    let mixed = run_and_parse_report(&["--scenario", "scenarios/mixed_site.toml"]);
    let depot = run_and_parse_report(&["--scenario", "scenarios/depot_hourly.toml"]);

    for report in [&baseline, &mixed, &depot] {
        assert!(report.total_energy_kwh > 0.0, "{report:?}");
        assert!(report.actual_max_kw <= report.theoretical_max_kw + 1e-6, "{report:?}");
        assert!((0.0..=100.0).contains(&report.concurrency_pct), "{report:?}");
    }

    assert!((depot.theoretical_max_kw - 132.0).abs() < 1e-6);
    assert!(
        (baseline.theoretical_max_kw - mixed.theoretical_max_kw).abs() > 1.0,
        "expected baseline and mixed site ratings to differ: baseline={:.2}, mixed={:.2}",
        baseline.theoretical_max_kw,
        mixed.theoretical_max_kw
    );
}

#[test]
fn presets_run_via_cli() {
    for preset in ["baseline", "single", "mixed", "rush_hour"] {
        let report = run_and_parse_report(&["--preset", preset, "--seed", "7"]);
        assert!(report.concurrency_pct <= 100.0, "{preset}: {report:?}");
    }
}

#[test]
fn same_seed_prints_the_same_report() {
    let args = ["--preset", "single", "--seed", "11"];
    let first = stdout_of(&run(&args));
    let second = stdout_of(&run(&args));
    assert_eq!(first, second);
}

#[test]
fn date_range_restricts_reported_ticks() {
    let stdout = stdout_of(&run(&[
        "--preset",
        "single",
        "--seed",
        "3",
        "--from",
        "2025-01-01",
        "--to",
        "2025-01-02",
    ]));
    // 15-minute ticks.
    assert_eq!(parse_value(&stdout, "Ticks:"), 96.0);
}

#[test]
fn aggregate_prints_one_row_per_day() {
    let stdout = stdout_of(&run(&[
        "--preset",
        "single",
        "--seed",
        "5",
        "--aggregate",
        "daily",
    ]));
    let rows = section_rows(&stdout, "--- Average power per daily window (kW) ---");
    assert_eq!(rows.len(), 365);
    assert!(rows[0].starts_with("2025-01-01T00:00:00,"), "{}", rows[0]);
}

#[test]
fn sweep_prints_one_line_per_count() {
    let stdout = stdout_of(&run(&["--preset", "single", "--seed", "9", "--sweep", "3"]));
    assert!(stdout.contains("--- Chargepoint Sweep (11 kW) ---"), "{stdout}");
    let lines: Vec<&str> = stdout
        .lines()
        .filter(|l| l.starts_with("Chargepoints "))
        .collect();
    assert_eq!(lines.len(), 3, "{stdout}");
    assert!(lines[2].starts_with("Chargepoints   3:"), "{}", lines[2]);
}

#[test]
fn unknown_preset_fails() {
    let output = run(&["--preset", "nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope"), "{stderr}");
    assert!(stderr.contains("rush_hour"), "{stderr}");
}

#[test]
fn invalid_scenario_file_fails() {
    let output = run(&["--scenario", "scenarios/does_not_exist.toml"]);
    assert!(!output.status.success());
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ev-charge-sim"))
        .args(args)
        .output()
        .expect("ev-charge-sim process should run")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8")
}

fn run_and_parse_report(args: &[&str]) -> Report {
    let stdout = stdout_of(&run(args));
    Report {
        total_energy_kwh: parse_value(&stdout, "Total energy:"),
        theoretical_max_kw: parse_value(&stdout, "Theoretical max power:"),
        actual_max_kw: parse_value(&stdout, "Actual max power:"),
        concurrency_pct: parse_value(&stdout, "Concurrency factor:"),
    }
}

fn parse_value(stdout: &str, label: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid format for line `{line}`"));
    let number = raw
        .split(|c: char| c == '%' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    number
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed to parse value from line `{line}`"))
}

/// CSV rows below `header`, without the column header, up to the next blank line.
fn section_rows<'a>(stdout: &'a str, header: &str) -> Vec<&'a str> {
    stdout
        .lines()
        .skip_while(|line| *line != header)
        .skip(2)
        .take_while(|line| !line.is_empty())
        .collect()
}
