use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const EXTRACT: &str = "\
trade_flow,date,commodity_id,country_id,naics_id,district_id,amount,qty_1,unit_1,qty_2,unit_2
1,2021-03-15,1,10,,,100,10,kg,,
2,2021-03-20,2,10,,,50,5,kg,,
";

fn write_fixtures(dir: &Path) {
    let reference = dir.join("reference");
    std::fs::create_dir_all(&reference).unwrap();
    std::fs::write(
        reference.join("commodity.csv"),
        "id,code,description\n1,0101210000,\n2,0102290000,\n",
    )
    .unwrap();
    std::fs::write(
        reference.join("country.csv"),
        "id,code,description\n10,1220,CANADA\n",
    )
    .unwrap();
    std::fs::write(dir.join("extract.csv"), EXTRACT).unwrap();
}

fn trade_stats(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_trade-stats"));
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_aggregate_monthly_commodity_csv() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let status = trade_stats(dir.path())
        .args([
            "aggregate",
            "-i",
            "extract.csv",
            "--reference-dir",
            "reference",
            "-t",
            "monthly",
            "-d",
            "hts",
            "-o",
            "out/monthly_hts.csv",
        ])
        .status()
        .expect("Failed to run trade-stats");
    assert!(status.success());

    let output = std::fs::read_to_string(dir.path().join("out/monthly_hts.csv")).unwrap();
    let mut lines = output.lines();
    assert_eq!(
        lines.next(),
        Some("year,month,hts_id,hts_code,imports,exports,qty_imports,qty_exports,net_exports,net_qty")
    );
    assert_eq!(lines.clone().count(), 2);
    assert!(output.contains("2021,3,1,0101210000,100,0,"));
    assert!(output.contains("2021,3,2,0102290000,0,50,"));
}

#[test]
fn test_aggregate_rejects_weekly() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let output = trade_stats(dir.path())
        .args([
            "aggregate",
            "-i",
            "extract.csv",
            "--reference-dir",
            "reference",
            "-t",
            "weekly",
        ])
        .output()
        .expect("Failed to run trade-stats");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid selector"));
}

#[test]
fn test_aggregate_naics_on_institute_fails() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let output = trade_stats(dir.path())
        .args([
            "aggregate",
            "-i",
            "extract.csv",
            "--reference-dir",
            "reference",
            "-d",
            "naics",
        ])
        .output()
        .expect("Failed to run trade-stats");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not available"));
}

#[test]
fn test_aggregate_all_with_filter_rejected() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let output = trade_stats(dir.path())
        .args([
            "aggregate",
            "-i",
            "extract.csv",
            "--reference-dir",
            "reference",
            "--all",
            "--filter",
            "0101",
        ])
        .output()
        .expect("Failed to run trade-stats");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be used with"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_aggregate_all_writes_every_supported_selector() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let status = trade_stats(dir.path())
        .args([
            "aggregate",
            "-i",
            "extract.csv",
            "--reference-dir",
            "reference",
            "--all",
            "-o",
            "out",
        ])
        .status()
        .expect("Failed to run trade-stats");
    assert!(status.success());
    assert!(dir.path().join("out/institute_yearly_total.csv").exists());
    assert!(dir.path().join("out/institute_monthly_commodity.csv").exists());
}

#[test]
fn test_prices_writes_view() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let status = trade_stats(dir.path())
        .args([
            "prices",
            "-i",
            "extract.csv",
            "--reference-dir",
            "reference",
            "-o",
            "prices.csv",
        ])
        .status()
        .expect("Failed to run trade-stats");
    assert!(status.success());

    let output = std::fs::read_to_string(dir.path().join("prices.csv")).unwrap();
    assert!(output.starts_with("date,hs4,"));
    assert!(output.contains("2021-03-01,0101,"));
    assert!(output.contains("2021-03-01,0102,"));
}

#[test]
fn test_units_lists_table() {
    let dir = tempdir().unwrap();
    let output = trade_stats(dir.path())
        .arg("units")
        .output()
        .expect("Failed to run trade-stats");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kg"));
    assert!(stdout
        .lines()
        .any(|l| l.starts_with("m3") && l.contains("disputed")));
}

#[test]
fn test_units_uppercase_config_key_overrides_default() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("units.toml"),
        "[units.factors.M3]\nfactor = 1560\n",
    )
    .unwrap();

    let output = trade_stats(dir.path())
        .args(["units", "--config", "units.toml"])
        .output()
        .expect("Failed to run trade-stats");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let m3: Vec<&str> = stdout.lines().filter(|l| l.starts_with("m3")).collect();
    assert_eq!(m3.len(), 1);
    assert!(m3[0].contains("1560"));
    assert!(!stdout.lines().any(|l| l.starts_with("M3")));
}
