use serde_json::Value;
use std::io::Write;
use std::process::{Command, Stdio};

/// Run csvreport with CSV on stdin; stdout on success, stderr on failure
fn run_csvreport(args: &[&str], csv_content: &str) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_csvreport"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    // The child may exit before reading stdin (argument or config errors)
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(csv_content.as_bytes());
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

fn report_json(args: &[&str], csv_content: &str) -> Value {
    let stdout = run_csvreport(args, csv_content).expect("csvreport failed");
    serde_json::from_slice(&stdout).expect("stdout is not JSON")
}

fn kinds(report: &Value) -> Vec<String> {
    report["charts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["kind"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_report_monthly_from_stdin() {
    let csv = std::fs::read_to_string("test/monthly.csv").expect("Failed to read test CSV");
    let report = report_json(&["report"], &csv);

    assert_eq!(report["title"], "CSV Report");
    assert_eq!(report["x_column"], "month");
    assert_eq!(report["kpis"][0]["label"], "Total Rows");
    assert_eq!(report["kpis"][0]["value"], "3");
    assert_eq!(report["kpis"][1]["label"], "Avg sales");
    assert_eq!(report["kpis"][1]["value"], "21.67");

    let breakdown = &report["breakdown"];
    assert_eq!(breakdown["title"], "Share of sales by month");
    assert_eq!(breakdown["rows"][2]["category"], "Mar");
    assert_eq!(breakdown["rows"][2]["percent"], 53.85);
    assert_eq!(breakdown["rows"][2]["active_dots"], 11);

    let trend = &report["charts"][0];
    assert_eq!(trend["kind"], "trend");
    assert_eq!(trend["categories"], serde_json::json!(["Jan", "Feb", "Mar"]));
    assert_eq!(trend["series"][0]["values"], serde_json::json!([10.0, 20.0, 35.0]));

    let row = &report["table"][0];
    assert_eq!(row["column"], "sales");
    assert_eq!(row["count"], 3);
    assert_eq!(row["sum"], "65.00");
    assert_eq!(row["min"], "10.00");
    assert_eq!(row["max"], "35.00");
    assert_eq!(row["avg"], "21.67");
}

#[test]
fn test_report_from_file_with_selection() {
    let report = report_json(
        &["report", "test/sales.csv", "--x", "region", "--y", "sales"],
        "",
    );

    assert_eq!(report["x_column"], "region");
    assert_eq!(
        kinds(&report),
        vec!["trend", "distribution", "comparison", "grouped_bar", "area", "scatter"]
    );

    let pie = &report["charts"][1];
    assert_eq!(pie["title"], "sales share by region");
    let slices: Vec<(String, f64)> = pie["slices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["name"].as_str().unwrap().to_string(), s["value"].as_f64().unwrap()))
        .collect();
    assert_eq!(
        slices,
        vec![
            ("North".to_string(), 260.0),
            ("South".to_string(), 205.0),
            ("East".to_string(), 160.0),
        ]
    );
}

#[test]
fn test_report_unknown_x_falls_back() {
    let report = report_json(&["report", "test/sales.csv", "--x", "nope"], "");
    assert_eq!(report["x_column"], "month");
}

#[test]
fn test_report_header_only_is_empty() {
    let report = report_json(&["report", "test/header_only.csv"], "");
    assert_eq!(report["kpis"], serde_json::json!([]));
    assert!(report["breakdown"].is_null());
    assert_eq!(report["charts"], serde_json::json!([]));
    assert_eq!(report["table"], serde_json::json!([]));
}

#[test]
fn test_report_without_dynamic_typing() {
    let csv = std::fs::read_to_string("test/monthly.csv").expect("Failed to read test CSV");
    let report = report_json(&["report", "--no-dynamic-typing"], &csv);
    assert_eq!(report["table"][0]["sum"], "65.00");
}

#[test]
fn test_chart_missing_kind_fails() {
    let csv = std::fs::read_to_string("test/text_only.csv").expect("Failed to read test CSV");
    let result = run_csvreport(&["chart", "--kind", "trend"], &csv);
    let stderr = result.expect_err("chart should fail without numeric columns");
    assert!(stderr.contains("No trend chart"), "stderr: {}", stderr);
}

#[test]
fn test_chart_rejects_unknown_kind() {
    let result = run_csvreport(&["chart", "--kind", "radar"], "a,b\n1,2\n");
    assert!(result.is_err());
}

#[test]
fn test_missing_config_file_fails() {
    let result = run_csvreport(&["report", "--config", "does-not-exist.json"], "a\n1\n");
    let stderr = result.expect_err("missing config should fail");
    assert!(stderr.contains("does-not-exist.json"), "stderr: {}", stderr);
}
