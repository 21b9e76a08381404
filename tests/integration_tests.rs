//! Integration tests for the fabest CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get a fabest command with a clean environment
fn fabest() -> Command {
    let mut cmd = Command::cargo_bin("fabest").unwrap();
    cmd.env_remove("FABEST_MARKUP")
        .env_remove("FABEST_MATERIAL_SET")
        .env_remove("FABEST_LOG");
    cmd
}

/// Helper to create an empty project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fabest().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

const SHEET_ITEM: &str = r#"code: Test Sheet 2mm
stock_uom: Kg
valuation_rate: 200
"#;

const PIPE_ITEM: &str = r#"code: Test Pipe 25mm
stock_uom: Meter
weight_per_unit: 1.5
prices:
  - price_list: Standard Buying
    rate: 100
"#;

const MATERIAL_SET: &str = r#"name: Test SS 304
sheet_item: Test Sheet 2mm
round_pipe_item: Test Pipe 25mm
density_factor: 0.0102
"#;

const RULE_SET: &str = r#"product: Test Product
labor_formula: weight * 10
consumables_formula: "50"
components:
  - part_name: Top Sheet
    material_source: sheet
    quantity_formula: "1"
    length_formula: L
    width_formula: W
  - part_name: Legs
    material_source: round_pipe
    quantity_formula: "4"
    length_formula: H - 50
    width_formula: "0"
  - part_name: Shelf
    material_source: sheet
    condition: has_shelf
    quantity_formula: "1"
    length_formula: L - 40
    width_formula: W - 40
"#;

/// Helper to create a project with one product, one material set and its items
fn setup_seeded_project() -> TempDir {
    let tmp = setup_test_project();
    let root = tmp.path();
    fs::write(root.join("materials/items/test-sheet-2mm.yaml"), SHEET_ITEM).unwrap();
    fs::write(root.join("materials/items/test-pipe-25mm.yaml"), PIPE_ITEM).unwrap();
    fs::write(root.join("materials/sets/test-ss-304.yaml"), MATERIAL_SET).unwrap();
    fs::write(root.join("rules/test-product.yaml"), RULE_SET).unwrap();
    tmp
}

fn estimate_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "estimate",
        "Test Product",
        "-s",
        "Test SS 304",
        "-i",
        "L=1000",
        "-i",
        "W=1000",
        "-i",
        "H=1000",
        "-i",
        "has_shelf=false",
    ];
    args.extend_from_slice(extra);
    args
}

fn approx(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() < tolerance
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    fabest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("estimate"))
        .stdout(predicate::str::contains("consolidate"))
        .stdout(predicate::str::contains("order"));
}

#[test]
fn test_version_displays() {
    fabest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fabest"));
}

#[test]
fn test_completions_bash() {
    fabest()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fabest"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_structure() {
    let tmp = setup_test_project();
    let root = tmp.path();
    assert!(root.join(".fabest/config.yaml").is_file());
    for dir in ["materials/items", "materials/sets", "rules", "orders", "boms"] {
        assert!(root.join(dir).is_dir(), "missing {}", dir);
    }
}

#[test]
fn test_init_twice_reports_existing_project() {
    let tmp = setup_test_project();
    fabest()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();
    fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&[]))
        .assert()
        .failure();
}

// ============================================================================
// Estimate Tests
// ============================================================================

#[test]
fn test_estimate_json_matches_reference_numbers() {
    let tmp = setup_seeded_project();
    let output = fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["-f", "json"]))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let number = |key: &str| result[key].as_f64().unwrap();
    assert!(approx(number("weight"), 21.51, 0.01), "weight {}", number("weight"));
    assert!(approx(number("cost"), 3807.1, 0.1), "cost {}", number("cost"));
    assert!(approx(number("price"), 4949.23, 0.1), "price {}", number("price"));

    let details = result["details"].as_array().unwrap();
    assert_eq!(details.len(), 2, "shelf must be skipped");
    assert_eq!(details[0]["part"], "Top Sheet");
    assert_eq!(details[0]["cut_size"], "1000 x 1000");
    assert_eq!(details[1]["part"], "Legs");
    assert_eq!(details[1]["cut_size"], "950");
    assert_eq!(details[1]["material_item"], "Test Pipe 25mm");
    assert!(approx(details[1]["stock_qty"].as_f64().unwrap(), 3.8, 1e-9));
}

#[test]
fn test_estimate_condition_adds_component() {
    let tmp = setup_seeded_project();
    let output = fabest()
        .current_dir(tmp.path())
        .args([
            "estimate",
            "Test Product",
            "-s",
            "Test SS 304",
            "-i",
            "L=1000",
            "-i",
            "W=1000",
            "-i",
            "H=1000",
            "-i",
            "has_shelf=true",
            "-f",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let details = result["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    assert_eq!(details[2]["cut_size"], "960 x 960");
}

#[test]
fn test_estimate_table_output() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&[]))
        .assert()
        .success()
        .stdout(predicate::str::contains("Top Sheet"))
        .stdout(predicate::str::contains("Legs"))
        .stdout(predicate::str::contains("4949.2"));
}

#[test]
fn test_estimate_quiet_prints_price_only() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["--quiet"]))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4949.2"))
        .stdout(predicate::str::contains("Legs").not());
}

#[test]
fn test_estimate_csv_output() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["-f", "csv"]))
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "part,cut_size,qty,weight,stock_qty,material_item",
        ))
        .stdout(predicate::str::contains("Legs,950,4"));
}

#[test]
fn test_estimate_markup_override() {
    let tmp = setup_seeded_project();
    let output = fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["--markup", "1", "-f", "json"]))
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["price"], result["cost"]);
}

#[test]
fn test_estimate_markup_from_env() {
    let tmp = setup_seeded_project();
    let output = fabest()
        .current_dir(tmp.path())
        .env("FABEST_MARKUP", "2")
        .args(estimate_args(&["-f", "json"]))
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let cost = result["cost"].as_f64().unwrap();
    assert!(approx(result["price"].as_f64().unwrap(), cost * 2.0, 1e-6));
}

#[test]
fn test_estimate_missing_input_fails() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args([
            "estimate",
            "Test Product",
            "-s",
            "Test SS 304",
            "-i",
            "L=1000",
            "-i",
            "W=1000",
            "-i",
            "has_shelf=false",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Legs"))
        .stderr(predicate::str::contains("variable"));
}

#[test]
fn test_estimate_unknown_material_set_fails() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(["estimate", "Test Product", "-s", "Nope", "-i", "L=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_estimate_requires_material_set() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(["estimate", "Test Product", "-i", "L=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No material set given"));
}

#[test]
fn test_estimate_uses_default_set_from_env() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .env("FABEST_MATERIAL_SET", "Test SS 304")
        .args([
            "estimate",
            "Test Product",
            "-i",
            "L=1000",
            "-i",
            "W=1000",
            "-i",
            "H=1000",
            "-i",
            "has_shelf=false",
            "-q",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4949.2"));
}

#[test]
fn test_estimate_rejects_malformed_input() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(["estimate", "Test Product", "-s", "Test SS 304", "-i", "L"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_estimate_inputs_file() {
    let tmp = setup_seeded_project();
    fs::write(
        tmp.path().join("inputs.yaml"),
        "L: 1000\nW: 1000\nH: 1000\nhas_shelf: false\n",
    )
    .unwrap();
    fabest()
        .current_dir(tmp.path())
        .args([
            "estimate",
            "Test Product",
            "-s",
            "Test SS 304",
            "--inputs-file",
            "inputs.yaml",
            "-q",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4949.2"));
}

#[test]
fn test_estimate_non_finite_input_fails() {
    let tmp = setup_seeded_project();
    fs::write(
        tmp.path().join("inputs.yaml"),
        "L: .nan\nW: .inf\nH: 1000\nhas_shelf: false\n",
    )
    .unwrap();
    fabest()
        .current_dir(tmp.path())
        .args([
            "estimate",
            "Test Product",
            "-s",
            "Test SS 304",
            "--inputs-file",
            "inputs.yaml",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("finite"));
}

// ============================================================================
// Consolidate Tests
// ============================================================================

#[test]
fn test_consolidate_snapshot_file() {
    let tmp = setup_seeded_project();
    let output = fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["-f", "json"]))
        .output()
        .unwrap();
    fs::write(tmp.path().join("snapshot.json"), &output.stdout).unwrap();

    fabest()
        .current_dir(tmp.path())
        .args(["consolidate", "snapshot.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Sheet 2mm"))
        .stdout(predicate::str::contains("Test Pipe 25mm"))
        .stdout(predicate::str::contains("Cut List:"))
        .stdout(predicate::str::contains("- Legs: 950 (Qty: 4)"));
}

#[test]
fn test_consolidate_merges_same_material() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("lines.json"),
        r#"[
            {"part": "Legs", "cut_size": "950", "qty": 4, "weight": 5.7, "stock_qty": 3.8, "material_item": "Pipe"},
            {"part": "Rails", "cut_size": "500", "qty": 2, "weight": 1.5, "stock_qty": 1.0, "material_item": "Pipe"},
            {"part": "Note", "cut_size": "", "qty": 1, "weight": 0, "stock_qty": 0}
        ]"#,
    )
    .unwrap();

    let output = fabest()
        .current_dir(tmp.path())
        .args(["consolidate", "lines.json", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let bom: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let materials = bom["materials"].as_array().unwrap();
    assert_eq!(materials.len(), 1);
    assert!(approx(materials[0]["quantity"].as_f64().unwrap(), 4.8, 1e-9));
}

#[test]
fn test_consolidate_invalid_snapshot_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.json"), "{\"details\": 5}").unwrap();
    fabest()
        .current_dir(tmp.path())
        .args(["consolidate", "bad.json"])
        .assert()
        .failure();
}

// ============================================================================
// Order Tests
// ============================================================================

#[test]
fn test_order_submit_creates_bom_once() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["--save", "SO-0001", "-q"]))
        .assert()
        .success();
    assert!(tmp.path().join("orders/so-0001.yaml").is_file());

    fabest()
        .current_dir(tmp.path())
        .args(["order", "submit", "SO-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created BOM BOM-SO-0001-Test Product-1"));

    let boms: Vec<_> = fs::read_dir(tmp.path().join("boms")).unwrap().collect();
    assert_eq!(boms.len(), 1);

    let order = fs::read_to_string(tmp.path().join("orders/so-0001.yaml")).unwrap();
    assert!(order.contains("bom_no:"));
    assert!(order.contains("BOM-SO-0001-Test Product-1"));
    assert!(order.contains("BOM Created for Row 1"));

    fabest()
        .current_dir(tmp.path())
        .args(["order", "submit", "SO-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"))
        .stdout(predicate::str::contains("Created BOM").not());

    let boms: Vec<_> = fs::read_dir(tmp.path().join("boms")).unwrap().collect();
    assert_eq!(boms.len(), 1);
}

#[test]
fn test_order_submit_bad_line_is_a_warning() {
    let tmp = setup_seeded_project();
    fs::write(
        tmp.path().join("orders/so-0002.yaml"),
        r#"name: SO-0002
lines:
  - idx: 1
    item_code: Test Product
    configuration: "{not json"
"#,
    )
    .unwrap();
    fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["--save", "SO-0002", "-q"]))
        .assert()
        .success();

    fabest()
        .current_dir(tmp.path())
        .args(["order", "submit", "SO-0002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BOM-SO-0002-Test Product-2"))
        .stderr(predicate::str::contains("row 1"));
}

#[test]
fn test_estimate_save_keeps_orders_with_similar_names() {
    let tmp = setup_seeded_project();
    for order in ["SO 1", "SO-1"] {
        fabest()
            .current_dir(tmp.path())
            .args(estimate_args(&["--save", order, "-q"]))
            .assert()
            .success();
    }
    let orders: Vec<_> = fs::read_dir(tmp.path().join("orders")).unwrap().collect();
    assert_eq!(orders.len(), 2);

    for (order, bom) in [("SO 1", "BOM-SO 1-Test Product-1"), ("SO-1", "BOM-SO-1-Test Product-1")] {
        fabest()
            .current_dir(tmp.path())
            .args(["order", "submit", order])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Created BOM {}", bom)));
    }
    let boms: Vec<_> = fs::read_dir(tmp.path().join("boms")).unwrap().collect();
    assert_eq!(boms.len(), 2);
}

#[test]
fn test_order_submit_unknown_order_fails() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(["order", "submit", "SO-9999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_order_show() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(estimate_args(&["--save", "SO-0003", "-q"]))
        .assert()
        .success();
    fabest()
        .current_dir(tmp.path())
        .args(["order", "show", "SO-0003"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Product"))
        .stdout(predicate::str::contains("yes"));
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_catalog_listings() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(["catalog", "sets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test SS 304"))
        .stdout(predicate::str::contains("Round Pipe"));

    fabest()
        .current_dir(tmp.path())
        .args(["catalog", "rules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H, L, W, has_shelf"));

    fabest()
        .current_dir(tmp.path())
        .args(["catalog", "items"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Pipe 25mm"))
        .stdout(predicate::str::contains("100.00"));
}

#[test]
fn test_catalog_check_passes() {
    let tmp = setup_seeded_project();
    fabest()
        .current_dir(tmp.path())
        .args(["catalog", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 error(s)"));
}

#[test]
fn test_catalog_check_reports_bad_formula() {
    let tmp = setup_seeded_project();
    fs::write(
        tmp.path().join("rules/broken.yaml"),
        "product: Broken\ncomponents:\n  - part_name: Top\n    material_source: sheet\n    quantity_formula: __import__('os')\n",
    )
    .unwrap();
    fabest()
        .current_dir(tmp.path())
        .args(["catalog", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Broken"));
}
