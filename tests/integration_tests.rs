use dashgraph::apps::{automobile, launch, App};
use dashgraph::controls::ControlValue;
use dashgraph::csv_reader::read_csv;
use dashgraph::data::Table;
use dashgraph::ir::{ChartKind, OutputValue};
use dashgraph::server::{routes, AppState};
use dashgraph::RenderOptions;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::process::Command;
use std::sync::Arc;

fn load_fixture(name: &str) -> Table {
    let file = fs::File::open(format!("test/{}", name)).expect("Failed to open test CSV");
    read_csv(file).expect("Failed to parse test CSV")
}

fn automobile_table() -> Table {
    load_fixture("automobile_sales.csv")
}

fn launch_table() -> Table {
    load_fixture("spacex_launch_dash.csv")
}

/// Distinct values of a column, compared numerically where possible
fn distinct_count(table: &Table, column: &str) -> usize {
    table.distinct(column).unwrap().len()
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && &bytes[0..8] == &[137, 80, 78, 71, 13, 10, 26, 10]
}

// Automobile dashboard

#[test]
fn test_yearly_without_year_has_no_output() {
    let table = automobile_table();
    let view = automobile::statistics_view(&table, Some(automobile::YEARLY), None).unwrap();
    assert!(view.is_none());
}

#[test]
fn test_recession_charts_only_use_recession_rows() {
    let table = automobile_table();
    let recession_years: HashSet<String> = table
        .filter_eq("Recession", "1")
        .unwrap()
        .distinct("Year")
        .unwrap()
        .into_iter()
        .collect();

    for year in [None, Some(1981), Some(2023)] {
        let rows = automobile::statistics_view(&table, Some(automobile::RECESSION), year)
            .unwrap()
            .expect("recession view always has charts");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.charts.len() == 2));

        let trend = &rows[0].charts[0];
        let years: HashSet<String> = trend.data.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(years, recession_years, "selected year {:?}", year);

        // 1981 and 2023 sell Executivecar only outside recessions
        for chart in [&rows[0].charts[1], &rows[1].charts[0]] {
            assert!(chart.data.rows.iter().all(|r| r[0] != "Executivecar"));
        }
    }
}

#[test]
fn test_yearly_aggregate_row_counts() {
    let table = automobile_table();
    let rows = automobile::statistics_view(&table, Some(automobile::YEARLY), Some(1980))
        .unwrap()
        .unwrap();

    let trend = &rows[0].charts[0];
    assert_eq!(trend.kind, ChartKind::Line);
    assert_eq!(trend.data.len(), distinct_count(&table, "Year"));

    let months_1980 = distinct_count(&table.filter_eq("Year", "1980").unwrap(), "Month");
    let monthly = &rows[0].charts[1];
    assert_eq!(monthly.data.len(), months_1980);

    assert_eq!(rows[1].charts[0].kind, ChartKind::Bar);
    assert_eq!(rows[1].charts[1].kind, ChartKind::Pie);
}

#[test]
fn test_year_selector_disabled_combinations() {
    let cases = [
        (automobile::YEARLY, false),
        (automobile::RECESSION, true),
    ];
    for (statistics, expected) in cases {
        assert_eq!(automobile::year_selector_disabled(Some(statistics)), expected);
    }

    let mut dash = App::Automobile.build(Arc::new(automobile_table())).unwrap();
    // Starts on the yearly report, so alternate away from it and back
    let sequence = [cases[1], cases[0], cases[1], cases[0]];
    for (statistics, expected) in sequence.iter() {
        let out = dash
            .dispatcher
            .apply(&[(automobile::STATISTICS_ID.to_string(), ControlValue::text(statistics))])
            .unwrap();
        assert!(out.contains(&(
            dashgraph::ir::OutputId::new(automobile::YEAR_ID, "disabled"),
            OutputValue::Flag(*expected)
        )));
    }
}

// Launch dashboard

#[test]
fn test_pie_all_sites_has_one_slice_per_site() {
    let table = launch_table();
    let pie = launch::success_pie(&table, launch::ALL_SITES).unwrap();
    assert_eq!(pie.kind, ChartKind::Pie);
    assert_eq!(pie.data.len(), distinct_count(&table, "Launch Site"));
}

#[test]
fn test_pie_single_site_counts_outcomes() {
    let table = launch_table();
    let pie = launch::success_pie(&table, "KSC LC-39A").unwrap();
    assert_eq!(
        pie.data.rows,
        vec![
            vec!["0".to_string(), "1".to_string()],
            vec!["1".to_string(), "3".to_string()],
        ]
    );
}

#[test]
fn test_scatter_rows_within_payload_range() {
    let table = launch_table();
    let payload_col = table.column("Payload Mass (kg)").unwrap();
    for (lo, hi) in [(0.0, 1000.0), (500.0, 5600.0), (3000.0, 3000.0), (9000.0, 10000.0)] {
        let chart = launch::payload_scatter(&table, launch::ALL_SITES, (lo, hi)).unwrap();
        for row in &chart.data.rows {
            let payload: f64 = row[payload_col].parse().unwrap();
            assert!(lo <= payload && payload <= hi, "{} outside [{}, {}]", payload, lo, hi);
        }
    }
}

#[test]
fn test_scatter_full_range_matches_table() {
    let table = launch_table();
    let range = table.min_max("Payload Mass (kg)").unwrap();

    let all = launch::payload_scatter(&table, launch::ALL_SITES, range).unwrap();
    assert_eq!(all.data.len(), table.len());

    for site in table.distinct("Launch Site").unwrap() {
        let chart = launch::payload_scatter(&table, &site, range).unwrap();
        assert_eq!(chart.data.len(), table.filter_eq("Launch Site", &site).unwrap().len());
    }
}

#[test]
fn test_launch_controls_follow_data() {
    let table = launch_table();
    let dash = App::Launch.build(Arc::new(table)).unwrap();
    let registry = dash.dispatcher.registry();

    let payload = registry.get(launch::PAYLOAD_ID).unwrap();
    assert_eq!(payload.default, ControlValue::Range(0.0, 9600.0));
    assert!(!payload.admits(&ControlValue::Range(-1.0, 500.0)));

    let site = registry.get(launch::SITE_ID).unwrap();
    assert!(site.admits(&ControlValue::text("CCAFS SLC-40")));
    assert!(!site.admits(&ControlValue::text("Boca Chica")));
}

// HTTP surface

fn launch_state() -> dashgraph::server::SharedState {
    let dash = App::Launch.build(Arc::new(launch_table())).unwrap();
    AppState::new(dash, RenderOptions::default())
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body is JSON")
}

#[tokio::test]
async fn test_http_index_page() {
    let filter = routes(launch_state());
    let resp = warp::test::request().method("GET").path("/").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    let html = String::from_utf8_lossy(resp.body());
    assert!(html.contains("SpaceX Launch Records Dashboard"));
    assert!(html.contains("id=\"site-dropdown\""));
    assert!(html.contains("id=\"success-payload-scatter-chart\""));
}

#[tokio::test]
async fn test_http_layout_lists_controls_and_regions() {
    let filter = routes(launch_state());
    let resp = warp::test::request().method("GET").path("/_dash-layout").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    let layout = body_json(resp.body());
    assert_eq!(layout["regions"], json!(["success-pie-chart", "success-payload-scatter-chart"]));
    assert_eq!(layout["controls"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_http_initial_renders_both_figures() {
    let filter = routes(launch_state());
    let resp = warp::test::request().method("GET").path("/_dash-initial").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    let outputs = body_json(resp.body())["outputs"].as_array().unwrap().clone();
    assert_eq!(outputs.len(), 2);
    for output in outputs {
        assert_eq!(output["property"], "figure");
        assert!(output["value"].as_str().unwrap().contains("<svg"));
    }
}

#[tokio::test]
async fn test_http_update_recomputes_dependents_once() {
    let filter = routes(launch_state());

    let resp = warp::test::request()
        .method("POST")
        .path("/_dash-update")
        .json(&json!({ "changes": { "payload-slider": [0, 5000] } }))
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    let outputs = body_json(resp.body())["outputs"].clone();
    assert_eq!(outputs.as_array().unwrap().len(), 1);
    assert_eq!(outputs[0]["id"], "success-payload-scatter-chart");

    let resp = warp::test::request()
        .method("POST")
        .path("/_dash-update")
        .json(&json!({ "changes": { "site-dropdown": "VAFB SLC-4E", "payload-slider": [0, 9600] } }))
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    let ids: Vec<String> = body_json(resp.body())["outputs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["success-pie-chart", "success-payload-scatter-chart"]);
}

#[tokio::test]
async fn test_http_reload_serves_default_outputs() {
    let filter = routes(launch_state());

    let resp = warp::test::request()
        .method("POST")
        .path("/_dash-update")
        .json(&json!({ "changes": { "site-dropdown": "VAFB SLC-4E" } }))
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);

    let page = warp::test::request().method("GET").path("/").reply(&filter).await;
    let html = String::from_utf8_lossy(page.body()).to_string();
    assert!(html.contains("<option value=\"0\" selected>All Sites</option>"));

    let resp = warp::test::request().method("GET").path("/_dash-initial").reply(&filter).await;
    assert_eq!(resp.status(), 200);
    let outputs = body_json(resp.body())["outputs"].clone();
    assert_eq!(outputs[0]["id"], "success-pie-chart");
    let pie = outputs[0]["value"].as_str().unwrap();
    assert!(pie.contains("Total Successful Launches by Site"));
    assert!(!pie.contains("Total Success vs. Failure for Site VAFB SLC-4E"));

    // The site shows as unselected again, so choosing it must update the pie
    let resp = warp::test::request()
        .method("POST")
        .path("/_dash-update")
        .json(&json!({ "changes": { "site-dropdown": "VAFB SLC-4E" } }))
        .reply(&filter)
        .await;
    let outputs = body_json(resp.body())["outputs"].clone();
    assert_eq!(outputs.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_http_automobile_reload_reenables_year() {
    let dash = App::Automobile.build(Arc::new(automobile_table())).unwrap();
    let filter = routes(AppState::new(dash, RenderOptions::default()));

    warp::test::request()
        .method("POST")
        .path("/_dash-update")
        .json(&json!({ "changes": { "dropdown-statistics": "Recession Period Statistics" } }))
        .reply(&filter)
        .await;

    let resp = warp::test::request().method("GET").path("/_dash-initial").reply(&filter).await;
    let outputs = body_json(resp.body())["outputs"].clone();
    assert_eq!(outputs[0], json!({ "id": "select-year", "property": "disabled", "value": false }));
    assert_eq!(outputs[1]["value"], "");
}

#[tokio::test]
async fn test_http_rejects_bad_values_and_keeps_serving() {
    let filter = routes(launch_state());

    for changes in [
        json!({ "no-such-control": "x" }),
        json!({ "site-dropdown": "Boca Chica" }),
        json!({ "site-dropdown": null }),
    ] {
        let resp = warp::test::request()
            .method("POST")
            .path("/_dash-update")
            .json(&json!({ "changes": changes }))
            .reply(&filter)
            .await;
        assert_eq!(resp.status(), 400, "changes {}", changes);
        assert!(body_json(resp.body())["error"].is_string());
    }

    let resp = warp::test::request().method("GET").path("/_dash-initial").reply(&filter).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_http_automobile_year_flow() {
    let dash = App::Automobile.build(Arc::new(automobile_table())).unwrap();
    let filter = routes(AppState::new(dash, RenderOptions::default()));

    let resp = warp::test::request()
        .method("POST")
        .path("/_dash-update")
        .json(&json!({ "changes": { "select-year": 1980 } }))
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    let outputs = body_json(resp.body())["outputs"].clone();
    assert_eq!(outputs[0]["id"], "output-container");
    let html = outputs[0]["value"].as_str().unwrap();
    assert_eq!(html.matches("class=\"chart-row\"").count(), 2);
    assert_eq!(html.matches("<svg").count(), 4);

    let resp = warp::test::request()
        .method("POST")
        .path("/_dash-update")
        .json(&json!({ "changes": { "dropdown-statistics": null } }))
        .reply(&filter)
        .await;
    let outputs = body_json(resp.body())["outputs"].clone();
    assert_eq!(outputs[0], json!({ "id": "select-year", "property": "disabled", "value": true }));
    assert_eq!(outputs[1]["value"], "");
}

// Command line

#[test]
fn test_snapshot_writes_png_charts() {
    let out_dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dashgraph"))
        .args(["snapshot", "launch", "--data", "test/spacex_launch_dash.csv"])
        .args(["--set", "site-dropdown=\"KSC LC-39A\""])
        .arg("--out-dir")
        .arg(out_dir.path())
        .output()
        .expect("Failed to run dashgraph");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    for region in ["success-pie-chart-1.png", "success-payload-scatter-chart-1.png"] {
        let bytes = fs::read(out_dir.path().join(region)).unwrap();
        assert!(is_valid_png(&bytes), "{} is not a valid PNG", region);
    }
}

#[test]
fn test_snapshot_svg_yearly_report() {
    let out_dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dashgraph"))
        .args(["snapshot", "automobile", "--data", "test/automobile_sales.csv"])
        .args(["--set", "select-year=1982", "--render", r#"{"type": "svg"}"#])
        .arg("--out-dir")
        .arg(out_dir.path())
        .output()
        .expect("Failed to run dashgraph");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let files = fs::read_dir(out_dir.path()).unwrap().count();
    assert_eq!(files, 4);
    let pie = fs::read_to_string(out_dir.path().join("output-container-4.svg")).unwrap();
    assert!(pie.contains("Total Advertising Expenditure by Vehicle Type in 1982"));
}

#[test]
fn test_snapshot_without_year_fails() {
    let out_dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dashgraph"))
        .args(["snapshot", "automobile", "--data", "test/automobile_sales.csv"])
        .arg("--out-dir")
        .arg(out_dir.path())
        .output()
        .expect("Failed to run dashgraph");
    assert!(!output.status.success());
}

#[test]
fn test_missing_data_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_dashgraph"))
        .args(["snapshot", "launch", "--data", "test/does_not_exist.csv"])
        .output()
        .expect("Failed to run dashgraph");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does_not_exist.csv"));
}
