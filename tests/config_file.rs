// tests/config_file.rs
use std::fs;
use std::path::Path;

use ai_trend_tracker::{load_config_from, TrackerConfig, TrendTracker};
use serde_json::json;

#[test]
fn example_config_loads_and_builds_a_tracker() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/tracker.example.toml");
    let cfg = load_config_from(&path).expect("example config is valid");

    let names: Vec<&str> = cfg.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "large_language_models",
            "computer_vision",
            "reinforcement_learning",
            "ai_ethics",
            "ai_infrastructure"
        ]
    );
    assert_eq!(cfg.report.window_days, Some(30));

    let tracker = TrendTracker::from_config(cfg).unwrap();
    assert!(!tracker.categories()[3].is_technology());
    let id = tracker.process_news_item(&json!({ "title": "Deepfake misinformation and bias concerns" }));
    assert!(id.is_some());
    assert_eq!(tracker.stats()[3].records, 1);
}

#[test]
fn invalid_values_are_rejected_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("bad.json");
    fs::write(&p, r#"{ "trending": { "top_n": 0 } }"#).unwrap();
    let err = load_config_from(&p).unwrap_err();
    assert!(format!("{err:#}").contains("top_n"));

    let p = dir.path().join("broken.toml");
    fs::write(&p, "categories = [").unwrap();
    let err = load_config_from(&p).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}

#[test]
fn config_round_trips_through_toml() {
    let cfg = TrackerConfig::with_categories(["research_papers", "quantum_computing"]);
    let text = toml::to_string(&cfg).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("tracker.toml");
    fs::write(&p, text).unwrap();
    assert_eq!(load_config_from(&p).unwrap(), cfg);
}
