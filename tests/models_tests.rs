// Model serialization tests (JSON camelCase, kebab-case enums, MB-suffixed keys)

use memscope::models::*;
use serde_json::json;

#[test]
fn test_measurement_serialization_camel_case() {
    let m = MemoryMeasurement {
        timestamp: 1,
        heap_used: 2,
        heap_size: 3,
        heap_limit: 4,
    };
    let v = serde_json::to_value(m).unwrap();
    assert_eq!(
        v,
        json!({ "timestamp": 1, "heapUsed": 2, "heapSize": 3, "heapLimit": 4 })
    );
}

#[test]
fn test_timeline_event_uses_type_key() {
    let e = TimelineEvent {
        timestamp: 5,
        type_: TimelineEventType::UserAction,
        description: "clicked".into(),
        memory_impact: None,
    };
    let v = serde_json::to_value(&e).unwrap();
    assert_eq!(v["type"], "user-action");
    assert!(v.get("memoryImpact").is_none());
}

#[test]
fn test_suggestion_savings_key() {
    let s = MemoryOptimizationSuggestion {
        id: "virtualization-List".into(),
        type_: SuggestionType::Virtualization,
        component: "List".into(),
        description: String::new(),
        impact: Level::High,
        effort: Level::Medium,
        projected_savings_mb: 12.5,
        code_example: None,
        one_click_fix: false,
    };
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["projectedSavingsMB"], 12.5);
    assert_eq!(v["type"], "virtualization");
    assert_eq!(v["impact"], "high");
}

#[test]
fn test_budget_keys_and_target() {
    let b: MemoryBudget =
        serde_json::from_value(json!({ "component": "Chart", "budgetMB": 4.0, "warningThresholdMB": 3.0 }))
            .unwrap();
    assert_eq!(b.target(), "component Chart");
    let heap = MemoryBudget {
        component: None,
        route: None,
        budget_mb: 1.0,
        warning_threshold_mb: 0.0,
    };
    assert_eq!(heap.target(), "heap");
    let v = serde_json::to_value(&heap).unwrap();
    assert!(v.get("component").is_none());
    assert_eq!(v["budgetMB"], 1.0);
}

#[test]
fn test_leak_severity_from_impact() {
    assert_eq!(LeakSeverity::from_impact(10 * 1024 * 1024), LeakSeverity::Critical);
    assert_eq!(LeakSeverity::from_impact(2 * 1024 * 1024), LeakSeverity::High);
    assert_eq!(LeakSeverity::from_impact(200 * 1024), LeakSeverity::Medium);
    assert_eq!(LeakSeverity::from_impact(10), LeakSeverity::Low);
}

#[test]
fn test_pattern_kind_strings_match_serde() {
    for kind in [
        LeakPatternKind::GrowingArray,
        LeakPatternKind::EventListeners,
        LeakPatternKind::Timers,
        LeakPatternKind::Closures,
        LeakPatternKind::DomRefs,
    ] {
        assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
    }
}

#[test]
fn test_performance_entries_fold_into_metrics() {
    let mut perf = PerformanceMetrics::default();
    perf.apply(&PerformanceEntry {
        name: "first-contentful-paint".into(),
        entry_type: "paint".into(),
        start_time: 120.0,
        duration: 0.0,
        value: None,
    });
    for shift in [0.05, 0.1] {
        perf.apply(&PerformanceEntry {
            name: "layout-shift".into(),
            entry_type: "layout-shift".into(),
            start_time: 0.0,
            duration: 0.0,
            value: Some(shift),
        });
    }
    perf.apply(&PerformanceEntry {
        name: "App".into(),
        entry_type: "render".into(),
        start_time: 0.0,
        duration: 16.0,
        value: None,
    });
    perf.apply(&PerformanceEntry {
        name: "x".into(),
        entry_type: "unknown".into(),
        start_time: 1.0,
        duration: 1.0,
        value: None,
    });
    assert_eq!(perf.first_contentful_paint, Some(120.0));
    assert!((perf.cumulative_layout_shift.unwrap() - 0.15).abs() < 1e-9);
    assert_eq!(perf.render_time, 16.0);
    assert_eq!(perf.rerender_count, 1);
}

#[test]
fn test_bytes_to_mb() {
    assert_eq!(bytes_to_mb(3 * 1024 * 1024), 3.0);
    assert_eq!(bytes_to_mb(0), 0.0);
}
