// Alert manager and budget evaluation tests

mod common;

use std::collections::BTreeMap;

use common::{MB, measurement};
use memscope::alerts::{AlertManager, budget_violations, evaluate_conditions};
use memscope::config::ProfilerConfig;
use memscope::models::{
    AlertSeverity, AlertType, ComponentMemoryInfo, MemoryBudget, PerformanceMetrics, Trend,
};

fn component(name: &str, bytes: u64) -> ComponentMemoryInfo {
    ComponentMemoryInfo {
        name: name.into(),
        instance_count: 1,
        total_memory: bytes,
        average_memory_per_instance: bytes,
        retained_objects: Default::default(),
        suspicious_growth: false,
        trend: Trend::Stable,
        last_updated: 0,
    }
}

fn budget(component: Option<&str>, route: Option<&str>, mb: f64, warn: f64) -> MemoryBudget {
    MemoryBudget {
        component: component.map(Into::into),
        route: route.map(Into::into),
        budget_mb: mb,
        warning_threshold_mb: warn,
    }
}

#[test]
fn test_duplicate_alert_is_suppressed() {
    let mut alerts = AlertManager::new(10);
    assert!(
        alerts
            .add_alert(AlertType::MemoryLimit, "high", AlertSeverity::Error, 1)
            .is_some()
    );
    assert!(
        alerts
            .add_alert(AlertType::MemoryLimit, "high", AlertSeverity::Error, 2)
            .is_none()
    );
    // same message, different type is a different alert
    assert!(
        alerts
            .add_alert(AlertType::LeakDetected, "high", AlertSeverity::Warning, 3)
            .is_some()
    );
    assert_eq!(alerts.alerts().len(), 2);
}

#[test]
fn test_dismissed_alert_is_not_re_raised() {
    let mut alerts = AlertManager::new(10);
    let a = alerts
        .add_alert(AlertType::LeakDetected, "leak in Chart", AlertSeverity::Warning, 1)
        .unwrap();
    assert!(alerts.dismiss(&a.id));
    assert!(!alerts.dismiss(&a.id));
    assert!(alerts.alerts().is_empty());
    assert!(
        alerts
            .add_alert(AlertType::LeakDetected, "leak in Chart", AlertSeverity::Warning, 2)
            .is_none()
    );
}

#[test]
fn test_alert_history_is_bounded() {
    let mut alerts = AlertManager::new(3);
    for i in 0..5 {
        alerts.add_alert(AlertType::LeakDetected, format!("leak {}", i), AlertSeverity::Info, i);
    }
    let messages: Vec<&str> = alerts.alerts().iter().map(|a| a.message.as_str()).collect();
    assert_eq!(messages, vec!["leak 2", "leak 3", "leak 4"]);
}

#[test]
fn test_resolved_condition_lifts_dismissal() {
    let mut config = ProfilerConfig::default();
    config.budgets = vec![budget(None, None, 10.0, 0.0)];
    let components = BTreeMap::new();
    let perf = PerformanceMetrics::default();
    let mut alerts = AlertManager::new(10);

    let over = measurement(1, 20 * MB);
    let conds = evaluate_conditions(&config, &components, Some(&over), &perf, None);
    let raised = alerts.apply_conditions(&conds, 1);
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].type_, AlertType::BudgetExceeded);
    assert_eq!(raised[0].severity, AlertSeverity::Error);

    // identical breach on the next tick: nothing new
    assert!(alerts.apply_conditions(&conds, 2).is_empty());

    assert!(alerts.dismiss(&raised[0].id));
    assert!(alerts.apply_conditions(&conds, 3).is_empty());

    let under = measurement(4, 5 * MB);
    let clear = evaluate_conditions(&config, &components, Some(&under), &perf, None);
    assert!(clear.is_empty());
    alerts.apply_conditions(&clear, 4);

    // breach again after it resolved
    assert_eq!(alerts.apply_conditions(&conds, 5).len(), 1);
}

#[test]
fn test_warning_threshold_and_component_budget() {
    let mut config = ProfilerConfig::default();
    config.budgets = vec![budget(Some("Grid"), None, 8.0, 6.0)];
    let mut components = BTreeMap::new();
    components.insert("Grid".to_string(), component("Grid", 7 * MB));
    let conds = evaluate_conditions(&config, &components, None, &PerformanceMetrics::default(), None);
    assert_eq!(conds.len(), 1);
    assert_eq!(conds[0].severity, AlertSeverity::Warning);
    assert!(conds[0].message.contains("component Grid"));
}

#[test]
fn test_memory_limit_and_slow_render_conditions() {
    let config = ProfilerConfig::default();
    let mut m = measurement(1, 95 * MB);
    m.heap_limit = 100 * MB;
    let perf = PerformanceMetrics {
        render_time: 80.0,
        ..Default::default()
    };
    let conds = evaluate_conditions(&config, &BTreeMap::new(), Some(&m), &perf, None);
    let types: Vec<AlertType> = conds.iter().map(|c| c.type_).collect();
    assert_eq!(types, vec![AlertType::MemoryLimit, AlertType::PerformanceDegraded]);

    // unknown heap limit never trips the limit alert
    m.heap_limit = 0;
    let conds = evaluate_conditions(&config, &BTreeMap::new(), Some(&m), &PerformanceMetrics::default(), None);
    assert!(conds.is_empty());
}

#[test]
fn test_budget_violations_are_recomputed() {
    let budgets = vec![
        budget(Some("Grid"), None, 1.0, 0.0),
        budget(None, Some("/reports"), 10.0, 0.0),
        budget(None, None, 100.0, 0.0),
    ];
    let mut components = BTreeMap::new();
    components.insert("Grid".to_string(), component("Grid", 3 * MB));
    let latest = measurement(1, 20 * MB);

    let off_route = budget_violations(&budgets, &components, Some(&latest), Some("/home"));
    assert_eq!(off_route.len(), 1);
    assert_eq!(off_route[0].current_usage_mb, 3.0);
    assert_eq!(off_route[0].exceeded_by_mb, 2.0);

    let on_route = budget_violations(&budgets, &components, Some(&latest), Some("/reports"));
    assert_eq!(on_route.len(), 2);
    assert_eq!(on_route[1].budget.route.as_deref(), Some("/reports"));
    assert_eq!(on_route[1].exceeded_by_mb, 10.0);

    components.insert("Grid".to_string(), component("Grid", MB / 2));
    assert!(budget_violations(&budgets, &components, Some(&latest), None).is_empty());
}

#[test]
fn test_clear_all_suppresses_current_alerts() {
    let mut alerts = AlertManager::new(10);
    alerts.add_alert(AlertType::LeakDetected, "a", AlertSeverity::Info, 1);
    alerts.add_alert(AlertType::LeakDetected, "b", AlertSeverity::Info, 1);
    alerts.clear_all();
    assert!(alerts.alerts().is_empty());
    assert!(
        alerts
            .add_alert(AlertType::LeakDetected, "a", AlertSeverity::Info, 2)
            .is_none()
    );
    alerts.reset();
    assert!(
        alerts
            .add_alert(AlertType::LeakDetected, "a", AlertSeverity::Info, 3)
            .is_some()
    );
}
