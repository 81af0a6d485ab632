// Suggestion generator tests

use std::collections::BTreeMap;

use memscope::analyzer::FLAG_EFFECT_NO_CLEANUP;
use memscope::config::ProfilerConfig;
use memscope::models::{
    ComponentMemoryInfo, HookKind, HookMemoryInfo, Level, SuggestionType, Trend,
};
use memscope::suggestions::{generate, suggestion_id};

const MB: u64 = 1024 * 1024;

fn info(name: &str, instances: u32, bytes: u64) -> ComponentMemoryInfo {
    ComponentMemoryInfo {
        name: name.into(),
        instance_count: instances,
        total_memory: bytes,
        average_memory_per_instance: bytes / u64::from(instances.max(1)),
        retained_objects: Default::default(),
        suspicious_growth: false,
        trend: Trend::Stable,
        last_updated: 0,
    }
}

fn components(list: Vec<ComponentMemoryInfo>) -> BTreeMap<String, ComponentMemoryInfo> {
    list.into_iter().map(|c| (c.name.clone(), c)).collect()
}

#[test]
fn test_virtualization_for_large_lists() {
    let config = ProfilerConfig::default();
    let out = generate(&components(vec![info("Row", 120, 20 * MB)]), &[], &config);
    assert_eq!(out.len(), 1);
    let s = &out[0];
    assert_eq!(s.type_, SuggestionType::Virtualization);
    assert_eq!(s.id, "virtualization-Row");
    assert_eq!(s.component, "Row");
    assert!((s.projected_savings_mb - 16.0).abs() < 1e-9);
    assert_eq!(s.impact, Level::High);
    assert_eq!(s.effort, Level::Medium);
    assert!(s.code_example.is_some());
}

#[test]
fn test_thresholds_are_strict() {
    let config = ProfilerConfig::default();
    // exactly at the floors: no suggestion
    let at_floor = info("Row", 50, 5 * MB);
    assert!(generate(&components(vec![at_floor]), &[], &config).is_empty());
    let small = info("Row", 500, MB);
    assert!(generate(&components(vec![small]), &[], &config).is_empty());
}

#[test]
fn test_memoization_for_suspicious_growth() {
    let mut c = info("Feed", 2, 4 * MB);
    c.suspicious_growth = true;
    let out = generate(&components(vec![c]), &[], &ProfilerConfig::default());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].type_, SuggestionType::Memoization);
    assert_eq!(out[0].id, suggestion_id(SuggestionType::Memoization, "Feed"));
}

#[test]
fn test_cleanup_for_effects_without_cleanup() {
    let hooks = vec![HookMemoryInfo {
        component: "Ticker".into(),
        hook_index: 0,
        hook_type: HookKind::Effect,
        dependency_count: Some(0),
        has_cleanup: false,
        suspicious_patterns: vec![FLAG_EFFECT_NO_CLEANUP.to_string()],
    }];
    let out = generate(
        &components(vec![info("Ticker", 3, MB)]),
        &hooks,
        &ProfilerConfig::default(),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].type_, SuggestionType::Cleanup);
    assert!(out[0].one_click_fix);
}

#[test]
fn test_lazy_loading_for_heavy_singletons() {
    let out = generate(
        &components(vec![info("Editor", 1, 3 * MB)]),
        &[],
        &ProfilerConfig::default(),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].type_, SuggestionType::LazyLoading);
    assert_eq!(out[0].id, "lazy-loading-Editor");
}

#[test]
fn test_thresholds_follow_config() {
    let config = ProfilerConfig {
        virtualization_min_memory_mb: 0.5,
        virtualization_min_instances: 5,
        ..ProfilerConfig::default()
    };
    let out = generate(&components(vec![info("Card", 10, MB)]), &[], &config);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].type_, SuggestionType::Virtualization);
}
