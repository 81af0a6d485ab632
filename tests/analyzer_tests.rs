// Component attribution tests: aggregation, trends, growth flags

mod common;

use common::{effect, sized_node, tree};
use memscope::analyzer::{BASE_COMPONENT_BYTES, ComponentAnalyzer};
use memscope::config::ProfilerConfig;
use memscope::introspection::{ComponentNode, ResourceKind};
use memscope::models::Trend;

#[test]
fn test_instances_aggregate_by_name() {
    let mut analyzer = ComponentAnalyzer::new(10);
    let config = ProfilerConfig::default();
    let t = tree(vec![
        ComponentNode::new("App")
            .with_child(sized_node("Row", 2000))
            .with_child(sized_node("Row", 2000))
            .with_child(ComponentNode::new("Row")),
    ]);
    let result = analyzer.analyze(&t, &config, 1_000);
    assert_eq!(result.node_count, 4);
    let row = &result.components["Row"];
    assert_eq!(row.instance_count, 3);
    assert_eq!(row.total_memory, 3 * BASE_COMPONENT_BYTES + 2 * 2000);
    assert_eq!(row.average_memory_per_instance, row.total_memory / 3);
    assert_eq!(row.trend, Trend::Stable);
    assert!(!row.suspicious_growth);
    assert_eq!(row.last_updated, 1_000);
    assert_eq!(result.components["App"].instance_count, 1);
}

#[test]
fn test_empty_tree_yields_nothing() {
    let mut analyzer = ComponentAnalyzer::new(10);
    let result = analyzer.analyze(&tree(vec![]), &ProfilerConfig::default(), 0);
    assert!(result.components.is_empty());
    assert!(result.hooks.is_empty());
    assert_eq!(result.node_count, 0);
}

#[test]
fn test_growth_beyond_ratio_is_suspicious() {
    let mut analyzer = ComponentAnalyzer::new(10);
    let config = ProfilerConfig::default();
    analyzer.analyze(&tree(vec![sized_node("Feed", 10_000)]), &config, 1);
    let grown = analyzer.analyze(&tree(vec![sized_node("Feed", 40_000)]), &config, 2);
    let feed = &grown.components["Feed"];
    assert_eq!(feed.trend, Trend::Up);
    assert!(feed.suspicious_growth);

    // modest growth trends up without being suspicious
    let modest = analyzer.analyze(&tree(vec![sized_node("Feed", 44_000)]), &config, 3);
    assert_eq!(modest.components["Feed"].trend, Trend::Up);
    assert!(!modest.components["Feed"].suspicious_growth);

    let shrunk = analyzer.analyze(&tree(vec![sized_node("Feed", 10_000)]), &config, 4);
    assert_eq!(shrunk.components["Feed"].trend, Trend::Down);
}

#[test]
fn test_hooks_are_recorded_with_resource_tags() {
    let mut analyzer = ComponentAnalyzer::new(10);
    let node = ComponentNode::new("Ticker")
        .with_hook(effect(vec![ResourceKind::Timer], false))
        .with_hook(effect(vec![ResourceKind::EventListener], true));
    let result = analyzer.analyze(&tree(vec![node]), &ProfilerConfig::default(), 0);
    assert_eq!(result.hooks.len(), 2);
    assert_eq!(result.hooks[1].hook_index, 1);
    assert!(!result.hooks[0].suspicious_patterns.is_empty());
    assert!(result.hooks[1].suspicious_patterns.is_empty());
    let tags: Vec<&str> = result.components["Ticker"]
        .retained_objects
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(tags, vec!["event-listener", "timer"]);
}

#[test]
fn test_history_is_bounded() {
    let mut analyzer = ComponentAnalyzer::new(3);
    let config = ProfilerConfig::default();
    for ts in 0..10 {
        analyzer.analyze(&tree(vec![ComponentNode::new("A")]), &config, ts);
    }
    assert_eq!(analyzer.history().len(), 3);
    assert_eq!(analyzer.history().first().unwrap().timestamp, 7);
}

#[test]
fn test_deep_tree_does_not_overflow() {
    let mut node = ComponentNode::new("Leaf");
    for _ in 0..50_000 {
        node = ComponentNode::new("Wrapper").with_child(node);
    }
    let deep = tree(vec![node]);
    let mut analyzer = ComponentAnalyzer::new(2);
    let result = analyzer.analyze(&deep, &ProfilerConfig::default(), 0);
    assert_eq!(result.node_count, 50_001);
    assert_eq!(result.components["Wrapper"].instance_count, 50_000);
    // dropping a 50k-deep tree recurses; leak it instead of overflowing the test thread
    std::mem::forget(deep);
}
