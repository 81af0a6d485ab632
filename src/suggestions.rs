// Optimization suggestions derived from attribution and hook data.

use std::collections::BTreeMap;

use crate::analyzer::FLAG_EFFECT_NO_CLEANUP;
use crate::config::ProfilerConfig;
use crate::models::{
    ComponentMemoryInfo, HookMemoryInfo, Level, MemoryOptimizationSuggestion, SuggestionType,
    bytes_to_mb,
};

/// Share of usage a memoization fix is expected to recover.
const MEMOIZATION_SAVINGS: f64 = 0.3;
const CLEANUP_SAVINGS: f64 = 0.5;
const LAZY_LOADING_SAVINGS: f64 = 0.5;

pub fn suggestion_id(type_: SuggestionType, component: &str) -> String {
    format!("{}-{}", type_.as_str(), component)
}

pub fn generate(
    components: &BTreeMap<String, ComponentMemoryInfo>,
    hooks: &[HookMemoryInfo],
    config: &ProfilerConfig,
) -> Vec<MemoryOptimizationSuggestion> {
    let mut out = Vec::new();
    for (name, info) in components {
        let mb = bytes_to_mb(info.total_memory);

        if mb > config.virtualization_min_memory_mb
            && info.instance_count > config.virtualization_min_instances
        {
            let savings = mb * config.savings_fraction;
            out.push(MemoryOptimizationSuggestion {
                id: suggestion_id(SuggestionType::Virtualization, name),
                type_: SuggestionType::Virtualization,
                component: name.clone(),
                description: format!(
                    "{} renders {} instances using {:.1}MB; render only the visible rows",
                    name, info.instance_count, mb
                ),
                impact: impact_for(savings),
                effort: Level::Medium,
                projected_savings_mb: savings,
                code_example: Some(format!(
                    "<VirtualList itemCount={{items.length}} itemSize={{40}}>\n  {{({{ index, style }}) => <{} style={{style}} {{...items[index]}} />}}\n</VirtualList>",
                    name
                )),
                one_click_fix: false,
            });
        }

        if info.suspicious_growth {
            let savings = mb * MEMOIZATION_SAVINGS;
            out.push(MemoryOptimizationSuggestion {
                id: suggestion_id(SuggestionType::Memoization, name),
                type_: SuggestionType::Memoization,
                component: name.clone(),
                description: format!(
                    "{} grew more than {:.1}x since the last pass; memoize derived values and props",
                    name, config.growth_ratio
                ),
                impact: impact_for(savings),
                effort: Level::Low,
                projected_savings_mb: savings,
                code_example: Some(format!(
                    "export default React.memo({});\nconst derived = useMemo(() => compute(data), [data]);",
                    name
                )),
                one_click_fix: false,
            });
        }

        let missing_cleanup = hooks
            .iter()
            .filter(|h| {
                h.component == *name
                    && h.suspicious_patterns.iter().any(|f| f == FLAG_EFFECT_NO_CLEANUP)
            })
            .count();
        if missing_cleanup > 0 {
            let savings = mb * CLEANUP_SAVINGS;
            out.push(MemoryOptimizationSuggestion {
                id: suggestion_id(SuggestionType::Cleanup, name),
                type_: SuggestionType::Cleanup,
                component: name.clone(),
                description: format!(
                    "{} has {} effect(s) without a cleanup function",
                    name, missing_cleanup
                ),
                impact: impact_for(savings),
                effort: Level::Low,
                projected_savings_mb: savings,
                code_example: Some(
                    "useEffect(() => {\n  const id = setInterval(tick, 1000);\n  return () => clearInterval(id);\n}, []);"
                        .to_string(),
                ),
                one_click_fix: true,
            });
        }

        if info.instance_count == 1 && mb > config.lazy_load_min_memory_mb {
            let savings = mb * LAZY_LOADING_SAVINGS;
            out.push(MemoryOptimizationSuggestion {
                id: suggestion_id(SuggestionType::LazyLoading, name),
                type_: SuggestionType::LazyLoading,
                component: name.clone(),
                description: format!(
                    "{} holds {:.1}MB in a single instance; load it on demand",
                    name, mb
                ),
                impact: impact_for(savings),
                effort: Level::Medium,
                projected_savings_mb: savings,
                code_example: Some(format!(
                    "const {0} = React.lazy(() => import('./{0}'));",
                    name
                )),
                one_click_fix: false,
            });
        }
    }
    out
}

fn impact_for(savings_mb: f64) -> Level {
    if savings_mb >= 10.0 {
        Level::High
    } else if savings_mb >= 1.0 {
        Level::Medium
    } else {
        Level::Low
    }
}
