//! Navigation extractor: links, router pushes, navigate calls and redirects.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::{Detection, Rule, compile, normalize_path};
use crate::analyzer::scanner::classify;
use crate::types::NavigationEdge;

static RULES: LazyLock<Vec<Rule<&'static str>>> = LazyLock::new(|| {
    compile(&[
        (r#"<(?:Link|NavLink|a)\b[^>]*?\bhref=\{?\s*['"`]([^'"`]+)['"`]"#, "link"),
        (r#"<(?:Link|NavLink|RouterLink|router-link)\b[^>]*?\bto=\{?\s*['"`]([^'"`]+)['"`]"#, "link"),
        (r#"\brouter\.(?:push|replace)\(\s*['"`]([^'"`]+)['"`]"#, "push"),
        (r#"\bnavigat(?:e|ion\.navigate)\(\s*['"`]([^'"`]+)['"`]"#, "navigate"),
        (r#"\bredirect\(\s*['"`]([^'"`]+)['"`]"#, "redirect"),
    ])
});

/// Import markers mapped to a framework tag, first match wins
const FRAMEWORK_MARKERS: &[(&str, &str)] = &[
    ("next/link", "nextjs"),
    ("next/navigation", "nextjs"),
    ("next/router", "nextjs"),
    ("@react-navigation", "react-navigation"),
    ("react-router", "react-router"),
    ("vue-router", "vue-router"),
    ("router-link", "vue-router"),
    ("expo-router", "expo-router"),
];

pub fn detect(content: &str, path: &str) -> Detection<NavigationEdge> {
    let mut detection = Detection::default();
    let from = classify::screen_name(path);
    let mut seen = HashSet::new();

    for rule in RULES.iter() {
        for caps in rule.regex.captures_iter(content) {
            let Some(target) = caps.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if target.starts_with("http")
                || target.starts_with('#')
                || target.starts_with("mailto:")
            {
                continue;
            }
            // Path targets are normalized; bare names are screen names (React Navigation)
            let to = if target.starts_with('/') || target.starts_with("${") {
                match normalize_path(target) {
                    Some(p) => p,
                    None => continue,
                }
            } else {
                target.to_string()
            };

            if seen.insert((to.clone(), rule.meta)) {
                detection.facts.push(NavigationEdge {
                    from: from.clone(),
                    to,
                    trigger: rule.meta.to_string(),
                });
            }
        }
    }

    if !detection.is_empty()
        && let Some((_, tag)) = FRAMEWORK_MARKERS.iter().find(|(m, _)| content.contains(m))
    {
        detection.tag(tag);
    }
    detection
}
