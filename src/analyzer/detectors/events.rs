//! Event detector: analytics tracking calls, domain event emitters and DOM
//! listeners.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::{Detection, Rule, STRING_LITERAL, compile, literal};
use crate::types::EventFact;

#[derive(Clone, Copy)]
struct EventRule {
    kind: &'static str,
    /// Fixed framework tag; `None` takes it from capture group 1 (the receiver)
    framework: Option<&'static str>,
    /// First capture group holding the event name
    name_group: usize,
}

static RULES: LazyLock<Vec<Rule<EventRule>>> = LazyLock::new(|| {
    let receiver = format!(
        r"\b(analytics|segment|amplitude|mixpanel|posthog|rudderanalytics|heap)\.(?:track|capture|logEvent)\(\s*{}",
        STRING_LITERAL
    );
    let track = format!(r"\btrack(?:Event)?\(\s*{}", STRING_LITERAL);
    let firebase = format!(r"\blogEvent\(\s*(?:\w+\s*,\s*)?{}", STRING_LITERAL);
    let emit = format!(r"\.emit\(\s*{}", STRING_LITERAL);
    let listener = format!(r"\baddEventListener\(\s*{}", STRING_LITERAL);

    let rules = [
        (receiver, EventRule { kind: "analytics", framework: None, name_group: 2 }),
        (track, EventRule { kind: "analytics", framework: Some(""), name_group: 1 }),
        (firebase, EventRule { kind: "analytics", framework: Some("firebase"), name_group: 1 }),
        (
            r#"\bgtag\(\s*['"]event['"]\s*,\s*['"]([^'"]+)['"]"#.to_string(),
            EventRule { kind: "analytics", framework: Some("gtag"), name_group: 1 },
        ),
        (emit, EventRule { kind: "domain", framework: Some(""), name_group: 1 }),
        (listener, EventRule { kind: "dom", framework: Some(""), name_group: 1 }),
    ];
    let table: Vec<(&str, EventRule)> = rules.iter().map(|(p, r)| (p.as_str(), *r)).collect();
    compile(&table)
});

pub fn detect(content: &str, path: &str) -> Detection<EventFact> {
    let mut detection = Detection::default();
    let mut seen = HashSet::new();

    for rule in RULES.iter() {
        for caps in rule.regex.captures_iter(content) {
            let Some(name) = literal(&caps, rule.meta.name_group) else {
                continue;
            };
            if name.contains("${") {
                continue;
            }
            if seen.insert((name.to_string(), rule.meta.kind)) {
                match rule.meta.framework {
                    None => {
                        if let Some(receiver) = caps.get(1) {
                            detection.tag(receiver.as_str());
                        }
                    }
                    Some("") => {}
                    Some(tag) => detection.tag(tag),
                }
                detection.facts.push(EventFact {
                    name: name.to_string(),
                    kind: rule.meta.kind.to_string(),
                    source: path.to_string(),
                });
            }
        }
    }

    detection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(d: &Detection<EventFact>) -> Vec<(&str, &str)> {
        d.facts
            .iter()
            .map(|e| (e.name.as_str(), e.kind.as_str()))
            .collect()
    }

    #[test]
    fn test_analytics_calls() {
        let content = r#"
analytics.track('Checkout Started', { total });
trackEvent("signup_completed");
gtag('event', 'purchase', { value: 10 });
"#;
        let d = detect(content, "src/pages/Checkout.tsx");
        assert_eq!(
            pairs(&d),
            vec![
                ("Checkout Started", "analytics"),
                ("signup_completed", "analytics"),
                ("purchase", "analytics"),
            ]
        );
        assert_eq!(d.framework.as_deref(), Some("analytics"));
    }

    #[test]
    fn test_firebase_log_event_with_instance() {
        let d = detect("logEvent(analytics, 'screen_view');", "src/a.ts");
        assert_eq!(pairs(&d), vec![("screen_view", "analytics")]);
        assert_eq!(d.framework.as_deref(), Some("firebase"));
    }

    #[test]
    fn test_domain_and_dom_events() {
        let content = "bus.emit('order:created', order);\nwindow.addEventListener(\"resize\", onResize);";
        assert_eq!(
            pairs(&detect(content, "src/a.ts")),
            vec![("order:created", "domain"), ("resize", "dom")]
        );
    }

    #[test]
    fn test_dynamic_names_are_ignored() {
        assert!(detect("track(`view_${page}`);", "src/a.ts").is_empty());
    }
}
