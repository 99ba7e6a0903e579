//! API endpoint detector.
//!
//! Client idioms (fetch, axios-style clients) and server idioms (Next.js
//! route handlers, Express/Fastify routers, FastAPI/Flask decorators,
//! GraphQL operations). Paths are normalized and deduplicated by
//! `METHOD path`.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::{Detection, Rule, STRING_LITERAL, compile, compile_one, literal, normalize_path};
use crate::analyzer::scanner::classify;
use crate::types::ApiEndpoint;

/// How a rule's captures map to an endpoint
#[derive(Clone, Copy)]
enum Shape {
    /// Path in the first literal group; method looked up near the call
    Fetch,
    /// Verb in group 2, path literal from group 3 (receiver in group 1)
    ReceiverVerb { idiom: &'static str, framework: &'static str },
    /// Python decorator: verb in group 1, path in group 2
    Decorator,
}

static CALL_RULES: LazyLock<Vec<Rule<Shape>>> = LazyLock::new(|| {
    let fetch = format!(r"\bfetch\(\s*{}", STRING_LITERAL);
    let client = format!(
        r"\b(axios|api|apiClient|client|http|httpClient|request|instance|\$http)\.(get|post|put|patch|delete)\s*(?:<[^>()]*>)?\(\s*{}",
        STRING_LITERAL
    );
    let server = format!(
        r"\b(app|router|server|fastify)\.(get|post|put|patch|delete|all)\(\s*{}",
        STRING_LITERAL
    );
    compile(&[
        (fetch.as_str(), Shape::Fetch),
        (
            client.as_str(),
            Shape::ReceiverVerb {
                idiom: "http-client",
                framework: "",
            },
        ),
        (
            server.as_str(),
            Shape::ReceiverVerb {
                idiom: "express",
                framework: "express",
            },
        ),
        (
            r#"@(?:app|router|api|bp|blueprint)\.(get|post|put|patch|delete|route)\(\s*['"]([^'"]+)['"]"#,
            Shape::Decorator,
        ),
    ])
});

static FETCH_METHOD: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile_one(r#"method\s*:\s*['"`](\w+)['"`]"#));

static FLASK_METHODS: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile_one(r#"methods\s*=\s*\[\s*['"](\w+)['"]"#));

static ROUTE_HANDLER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile_one(
        r"export\s+(?:async\s+function\s+|function\s+|const\s+)(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\b",
    )
});

static DEFAULT_HANDLER: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile_one(r"export\s+default\s+(?:async\s+)?function"));

static GRAPHQL_OPERATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile_one(r"\b(query|mutation|subscription)\s+([A-Za-z_][A-Za-z0-9_]*)\s*[({]")
});

/// Characters after a `fetch(` call searched for a `method:` option
const FETCH_OPTION_WINDOW: usize = 240;

pub fn detect(content: &str, path: &str) -> Detection<ApiEndpoint> {
    let mut detection = Detection::default();
    let mut seen = HashSet::new();

    let mut push = |detection: &mut Detection<ApiEndpoint>, method: &str, raw: &str, idiom: &str| {
        let Some(normalized) = normalize_path(raw) else {
            return;
        };
        let endpoint = ApiEndpoint {
            method: method.to_uppercase(),
            path: normalized,
            source: path.to_string(),
            idiom: idiom.to_string(),
        };
        if seen.insert(endpoint.key()) {
            detection.facts.push(endpoint);
        }
    };

    for rule in CALL_RULES.iter() {
        for caps in rule.regex.captures_iter(content) {
            match rule.meta {
                Shape::Fetch => {
                    let Some(raw) = literal(&caps, 1) else { continue };
                    if !looks_like_path(raw) {
                        continue;
                    }
                    let end = caps.get(0).map_or(0, |m| m.end());
                    let method = fetch_method(content, end).unwrap_or_else(|| "GET".to_string());
                    push(&mut detection, &method, raw, "fetch");
                }
                Shape::ReceiverVerb { idiom, framework } => {
                    let (Some(receiver), Some(verb), Some(raw)) =
                        (caps.get(1), caps.get(2), literal(&caps, 3))
                    else {
                        continue;
                    };
                    // `@router.get(...)` is a Python decorator, handled below
                    if content[..receiver.start()].ends_with('@') {
                        continue;
                    }
                    if !looks_like_path(raw) {
                        continue;
                    }
                    let (idiom, framework) = if receiver.as_str() == "axios" {
                        ("axios", "axios")
                    } else {
                        (idiom, framework)
                    };
                    if !framework.is_empty() {
                        detection.tag(framework);
                    }
                    push(&mut detection, verb.as_str(), raw, idiom);
                }
                Shape::Decorator => {
                    let (Some(verb), Some(raw)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    if verb.as_str() == "route" {
                        let end = caps.get(0).map_or(0, |m| m.end());
                        let method = FLASK_METHODS
                            .as_ref()
                            .and_then(|re| re.captures(window(content, end, 120)))
                            .and_then(|c| c.get(1))
                            .map_or("GET", |m| m.as_str());
                        detection.tag("flask");
                        push(&mut detection, method, raw.as_str(), "flask");
                    } else {
                        detection.tag("fastapi");
                        push(&mut detection, verb.as_str(), raw.as_str(), "fastapi");
                    }
                }
            }
        }
    }

    detect_route_handlers(content, path, &mut detection, &mut push);
    detect_graphql(content, path, &mut detection, &mut seen);

    detection
}

/// Next.js-style handlers whose route comes from the file path
fn detect_route_handlers<F>(
    content: &str,
    path: &str,
    detection: &mut Detection<ApiEndpoint>,
    push: &mut F,
) where
    F: FnMut(&mut Detection<ApiEndpoint>, &str, &str, &str),
{
    if !classify::is_api_file(path) {
        return;
    }
    let Some(route) = classify::route_from_path(path) else {
        return;
    };

    let mut found = false;
    if let Some(re) = ROUTE_HANDLER.as_ref() {
        for caps in re.captures_iter(content) {
            if let Some(verb) = caps.get(1) {
                found = true;
                push(detection, verb.as_str(), &route, "next-route");
            }
        }
    }

    // pages/api handlers answer every verb
    if !found
        && path.contains("pages/api/")
        && DEFAULT_HANDLER.as_ref().is_some_and(|re| re.is_match(content))
    {
        found = true;
        push(detection, "ALL", &route, "next-api");
    }

    if found {
        detection.tag("nextjs");
    }
}

fn detect_graphql(
    content: &str,
    path: &str,
    detection: &mut Detection<ApiEndpoint>,
    seen: &mut HashSet<String>,
) {
    let is_schema_file = path.ends_with(".graphql") || path.ends_with(".gql");
    let embedded = content.contains("gql`")
        || content.contains("graphql`")
        || content.contains("graphql(");
    if !(is_schema_file || embedded) {
        return;
    }
    let Some(re) = GRAPHQL_OPERATION.as_ref() else {
        return;
    };

    for caps in re.captures_iter(content) {
        let (Some(kind), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let endpoint = ApiEndpoint {
            method: kind.as_str().to_uppercase(),
            path: name.as_str().to_string(),
            source: path.to_string(),
            idiom: "graphql".to_string(),
        };
        if seen.insert(endpoint.key()) {
            detection.tag("graphql");
            detection.facts.push(endpoint);
        }
    }
}

fn fetch_method(content: &str, from: usize) -> Option<String> {
    let slice = window(content, from, FETCH_OPTION_WINDOW);
    // Stop at the next call so a later fetch's options are not borrowed
    let slice = slice.split("fetch(").next().unwrap_or(slice);
    FETCH_METHOD
        .as_ref()?
        .captures(slice)?
        .get(1)
        .map(|m| m.as_str().to_uppercase())
}

fn window(content: &str, from: usize, len: usize) -> &str {
    let start = from.min(content.len());
    let mut end = (start + len).min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[start..end]
}

/// Path-ish literal: relative route, absolute URL, or base-URL interpolation
fn looks_like_path(raw: &str) -> bool {
    raw.starts_with('/')
        || raw.starts_with("http://")
        || raw.starts_with("https://")
        || raw.starts_with("${")
}
