//! Path Classification Rules
//!
//! Pure functions over repository-relative paths (forward slashes). Nothing
//! here reads file contents.

/// Extensions worth handing to the detectors
const CODE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "vue", "svelte", "py", "rb", "go", "java", "kt",
    "prisma", "graphql", "gql",
];

/// Extensions a screen can be written in
const UI_EXTENSIONS: &[&str] = &["tsx", "jsx", "js", "ts", "vue", "svelte"];

/// Extensions where a capitalized file name usually means a component
const COMPONENT_EXTENSIONS: &[&str] = &["tsx", "jsx", "vue", "svelte"];

/// Directories holding design-system primitives rather than screens
const UI_PRIMITIVE_DIRS: &[&str] = &[
    "ui",
    "primitives",
    "atoms",
    "icons",
    "common",
    "shared",
    "components",
    "layouts",
];

const SCREEN_DIRS: &[&str] = &["screens", "views"];
const SCREEN_SUFFIXES: &[&str] = &["Page", "Screen", "View"];
const FRAMEWORK_PAGE_STEMS: &[&str] = &["_app", "_document", "_error", "_layout", "+layout"];

const API_DIRS: &[&str] = &[
    "api",
    "routes",
    "controllers",
    "handlers",
    "endpoints",
    "services",
];
/// Whole words of a file stem that mark an API file
const API_NAME_MARKERS: &[&str] = &[
    "controller",
    "controllers",
    "route",
    "router",
    "routes",
    "handler",
    "handlers",
    "api",
    "service",
    "services",
];

const MODEL_DIRS: &[&str] = &["models", "model", "entities", "entity", "schemas", "schema"];
const MODEL_NAME_MARKERS: &[&str] = &[".model.", ".entity.", ".schema."];

/// Split a relative path into (directory segments, stem, extension)
fn split(path: &str) -> (Vec<&str>, &str, &str) {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let file = segments.pop().unwrap_or("");
    let (stem, ext) = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (file, ""),
    };
    (segments, stem, ext)
}

/// Lower-cased words of a file stem, split on `.`, `-`, `_` and camel case
/// (`userAPIController` -> `user`, `api`, `controller`)
fn stem_words(stem: &str) -> Vec<String> {
    let chars: Vec<char> = stem.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '.' | '-' | '_') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn is_test_or_story(path: &str) -> bool {
    path.contains(".test.")
        || path.contains(".spec.")
        || path.contains(".stories.")
        || path.contains("__tests__/")
        || path.contains("__mocks__/")
}

pub fn is_code_file(path: &str) -> bool {
    let (_, _, ext) = split(path);
    CODE_EXTENSIONS.contains(&ext)
}

pub fn is_test_file(path: &str) -> bool {
    let (dirs, stem, _) = split(path);
    is_test_or_story(path)
        || stem.starts_with("test_")
        || stem.ends_with("_test")
        || dirs.iter().any(|d| *d == "tests" || *d == "test")
}

pub fn is_screen(path: &str) -> bool {
    if is_test_or_story(path) {
        return false;
    }
    let (dirs, stem, ext) = split(path);
    if !UI_EXTENSIONS.contains(&ext) || FRAMEWORK_PAGE_STEMS.contains(&stem) {
        return false;
    }

    // pages/ router (excluding pages/api)
    if let Some(idx) = dirs.iter().position(|d| *d == "pages") {
        return dirs.get(idx + 1) != Some(&"api");
    }

    // app/ router page files
    if dirs.contains(&"app") && (stem == "page" || stem == "+page") {
        return true;
    }

    if dirs.iter().any(|d| SCREEN_DIRS.contains(d)) {
        return true;
    }

    if !COMPONENT_EXTENSIONS.contains(&ext) || !starts_uppercase(stem) {
        return false;
    }
    if SCREEN_SUFFIXES.iter().any(|s| stem.ends_with(s)) {
        return true;
    }
    !dirs.iter().any(|d| UI_PRIMITIVE_DIRS.contains(d))
}

pub fn is_api_file(path: &str) -> bool {
    if !is_code_file(path) || is_test_or_story(path) {
        return false;
    }
    let (dirs, stem, ext) = split(path);
    if matches!(ext, "prisma" | "graphql" | "gql") {
        return false;
    }
    if dirs.iter().any(|d| API_DIRS.contains(d)) {
        return true;
    }
    stem_words(stem)
        .iter()
        .any(|w| API_NAME_MARKERS.contains(&w.as_str()))
}

pub fn is_data_model_file(path: &str) -> bool {
    if is_test_or_story(path) {
        return false;
    }
    let (dirs, stem, ext) = split(path);
    if matches!(ext, "prisma" | "graphql" | "gql") {
        return true;
    }
    if !is_code_file(path) {
        return false;
    }
    let file_name = path.rsplit('/').next().unwrap_or(path);
    stem == "models"
        || dirs.iter().any(|d| MODEL_DIRS.contains(d))
        || MODEL_NAME_MARKERS.iter().any(|m| file_name.contains(m))
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

// =============================================================================
// Routing Conventions
// =============================================================================

/// Route implied by file-system routing (`pages/`, `app/`, `api/`), if any.
///
/// Dynamic segments are left as written (`[id]`); callers normalize.
pub fn route_from_path(path: &str) -> Option<String> {
    let (dirs, stem, _) = split(path);

    let (base, include_stem) = if let Some(idx) = dirs.iter().position(|d| *d == "app") {
        (&dirs[idx + 1..], !matches!(stem, "page" | "+page" | "route" | "+server"))
    } else if let Some(idx) = dirs.iter().position(|d| *d == "pages") {
        (&dirs[idx + 1..], stem != "index")
    } else if let Some(idx) = dirs.iter().position(|d| *d == "api") {
        (&dirs[idx..], !matches!(stem, "index" | "route"))
    } else {
        return None;
    };

    let mut segments: Vec<&str> = base
        .iter()
        .copied()
        // Route groups `(marketing)` do not appear in URLs
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .collect();
    if include_stem {
        segments.push(stem);
    }

    Some(format!("/{}", segments.join("/")))
}

/// Human-readable screen name for a screen file
pub fn screen_name(path: &str) -> String {
    let (dirs, stem, _) = split(path);
    let generic = matches!(stem, "page" | "+page" | "index");
    if !generic {
        return stem.to_string();
    }
    dirs.iter()
        .rev()
        .find(|d| {
            !(d.starts_with('(') || d.starts_with('['))
                && !matches!(**d, "app" | "pages" | "src")
        })
        .map(|d| crate::types::capitalize_first(d))
        .unwrap_or_else(|| "Home".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_conventions() {
        assert!(is_screen("src/pages/Dashboard.tsx"));
        assert!(is_screen("app/settings/page.tsx"));
        assert!(is_screen("src/screens/login.js"));
        assert!(is_screen("src/features/billing/InvoicePage.tsx"));
        assert!(is_screen("src/features/billing/Checkout.vue"));
    }

    #[test]
    fn test_screen_exclusions() {
        assert!(!is_screen("pages/api/users.ts"));
        assert!(!is_screen("pages/_app.tsx"));
        assert!(!is_screen("src/components/ui/Button.tsx"));
        assert!(!is_screen("src/components/Header.tsx"));
        assert!(!is_screen("src/pages/Dashboard.test.tsx"));
        assert!(!is_screen("src/utils/format.ts"));
    }

    #[test]
    fn test_api_files() {
        assert!(is_api_file("src/api/users/route.ts"));
        assert!(is_api_file("server/routes/orders.js"));
        assert!(is_api_file("src/userController.ts"));
        assert!(is_api_file("app/api/health/route.ts"));
        assert!(!is_api_file("src/pages/Dashboard.tsx"));
        assert!(!is_api_file("README.md"));
    }

    #[test]
    fn test_api_markers_match_whole_words() {
        assert!(is_api_file("src/user.service.ts"));
        assert!(is_api_file("src/order-handler.js"));
        assert!(is_api_file("src/lib/apiClient.ts"));
        assert!(is_api_file("src/lib/APIClient.ts"));
        assert!(!is_api_file("src/utils/capitalize.ts"));
        assert!(!is_api_file("src/lib/rapid.ts"));
    }

    #[test]
    fn test_stem_words() {
        assert_eq!(stem_words("userAPIController"), vec!["user", "api", "controller"]);
        assert_eq!(stem_words("order-handler.v2"), vec!["order", "handler", "v2"]);
        assert_eq!(stem_words("capitalize"), vec!["capitalize"]);
    }

    #[test]
    fn test_data_model_files() {
        assert!(is_data_model_file("prisma/schema.prisma"));
        assert!(is_data_model_file("src/models/user.ts"));
        assert!(is_data_model_file("src/user.entity.ts"));
        assert!(is_data_model_file("app/models.py"));
        assert!(is_data_model_file("schema/types.graphql"));
        assert!(!is_data_model_file("src/pages/Dashboard.tsx"));
    }

    #[test]
    fn test_route_from_path() {
        assert_eq!(route_from_path("src/api/users/route.ts").as_deref(), Some("/api/users"));
        assert_eq!(
            route_from_path("app/(shop)/products/[id]/page.tsx").as_deref(),
            Some("/products/[id]")
        );
        assert_eq!(route_from_path("pages/index.tsx").as_deref(), Some("/"));
        assert_eq!(route_from_path("src/pages/Dashboard.tsx").as_deref(), Some("/Dashboard"));
        assert_eq!(route_from_path("pages/api/login.ts").as_deref(), Some("/api/login"));
        assert_eq!(route_from_path("src/lib/db.ts"), None);
    }

    #[test]
    fn test_screen_name() {
        assert_eq!(screen_name("src/pages/Dashboard.tsx"), "Dashboard");
        assert_eq!(screen_name("app/settings/page.tsx"), "Settings");
        assert_eq!(screen_name("app/page.tsx"), "Home");
        assert_eq!(screen_name("app/products/[id]/page.tsx"), "Products");
    }
}
