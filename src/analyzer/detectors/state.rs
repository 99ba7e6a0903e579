//! State management detector.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::{Detection, Rule, compile};
use crate::types::StatePattern;

#[derive(Clone, Copy)]
struct StateRule {
    library: &'static str,
    /// Only applies when the file imports this module
    requires_import: Option<&'static str>,
}

const fn rule(library: &'static str) -> StateRule {
    StateRule {
        library,
        requires_import: None,
    }
}

const fn imported(library: &'static str, module: &'static str) -> StateRule {
    StateRule {
        library,
        requires_import: Some(module),
    }
}

/// Group 1, when present, names the store/slice/context
static RULES: LazyLock<Vec<Rule<StateRule>>> = LazyLock::new(|| {
    compile(&[
        (r#"createSlice\(\s*\{\s*name\s*:\s*['"](\w+)['"]"#, rule("redux")),
        (r"\bconfigureStore\(", rule("redux")),
        (r"(?:const|let)\s+(use\w+)\s*=\s*create\b", imported("zustand", "zustand")),
        (r"(?:const|let)\s+(\w+)\s*=\s*(?:React\.)?createContext\b", rule("context")),
        (r"\buseReducer\(", rule("use-reducer")),
        (r"\bmake(?:Auto)?Observable\(|@observable\b", rule("mobx")),
        (r#"\batom\(\s*\{\s*key\s*:\s*['"]([^'"]+)['"]"#, rule("recoil")),
        (r"(?:const|let)\s+(\w+)\s*=\s*atom\(", imported("jotai", "jotai")),
        (r#"defineStore\(\s*['"]([^'"]+)['"]"#, rule("pinia")),
        (r"new\s+Vuex\.Store\(|\bcreateStore\(", imported("vuex", "vuex")),
        (r"\buse(?:Query|Mutation|InfiniteQuery)\(", imported("react-query", "react-query")),
        (r"\buseSWR\(", rule("swr")),
    ])
});

pub fn detect(content: &str, path: &str) -> Detection<StatePattern> {
    let mut detection = Detection::default();
    let mut seen = HashSet::new();

    for r in RULES.iter() {
        if let Some(module) = r.meta.requires_import
            && !imports(content, module)
        {
            continue;
        }
        for caps in r.regex.captures_iter(content) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            if seen.insert((r.meta.library, name.clone())) {
                detection.tag(r.meta.library);
                detection.facts.push(StatePattern {
                    library: r.meta.library.to_string(),
                    name,
                    source: path.to_string(),
                });
            }
        }
    }

    detection
}

/// Import or require of `module` (or a scoped/sub-path variant of it)
fn imports(content: &str, module: &str) -> bool {
    ['\'', '"'].iter().any(|q| {
        content.contains(&format!("{q}{module}{q}"))
            || content.contains(&format!("{q}{module}/"))
            || content.contains(&format!("/{module}{q}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn libraries(d: &Detection<StatePattern>) -> Vec<(&str, Option<&str>)> {
        d.facts
            .iter()
            .map(|p| (p.library.as_str(), p.name.as_deref()))
            .collect()
    }

    #[test]
    fn test_redux_toolkit() {
        let content = r#"
const cartSlice = createSlice({ name: 'cart', initialState, reducers: {} });
export const store = configureStore({ reducer: { cart: cartSlice.reducer } });
"#;
        let d = detect(content, "src/store.ts");
        assert_eq!(libraries(&d), vec![("redux", Some("cart")), ("redux", None)]);
        assert_eq!(d.framework.as_deref(), Some("redux"));
    }

    #[test]
    fn test_import_gated_rules() {
        let zustand = "import { create } from 'zustand';\nexport const useCartStore = create((set) => ({}));";
        assert_eq!(
            libraries(&detect(zustand, "src/cart.ts")),
            vec![("zustand", Some("useCartStore"))]
        );

        // Same shape without the import is not zustand
        let other = "const useThing = create();";
        assert!(detect(other, "src/x.ts").is_empty());
    }

    #[test]
    fn test_context_and_pinia() {
        let content = "export const AuthContext = React.createContext(null);\nexport const useUser = defineStore('user', {});";
        assert_eq!(
            libraries(&detect(content, "src/auth.ts")),
            vec![("context", Some("AuthContext")), ("pinia", Some("user"))]
        );
    }

    #[test]
    fn test_react_query_scoped_package() {
        let content = "import { useQuery } from '@tanstack/react-query';\nconst q = useQuery({ queryKey: ['x'] });";
        assert_eq!(libraries(&detect(content, "src/x.tsx")), vec![("react-query", None)]);
    }
}
