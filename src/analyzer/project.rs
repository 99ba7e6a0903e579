//! Project metadata: name resolution and framework hints from package
//! manifests.

use std::path::Path;

use serde_json::Value;

use crate::types::log_skip;

const README_NAMES: &[&str] = &["README.md", "readme.md", "Readme.md", "README.mdx", "README"];

/// Dependency names that identify a framework
const FRAMEWORK_DEPENDENCIES: &[(&str, &str)] = &[
    ("next", "nextjs"),
    ("react-native", "react-native"),
    ("expo", "expo"),
    ("react", "react"),
    ("vue", "vue"),
    ("nuxt", "nuxt"),
    ("svelte", "svelte"),
    ("@sveltejs/kit", "sveltekit"),
    ("@angular/core", "angular"),
    ("express", "express"),
    ("@nestjs/core", "nestjs"),
    ("fastify", "fastify"),
    ("@prisma/client", "prisma"),
    ("mongoose", "mongoose"),
    ("typeorm", "typeorm"),
    ("graphql", "graphql"),
];

/// Resolve a display name for the project.
///
/// Order: package metadata, first `# Heading` of the README, directory name.
pub fn resolve_project_name(root: &Path) -> String {
    package_name(root)
        .or_else(|| readme_heading(root))
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "project".to_string())
}

fn package_name(root: &Path) -> Option<String> {
    let from_package_json = || -> Option<String> {
        let text = std::fs::read_to_string(root.join("package.json")).ok()?;
        let json: Value = log_skip(serde_json::from_str(&text), "package.json")?;
        json.get("name")?.as_str().map(String::from)
    };
    let from_cargo = || -> Option<String> {
        let value = read_toml(&root.join("Cargo.toml"))?;
        value.get("package")?.get("name")?.as_str().map(String::from)
    };
    let from_pyproject = || -> Option<String> {
        let value = read_toml(&root.join("pyproject.toml"))?;
        value
            .get("project")
            .and_then(|p| p.get("name"))
            .or_else(|| value.get("tool")?.get("poetry")?.get("name"))?
            .as_str()
            .map(String::from)
    };

    from_package_json()
        .or_else(from_cargo)
        .or_else(from_pyproject)
        .filter(|name| !name.trim().is_empty())
}

fn read_toml(path: &Path) -> Option<toml::Table> {
    let text = std::fs::read_to_string(path).ok()?;
    log_skip(toml::from_str(&text), &path.display().to_string())
}

fn readme_heading(root: &Path) -> Option<String> {
    let text = README_NAMES
        .iter()
        .find_map(|name| std::fs::read_to_string(root.join(name)).ok())?;
    text.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
        .filter(|heading| !heading.is_empty())
}

/// Framework tags implied by `package.json` dependencies
pub fn package_frameworks(root: &Path) -> Vec<String> {
    let Some(json) = std::fs::read_to_string(root.join("package.json"))
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok())
    else {
        return Vec::new();
    };

    let has_dependency = |name: &str| {
        ["dependencies", "devDependencies", "peerDependencies"]
            .iter()
            .any(|section| json.get(section).and_then(|d| d.get(name)).is_some())
    };

    FRAMEWORK_DEPENDENCIES
        .iter()
        .filter(|(dependency, _)| has_dependency(dependency))
        .map(|(_, tag)| tag.to_string())
        .collect()
}
