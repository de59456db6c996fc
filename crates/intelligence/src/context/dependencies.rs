//! Dependency manifest parsers for the ecosystems we recognise.

use super::DependencyInfo;
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static GEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*gem\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#)
        .expect("Invalid regex pattern")
});

static GO_REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:require\s+)?([A-Za-z0-9._~/-]+)\s+(v[^\s]+)").expect("Invalid regex pattern")
});

type ManifestParser = fn(&Path) -> Result<Vec<DependencyInfo>>;

/// `(file name, ecosystem, parser)`; the first manifest per ecosystem wins.
const MANIFESTS: &[(&str, &str, ManifestParser)] = &[
    ("Cargo.toml", "rust", parse_cargo_toml),
    ("package.json", "npm", parse_package_json),
    ("pyproject.toml", "python", parse_pyproject_toml),
    ("requirements.txt", "python", parse_requirements_txt),
    ("go.mod", "go", parse_go_mod),
    ("Gemfile", "ruby", parse_gemfile),
    ("composer.json", "php", parse_composer_json),
];

/// Parses every known manifest directly inside `dir`.
///
/// Manifests that fail to parse are logged and skipped.
pub fn parse_all_dependencies(dir: &Path) -> HashMap<String, Vec<DependencyInfo>> {
    let mut deps: HashMap<String, Vec<DependencyInfo>> = HashMap::new();
    for (file, ecosystem, parse) in MANIFESTS {
        if deps.contains_key(*ecosystem) {
            continue;
        }
        let path = dir.join(file);
        if !path.is_file() {
            continue;
        }
        match parse(&path) {
            Ok(parsed) => {
                deps.insert((*ecosystem).to_string(), parsed);
            }
            Err(e) => {
                tracing::debug!(error = %e, path = %path.display(), "Could not parse manifest");
            }
        }
    }
    deps
}

/// Parse Cargo.toml for Rust dependencies.
pub fn parse_cargo_toml(path: &Path) -> Result<Vec<DependencyInfo>> {
    let doc: toml::Value = toml::from_str(&fs::read_to_string(path)?)?;
    let mut deps = Vec::new();
    for (section, dev) in [
        ("dependencies", false),
        ("dev-dependencies", true),
        ("build-dependencies", true),
    ] {
        deps.extend(toml_table_deps(doc.get(section), dev, &[]));
    }
    // Workspace roots declare shared versions here.
    if let Some(workspace) = doc.get("workspace") {
        deps.extend(toml_table_deps(workspace.get("dependencies"), false, &[]));
    }
    Ok(deps)
}

/// Parse package.json for Node.js dependencies.
pub fn parse_package_json(path: &Path) -> Result<Vec<DependencyInfo>> {
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(json_object_deps(
        &doc,
        &[
            ("dependencies", false),
            ("devDependencies", true),
            ("peerDependencies", false),
        ],
    ))
}

/// Parse composer.json for PHP dependencies.
pub fn parse_composer_json(path: &Path) -> Result<Vec<DependencyInfo>> {
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(json_object_deps(
        &doc,
        &[("require", false), ("require-dev", true)],
    ))
}

/// Parse pyproject.toml for Python dependencies (PEP 621, Poetry, uv).
pub fn parse_pyproject_toml(path: &Path) -> Result<Vec<DependencyInfo>> {
    let doc: toml::Value = toml::from_str(&fs::read_to_string(path)?)?;
    let mut deps = Vec::new();

    if let Some(project) = doc.get("project") {
        deps.extend(pep508_array(project.get("dependencies"), false));
        if let Some(optional) = project
            .get("optional-dependencies")
            .and_then(|d| d.as_table())
        {
            for group in optional.values() {
                deps.extend(pep508_array(Some(group), true));
            }
        }
    }

    let tool = doc.get("tool");
    if let Some(poetry) = tool.and_then(|t| t.get("poetry")) {
        deps.extend(toml_table_deps(poetry.get("dependencies"), false, &["python"]));
        deps.extend(toml_table_deps(poetry.get("dev-dependencies"), true, &[]));
        if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
            for (group_name, group) in groups {
                let dev = matches!(group_name.as_str(), "dev" | "test");
                deps.extend(toml_table_deps(group.get("dependencies"), dev, &[]));
            }
        }
    }
    if let Some(uv) = tool.and_then(|t| t.get("uv")) {
        deps.extend(pep508_array(uv.get("dev-dependencies"), true));
    }

    Ok(deps)
}

/// Parse requirements.txt for Python dependencies.
pub fn parse_requirements_txt(path: &Path) -> Result<Vec<DependencyInfo>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(|line| {
            let (name, version) = parse_python_dep_string(line);
            (!name.is_empty()).then(|| DependencyInfo::new(name, version, false))
        })
        .collect())
}

/// Parse go.mod `require` directives.
pub fn parse_go_mod(path: &Path) -> Result<Vec<DependencyInfo>> {
    let content = fs::read_to_string(path)?;
    let mut deps = Vec::new();
    let mut in_block = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("require (") || trimmed == "require(" {
            in_block = true;
            continue;
        }
        if in_block && trimmed.starts_with(')') {
            in_block = false;
            continue;
        }
        if !in_block && !trimmed.starts_with("require ") {
            continue;
        }
        if let Some(caps) = GO_REQUIRE.captures(trimmed) {
            deps.push(DependencyInfo::new(
                &caps[1],
                Some(caps[2].to_string()),
                false,
            ));
        }
    }
    Ok(deps)
}

/// Parse Gemfile `gem` lines; gems inside development/test groups count as dev.
pub fn parse_gemfile(path: &Path) -> Result<Vec<DependencyInfo>> {
    let content = fs::read_to_string(path)?;
    let mut deps = Vec::new();
    let mut dev_group = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("group ") {
            dev_group = trimmed.contains(":development") || trimmed.contains(":test");
            continue;
        }
        if trimmed == "end" {
            dev_group = false;
            continue;
        }
        if let Some(caps) = GEM_LINE.captures(line) {
            let version = caps.get(2).map(|m| m.as_str().to_string());
            deps.push(DependencyInfo::new(&caps[1], version, dev_group));
        }
    }
    Ok(deps)
}

fn toml_table_deps(table: Option<&toml::Value>, dev: bool, skip: &[&str]) -> Vec<DependencyInfo> {
    let Some(table) = table.and_then(|t| t.as_table()) else {
        return Vec::new();
    };
    table
        .iter()
        .filter(|(name, _)| !skip.contains(&name.as_str()))
        .map(|(name, value)| DependencyInfo::new(name.as_str(), toml_version(value), dev))
        .collect()
}

fn toml_version(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Table(t) => t.get("version").and_then(|v| v.as_str()).map(str::to_string),
        _ => None,
    }
}

fn json_object_deps(doc: &serde_json::Value, sections: &[(&str, bool)]) -> Vec<DependencyInfo> {
    let mut deps = Vec::new();
    for (section, dev) in sections {
        if let Some(map) = doc.get(*section).and_then(|d| d.as_object()) {
            deps.extend(map.iter().map(|(name, version)| {
                DependencyInfo::new(name.as_str(), version.as_str().map(str::to_string), *dev)
            }));
        }
    }
    deps
}

fn pep508_array(value: Option<&toml::Value>, dev: bool) -> Vec<DependencyInfo> {
    value
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|dep| dep.as_str())
        .map(|dep| {
            let (name, version) = parse_python_dep_string(dep);
            DependencyInfo::new(name, version, dev)
        })
        .collect()
}

/// Splits `name[extra]>=1.0; marker` into name and version specifier.
fn parse_python_dep_string(dep: &str) -> (String, Option<String>) {
    let dep = dep.split(';').next().unwrap_or("").trim();
    let split = dep.find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | '^'));
    let (name_part, version) = match split {
        Some(idx) => (&dep[..idx], Some(dep[idx..].trim().to_string())),
        None => (dep, None),
    };
    let name = name_part.split('[').next().unwrap_or("").trim();
    (name.to_string(), version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use artimine_test_utils::ProjectFixture;

    fn names(deps: &[DependencyInfo]) -> Vec<&str> {
        deps.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn cargo_sections_and_dev_flags() {
        let fixture = ProjectFixture::with_files(&[(
            "Cargo.toml",
            r#"
[package]
name = "demo"

[dependencies]
axum = "0.7"
serde = { version = "1", features = ["derive"] }

[dev-dependencies]
proptest = "1"
"#,
        )])
        .unwrap();
        let deps = parse_cargo_toml(&fixture.root().join("Cargo.toml")).unwrap();
        let serde = deps.iter().find(|d| d.name == "serde").unwrap();
        assert_eq!(serde.version.as_deref(), Some("1"));
        assert!(!serde.dev);
        assert!(deps.iter().find(|d| d.name == "proptest").unwrap().dev);
    }

    #[test]
    fn package_json_dev_dependencies() {
        let fixture = ProjectFixture::with_files(&[(
            "package.json",
            r#"{"dependencies":{"react":"^18"},"devDependencies":{"jest":"^29"}}"#,
        )])
        .unwrap();
        let deps = parse_package_json(&fixture.root().join("package.json")).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "jest" && d.dev));
    }

    #[test]
    fn pyproject_pep621_and_poetry() {
        let fixture = ProjectFixture::with_files(&[(
            "pyproject.toml",
            r#"
[project]
dependencies = ["django>=4.2", "requests[socks]~=2.31; python_version>'3.8'"]

[tool.poetry.dependencies]
python = "^3.11"
flask = "^3.0"

[tool.poetry.group.test.dependencies]
pytest = "^8"
"#,
        )])
        .unwrap();
        let deps = parse_pyproject_toml(&fixture.root().join("pyproject.toml")).unwrap();
        assert_eq!(names(&deps), vec!["django", "requests", "flask", "pytest"]);
        assert_eq!(deps[1].version.as_deref(), Some("~=2.31"));
        assert!(deps[3].dev);
    }

    #[test]
    fn requirements_skip_comments_and_options() {
        let fixture = ProjectFixture::with_files(&[(
            "requirements.txt",
            "# web\nFlask==3.0.0\n-r base.txt\n\nnumpy  # math\n",
        )])
        .unwrap();
        let deps = parse_requirements_txt(&fixture.root().join("requirements.txt")).unwrap();
        assert_eq!(names(&deps), vec!["Flask", "numpy"]);
        assert_eq!(deps[0].version.as_deref(), Some("==3.0.0"));
    }

    #[test]
    fn go_mod_block_and_single_requires() {
        let fixture = ProjectFixture::with_files(&[(
            "go.mod",
            "module example.com/app\n\ngo 1.22\n\nrequire github.com/google/uuid v1.6.0\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\tgolang.org/x/net v0.20.0 // indirect\n)\n",
        )])
        .unwrap();
        let deps = parse_go_mod(&fixture.root().join("go.mod")).unwrap();
        assert_eq!(
            names(&deps),
            vec!["github.com/google/uuid", "github.com/gin-gonic/gin", "golang.org/x/net"]
        );
    }

    #[test]
    fn gemfile_groups_mark_dev() {
        let fixture = ProjectFixture::with_files(&[(
            "Gemfile",
            "source 'https://rubygems.org'\ngem 'rails', '~> 7.1'\ngroup :development, :test do\n  gem 'rspec-rails'\nend\n",
        )])
        .unwrap();
        let deps = parse_gemfile(&fixture.root().join("Gemfile")).unwrap();
        assert_eq!(names(&deps), vec!["rails", "rspec-rails"]);
        assert_eq!(deps[0].version.as_deref(), Some("~> 7.1"));
        assert!(deps[1].dev);
    }

    #[test]
    fn broken_manifests_are_skipped() {
        let fixture = ProjectFixture::with_files(&[
            ("Cargo.toml", "[dependencies\nbroken"),
            ("composer.json", r#"{"require":{"laravel/framework":"^11"}}"#),
        ])
        .unwrap();
        let deps = parse_all_dependencies(fixture.root());
        assert!(!deps.contains_key("rust"));
        assert_eq!(names(&deps["php"]), vec!["laravel/framework"]);
    }

    #[test]
    fn pyproject_shadows_requirements() {
        let fixture = ProjectFixture::with_files(&[
            ("pyproject.toml", "[project]\ndependencies = [\"fastapi\"]\n"),
            ("requirements.txt", "flask\n"),
        ])
        .unwrap();
        let deps = parse_all_dependencies(fixture.root());
        assert_eq!(names(&deps["python"]), vec!["fastapi"]);
    }
}
