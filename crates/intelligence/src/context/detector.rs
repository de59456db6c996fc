//! Language and framework detection from project files.

use super::{dependencies::parse_all_dependencies, DependencyInfo, LanguageInfo, ProjectDetection};
use artimine_discovery::{Error, IgnorePatterns, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Language extension mappings.
const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("py", "Python"),
    ("pyw", "Python"),
    ("ipynb", "Python"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("rs", "Rust"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("cs", "C#"),
    ("swift", "Swift"),
    ("scala", "Scala"),
    ("dart", "Dart"),
    ("r", "R"),
    ("jl", "Julia"),
    ("lua", "Lua"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("hs", "Haskell"),
    ("m", "Objective-C"),
    ("sh", "Shell"),
    ("sql", "SQL"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("scss", "CSS"),
];

/// Manifests that settle the language outright, checked in order.
const MANIFEST_LANGUAGES: &[(&str, &str)] = &[
    ("Cargo.toml", "Rust"),
    ("package.json", "JavaScript"),
    ("pyproject.toml", "Python"),
    ("requirements.txt", "Python"),
    ("setup.py", "Python"),
    ("pom.xml", "Java"),
    ("build.gradle", "Java"),
    ("build.gradle.kts", "Java"),
    ("go.mod", "Go"),
    ("Gemfile", "Ruby"),
    ("composer.json", "PHP"),
];

/// `(dependency substring, framework)`; table order decides the dominant framework.
const KNOWN_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("spring-boot", "Spring Boot"),
    ("rails", "Rails"),
    ("laravel", "Laravel"),
    ("next", "Next.js"),
    ("nuxt", "Nuxt"),
    ("@angular/core", "Angular"),
    ("react", "React"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("nestjs", "NestJS"),
    ("express", "Express"),
    ("fastify", "Fastify"),
    ("koa", "Koa"),
    ("actix-web", "Actix"),
    ("axum", "Axum"),
    ("rocket", "Rocket"),
    ("gin-gonic", "Gin"),
    ("labstack/echo", "Echo"),
    ("gofiber", "Fiber"),
    ("streamlit", "Streamlit"),
    ("tensorflow", "TensorFlow"),
    ("torch", "PyTorch"),
    ("scikit-learn", "scikit-learn"),
    ("pandas", "pandas"),
    ("numpy", "NumPy"),
    ("tokio", "Tokio"),
    ("jest", "Jest"),
    ("pytest", "pytest"),
];

/// Manifests without a dependency parser, searched for marker text.
const MARKER_FRAMEWORKS: &[(&str, &str, &str)] = &[
    ("pom.xml", "spring-boot", "Spring Boot"),
    ("build.gradle", "org.springframework.boot", "Spring Boot"),
    ("build.gradle.kts", "org.springframework.boot", "Spring Boot"),
];

/// Detects the dominant language and frameworks of the project at `root`.
///
/// Manifests at the root and one level down decide the language; without
/// one, the language with the most files wins.
pub fn detect_language_and_framework(
    root: &Path,
    ignore: &IgnorePatterns,
) -> Result<ProjectDetection> {
    if !root.is_dir() {
        return Err(Error::InvalidDirectory {
            path: root.to_path_buf(),
        });
    }

    let languages = detect_languages(root, ignore);
    let dirs = manifest_dirs(root, ignore);

    let mut dependencies: HashMap<String, Vec<DependencyInfo>> = HashMap::new();
    let mut markers = BTreeSet::new();
    for dir in &dirs {
        for (ecosystem, deps) in parse_all_dependencies(dir) {
            dependencies.entry(ecosystem).or_default().extend(deps);
        }
        markers.extend(marker_frameworks(dir));
    }

    let mut frameworks = detect_frameworks(&dependencies);
    for (_, framework) in KNOWN_FRAMEWORKS {
        if markers.contains(framework) && !frameworks.iter().any(|f| f == framework) {
            frameworks.push((*framework).to_string());
        }
    }
    frameworks.sort_by_key(|f| framework_rank(f));

    let language = dirs
        .iter()
        .find_map(|dir| manifest_language(dir))
        .or_else(|| primary_language(&languages));

    tracing::debug!(
        root = %root.display(),
        language = ?language,
        frameworks = ?frameworks,
        "language detection complete"
    );

    Ok(ProjectDetection {
        language,
        framework: frameworks.first().cloned(),
        languages,
        frameworks,
        dependencies,
    })
}

/// Counts files per language by extension, pruning ignored and hidden directories.
pub fn detect_languages(root: &Path, ignore: &IgnorePatterns) -> HashMap<String, LanguageInfo> {
    let mut counts: HashMap<&'static str, (usize, Vec<String>)> = HashMap::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        if e.depth() == 0 {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        !ignore.contains(&name) && !(e.file_type().is_dir() && name.starts_with('.'))
    });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if let Some((_, lang)) = LANGUAGE_EXTENSIONS.iter().find(|(e, _)| *e == ext) {
            let slot = counts.entry(*lang).or_default();
            slot.0 += 1;
            if !slot.1.contains(&ext) {
                slot.1.push(ext);
            }
        }
    }

    let max_count = counts.values().map(|(c, _)| *c).max().unwrap_or(0);
    counts
        .into_iter()
        .map(|(name, (count, extensions))| {
            (
                name.to_string(),
                LanguageInfo {
                    file_count: count,
                    extensions,
                    primary: count == max_count && max_count > 0,
                },
            )
        })
        .collect()
}

/// Frameworks implied by parsed dependencies, in table order.
pub fn detect_frameworks(deps: &HashMap<String, Vec<DependencyInfo>>) -> Vec<String> {
    let names: Vec<String> = deps
        .values()
        .flatten()
        .map(|d| d.name.to_lowercase())
        .collect();
    KNOWN_FRAMEWORKS
        .iter()
        .filter(|(pattern, _)| names.iter().any(|n| n.contains(pattern)))
        .map(|(_, framework)| (*framework).to_string())
        .collect()
}

/// Language declared by the first manifest found directly inside `dir`.
pub fn manifest_language(dir: &Path) -> Option<String> {
    let (file, lang) = MANIFEST_LANGUAGES
        .iter()
        .find(|(file, _)| dir.join(file).is_file())?;
    if *file == "package.json" && dir.join("tsconfig.json").is_file() {
        return Some("TypeScript".to_string());
    }
    Some((*lang).to_string())
}

/// The root plus its non-ignored immediate subdirectories, sorted.
fn manifest_dirs(root: &Path, ignore: &IgnorePatterns) -> Vec<PathBuf> {
    let mut subdirs: Vec<PathBuf> = match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|e| !ignore.contains(&e.file_name().to_string_lossy()))
            .map(|e| e.path())
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, root = %root.display(), "Could not list project root");
            Vec::new()
        }
    };
    subdirs.sort();
    let mut dirs = vec![root.to_path_buf()];
    dirs.extend(subdirs);
    dirs
}

fn marker_frameworks(dir: &Path) -> Vec<&'static str> {
    MARKER_FRAMEWORKS
        .iter()
        .filter(|(file, needle, _)| {
            fs::read_to_string(dir.join(file))
                .map(|text| text.contains(needle))
                .unwrap_or(false)
        })
        .map(|(_, _, framework)| *framework)
        .collect()
}

fn framework_rank(framework: &str) -> usize {
    KNOWN_FRAMEWORKS
        .iter()
        .position(|(_, f)| *f == framework)
        .unwrap_or(usize::MAX)
}

/// Highest file count; ties break alphabetically so results are stable.
fn primary_language(languages: &HashMap<String, LanguageInfo>) -> Option<String> {
    languages
        .iter()
        .max_by(|(a_name, a), (b_name, b)| {
            a.file_count
                .cmp(&b.file_count)
                .then_with(|| b_name.cmp(a_name))
        })
        .map(|(name, _)| name.clone())
}
