use crate::cli::{Cli, Commands};
use crate::render::{write_json, write_tree};
use anyhow::{Context, Result};
use artimine_discovery::{
    build_tree, extract_archive, get_summary, read_archive_names, ArchiveTree, DirectoryWalker,
    FileEntry, WalkSummary,
};
use artimine_intelligence::{detect_language_and_framework, ProjectDetection, SkillDetector, SkillSet};
use artimine_metrics::{
    CollabDetector, CollaboratorEstimate, ContributionAnalyzer, ContributionMetrics,
    ContributorAnalyzer, ContributorInfo, OaciConfig, OaciInput, ProjectDuration, SystemGit,
};
use artimine_state::{load_settings, SaveReport, Settings, SkillStore};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Parses arguments, loads settings and runs the chosen command against stdout.
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings().context("failed to load settings")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &settings, &mut out)
}

#[derive(Debug, Serialize)]
struct WalkReport<'a> {
    summary: WalkSummary,
    files: &'a [FileEntry],
}

#[derive(Debug, Serialize)]
struct SkillsReport {
    skills: SkillSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<SavedSkills>,
}

#[derive(Debug, Clone, Serialize)]
struct SavedSkills {
    project: String,
    project_id: i64,
    report: SaveReport,
}

/// Everything [`analyze_archive`] learns about one upload.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub archive: String,
    pub tree: ArchiveTree,
    pub summary: WalkSummary,
    pub skills: SkillSet,
    pub detection: ProjectDetection,
    pub duration: ProjectDuration,
    pub metrics: ContributionMetrics,
    pub collaborators: CollaboratorEstimate,
    pub contributors: Vec<ContributorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<SaveReport>,
}

/// Runs one command, writing its output to `out`.
pub fn execute(command: Commands, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    let ignore = &settings.ignore_patterns;
    let git = || SystemGit::new(settings.git_timeout);

    match command {
        Commands::Tree { archive } => {
            let names = read_archive_names(&archive)
                .with_context(|| format!("failed to read {}", archive.display()))?;
            write_tree(&build_tree(names, ignore), out)?;
        }
        Commands::Walk { dir } => {
            let result = DirectoryWalker::new(ignore.clone()).walk(&dir, None)?;
            write_json(
                &WalkReport {
                    summary: get_summary(&result),
                    files: &result.files,
                },
                out,
            )?;
        }
        Commands::Skills { dir, save, project } => {
            let skills = SkillDetector::new(ignore.clone()).detect(&dir)?;
            let saved = if save {
                let project = match project {
                    Some(name) => name,
                    None => project_name(&dir)?,
                };
                Some(save_skills(settings, &project, &skills)?)
            } else {
                None
            };
            write_json(&SkillsReport { skills, saved }, out)?;
        }
        Commands::Detect { dir } => {
            write_json(&detect_language_and_framework(&dir, ignore)?, out)?;
        }
        Commands::Duration { dir } => {
            let analyzer = ContributionAnalyzer::new(git(), ignore.clone());
            write_json(&analyzer.get_project_duration(&dir), out)?;
        }
        Commands::Metrics { dir } => {
            let analyzer = ContributionAnalyzer::new(git(), ignore.clone());
            write_json(&analyzer.get_project_contribution_metrics(&dir), out)?;
        }
        Commands::Collaborators { dir } => {
            write_json(&CollabDetector::new(git(), ignore.clone()).estimate(&dir), out)?;
        }
        Commands::Contributors {
            dir,
            merge_duplicates,
        } => {
            write_json(&ContributorAnalyzer::new(git()).analyze(&dir, merge_duplicates), out)?;
        }
        Commands::Oaci {
            input,
            churn_window_days,
        } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let mut doc: OaciInput = serde_json::from_str(&text)
                .with_context(|| format!("invalid OACI input {}", input.display()))?;
            if doc.criticality.is_none() && !settings.criticality.is_empty() {
                doc.criticality = Some(settings.criticality.clone());
            }
            let config = OaciConfig {
                churn_window_days: churn_window_days.unwrap_or(settings.churn_window_days),
            };
            let scores: BTreeMap<String, f64> = doc.score(config).into_iter().collect();
            write_json(&scores, out)?;
        }
        Commands::Analyze { archive, save } => {
            write_json(&analyze_archive(&archive, settings, save)?, out)?;
        }
    }
    Ok(())
}

/// Extracts `archive` into a temporary directory and runs every analysis on it.
pub fn analyze_archive(archive: &Path, settings: &Settings, save: bool) -> Result<AnalysisReport> {
    let ignore = &settings.ignore_patterns;
    let names = read_archive_names(archive)
        .with_context(|| format!("failed to read {}", archive.display()))?;
    let tree = build_tree(names, ignore);

    let workdir = tempfile::tempdir().context("failed to create extraction directory")?;
    let root = extract_archive(archive, workdir.path())?;
    tracing::info!(archive = %archive.display(), files = tree.file_count, "archive extracted");

    let walk = DirectoryWalker::new(ignore.clone()).walk(&root, None)?;
    let skills = SkillDetector::new(ignore.clone()).detect(&root)?;
    let detection = detect_language_and_framework(&root, ignore)?;

    let git = SystemGit::new(settings.git_timeout);
    let contribution = ContributionAnalyzer::new(&git, ignore.clone());
    let duration = contribution.get_project_duration(&root);
    let metrics = contribution.get_project_contribution_metrics(&root);
    let collaborators = CollabDetector::new(&git, ignore.clone()).estimate(&root);
    let contributors = ContributorAnalyzer::new(&git).analyze(&root, true);

    let saved = if save {
        let name = project_name(archive)?;
        Some(save_skills(settings, &name, &skills)?.report)
    } else {
        None
    };

    Ok(AnalysisReport {
        archive: archive.display().to_string(),
        summary: get_summary(&walk),
        tree,
        skills,
        detection,
        duration,
        metrics,
        collaborators,
        contributors,
        saved,
    })
}

fn save_skills(settings: &Settings, project: &str, skills: &SkillSet) -> Result<SavedSkills> {
    let mut store = SkillStore::open(&settings.db_path)
        .with_context(|| format!("failed to open database {}", settings.db_path.display()))?;
    let project_id = store.upsert_project(project)?;
    let report = store.save_skills_to_db(project_id, skills)?;
    tracing::info!(project, project_id, queries = report.queries, "skills saved");
    Ok(SavedSkills {
        project: project.to_string(),
        project_id,
        report,
    })
}

/// File stem of `path`, made absolute first so `.` resolves to a real name.
fn project_name(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    absolute
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("cannot derive a project name from {}", path.display()))
}
