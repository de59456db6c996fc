//! Ownership-Adjusted Contribution Impact (OACI) scoring.
//!
//! Scores are a pure fold over merged pull requests, reviews and incident
//! fixes. Nothing is rounded.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Default churn look-back in days.
pub const DEFAULT_CHURN_WINDOW_DAYS: i64 = 14;

const DELETED_LINE_WEIGHT: f64 = 0.5;
const MAX_CHURN_PENALTY: f64 = 0.3;
const COVERAGE_BONUS: f64 = 100.0;
const PERFORMANCE_BONUS: f64 = 100.0;
const REVIEW_ACCEPT_WEIGHT: f64 = 1.5;
const REVIEW_INFLUENCE_WEIGHT: f64 = 1.75;
const REVIEW_SIZE_WEIGHT: f64 = 0.25;
const INCIDENT_WEIGHT: f64 = 10.0;

/// Identifier of a pull request.
pub type PrId = u64;

/// One file touched by a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub added: u64,
    pub deleted: u64,
    /// Change in cyclomatic complexity; negative means simpler.
    #[serde(default)]
    pub complexity_delta: f64,
}

impl FileChange {
    /// Effective lines of code: `added + 0.5 * deleted`.
    pub fn eloc(&self) -> f64 {
        self.added as f64 + DELETED_LINE_WEIGHT * self.deleted as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: PrId,
    pub author: String,
    pub merged: bool,
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub coverage_delta: Option<f64>,
    #[serde(default)]
    pub performance_delta: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl PullRequest {
    pub fn eloc(&self) -> f64 {
        self.files.iter().map(FileChange::eloc).sum()
    }

    fn touched_paths(&self) -> BTreeSet<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    fn touches(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub pr_id: PrId,
    pub reviewer: String,
    #[serde(default)]
    pub suggestions_accepted: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentFix {
    pub resolver: String,
    pub severity: i64,
}

/// Scoring knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OaciConfig {
    pub churn_window_days: i64,
}

impl Default for OaciConfig {
    fn default() -> Self {
        Self {
            churn_window_days: DEFAULT_CHURN_WINDOW_DAYS,
        }
    }
}

/// Everything `compute_oaci` consumes, in one deserializable document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OaciInput {
    #[serde(default)]
    pub prs: Vec<PullRequest>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub incidents: Vec<IncidentFix>,
    #[serde(default)]
    pub criticality: Option<HashMap<String, f64>>,
}

impl OaciInput {
    pub fn score(&self, config: OaciConfig) -> HashMap<String, f64> {
        compute_oaci(
            &self.prs,
            &self.reviews,
            &self.incidents,
            self.criticality.as_ref(),
            config.churn_window_days,
        )
    }
}

/// Per-PR factors behind a code score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrScore {
    pub eloc: f64,
    pub complexity_factor: f64,
    pub criticality_weight: f64,
    pub churn_penalty: f64,
    /// `eloc * complexity_factor * criticality_weight * (1 - churn_penalty)`.
    pub code_score: f64,
    pub bonus: f64,
}

/// Multiplier rewarding simplification and lightly penalising added complexity.
pub fn complexity_factor(total_delta: f64) -> f64 {
    if total_delta <= -5.0 {
        1.2
    } else if total_delta <= -1.0 {
        1.1
    } else if total_delta >= 3.0 {
        0.95
    } else {
        1.0
    }
}

/// ELOC-weighted mean criticality of the touched paths; unknown paths weigh 1.0.
pub fn criticality_weight(pr: &PullRequest, criticality: Option<&HashMap<String, f64>>) -> f64 {
    let Some(criticality) = criticality else {
        return 1.0;
    };
    let total_eloc = pr.eloc();
    if pr.files.is_empty() || total_eloc == 0.0 {
        return 1.0;
    }
    let weighted: f64 = pr
        .files
        .iter()
        .map(|f| f.eloc() * criticality.get(&f.path).copied().unwrap_or(1.0))
        .sum();
    weighted / total_eloc
}

/// Rework penalty from the same author's earlier merged PRs inside the window.
///
/// `history` may hold any PRs; only merged ones by `pr.author` created
/// strictly before `pr` and no more than `churn_window_days` earlier count.
pub fn churn_penalty(pr: &PullRequest, history: &[PullRequest], churn_window_days: i64) -> f64 {
    let touched = pr.touched_paths();
    if touched.is_empty() {
        return 0.0;
    }
    // Windows beyond chrono's range cover all history.
    let window = Duration::try_days(churn_window_days.max(0)).unwrap_or(Duration::MAX);
    let prior: Vec<&PullRequest> = history
        .iter()
        .filter(|p| p.merged && p.author == pr.author && p.id != pr.id)
        .filter(|p| p.created_at < pr.created_at && pr.created_at - p.created_at <= window)
        .collect();

    let retouch: usize = touched
        .iter()
        .map(|path| prior.iter().filter(|p| p.touches(path)).count())
        .sum();
    (retouch as f64 / touched.len() as f64 * MAX_CHURN_PENALTY).min(MAX_CHURN_PENALTY)
}

/// All factors for a single PR.
pub fn pr_breakdown(
    pr: &PullRequest,
    history: &[PullRequest],
    criticality: Option<&HashMap<String, f64>>,
    churn_window_days: i64,
) -> PrScore {
    let eloc = pr.eloc();
    let complexity_factor =
        complexity_factor(pr.files.iter().map(|f| f.complexity_delta).sum::<f64>());
    let criticality_weight = criticality_weight(pr, criticality);
    let churn_penalty = churn_penalty(pr, history, churn_window_days);
    let bonus = COVERAGE_BONUS * pr.coverage_delta.unwrap_or(0.0)
        + PERFORMANCE_BONUS * pr.performance_delta.unwrap_or(0.0);

    PrScore {
        eloc,
        complexity_factor,
        criticality_weight,
        churn_penalty,
        code_score: eloc * complexity_factor * criticality_weight * (1.0 - churn_penalty),
        bonus,
    }
}

/// Sums code, bonus, review and incident credit per person.
///
/// Unmerged PRs are ignored, as are reviews of them and of unknown ids.
/// People whose every component is zero are absent from the result.
pub fn compute_oaci(
    prs: &[PullRequest],
    reviews: &[Review],
    incidents: &[IncidentFix],
    criticality_by_path: Option<&HashMap<String, f64>>,
    churn_window_days: i64,
) -> HashMap<String, f64> {
    let merged: Vec<PullRequest> = prs.iter().filter(|p| p.merged).cloned().collect();
    let merged_by_id: HashMap<PrId, &PullRequest> = merged.iter().map(|p| (p.id, p)).collect();

    let code = merged.iter().flat_map(|pr| {
        let score = pr_breakdown(pr, &merged, criticality_by_path, churn_window_days);
        [
            (pr.author.as_str(), score.code_score),
            (pr.author.as_str(), score.bonus),
        ]
    });

    let review = reviews.iter().filter_map(|r| {
        let pr = merged_by_id.get(&r.pr_id)?;
        Some((
            r.reviewer.as_str(),
            review_credit(r, pr, REVIEW_ACCEPT_WEIGHT),
        ))
    });

    let incident = incidents
        .iter()
        .map(|i| (i.resolver.as_str(), incident_credit(i)));

    code.chain(review)
        .chain(incident)
        .fold(HashMap::new(), credit)
}

/// Review influence in isolation, with its own acceptance weight.
pub fn compute_review_influence_score(
    reviews: &[Review],
    prs: &[PullRequest],
) -> HashMap<String, f64> {
    let merged_by_id: HashMap<PrId, &PullRequest> =
        prs.iter().filter(|p| p.merged).map(|p| (p.id, p)).collect();
    reviews
        .iter()
        .filter_map(|r| {
            let pr = merged_by_id.get(&r.pr_id)?;
            Some((
                r.reviewer.as_str(),
                review_credit(r, pr, REVIEW_INFLUENCE_WEIGHT),
            ))
        })
        .fold(HashMap::new(), credit)
}

fn review_credit(review: &Review, pr: &PullRequest, accept_weight: f64) -> f64 {
    accept_weight * f64::from(review.suggestions_accepted)
        + REVIEW_SIZE_WEIGHT * (1.0 + pr.eloc().max(0.0)).ln()
}

fn incident_credit(incident: &IncidentFix) -> f64 {
    incident.severity.clamp(1, 5) as f64 * INCIDENT_WEIGHT
}

fn credit(mut totals: HashMap<String, f64>, (who, value): (&str, f64)) -> HashMap<String, f64> {
    if value != 0.0 {
        *totals.entry(who.to_string()).or_insert(0.0) += value;
    }
    totals
}
