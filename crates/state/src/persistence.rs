use artimine_intelligence::{Skill, SkillSet, SkillType};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    skill_type TEXT NOT NULL CHECK (skill_type IN ('tool', 'practice')),
    UNIQUE (name, skill_type)
);
CREATE TABLE IF NOT EXISTS project_skills (
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
    PRIMARY KEY (project_id, skill_id)
);
";

/// Errors raised by [`SkillStore`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown project id {0}")]
    UnknownProject(i64),

    #[error("stored skill type {0:?} is not recognised")]
    InvalidSkillType(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// What a [`SkillStore::save_skills_to_db`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Statements executed inside the transaction; never more than four.
    pub queries: usize,
    pub skills_created: usize,
    pub links_created: usize,
}

/// SQLite-backed store of projects and their detected skills.
pub struct SkillStore {
    conn: Connection,
}

impl SkillStore {
    /// Opens (creating if needed) the database at `path` and ensures the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init_schema()?;
        tracing::debug!(path = %path.display(), "skill store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Creates missing tables; safe to call repeatedly.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Returns the id of project `name`, creating it on first use.
    pub fn upsert_project(&self, name: &str) -> Result<i64> {
        let id = self.conn.query_row(
            "INSERT INTO projects (name) VALUES (?1)
             ON CONFLICT(name) DO UPDATE SET name = excluded.name
             RETURNING id",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Links every skill in `skills` to `project_id`, creating skill rows as needed.
    ///
    /// Runs at most four statements in one transaction: fetch existing
    /// skills, insert missing skills, fetch existing links, insert missing
    /// links. Steps with nothing to do are skipped. Repeating the call is a
    /// no-op apart from the two lookups.
    pub fn save_skills_to_db(&mut self, project_id: i64, skills: &SkillSet) -> Result<SaveReport> {
        let mut report = SaveReport::default();
        if skills.is_empty() {
            return Ok(report);
        }

        let wanted: BTreeSet<(String, SkillType)> =
            skills.iter().map(|s| (s.name, s.skill_type)).collect();
        let names: BTreeSet<&str> = wanted.iter().map(|(n, _)| n.as_str()).collect();

        let tx = self.conn.transaction()?;

        // 1. existing skill rows, matched by name and filtered by type here
        let mut ids: HashMap<(String, SkillType), i64> = HashMap::new();
        {
            let sql = format!(
                "SELECT id, name, skill_type FROM skills WHERE name IN ({})",
                placeholders(names.len(), 1)
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(names.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (id, name, ty) = row?;
                let ty = SkillType::parse(&ty).ok_or(StoreError::InvalidSkillType(ty))?;
                if wanted.contains(&(name.clone(), ty)) {
                    ids.insert((name, ty), id);
                }
            }
            report.queries += 1;
        }

        // 2. missing skill rows
        let missing: Vec<&(String, SkillType)> =
            wanted.iter().filter(|k| !ids.contains_key(*k)).collect();
        if !missing.is_empty() {
            let sql = format!(
                "INSERT INTO skills (name, skill_type) VALUES {} RETURNING id, name, skill_type",
                placeholders(missing.len(), 2)
            );
            let values: Vec<&str> = missing
                .iter()
                .flat_map(|(name, ty)| [name.as_str(), ty.as_str()])
                .collect();
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (id, name, ty) = row?;
                let ty = SkillType::parse(&ty).ok_or(StoreError::InvalidSkillType(ty))?;
                ids.insert((name, ty), id);
                report.skills_created += 1;
            }
            report.queries += 1;
        }

        // 3. links that already exist
        let skill_ids: BTreeSet<i64> = ids.values().copied().collect();
        let mut linked: BTreeSet<i64> = BTreeSet::new();
        {
            let sql = format!(
                "SELECT skill_id FROM project_skills WHERE project_id = ? AND skill_id IN ({})",
                placeholders(skill_ids.len(), 1)
            );
            let args = std::iter::once(project_id).chain(skill_ids.iter().copied());
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), |row| row.get::<_, i64>(0))?;
            for row in rows {
                linked.insert(row?);
            }
            report.queries += 1;
        }

        // 4. missing links
        let to_link: Vec<i64> = skill_ids.difference(&linked).copied().collect();
        if !to_link.is_empty() {
            let sql = format!(
                "INSERT INTO project_skills (project_id, skill_id) VALUES {}",
                placeholders(to_link.len(), 2)
            );
            let args = to_link.iter().flat_map(|id| [project_id, *id]);
            report.links_created = tx
                .execute(&sql, params_from_iter(args))
                .map_err(|e| foreign_key_error(e, project_id))?;
            report.queries += 1;
        }

        tx.commit()?;
        tracing::debug!(
            project_id,
            queries = report.queries,
            skills_created = report.skills_created,
            links_created = report.links_created,
            "skills saved"
        );
        Ok(report)
    }

    /// Skills linked to `project_id`, tools first, each alphabetical.
    pub fn load_project_skills(&self, project_id: i64) -> Result<Vec<Skill>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.name, s.skill_type FROM skills s
             JOIN project_skills ps ON ps.skill_id = s.id
             WHERE ps.project_id = ?1
             ORDER BY CASE s.skill_type WHEN 'tool' THEN 0 ELSE 1 END, s.name",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.map(|row| -> Result<Skill> {
            let (name, ty) = row?;
            let skill_type = SkillType::parse(&ty).ok_or(StoreError::InvalidSkillType(ty))?;
            Ok(Skill { name, skill_type })
        })
        .collect()
    }

    /// Looks up a project id by name.
    pub fn project_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }
}

/// `n` groups of `width` placeholders: `?` for width 1, `(?, ?)` otherwise.
fn placeholders(n: usize, width: usize) -> String {
    let group = if width == 1 {
        "?".to_string()
    } else {
        format!("({})", vec!["?"; width].join(", "))
    };
    vec![group; n].join(", ")
}

fn foreign_key_error(e: rusqlite::Error, project_id: i64) -> StoreError {
    match e.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => StoreError::UnknownProject(project_id),
        _ => StoreError::Sqlite(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(tools: &[&str], practices: &[&str]) -> SkillSet {
        let mut set = SkillSet::new();
        for t in tools {
            set.insert(SkillType::Tool, t);
        }
        for p in practices {
            set.insert(SkillType::Practice, p);
        }
        set
    }

    #[test]
    fn upsert_project_is_stable() {
        let store = SkillStore::open_in_memory().unwrap();
        let a = store.upsert_project("portfolio").unwrap();
        let b = store.upsert_project("portfolio").unwrap();
        let c = store.upsert_project("other").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.project_id("portfolio").unwrap(), Some(a));
        assert_eq!(store.project_id("missing").unwrap(), None);
    }

    #[test]
    fn first_save_runs_four_statements() {
        let mut store = SkillStore::open_in_memory().unwrap();
        let project = store.upsert_project("p").unwrap();
        let report = store
            .save_skills_to_db(project, &skills(&["Docker", "SQL"], &["Code Review"]))
            .unwrap();
        assert_eq!(
            report,
            SaveReport {
                queries: 4,
                skills_created: 3,
                links_created: 3
            }
        );
    }

    #[test]
    fn repeat_save_is_idempotent() {
        let mut store = SkillStore::open_in_memory().unwrap();
        let project = store.upsert_project("p").unwrap();
        let set = skills(&["Docker"], &["Automated Testing"]);
        store.save_skills_to_db(project, &set).unwrap();
        let again = store.save_skills_to_db(project, &set).unwrap();
        assert_eq!(again.queries, 2);
        assert_eq!(again.skills_created, 0);
        assert_eq!(again.links_created, 0);
        assert_eq!(store.load_project_skills(project).unwrap().len(), 2);
    }

    #[test]
    fn skills_are_shared_between_projects() {
        let mut store = SkillStore::open_in_memory().unwrap();
        let a = store.upsert_project("a").unwrap();
        let b = store.upsert_project("b").unwrap();
        store.save_skills_to_db(a, &skills(&["Docker"], &[])).unwrap();
        let report = store
            .save_skills_to_db(b, &skills(&["Docker", "Git"], &[]))
            .unwrap();
        assert_eq!(report.skills_created, 1);
        assert_eq!(report.links_created, 2);
    }

    #[test]
    fn same_name_different_type_are_distinct() {
        let mut store = SkillStore::open_in_memory().unwrap();
        let p = store.upsert_project("p").unwrap();
        store
            .save_skills_to_db(p, &skills(&["Docker"], &["Docker"]))
            .unwrap();
        let loaded = store.load_project_skills(p).unwrap();
        assert_eq!(
            loaded,
            vec![
                Skill {
                    name: "Docker".into(),
                    skill_type: SkillType::Tool
                },
                Skill {
                    name: "Docker".into(),
                    skill_type: SkillType::Practice
                },
            ]
        );
    }

    #[test]
    fn empty_set_runs_nothing() {
        let mut store = SkillStore::open_in_memory().unwrap();
        let p = store.upsert_project("p").unwrap();
        assert_eq!(
            store.save_skills_to_db(p, &SkillSet::new()).unwrap(),
            SaveReport::default()
        );
    }

    #[test]
    fn unknown_project_is_rejected_and_rolled_back() {
        let mut store = SkillStore::open_in_memory().unwrap();
        let err = store
            .save_skills_to_db(42, &skills(&["Docker"], &[]))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownProject(42)));
        let p = store.upsert_project("p").unwrap();
        let report = store.save_skills_to_db(p, &skills(&["Docker"], &[])).unwrap();
        assert_eq!(report.skills_created, 1);
    }
}
