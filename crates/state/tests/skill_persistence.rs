//! Detected skills survive a round trip through an on-disk store.

use artimine_intelligence::{SkillDetector, SkillType};
use artimine_state::SkillStore;
use artimine_test_utils::ProjectFixture;

#[test]
fn detected_skills_persist_across_reopen() {
    let project = ProjectFixture::with_files(&[
        ("pytest.ini", ""),
        ("tests/test_a.py", ""),
        ("Dockerfile", ""),
    ])
    .unwrap();
    let skills = SkillDetector::default().detect(project.root()).unwrap();

    let db_dir = tempfile::tempdir().unwrap();
    let db_path = db_dir.path().join("nested/artimine.db");
    let project_id = {
        let mut store = SkillStore::open(&db_path).unwrap();
        let id = store.upsert_project("demo").unwrap();
        let report = store.save_skills_to_db(id, &skills).unwrap();
        assert!(report.queries <= 4);
        id
    };

    let store = SkillStore::open(&db_path).unwrap();
    let loaded = store.load_project_skills(project_id).unwrap();
    assert_eq!(loaded.len(), skills.len());
    assert!(loaded
        .iter()
        .any(|s| s.name == "PyTest" && s.skill_type == SkillType::Tool));
    assert_eq!(store.project_id("demo").unwrap(), Some(project_id));
}
