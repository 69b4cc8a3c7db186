//! Session lifecycle tests: open, edit, commit, discard

use std::fs;

use pam_fs::NormalizedPath;
use pam_tree::{
    CommitOutcome, Error, Expr, Grammar, LineChange, NodePath, Query, Session, Step, TreeEditor,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SOURCE: &str = "\
#%PAM-1.0
auth        required      pam_env.so
auth        required      pam_deny.so
";

fn target(dir: &TempDir, content: Option<&str>) -> NormalizedPath {
    let path = dir.path().join("system-auth");
    if let Some(content) = content {
        fs::write(&path, content).unwrap();
    }
    NormalizedPath::new(path)
}

fn add_unix(session: &mut Session) -> NodePath {
    let anchor = NodePath::root().child("2");
    let created = session.insert(&anchor, "3", true).unwrap();
    session.set(&created.child("type"), "auth").unwrap();
    session.set(&created.child("control"), "sufficient").unwrap();
    session.set(&created.child("module"), "pam_unix.so").unwrap();
    session
        .set(&created.append("argument"), "nullok")
        .unwrap();
    created
}

#[test]
fn test_commit_writes_inserted_entry_in_place() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, Some(SOURCE));

    let mut session = Session::open(&path, Grammar::PamD).unwrap();
    let created = add_unix(&mut session);
    assert_eq!(created.to_string(), "/3");

    let log: Vec<String> = session.edits().iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(log.join("\n"), @r"
    insert /3 before /2
    set /3/type 'auth'
    set /3/control 'sufficient'
    set /3/module 'pam_unix.so'
    set /3/argument[last()+1] 'nullok'
    ");

    assert_eq!(
        session.commit().unwrap(),
        CommitOutcome::Written { edits: 5 }
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "#%PAM-1.0\n\
         auth        required      pam_env.so\n\
         auth\tsufficient\tpam_unix.so nullok\n\
         auth        required      pam_deny.so\n"
    );
}

#[test]
fn test_discard_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, Some(SOURCE));

    let mut session = Session::open(&path, Grammar::PamD).unwrap();
    add_unix(&mut session);
    assert!(session.is_modified());
    assert_eq!(session.discard(), 5);

    assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
}

#[test]
fn test_commit_without_edits_is_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, Some(SOURCE));

    let mut session = Session::open(&path, Grammar::PamD).unwrap();
    // Setting a field to its current value records nothing
    session
        .set(&NodePath::root().child("1").child("control"), "required")
        .unwrap();
    assert!(!session.is_modified());
    assert!(session.diff().unwrap().is_equivalent);
    assert_eq!(session.commit().unwrap(), CommitOutcome::Unchanged);
}

#[test]
fn test_missing_file_opens_empty_and_is_created_on_commit() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, None);

    let mut session = Session::open(&path, Grammar::PamD).unwrap();
    assert!(session.tree().root().children().is_empty());

    let entry = NodePath::root().child("1");
    session.set(&entry.child("type"), "auth").unwrap();
    session.set(&entry.child("control"), "required").unwrap();
    session.set(&entry.child("module"), "pam_deny.so").unwrap();
    session.commit().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "auth\trequired\tpam_deny.so\n"
    );
}

#[test]
fn test_broken_file_fails_naming_the_path() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, Some("auth required pam_env.so\nbogus line here\n"));

    let err = Session::open(&path, Grammar::PamD).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 2, .. }));
    assert!(err.to_string().contains(path.as_str()));
}

#[test]
fn test_rm_removes_matches_and_reports_count() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, Some(SOURCE));
    let mut session = Session::open(&path, Grammar::PamD).unwrap();

    let query = Query::new(Step::any().filter(Expr::eq("module", "pam_deny.so")));
    let found = session.matches(&query).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(session.rm(&found[0]).unwrap(), 1);
    assert_eq!(session.rm(&found[0]).unwrap(), 0);

    assert!(session.matches(&query).unwrap().is_empty());
    session.commit().unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "#%PAM-1.0\nauth        required      pam_env.so\n"
    );
}

#[test]
fn test_diff_lists_changed_lines() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, Some(SOURCE));
    let mut session = Session::open(&path, Grammar::PamD).unwrap();

    session
        .set(&NodePath::root().child("2").child("control"), "requisite")
        .unwrap();
    let diff = session.diff().unwrap();

    assert!(!diff.is_equivalent);
    assert_eq!(
        diff.changes,
        vec![
            LineChange::Removed("auth        required      pam_deny.so".into()),
            LineChange::Added("auth\trequisite\tpam_deny.so".into()),
        ]
    );
    assert!(diff.unified.contains("+auth\trequisite\tpam_deny.so"));
}

#[test]
fn test_touch_and_clear_toggle_marker() {
    let dir = TempDir::new().unwrap();
    let path = target(&dir, Some(SOURCE));
    let mut session = Session::open(&path, Grammar::PamD).unwrap();
    let marker = NodePath::root().child("1").child("optional");

    session.touch(&marker).unwrap();
    session.touch(&marker).unwrap();
    assert_eq!(session.edits().len(), 1);
    assert_eq!(session.get(&marker).unwrap(), None);

    session.commit().unwrap();
    assert!(
        fs::read_to_string(&path)
            .unwrap()
            .contains("-auth\trequired\tpam_env.so\n")
    );
}
