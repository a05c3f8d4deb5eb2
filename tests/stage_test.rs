use std::fs;

use coderun::SourceStager;

#[test]
fn restaging_replaces_contents_at_the_same_path() {
    let dir = tempfile::tempdir().unwrap();
    let stager = SourceStager::new(dir.path().join("tmp"), "src");

    let first = stager.stage("print(\"one\")\nprint(\"two\")\n").unwrap();
    let second = stager.stage("print(\"three\")\n").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "print(\"three\")\n");
}

#[test]
fn staging_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("deeply").join("nested").join("tmp");
    let stager = SourceStager::new(&nested, "src");

    let staged = stager.stage("x = 1\n").unwrap();

    assert!(nested.is_dir());
    assert_eq!(staged.parent(), Some(nested.as_path()));
    assert_eq!(fs::read_to_string(&staged).unwrap(), "x = 1\n");
}

#[test]
fn isolated_staging_never_reuses_a_path() {
    let dir = tempfile::tempdir().unwrap();
    let stager = SourceStager::new(dir.path(), "src").with_isolation(true);

    let first = stager.stage("a").unwrap();
    let second = stager.stage("b").unwrap();

    assert_ne!(first, second);
    // Both runs keep their own staged file intact.
    assert_eq!(fs::read_to_string(&first).unwrap(), "a");
    assert_eq!(fs::read_to_string(&second).unwrap(), "b");
}
