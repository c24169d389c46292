//! End-to-end tests against the public [`gitdocdb::Database`] facade.

use std::time::Duration;

use gitdocdb::{Database, DatabaseOptions};
use gitdocdb_git::{GitRepo, GixRepo};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Database {
    Database::open(DatabaseOptions::new("notes", dir.path())).unwrap()
}

#[test]
fn open_leaves_a_valid_git_repository_with_bootstrap_commits() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    db.close(Duration::from_secs(1), false).unwrap();

    let repo = GixRepo::open(dir.path()).unwrap();
    let head = repo.resolve_ref("refs/heads/main").unwrap().unwrap();
    let commits = repo.list_commits_between(None, head).unwrap();
    let messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["first commit", "set database id", "put appinfo"]);
}

#[test]
fn documents_survive_a_close_and_reopen() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    db.put(serde_json::json!({"_id": "nara", "deer": 100})).unwrap();
    db.close(Duration::from_secs(1), false).unwrap();

    let db2 = open(&dir);
    let doc = db2.get("nara").unwrap().unwrap();
    assert_eq!(doc["deer"], 100);
    db2.close(Duration::from_secs(1), false).unwrap();
}

#[test]
fn put_commit_message_follows_the_verb_id_postfix_oid_grammar() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let id = db.put(serde_json::json!({"_id": "nara"})).unwrap();
    db.close(Duration::from_secs(1), false).unwrap();

    let repo = GixRepo::open(dir.path()).unwrap();
    let head = repo.resolve_ref("refs/heads/main").unwrap().unwrap();
    let message = repo.read_commit(head).unwrap().message;
    assert!(message.starts_with(&format!("insert: {id}.json(")));
    assert!(message.ends_with(')'));
}

#[test]
fn update_then_delete_each_produce_their_own_commit() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let id = db.put(serde_json::json!({"_id": "nara", "deer": 1})).unwrap();
    db.put(serde_json::json!({"_id": "nara", "deer": 2})).unwrap();
    assert!(db.delete(id.as_str()).unwrap());
    assert!(db.get(id.as_str()).unwrap().is_none());
    db.close(Duration::from_secs(1), false).unwrap();

    let repo = GixRepo::open(dir.path()).unwrap();
    let head = repo.resolve_ref("refs/heads/main").unwrap().unwrap();
    let commits = repo.list_commits_between(None, head).unwrap();
    let tail: Vec<_> = commits.iter().rev().take(3).map(|c| c.message.clone()).collect();
    assert!(tail[2].starts_with("delete: nara.json("));
    assert!(tail[1].starts_with("update: nara.json("));
    assert!(tail[0].starts_with("insert: nara.json("));
}

#[test]
fn two_independent_directories_do_not_share_state() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let db_a = open(&dir_a);
    let db_b = open(&dir_b);

    db_a.put(serde_json::json!({"_id": "only-in-a"})).unwrap();

    assert!(db_a.get("only-in-a").unwrap().is_some());
    assert!(db_b.get("only-in-a").unwrap().is_none());

    db_a.close(Duration::from_secs(1), false).unwrap();
    db_b.close(Duration::from_secs(1), false).unwrap();
}

#[test]
fn loading_database_options_from_a_config_file_round_trips() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("gitdocdb.toml");
    std::fs::write(
        &config_path,
        format!(
            "db_name = \"notes\"\nlocal_dir = \"{}\"\nserialization = \"yaml\"\n",
            dir.path().display()
        ),
    )
    .unwrap();

    let options = DatabaseOptions::load(&config_path).unwrap().unwrap();
    let db = Database::open(options).unwrap();
    let id = db.put(serde_json::json!({"_id": "nara"})).unwrap();
    assert!(db.get(id.as_str()).unwrap().is_some());
    db.close(Duration::from_secs(1), false).unwrap();

    let repo = GixRepo::open(dir.path()).unwrap();
    let head = repo.resolve_ref("refs/heads/main").unwrap().unwrap();
    let tree = repo.read_commit(head).unwrap().tree_oid;
    let paths: Vec<_> = repo.walk_tree(tree).unwrap().into_iter().map(|(p, _)| p).collect();
    assert!(paths.contains(&"nara.yml".to_owned()));
}
