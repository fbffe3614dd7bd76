use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn grandlite() -> Command {
    let mut cmd = Command::cargo_bin("grandlite").unwrap();
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn headered_graph(dir: &Path) -> String {
    let path = write(dir, "edges.csv", "src,tgt,weight\nA,B,5\nB,C,7\n");
    format!("h-edgelist(src:tgt)://{}", path.display())
}

#[test]
fn test_batch_csv_to_stdout() {
    let dir = TempDir::new().unwrap();
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-q", "MATCH (a)-[r]->(b) RETURN a, b, r.weight AS w ORDER BY a", "-o", "csv"])
        .assert()
        .success()
        .stdout("a,b,w\nA,B,5\nB,C,7\n");
}

#[test]
fn test_batch_table_is_the_default() {
    let dir = TempDir::new().unwrap();
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-q", "MATCH (n) RETURN count(n) AS nodes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nodes").and(predicate::str::contains("3")));
}

#[test]
fn test_output_file_infers_format() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("rows.jsonl");
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-q", "MATCH (a)-->(b) RETURN a, b ORDER BY a", "--output-file"])
        .arg(&out)
        .assert()
        .success()
        .stdout("");
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "{\"a\":\"A\",\"b\":\"B\"}\n{\"a\":\"B\",\"b\":\"C\"}\n"
    );
}

#[test]
fn test_motif_from_query_file() {
    let dir = TempDir::new().unwrap();
    let motif = write(dir.path(), "chain.motif", "# a two-step chain\nX -> Y\nY -> Z [weight >= 7]\n");
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-l", "dotmotif", "-o", "json", "--query-file"])
        .arg(&motif)
        .assert()
        .success()
        .stdout("[{\"X\":\"A\",\"Y\":\"B\",\"Z\":\"C\"}]\n");
}

#[test]
fn test_unknown_language_fails() {
    let dir = TempDir::new().unwrap();
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-l", "sparql", "-q", "SELECT *"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid value 'sparql'"))
        .stderr(predicate::str::contains("cypher, dotmotif"));
}

#[test]
fn test_unknown_output_format_fails() {
    let dir = TempDir::new().unwrap();
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-q", "MATCH (n) RETURN n", "-o", "parquet"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid value 'parquet'"))
        .stderr(predicate::str::contains("csv, json, jsonl"));
}

#[test]
fn test_help_lists_choices() {
    grandlite()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cypher, dotmotif"))
        .stdout(predicate::str::contains("csv, json, jsonl, md, html"));
}

#[test]
fn test_failed_query_leaves_no_output_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("rows.csv");
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-q", "MATCH (n RETURN n", "--output-file"])
        .arg(&out)
        .assert()
        .code(1);
    assert!(!out.exists());
}

#[test]
fn test_unclassifiable_source_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "mystery", "nothing to see here\n");
    grandlite()
        .arg(&path)
        .args(["-q", "MATCH (n) RETURN n"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not determine the graph format"));
}

#[test]
fn test_query_error_fails_batch() {
    let dir = TempDir::new().unwrap();
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-q", "MATCH (n RETURN n"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_repl_exit_synonyms() {
    let dir = TempDir::new().unwrap();
    for exit in ["exit", "exit()", "quit", "quit()", "q"] {
        grandlite()
            .arg(headered_graph(dir.path()))
            .write_stdin(format!("{}\nMATCH (n) RETURN n\n", exit))
            .assert()
            .success()
            .stdout(predicate::str::contains("Language: Cypher    Vertices: 3    Edges: 2"))
            .stdout(predicate::str::contains("| n |").not());
    }
}

#[test]
fn test_repl_saves_distinct_files() {
    let dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    grandlite()
        .current_dir(work.path())
        .arg(headered_graph(dir.path()))
        .write_stdin("save\nMATCH (a)-->(b) RETURN a, b\nMATCH (a)-->(b) RETURN a, b\nsave\nsave\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No results to save."))
        .stdout(predicate::str::contains("| A | B |"))
        .stdout(predicate::str::contains("Last results: 2"));

    let mut saved: Vec<String> = fs::read_dir(work.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    saved.sort();
    assert_eq!(saved.len(), 2);
    for name in &saved {
        assert!(name.starts_with("results-") && name.ends_with(".json"), "{}", name);
        let contents = fs::read_to_string(work.path().join(name)).unwrap();
        assert_eq!(contents, "[{\"a\":\"A\",\"b\":\"B\"},{\"a\":\"B\",\"b\":\"C\"}]\n");
    }
}

#[test]
fn test_repl_motif_blank_line_submits() {
    let dir = TempDir::new().unwrap();
    grandlite()
        .arg(headered_graph(dir.path()))
        .args(["-l", "dotmotif"])
        .write_stdin("X -> Y\nY -> Z\n\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("(blank line to submit)"))
        .stdout(predicate::str::contains("| A | B | C |"));
}
