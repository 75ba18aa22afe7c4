//! CLI behaviour of `cdxj-indexer index`

use super::helpers::*;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// The binary with HOME pointed at an empty directory, so no user options
/// file is picked up.
pub fn indexer(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cdxj-indexer").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("CDXJ_INDEXER_LOG");
    cmd
}

fn write_sample(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("example.warc.gz");
    response_and_revisit().write_to(&path);
    path
}

#[test]
fn indexes_file_to_stdout() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);

    let output = indexer(&temp)
        .args(["index", "--replace-fields", "url,mime,status"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    insta::assert_snapshot!(stdout, @r#"
    com,example)/ 20170306040206 {"url": "http://example.com/", "mime": "text/html", "status": "200"}
    com,example)/ 20170306040348 {"url": "http://example.com/", "mime": "warc/revisit", "status": "200"}
    "#);
}

#[test]
fn writes_output_file() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);
    let out = temp.path().join("index.cdxj");

    indexer(&temp)
        .args(["index", "-o"])
        .arg(&out)
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(written.contains("\"filename\": \"example.warc.gz\""));
}

#[test]
fn legacy_short_flag_selects_cdx11() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);

    indexer(&temp)
        .args(["index", "-11", "-s"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(" CDX N b a m s k r M S V g\n"))
        .stdout(predicate::str::contains(
            "com,example)/ 20170306040348 http://example.com/ warc/revisit 200 B2LTWWPUOYAH7UIPQ7ZUPQ4VMBSVC36A - -",
        ));
}

#[test]
fn sort_drops_duplicate_lines() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);

    let output = indexer(&temp)
        .args(["index", "-s"])
        .arg(&path)
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);
}

#[test]
fn conflicting_layout_options_fail() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);

    indexer(&temp)
        .args(["index", "-9", "-f", "method"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn zero_block_size_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);

    indexer(&temp)
        .args(["index", "-c"])
        .arg(temp.path().join("out"))
        .args(["-l", "0"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Block size must be at least 1 line"));
}

#[test]
fn missing_input_fails_with_path() {
    let temp = TempDir::new().unwrap();

    indexer(&temp)
        .args(["index", "does-not-exist.warc.gz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.warc.gz"));
}

#[test]
fn compress_writes_data_and_sidecar() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);
    let data = temp.path().join("index");

    let output = indexer(&temp)
        .args(["index", "-c"])
        .arg(&data)
        .args(["-l", "1"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let data_path = temp.path().join("index.cdxj.gz");
    assert!(data_path.exists());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("!meta 0 {\"format\": \"cdxj-gzip-1.0\""));
    assert!(lines[0].contains("index.cdxj.gz"));
    assert!(lines[1].starts_with("com,example)/ 20170306040206 {\"offset\": 0, \"length\": "));
}

#[test]
fn verbose_logs_to_stderr_only() {
    let temp = TempDir::new().unwrap();
    let path = write_sample(&temp);

    let output = indexer(&temp)
        .args(["index", "-v"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("indexing input"));
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .all(|line| line.starts_with("com,example)/ ")));
}

#[test]
fn completions_are_generated() {
    let temp = TempDir::new().unwrap();

    indexer(&temp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cdxj-indexer"));
}
