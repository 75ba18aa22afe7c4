//! Input handling: directories, standard input, filename resolution

use super::cli_test::indexer;
use super::helpers::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn resource(uri: &str) -> Warc {
    Warc::plain().push(Record::new("resource", uri).block("x"))
}

#[test]
fn directory_inputs_are_expanded() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("crawls");
    resource("http://example.com/a").write_to(&root.join("2017").join("a.warc"));
    resource("http://example.com/b").write_to(&root.join("b.warc.gz"));
    resource("http://example.com/ignored").write_to(&root.join("notes.txt"));

    let output = indexer(&temp)
        .args(["index", "--replace-fields", "url,filename", "--dir-root"])
        .arg(&root)
        .arg(&root)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    insta::assert_snapshot!(stdout, @r#"
    com,example)/a 20170306040206 {"url": "http://example.com/a", "filename": "2017/a.warc"}
    com,example)/b 20170306040206 {"url": "http://example.com/b", "filename": "b.warc.gz"}
    "#);
}

#[test]
fn files_outside_dir_root_use_basename() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("elsewhere").join("c.warc");
    resource("http://example.com/c").write_to(&path);

    indexer(&temp)
        .args(["index", "--dir-root"])
        .arg(temp.path().join("crawls"))
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"filename\": \"c.warc\""));
}

#[test]
fn standard_input_is_indexed() {
    let temp = TempDir::new().unwrap();
    let warc = response_and_revisit();

    indexer(&temp)
        .args(["index", "--rf", "url,filename", "-"])
        .write_stdin(warc.bytes().to_vec())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "com,example)/ 20170306040206 {\"url\": \"http://example.com/\", \"filename\": \"-\"}",
        ));
}

#[test]
fn truncated_container_stops_the_run() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.warc");
    std::fs::write(
        &path,
        b"WARC/1.0\r\nWARC-Type: resource\r\nContent-Length: 100\r\n\r\nshort",
    )
    .unwrap();

    indexer(&temp)
        .arg("index")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("truncated block"));
}
