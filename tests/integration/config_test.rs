//! Options files

use super::cli_test::indexer;
use super::helpers::*;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sample(temp: &TempDir) -> std::path::PathBuf {
    let path = temp.path().join("a.warc.gz");
    response_and_revisit().write_to(&path);
    path
}

#[test]
fn explicit_config_supplies_defaults() {
    let temp = TempDir::new().unwrap();
    let path = sample(&temp);
    let config = temp.path().join("indexer.toml");
    fs::write(&config, "format = \"cdx09\"\nfilename = \"from-config.warc.gz\"\n").unwrap();

    indexer(&temp)
        .args(["index", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(" CDX N b a m s k r V g\n"))
        .stdout(predicate::str::contains(" from-config.warc.gz\n"));
}

#[test]
fn flags_override_config_file() {
    let temp = TempDir::new().unwrap();
    let path = sample(&temp);
    let config = temp.path().join("indexer.toml");
    fs::write(&config, "filename = \"from-config.warc.gz\"\n").unwrap();

    indexer(&temp)
        .args(["index", "--filename", "from-flag.warc.gz", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"filename\": \"from-flag.warc.gz\""));
}

#[test]
fn default_config_is_read_from_home() {
    let temp = TempDir::new().unwrap();
    let path = sample(&temp);
    let dir = temp.path().join(".config").join("cdxj-indexer");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "replace_fields = \"url\"\n").unwrap();

    indexer(&temp)
        .arg("index")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "com,example)/ 20170306040206 {\"url\": \"http://example.com/\"}\n",
        ));
}

#[test]
fn conflicting_config_and_flag_fail_validation() {
    let temp = TempDir::new().unwrap();
    let path = sample(&temp);
    let config = temp.path().join("indexer.toml");
    fs::write(&config, "format = \"cdx11\"\n").unwrap();

    indexer(&temp)
        .args(["index", "-f", "method", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Options --cdx11 and --fields cannot be used together",
        ));
}

#[test]
fn invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = sample(&temp);
    let config = temp.path().join("broken.toml");
    fs::write(&config, "lines = \"many\"\n").unwrap();

    indexer(&temp)
        .args(["index", "--config"])
        .arg(&config)
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}
