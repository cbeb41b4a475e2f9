// E2E tests for the mediasort CLI that run without a real exiftool
use assert_fs::prelude::*;
use predicates::prelude::*;

mod common;
use common::{mediasort, setup_sorted_tree};
#[cfg(unix)]
use common::stub_exiftool_dir;

#[test]
fn test_help_lists_subcommands() {
    mediasort()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("organize"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_search_without_filters_lists_all_files() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);

    mediasort()
        .arg("search")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found files:"))
        .stdout(predicate::str::contains("lake.jpg"))
        .stdout(predicate::str::contains("city.png"))
        .stdout(predicate::str::contains("Total: 5 files"))
        .stdout(predicate::str::contains(".hidden.jpg").not());
}

#[test]
fn test_search_by_year_range_prunes_directories() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);

    mediasort()
        .arg("search")
        .arg(root.path())
        .args(["--year", "2020-2021"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spring.jpg"))
        .stdout(predicate::str::contains("summer.mp4"))
        .stdout(predicate::str::contains("winter.jpg"))
        .stdout(predicate::str::contains("lake.jpg").not())
        .stdout(predicate::str::contains("city.png").not())
        .stdout(predicate::str::contains("Skipped 2 directories"));
}

#[test]
fn test_search_by_month() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);

    mediasort()
        .arg("search")
        .arg(root.path())
        .args(["-y", "2020", "-m", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("summer.mp4"))
        .stdout(predicate::str::contains("spring.jpg").not());
}

#[test]
fn test_search_no_matches() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);

    mediasort()
        .arg("search")
        .arg(root.path())
        .args(["-y", "2030"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No files found matching the criteria."));
}

#[test]
fn test_conflicting_rating_flags_fail() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);

    mediasort()
        .arg("search")
        .arg(root.path())
        .args(["--rejected", "--picked"])
        .assert()
        .failure();

    mediasort()
        .arg("search")
        .arg(root.path())
        .args(["-r", "5", "-R"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_ranges_fail_before_searching() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);

    for args in [
        ["--rating", "7"],
        ["--rating", "-3"],
        ["--year", "2023-2020"],
        ["--month", "13"],
        ["--year", "twenty"],
    ] {
        mediasort()
            .arg("search")
            .arg(root.path())
            .args(args)
            .assert()
            .failure()
            .stdout(predicate::str::contains("Searching in").not());
    }
}

#[test]
fn test_missing_exiftool_aborts_organize() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let source = temp_dir.child("source");
    source.child("a.jpg").touch().unwrap();
    let dest = temp_dir.child("dest");

    mediasort()
        .env("PATH", "")
        .arg("organize")
        .arg(source.path())
        .arg(dest.path())
        .arg("--copy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exiftool is not installed"));

    source.child("a.jpg").assert(predicate::path::exists());
    dest.assert(predicate::path::missing());
}

#[test]
fn test_missing_exiftool_aborts_metadata_search() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);

    mediasort()
        .env("PATH", "")
        .arg("search")
        .arg(root.path())
        .args(["-k", "beach"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exiftool is not installed"))
        .stdout(predicate::str::contains("Found files:").not());
}

#[test]
fn test_log_file_is_written() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let root = setup_sorted_tree(&temp_dir);
    let log_file = temp_dir.child("run.log");

    mediasort()
        .arg("search")
        .arg(root.path())
        .arg("--log")
        .arg(log_file.path())
        .args(["--log-level", "DEBUG"])
        .assert()
        .success();

    log_file.assert(predicate::str::contains("Search complete"));
}

#[cfg(unix)]
#[test]
fn test_open_dest_failure_is_not_fatal() {
    let temp_dir = assert_fs::TempDir::new().unwrap();
    let bin = stub_exiftool_dir(&temp_dir);
    let source = temp_dir.child("source");
    source.child("a.jpg").write_str("a").unwrap();
    let dest = temp_dir.child("dest");

    // PATH holds only the stub, so no file explorer can be found
    mediasort()
        .env("PATH", bin.path())
        .arg("organize")
        .arg(source.path())
        .arg(dest.path())
        .args(["--copy", "--fallback-to-file-time", "modified", "--open-dest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 1/1 files"))
        .stdout(predicate::str::contains("could not open directory"));
}
