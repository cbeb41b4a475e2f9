use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;

pub fn mediasort() -> Command {
    Command::cargo_bin("mediasort").unwrap()
}

/// An already-sorted tree spanning 2019 to 2022.
pub fn setup_sorted_tree(temp_dir: &TempDir) -> ChildPath {
    let root = temp_dir.child("sorted");
    for file in [
        "2019/07/lake.jpg",
        "2020/05/spring.jpg",
        "2020/06/summer.mp4",
        "2021/12/winter.jpg",
        "2021/12/.hidden.jpg",
        "2022/03/city.png",
    ] {
        root.child(file).touch().unwrap();
    }
    root
}

/// A directory holding only a stub `exiftool` that reports no metadata.
#[cfg(unix)]
pub fn stub_exiftool_dir(temp_dir: &TempDir) -> ChildPath {
    use std::os::unix::fs::PermissionsExt;

    let bin = temp_dir.child("bin");
    bin.create_dir_all().unwrap();
    let script = bin.child("exiftool");
    script.write_str("#!/bin/sh\necho '[]'\n").unwrap();
    std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

    // Wait out ETXTBSY from children forked while the script was being written
    for _ in 0..50 {
        match std::process::Command::new(script.path()).output() {
            Err(e) if e.raw_os_error() == Some(26) => {
                std::thread::sleep(std::time::Duration::from_millis(20))
            }
            _ => break,
        }
    }
    bin
}
