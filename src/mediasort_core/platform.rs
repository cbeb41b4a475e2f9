use std::io;
use std::path::Path;
use std::process::Command;

#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENER: &str = "xdg-open";

/// Open `path` in the platform file explorer.
///
/// A missing opener program is an error; a non-zero exit is only logged
/// (explorer.exe reports 1 even on success).
pub fn open_directory(path: &Path) -> io::Result<()> {
    log::info!("Opening {} with {}", path.display(), OPENER);
    let status = Command::new(OPENER).arg(path).status()?;
    if !status.success() {
        log::warn!("{} exited with {} for {}", OPENER, status, path.display());
    }
    Ok(())
}
