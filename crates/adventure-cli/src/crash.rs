//! Crash log: panics are appended to `CRASH.log` in the root folder.

use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};

use chrono::Local;

pub const CRASH_LOG_FILE: &str = "CRASH.log";

pub fn crash_line(message: &str) -> String {
    format!(
        "[{}] [CRASHED] : |{}|\n",
        Local::now().format("%Y-%m-%d_%H:%M:%S%.3f"),
        message
    )
}

pub fn append_crash(path: &Path, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(crash_line(message).as_bytes())
}

/// Install a panic hook that records the panic before the default output.
pub fn install_hook(root_folder: &Path) {
    let path: PathBuf = root_folder.join(CRASH_LOG_FILE);
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if let Err(e) = append_crash(&path, &info.to_string()) {
            eprintln!("Failed to write {}: {e}", path.display());
        }
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_lines_are_appended() {
        let dir = std::env::temp_dir().join(format!("adventure_crash_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CRASH_LOG_FILE);

        append_crash(&path, "first").unwrap();
        append_crash(&path, "second").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] [CRASHED] : |first|"));
        assert!(lines[1].starts_with('['));

        std::fs::remove_dir_all(&dir).ok();
    }
}
