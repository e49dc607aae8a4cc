/// High-score persistence.
///
/// The only persisted value is one integer. The engine talks to a
/// `HighScoreStore`; loading never fails (anything unreadable is 0) and
/// saving is fire-and-forget.
///
/// ## File format:
///   A single key-value line, `high_score=<n>`.
///   Stored as `highscore.dat` next to the executable when that directory
///   is writable, otherwise under `~/.local/share/gridsnake`.

use std::cell::Cell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};

const SCORE_FILE: &str = "highscore.dat";

pub trait HighScoreStore {
    /// Persisted high score, 0 when nothing usable is stored.
    fn load(&self) -> u32;
    /// Persist a new high score. Failures are logged, not reported.
    fn save(&mut self, score: u32);
}

// ══════════════════════════════════════════════════════════════
// File-backed store
// ══════════════════════════════════════════════════════════════

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    /// Store in the default save directory.
    pub fn in_save_dir() -> Self {
        FileStore::new(save_dir().join(SCORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, score: u32) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serialize(score))
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> u32 {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse(&content).unwrap_or_else(|| {
                warn!("{} is not a valid score file, starting from 0", self.path.display());
                0
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no score file at {}", self.path.display());
                0
            }
            Err(e) => {
                warn!("could not read {}: {e}", self.path.display());
                0
            }
        }
    }

    fn save(&mut self, score: u32) {
        if let Err(e) = self.write(score) {
            warn!("saving high score to {} failed: {e}", self.path.display());
        }
    }
}

// ══════════════════════════════════════════════════════════════
// In-memory store (tests, `--no-save`)
// ══════════════════════════════════════════════════════════════

/// Clones share one cell, so a "fresh session" built from a clone sees
/// what an earlier one saved.
#[derive(Clone, Default)]
pub struct MemoryStore {
    value: Rc<Cell<u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    #[cfg(test)]
    pub fn with_value(score: u32) -> Self {
        MemoryStore { value: Rc::new(Cell::new(score)) }
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> u32 {
        self.value.get()
    }

    fn save(&mut self, score: u32) {
        self.value.set(score);
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let test_path = parent.join(".write_test_gridsnake");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gridsnake");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(score: u32) -> String {
    format!("high_score={}\n", score)
}

fn parse(content: &str) -> Option<u32> {
    content.lines()
        .filter_map(|line| line.trim().split_once('='))
        .find(|(key, _)| key.trim() == "high_score")
        .and_then(|(_, value)| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("gridsnake-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn parse_accepts_key_value_line() {
        assert_eq!(parse("high_score=120\n"), Some(120));
        assert_eq!(parse("  high_score = 7  "), Some(7));
        assert_eq!(parse("high_score=abc"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn file_round_trip_across_instances() {
        let path = temp_path("round_trip.dat");
        let mut store = FileStore::new(&path);
        store.save(345);

        let fresh = FileStore::new(&path);
        assert_eq!(fresh.load(), 345);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_loads_zero() {
        let store = FileStore::new(temp_path("does_not_exist.dat"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn garbled_file_loads_zero() {
        let path = temp_path("garbled.dat");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not a score").unwrap();
        assert_eq!(FileStore::new(&path).load(), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn memory_store_shares_between_clones() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.save(90);
        assert_eq!(b.load(), 90);
    }
}
