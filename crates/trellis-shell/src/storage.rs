//! Persistent history stores shared by every session of an engine.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use trellis_types::config::DEFAULT_HISTORY_FILE_LIMIT;
use trellis_types::error::{Result, ShellError};

/// Backing store for command history across sessions.
///
/// A session reads the stored list once when it starts and replaces it with
/// its own full list when it exits.
pub trait HistoryStorage: Send {
    /// Replace the stored list with `commands` (oldest first).
    fn store(&mut self, commands: &[String]) -> Result<()>;

    /// The stored list, oldest first.
    fn commands(&self) -> Result<Vec<String>>;
}

/// In-memory store: history survives between sessions but not restarts.
#[derive(Debug, Clone)]
pub struct VolatileHistoryStorage {
    commands: Vec<String>,
    max_size: usize,
}

impl VolatileHistoryStorage {
    /// Keep at most `max_size` entries (min 1).
    pub fn new(max_size: usize) -> Self {
        Self {
            commands: Vec::new(),
            max_size: max_size.max(1),
        }
    }
}

impl Default for VolatileHistoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_FILE_LIMIT)
    }
}

impl HistoryStorage for VolatileHistoryStorage {
    fn store(&mut self, commands: &[String]) -> Result<()> {
        let skip = commands.len().saturating_sub(self.max_size);
        self.commands = commands[skip..].to_vec();
        Ok(())
    }

    fn commands(&self) -> Result<Vec<String>> {
        Ok(self.commands.clone())
    }
}

/// Newline-separated text file, one command per line.
#[derive(Debug, Clone)]
pub struct FileHistoryStorage {
    path: PathBuf,
    max_size: usize,
}

impl FileHistoryStorage {
    /// Store history in `path`, keeping at most `max_size` entries (min 1).
    pub fn new(path: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            path: path.into(),
            max_size: max_size.max(1),
        }
    }

    /// Location of the history file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStorage for FileHistoryStorage {
    fn store(&mut self, commands: &[String]) -> Result<()> {
        let skip = commands.len().saturating_sub(self.max_size);
        let mut text = String::new();
        for command in &commands[skip..] {
            text.push_str(command);
            text.push('\n');
        }
        fs::write(&self.path, text)?;
        log::debug!(
            "stored {} history entries in {}",
            commands.len() - skip,
            self.path.display()
        );
        Ok(())
    }

    fn commands(&self) -> Result<Vec<String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ShellError::History(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            },
        };
        let lines: Vec<String> = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let skip = lines.len().saturating_sub(self.max_size);
        Ok(lines[skip..].to_vec())
    }
}
