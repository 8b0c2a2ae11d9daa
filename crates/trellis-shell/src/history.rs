//! Per-session command history with backward/forward browsing.

use std::collections::VecDeque;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Inserting,
    Browsing,
}

/// Bounded command log, newest entry first.
///
/// While browsing, slot 0 holds the line that was being edited when the user
/// first stepped back, so stepping forward again restores it.
#[derive(Debug, Clone)]
pub struct History {
    buffer: VecDeque<String>,
    capacity: usize,
    current: usize,
    mode: Mode,
}

impl History {
    /// Create an empty history keeping at most `capacity` entries (min 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            current: 0,
            mode: Mode::Inserting,
        }
    }

    /// Record a submitted command line.
    ///
    /// A line equal to the most recent entry is not recorded twice. When
    /// submitted while browsing, the line replaces the edit buffer.
    pub fn push(&mut self, line: &str) {
        self.current = 0;
        if self.mode == Mode::Browsing {
            self.mode = Mode::Inserting;
            if self.buffer.get(1).is_some_and(|prev| prev == line) {
                self.buffer.pop_front();
            } else if let Some(front) = self.buffer.front_mut() {
                *front = line.to_string();
            }
            return;
        }
        if self.buffer.front().is_some_and(|front| front == line) {
            return;
        }
        self.insert(line.to_string());
    }

    /// Step back one entry. `line` is the text currently being edited; it
    /// is kept so that [`next`](Self::next) can return to it.
    pub fn previous(&mut self, line: &str) -> String {
        match self.mode {
            Mode::Inserting => {
                self.insert(line.to_string());
                self.mode = Mode::Browsing;
                self.current = usize::from(self.buffer.len() > 1);
            },
            Mode::Browsing => {
                if let Some(slot) = self.buffer.get_mut(self.current) {
                    *slot = line.to_string();
                }
                if self.current + 1 < self.buffer.len() {
                    self.current += 1;
                }
            },
        }
        self.buffer.get(self.current).cloned().unwrap_or_default()
    }

    /// Step forward one entry, or `None` when already at the newest.
    pub fn next(&mut self) -> Option<String> {
        if self.current == 0 {
            return None;
        }
        self.current -= 1;
        self.buffer.get(self.current).cloned()
    }

    /// Seed the history from persisted entries, oldest first.
    pub fn load<S: AsRef<str>>(&mut self, commands: &[S]) {
        for command in commands {
            self.insert(command.as_ref().to_string());
        }
    }

    /// All recorded entries, oldest first.
    pub fn commands(&self) -> Vec<String> {
        let skip = usize::from(self.mode == Mode::Browsing);
        self.buffer.iter().skip(skip).rev().cloned().collect()
    }

    /// Write every entry, newest first, framed by blank lines.
    pub fn show(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out)?;
        for item in &self.buffer {
            writeln!(out, "{item}")?;
        }
        writeln!(out)?;
        out.flush()
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.current = 0;
        self.mode = Mode::Inserting;
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn insert(&mut self, item: String) {
        self.buffer.push_front(item);
        self.buffer.truncate(self.capacity);
    }
}
