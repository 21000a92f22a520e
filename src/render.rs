//! Output surfaces for the dashboard.
//!
//! Managers report failures that have no inline place in their data (a failed
//! compliance run, a failed export) through a [`Renderer`].  The terminal
//! dashboard uses [`PlainTextRenderer`]; embedders and tests can use
//! [`RecordingRenderer`] to inspect what would have been shown.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::types::{Message, Role};
use crate::utils::lock;

/// ANSI escape code for dim text (used for user echoes).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for assistant messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for info lines).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for alerts).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for presenting dashboard output.
///
/// Implementations must be shareable across tasks because every manager
/// holds a handle to the same renderer.
pub trait Renderer: Send + Sync {
    /// Print one conversation entry.
    fn print_message(&self, message: &Message);

    /// Print an informational line.
    fn print_info(&self, info: &str);

    /// Print a blocking alert, e.g. a failed batch action.
    fn print_error(&self, error: &str);
}

/// Plain text renderer with optional ANSI styling.
#[derive(Debug)]
pub struct PlainTextRenderer {
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self { use_color: true }
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&self, message: &Message) {
        let (label, style) = match message.role {
            Role::User => ("You", ANSI_DIM),
            Role::Assistant => ("Assistant", ANSI_CYAN),
        };
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", self.styled(style, &format!("{label}:")));
        for line in message.content.lines() {
            let _ = writeln!(stdout, "  {line}");
        }
        let _ = stdout.flush();
    }

    fn print_info(&self, info: &str) {
        println!("{}", self.styled(ANSI_YELLOW, info));
    }

    fn print_error(&self, error: &str) {
        eprintln!("{}", self.styled(ANSI_RED, &format!("Error: {error}")));
    }
}

/// Renderer that keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    messages: Mutex<Vec<Message>>,
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingRenderer {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages printed so far.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.messages).clone()
    }

    /// Informational lines printed so far.
    pub fn infos(&self) -> Vec<String> {
        lock(&self.infos).clone()
    }

    /// Alerts printed so far.
    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }
}

impl Renderer for RecordingRenderer {
    fn print_message(&self, message: &Message) {
        lock(&self.messages).push(message.clone());
    }

    fn print_info(&self, info: &str) {
        lock(&self.infos).push(info.to_string());
    }

    fn print_error(&self, error: &str) {
        lock(&self.errors).push(error.to_string());
    }
}
