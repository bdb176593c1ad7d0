//! User-facing output
//!
//! Provides a simple API for reporting what a command is doing:
//! - Current phase (Connecting, Creating, Loading, Summarizing)
//! - Progress (current/total with optional details)
//! - Activity log
//!
//! Commands write through the [`Ui`] trait so tests can run silently. The
//! interactive dashboard lives in [`dashboard`].

mod charts;
mod components;
pub mod dashboard;

use std::io::{self, Write};

pub use charts::format_money;
pub use dashboard::{DashboardApp, DashboardState};

/// Command phases
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Connecting,
    Creating,
    Loading,
    Querying,
    Summarizing,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Connecting => write!(f, "Connecting to warehouse"),
            Phase::Creating => write!(f, "Creating table"),
            Phase::Loading => write!(f, "Loading staged data"),
            Phase::Querying => write!(f, "Running queries"),
            Phase::Summarizing => write!(f, "Summarizing"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress information for the current operation
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Trait for UI implementations - allows both console and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

/// Line-oriented console output
#[derive(Default)]
pub struct ConsoleUi {
    verbose: bool,
    progress_shown: bool,
}

impl ConsoleUi {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress_shown: false,
        }
    }
}

impl Ui for ConsoleUi {
    fn set_phase(&mut self, phase: Phase) {
        if self.verbose {
            println!("==> {}", phase);
        }
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let progress = Progress::new(current, total, label);
        if progress.total > 0 {
            print!("\r{} ({:.0}%)", progress.label, progress.ratio().min(1.0) * 100.0);
        } else {
            print!("\r{}", progress.label);
        }
        io::stdout().flush().ok();
        self.progress_shown = true;
    }

    fn clear_progress(&mut self) {
        if self.progress_shown {
            println!();
            self.progress_shown = false;
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        println!("{}", message.into());
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}
