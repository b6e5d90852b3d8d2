/*!
 * Display
 * Presentation of the published watch state
 */

use crate::watcher::{GraphingModeState, WatchSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Background color for the status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusColor {
    Green,
    Red,
}

impl StatusColor {
    /// Enabled is green; Unknown and Disabled are red
    #[inline]
    pub fn for_state(state: GraphingModeState) -> Self {
        match state {
            GraphingModeState::Enabled => StatusColor::Green,
            GraphingModeState::Unknown | GraphingModeState::Disabled => StatusColor::Red,
        }
    }

    fn ansi_code(&self) -> &'static str {
        match self {
            StatusColor::Green => "\x1b[42;30m",
            StatusColor::Red => "\x1b[41;97m",
        }
    }
}

const ANSI_RESET: &str = "\x1b[0m";

/// One rendered status line, e.g. `Enabled (refreshed 3 times)`
#[derive(Debug, Clone, Copy)]
pub struct StatusLine {
    snapshot: WatchSnapshot,
    ansi: bool,
}

impl StatusLine {
    pub fn new(snapshot: WatchSnapshot) -> Self {
        Self {
            snapshot,
            ansi: false,
        }
    }

    /// Wrap the state in a terminal background color
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    pub fn color(&self) -> StatusColor {
        StatusColor::for_state(self.snapshot.state)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ansi {
            write!(
                f,
                "{} {} {} (refreshed {} times)",
                self.color().ansi_code(),
                self.snapshot.state,
                ANSI_RESET,
                self.snapshot.refreshed_count
            )
        } else {
            write!(
                f,
                "{} (refreshed {} times)",
                self.snapshot.state, self.snapshot.refreshed_count
            )
        }
    }
}
