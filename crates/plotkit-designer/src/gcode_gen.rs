//! G-code generation from motion programs.

use plotkit_core::{format_coordinate, format_feed_rate, format_seconds};
use serde::{Deserialize, Serialize};

use crate::toolpath::{Command, MotionProgram};

/// Pen actuator commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenSettings {
    /// Raises the pen.
    pub pen_up: String,
    /// Lowers the pen.
    pub pen_down: String,
    /// Settle time after every pen move, in seconds.
    pub dwell_seconds: f64,
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            pen_up: "M5".to_string(),
            pen_down: "M03 S35".to_string(),
            dwell_seconds: 0.0,
        }
    }
}

/// Renders a [`MotionProgram`] as G-code text.
#[derive(Debug, Clone, Default)]
pub struct ProgramSerializer {
    pen: PenSettings,
}

impl ProgramSerializer {
    pub fn new(pen: PenSettings) -> Self {
        Self { pen }
    }

    pub fn pen(&self) -> &PenSettings {
        &self.pen
    }

    /// Wire text for one command. Pen commands span two lines.
    pub fn command_text(&self, command: &Command) -> String {
        match command {
            Command::SetUnits => "G21".to_string(),
            Command::SetAbsolute => "G90".to_string(),
            Command::SetFeedRate(rate) => format!("F{}", format_feed_rate(*rate)),
            Command::PenUp => self.pen_command(&self.pen.pen_up),
            Command::PenDown => self.pen_command(&self.pen.pen_down),
            Command::RapidMove { x, y } => {
                format!("G0 X{} Y{}", format_coordinate(*x), format_coordinate(*y))
            }
            Command::LinearMove { x, y } => {
                format!("G1 X{} Y{}", format_coordinate(*x), format_coordinate(*y))
            }
            Command::Dwell(seconds) => format!("G4 P{}", format_seconds(*seconds)),
            Command::ProgramEnd => "M30".to_string(),
        }
    }

    fn pen_command(&self, command: &str) -> String {
        format!("{}\nG4 P{}", command, format_seconds(self.pen.dwell_seconds))
    }

    /// Newline-joined program text, without a trailing newline.
    pub fn serialize(&self, program: &MotionProgram) -> String {
        program
            .commands()
            .iter()
            .map(|command| self.command_text(command))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
