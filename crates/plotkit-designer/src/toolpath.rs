//! Toolpath compilation: placed strokes to an ordered motion program.

use serde::{Deserialize, Serialize};

use crate::geometry::{Clamped, Point, Segment};
use crate::layout::PlacedText;

/// Default gap, in millimeters, across which the pen stays down.
pub const DEFAULT_CONNECT_TOLERANCE_MM: f64 = 0.6;

/// Default drawing feed rate, in mm/min.
pub const DEFAULT_FEED_RATE: f64 = 2500.0;

/// One motion program instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Millimeter units.
    SetUnits,
    /// Absolute positioning.
    SetAbsolute,
    /// Feed rate for drawing moves, mm/min.
    SetFeedRate(f64),
    PenUp,
    PenDown,
    /// Travel with the pen up.
    RapidMove { x: f64, y: f64 },
    /// Draw with the pen down.
    LinearMove { x: f64, y: f64 },
    /// Pause, in seconds.
    Dwell(f64),
    ProgramEnd,
}

impl Command {
    fn rapid_to(point: Point<Clamped>) -> Self {
        Command::RapidMove {
            x: point.x,
            y: point.y,
        }
    }

    fn line_to(point: Point<Clamped>) -> Self {
        Command::LinearMove {
            x: point.x,
            y: point.y,
        }
    }
}

/// Number of commands in the fixed program header.
pub const HEADER_LEN: usize = 4;
/// Number of commands in the fixed program footer.
pub const FOOTER_LEN: usize = 2;

/// A complete motion program.
///
/// Always starts with `SetUnits, SetAbsolute, PenUp, SetFeedRate` and
/// always ends with `PenUp, ProgramEnd`, so the pen is never left down.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionProgram {
    commands: Vec<Command>,
}

impl MotionProgram {
    /// Wrap a toolpath body with the fixed header and footer.
    pub fn new(feed_rate: f64, toolpath: Vec<Command>) -> Self {
        let mut commands = Vec::with_capacity(HEADER_LEN + toolpath.len() + FOOTER_LEN);
        commands.extend([
            Command::SetUnits,
            Command::SetAbsolute,
            Command::PenUp,
            Command::SetFeedRate(feed_rate),
        ]);
        commands.extend(toolpath);
        commands.extend([Command::PenUp, Command::ProgramEnd]);
        Self { commands }
    }

    /// A program that draws nothing.
    pub fn empty(feed_rate: f64) -> Self {
        Self::new(feed_rate, Vec::new())
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Commands between the header and the footer.
    pub fn toolpath(&self) -> &[Command] {
        &self.commands[HEADER_LEN..self.commands.len() - FOOTER_LEN]
    }

    pub fn feed_rate(&self) -> f64 {
        match self.commands[HEADER_LEN - 1] {
            Command::SetFeedRate(rate) => rate,
            _ => DEFAULT_FEED_RATE,
        }
    }

    /// True when the program draws nothing.
    pub fn is_empty(&self) -> bool {
        self.toolpath().is_empty()
    }

    pub fn pen_down_count(&self) -> usize {
        self.toolpath()
            .iter()
            .filter(|c| matches!(c, Command::PenDown))
            .count()
    }
}

/// How the compiler decides when to lift the pen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PenStrategy {
    /// Keep the pen down while the next stroke starts within `tolerance_mm`
    /// of the current position.
    Connected { tolerance_mm: f64 },
    /// Lift and lower around every segment.
    LiftEverySegment,
}

impl Default for PenStrategy {
    fn default() -> Self {
        PenStrategy::Connected {
            tolerance_mm: DEFAULT_CONNECT_TOLERANCE_MM,
        }
    }
}

/// Toolpath compiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolpathOptions {
    /// Drawing feed rate, mm/min.
    pub feed_rate: f64,
    pub strategy: PenStrategy,
}

impl Default for ToolpathOptions {
    fn default() -> Self {
        Self {
            feed_rate: DEFAULT_FEED_RATE,
            strategy: PenStrategy::default(),
        }
    }
}

/// Turns placed strokes into a [`MotionProgram`].
#[derive(Debug, Clone, Default)]
pub struct ToolpathCompiler {
    options: ToolpathOptions,
}

impl ToolpathCompiler {
    pub fn new(options: ToolpathOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ToolpathOptions {
        &self.options
    }

    /// Compile placed text, line by line in drawing order.
    pub fn compile_text(&self, placed: &PlacedText) -> MotionProgram {
        self.compile(placed.segments())
    }

    /// Compile segments in the order given.
    pub fn compile<'a, I>(&self, segments: I) -> MotionProgram
    where
        I: IntoIterator<Item = &'a Segment<Clamped>>,
    {
        let (toolpath, segment_count) = match self.options.strategy {
            PenStrategy::Connected { tolerance_mm } => connected(segments, tolerance_mm),
            PenStrategy::LiftEverySegment => lift_every_segment(segments),
        };

        let program = MotionProgram::new(self.options.feed_rate, toolpath);
        tracing::debug!(
            "Compiled {} segment(s) into {} command(s), {} pen stroke(s)",
            segment_count,
            program.commands().len(),
            program.pen_down_count()
        );
        program
    }
}

fn connected<'a, I>(segments: I, tolerance_mm: f64) -> (Vec<Command>, usize)
where
    I: IntoIterator<Item = &'a Segment<Clamped>>,
{
    let mut toolpath = Vec::new();
    let mut current: Option<Point<Clamped>> = None;
    let mut pen_down = false;
    let mut count = 0;

    for segment in segments {
        count += 1;
        let detached = current.map_or(true, |at| at.distance_to(&segment.start) > tolerance_mm);
        if detached {
            if pen_down {
                toolpath.push(Command::PenUp);
            }
            toolpath.push(Command::rapid_to(segment.start));
            toolpath.push(Command::PenDown);
            pen_down = true;
        }
        toolpath.push(Command::line_to(segment.end));
        current = Some(segment.end);
    }

    if pen_down {
        toolpath.push(Command::PenUp);
    }
    (toolpath, count)
}

fn lift_every_segment<'a, I>(segments: I) -> (Vec<Command>, usize)
where
    I: IntoIterator<Item = &'a Segment<Clamped>>,
{
    let mut toolpath = Vec::new();
    let mut count = 0;
    for segment in segments {
        count += 1;
        toolpath.extend([
            Command::rapid_to(segment.start),
            Command::PenDown,
            Command::line_to(segment.end),
            Command::PenUp,
        ]);
    }
    (toolpath, count)
}
