//! # plotkit Designer
//!
//! Turns text into pen-plotter G-code using a single-stroke font.
//!
//! ## Pipeline
//!
//! ```text
//! text
//!   ├── LayoutEngine      wrap, stack, scale, place, clamp
//!   ├── ToolpathCompiler  strokes to pen moves, joining connected strokes
//!   └── ProgramSerializer motion program to G-code text
//! ```
//!
//! All stages are pure; a [`TextToGcode`] can be shared across threads.

pub mod font;
pub mod gcode_gen;
pub mod geometry;
pub mod layout;
pub mod toolpath;

use plotkit_core::LayoutError;
use serde::{Deserialize, Serialize};

pub use font::{FontStore, Glyph, HersheySimplex};
pub use gcode_gen::{PenSettings, ProgramSerializer};
pub use geometry::{BoundingBox, Clamped, FontUnits, Millimeters, Point, Segment};
pub use layout::{
    LayoutEngine, LayoutOptions, Line, PlacedText, PlacementMode, TextBlock, Workspace,
};
pub use toolpath::{Command, MotionProgram, PenStrategy, ToolpathCompiler, ToolpathOptions};

/// Settings for the whole text to G-code pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub layout: LayoutOptions,
    pub toolpath: ToolpathOptions,
    pub pen: PenSettings,
}

/// Text to G-code pipeline.
#[derive(Debug, Clone)]
pub struct TextToGcode<F = HersheySimplex> {
    engine: LayoutEngine<F>,
    compiler: ToolpathCompiler,
    serializer: ProgramSerializer,
}

impl TextToGcode<HersheySimplex> {
    /// Pipeline using the built-in Hershey simplex font.
    pub fn new(options: &PlotOptions) -> Result<Self, LayoutError> {
        Self::with_font(HersheySimplex::new(), options)
    }
}

impl<F: FontStore> TextToGcode<F> {
    pub fn with_font(font: F, options: &PlotOptions) -> Result<Self, LayoutError> {
        Ok(Self {
            engine: LayoutEngine::new(font, options.layout.clone())?,
            compiler: ToolpathCompiler::new(options.toolpath),
            serializer: ProgramSerializer::new(options.pen.clone()),
        })
    }

    pub fn engine(&self) -> &LayoutEngine<F> {
        &self.engine
    }

    /// Lay out and compile `text`.
    ///
    /// Blank text yields a program with only the fixed header and footer.
    pub fn compile(&self, text: &str) -> MotionProgram {
        if text.trim().is_empty() {
            tracing::debug!("Blank text, emitting an empty program");
            return MotionProgram::empty(self.compiler.options().feed_rate);
        }
        let placed = self.engine.layout(text);
        self.compiler.compile_text(&placed)
    }

    pub fn serialize(&self, program: &MotionProgram) -> String {
        self.serializer.serialize(program)
    }

    /// Lay out, compile and serialize `text`.
    pub fn generate(&self, text: &str) -> String {
        self.serialize(&self.compile(text))
    }
}

/// Convert text to G-code with default settings.
pub fn text_to_gcode(text: &str) -> Result<String, LayoutError> {
    Ok(TextToGcode::new(&PlotOptions::default())?.generate(text))
}
