//! Text layout: wrapping, line stacking and workspace placement.
//!
//! The pipeline is `wrap` (text to lines that fit the width budget),
//! `stack` (lines to a [`TextBlock`] in font units, top line first, y
//! decreasing), then `place` (font units to clamped millimeters on the
//! workspace).

use std::fmt;
use std::str::FromStr;

use plotkit_core::LayoutError;
use serde::{Deserialize, Serialize};

use crate::font::FontStore;
use crate::geometry::{BoundingBox, Clamped, FontUnits, Millimeters, Point, Segment};

/// Scale used when the reference glyph has no height.
pub const FALLBACK_SCALE_MM_PER_UNIT: f64 = 0.35;

/// Alphabet used to estimate the average glyph advance.
const SAMPLE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Rectangular drawing area, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub width: f64,
    pub height: f64,
    /// Keep-out band along every edge.
    pub margin: f64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            width: 150.0,
            height: 150.0,
            margin: 5.0,
        }
    }
}

impl Workspace {
    pub fn new(width: f64, height: f64, margin: f64) -> Result<Self, LayoutError> {
        let workspace = Self {
            width,
            height,
            margin,
        };
        workspace.validate()?;
        Ok(workspace)
    }

    /// The margin must leave a non-empty drawable area.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let finite = self.width.is_finite() && self.height.is_finite() && self.margin.is_finite();
        if !finite
            || self.margin < 0.0
            || self.margin >= self.width / 2.0
            || self.margin >= self.height / 2.0
        {
            return Err(LayoutError::EmptyDrawableArea {
                width: self.width,
                height: self.height,
                margin: self.margin,
            });
        }
        Ok(())
    }

    pub fn drawable_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn drawable_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// Mirror across the workspace on the requested axes.
    pub fn flip(&self, point: Point<Millimeters>, flip_x: bool, flip_y: bool) -> Point<Millimeters> {
        let x = if flip_x { self.width - point.x } else { point.x };
        let y = if flip_y { self.height - point.y } else { point.y };
        Point::<Millimeters>::new(x, y)
    }

    /// Clamp into `[margin, dimension - margin]` on both axes.
    pub fn clamp<S>(&self, point: Point<S>) -> Point<Clamped> {
        Point::in_space(
            point.x.clamp(self.margin, self.width - self.margin),
            point.y.clamp(self.margin, self.height - self.margin),
        )
    }
}

/// Horizontal part of a placement anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

/// Vertical part of a placement anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

/// Where the text block sits on the workspace.
///
/// The matching point of the block's bounding box lands on the matching
/// margin-adjusted point of the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementMode {
    TopLeft,
    TopCenter,
    TopRight,
    #[default]
    LeftMiddle,
    Center,
    RightMiddle,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl PlacementMode {
    pub const ALL: [PlacementMode; 9] = [
        PlacementMode::TopLeft,
        PlacementMode::TopCenter,
        PlacementMode::TopRight,
        PlacementMode::LeftMiddle,
        PlacementMode::Center,
        PlacementMode::RightMiddle,
        PlacementMode::BottomLeft,
        PlacementMode::BottomCenter,
        PlacementMode::BottomRight,
    ];

    pub fn anchors(self) -> (HorizontalAnchor, VerticalAnchor) {
        use HorizontalAnchor as H;
        use VerticalAnchor as V;
        match self {
            PlacementMode::TopLeft => (H::Left, V::Top),
            PlacementMode::TopCenter => (H::Center, V::Top),
            PlacementMode::TopRight => (H::Right, V::Top),
            PlacementMode::LeftMiddle => (H::Left, V::Middle),
            PlacementMode::Center => (H::Center, V::Middle),
            PlacementMode::RightMiddle => (H::Right, V::Middle),
            PlacementMode::BottomLeft => (H::Left, V::Bottom),
            PlacementMode::BottomCenter => (H::Center, V::Bottom),
            PlacementMode::BottomRight => (H::Right, V::Bottom),
        }
    }

    fn name(self) -> &'static str {
        match self {
            PlacementMode::TopLeft => "top-left",
            PlacementMode::TopCenter => "top-center",
            PlacementMode::TopRight => "top-right",
            PlacementMode::LeftMiddle => "left-middle",
            PlacementMode::Center => "center",
            PlacementMode::RightMiddle => "right-middle",
            PlacementMode::BottomLeft => "bottom-left",
            PlacementMode::BottomCenter => "bottom-center",
            PlacementMode::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlacementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        PlacementMode::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| format!("Unknown placement mode: {}", s))
    }
}

/// Layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Target height of the reference capital, in millimeters.
    pub cap_height_mm: f64,
    /// Width budget per line; the drawable width when unset.
    pub max_line_width_mm: Option<f64>,
    /// Extra space between lines as a multiple of the capital height.
    pub line_gap_multiplier: f64,
    pub placement: PlacementMode,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Wrap long lines; when off only explicit breaks split lines.
    pub wrap: bool,
    pub workspace: Workspace,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            cap_height_mm: 10.0,
            max_line_width_mm: None,
            line_gap_multiplier: 0.35,
            placement: PlacementMode::default(),
            flip_x: false,
            flip_y: false,
            wrap: true,
            workspace: Workspace::default(),
        }
    }
}

impl LayoutOptions {
    pub fn max_line_width_mm(&self) -> f64 {
        self.max_line_width_mm
            .unwrap_or_else(|| self.workspace.drawable_width())
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        self.workspace.validate()?;
        if !(self.cap_height_mm.is_finite() && self.cap_height_mm > 0.0) {
            return Err(invalid("cap_height_mm", "must be a positive number"));
        }
        let width = self.max_line_width_mm();
        if !(width.is_finite() && width > 0.0) {
            return Err(invalid("max_line_width_mm", "must be a positive number"));
        }
        if !(self.line_gap_multiplier.is_finite() && self.line_gap_multiplier >= 0.0) {
            return Err(invalid("line_gap_multiplier", "must not be negative"));
        }
        Ok(())
    }
}

fn invalid(param: &str, reason: &str) -> LayoutError {
    LayoutError::InvalidParameter {
        param: param.to_string(),
        reason: reason.to_string(),
    }
}

/// One stacked line of text in font units.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub segments: Vec<Segment<FontUnits>>,
    /// `None` for lines without strokes.
    pub bounds: Option<BoundingBox<FontUnits>>,
}

/// Lines stacked top to bottom in font units.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<Line>,
    pub bounds: Option<BoundingBox<FontUnits>>,
    /// Millimeters per font unit.
    pub scale: f64,
}

impl TextBlock {
    pub fn segments(&self) -> impl Iterator<Item = &Segment<FontUnits>> {
        self.lines.iter().flat_map(|line| line.segments.iter())
    }

    /// Block height once scaled, in millimeters.
    pub fn height_mm(&self) -> f64 {
        self.bounds.map_or(0.0, |b| b.height() * self.scale)
    }
}

/// Text placed on the workspace, ready for toolpath compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    /// Segments per line, in drawing order.
    pub lines: Vec<Vec<Segment<Clamped>>>,
    /// Block bounds after placement and flips, before clamping.
    pub bounds: Option<BoundingBox<Millimeters>>,
}

impl PlacedText {
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            bounds: None,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment<Clamped>> {
        self.lines.iter().flat_map(|line| line.iter())
    }

    pub fn segment_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count() == 0
    }
}

/// Lays text out on the workspace with a stroke font.
#[derive(Debug, Clone)]
pub struct LayoutEngine<F> {
    font: F,
    options: LayoutOptions,
    scale: f64,
    cap_height_units: f64,
}

impl<F: FontStore> LayoutEngine<F> {
    pub fn new(font: F, options: LayoutOptions) -> Result<Self, LayoutError> {
        options.validate()?;

        let reference = font.render(&font.reference_char().to_string());
        let reference_height = BoundingBox::from_segments(&reference).map_or(0.0, |b| b.height());
        let scale = if reference_height > 0.0 {
            options.cap_height_mm / reference_height
        } else {
            tracing::warn!(
                "Reference glyph {:?} has no height, using fallback scale {}",
                font.reference_char(),
                FALLBACK_SCALE_MM_PER_UNIT
            );
            FALLBACK_SCALE_MM_PER_UNIT
        };

        Ok(Self {
            cap_height_units: options.cap_height_mm / scale,
            font,
            options,
            scale,
        })
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn font(&self) -> &F {
        &self.font
    }

    /// Millimeters per font unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn cap_height_units(&self) -> f64 {
        self.cap_height_units
    }

    pub fn max_width_units(&self) -> f64 {
        self.options.max_line_width_mm() / self.scale
    }

    /// Rendered width of `text` (its strokes' bounding box), in font units.
    pub fn line_width_units(&self, text: &str) -> f64 {
        BoundingBox::from_segments(&self.font.render(text)).map_or(0.0, |b| b.width())
    }

    fn fits(&self, text: &str) -> bool {
        self.line_width_units(text) <= self.max_width_units()
    }

    /// Rough number of characters that fit on one line.
    pub fn estimate_chars_per_line(&self) -> usize {
        let average = self.line_width_units(SAMPLE_ALPHABET) / SAMPLE_ALPHABET.len() as f64;
        if average <= 0.0 {
            return 0;
        }
        (self.max_width_units() / average).floor() as usize
    }

    /// Split text into lines that fit the width budget.
    ///
    /// Explicit breaks are kept, blank lines included. Words wider than the
    /// budget are split between characters.
    pub fn wrap(&self, text: &str) -> Vec<String> {
        let mut raw_lines: Vec<&str> = text.lines().collect();
        if raw_lines.is_empty() {
            raw_lines.push("");
        }

        if !self.options.wrap {
            return raw_lines.into_iter().map(str::to_string).collect();
        }

        let mut wrapped = Vec::new();
        for raw in raw_lines {
            if raw.trim().is_empty() {
                wrapped.push(String::new());
                continue;
            }

            let mut current = String::new();
            for word in raw.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", current, word)
                };
                if self.fits(&candidate) {
                    current = candidate;
                    continue;
                }

                if !current.is_empty() {
                    wrapped.push(std::mem::take(&mut current));
                }

                if self.fits(word) {
                    current = word.to_string();
                } else {
                    current = self.hard_split(word, &mut wrapped);
                }
            }
            wrapped.push(current);
        }
        wrapped
    }

    /// Emit full chunks of `word` into `out`, returning the unfinished tail.
    fn hard_split(&self, word: &str, out: &mut Vec<String>) -> String {
        let mut chunk = String::new();
        for ch in word.chars() {
            let mut candidate = chunk.clone();
            candidate.push(ch);
            if self.fits(&candidate) {
                chunk = candidate;
            } else {
                if !chunk.is_empty() {
                    out.push(std::mem::take(&mut chunk));
                }
                chunk.push(ch);
            }
        }
        chunk
    }

    /// Stack lines top to bottom.
    ///
    /// Each line is moved so its left edge is at x = 0 and its top edge at
    /// the running cursor, which starts at 0 and decreases by the line
    /// height plus the gap. Blank lines advance by the gap alone.
    pub fn stack<S: AsRef<str>>(&self, lines: &[S]) -> TextBlock {
        let gap = self.cap_height_units * self.options.line_gap_multiplier;
        let mut cursor = 0.0;
        let mut stacked = Vec::with_capacity(lines.len());

        for text in lines {
            let text = text.as_ref();
            let segments = self.font.render(text);
            let Some(bounds) = BoundingBox::from_segments(&segments) else {
                cursor -= gap;
                stacked.push(Line {
                    text: text.to_string(),
                    segments: Vec::new(),
                    bounds: None,
                });
                continue;
            };

            let dx = -bounds.min_x;
            let dy = cursor - bounds.max_y;
            let segments: Vec<_> = segments.into_iter().map(|s| s.translate(dx, dy)).collect();
            cursor -= bounds.height() + gap;
            stacked.push(Line {
                text: text.to_string(),
                bounds: BoundingBox::from_segments(&segments),
                segments,
            });
        }

        TextBlock {
            bounds: BoundingBox::from_segments(stacked.iter().flat_map(|l| l.segments.iter())),
            lines: stacked,
            scale: self.scale,
        }
    }

    /// Map a stacked block onto the workspace.
    pub fn place(&self, block: &TextBlock) -> PlacedText {
        let Some(bounds) = block.bounds else {
            return PlacedText::empty();
        };

        let workspace = &self.options.workspace;
        let (horizontal, vertical) = self.options.placement.anchors();
        let (from_x, to_x) = match horizontal {
            HorizontalAnchor::Left => (bounds.min_x, workspace.margin),
            HorizontalAnchor::Center => (bounds.center_x(), workspace.width / 2.0),
            HorizontalAnchor::Right => (bounds.max_x, workspace.width - workspace.margin),
        };
        let (from_y, to_y) = match vertical {
            VerticalAnchor::Top => (bounds.max_y, workspace.height - workspace.margin),
            VerticalAnchor::Middle => (bounds.center_y(), workspace.height / 2.0),
            VerticalAnchor::Bottom => (bounds.min_y, workspace.margin),
        };

        let scale = block.scale;
        let (flip_x, flip_y) = (self.options.flip_x, self.options.flip_y);
        let to_mm = |p: Point<FontUnits>| {
            let placed = Point::<Millimeters>::new(
                (p.x - from_x) * scale + to_x,
                (p.y - from_y) * scale + to_y,
            );
            workspace.flip(placed, flip_x, flip_y)
        };

        let mm_lines: Vec<Vec<Segment<Millimeters>>> = block
            .lines
            .iter()
            .map(|line| line.segments.iter().map(|s| s.map(to_mm)).collect())
            .collect();
        let mm_bounds = BoundingBox::from_segments(mm_lines.iter().flatten());

        if let Some(b) = &mm_bounds {
            let outside = b.min_x < workspace.margin
                || b.max_x > workspace.width - workspace.margin
                || b.min_y < workspace.margin
                || b.max_y > workspace.height - workspace.margin;
            if outside {
                tracing::warn!(
                    "Text block {:.1}x{:.1}mm does not fit the drawable area and will be cropped",
                    b.width(),
                    b.height()
                );
            }
        }

        PlacedText {
            lines: mm_lines
                .into_iter()
                .map(|line| {
                    line.into_iter()
                        .map(|s| s.map(|p| workspace.clamp(p)))
                        .collect()
                })
                .collect(),
            bounds: mm_bounds,
        }
    }

    /// Wrap and stack text, after dropping trailing line breaks.
    pub fn prepare(&self, text: &str) -> TextBlock {
        let text = text.trim_end_matches(['\n', '\r']);
        let lines = self.wrap(text);
        tracing::debug!("Wrapped text into {} line(s)", lines.len());
        self.stack(&lines)
    }

    /// Full layout: wrap, stack and place.
    pub fn layout(&self, text: &str) -> PlacedText {
        self.place(&self.prepare(text))
    }
}
