//! Stroke font store
//!
//! A [`FontStore`] maps characters to open strokes in font units. Text is
//! rendered by laying glyphs side by side, each shifted by the advances of
//! the glyphs before it.

mod simplex;

use crate::geometry::{FontUnits, Point, Segment};

/// Strokes and horizontal advance for one character.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Glyph {
    pub segments: Vec<Segment<FontUnits>>,
    /// Distance to the origin of the next glyph, in font units.
    pub advance: f64,
}

/// Source of stroke glyphs.
pub trait FontStore {
    /// Glyph for `ch`. Characters the font lacks produce an empty glyph
    /// that still advances.
    fn glyph(&self, ch: char) -> Glyph;

    /// Character whose height defines the capital height.
    fn reference_char(&self) -> char {
        'H'
    }

    /// Strokes for `ch` at the origin.
    fn strokes(&self, ch: char) -> Vec<Segment<FontUnits>> {
        self.glyph(ch).segments
    }

    /// Strokes for a single line of text, starting at x = 0.
    fn render(&self, text: &str) -> Vec<Segment<FontUnits>> {
        let mut segments = Vec::new();
        let mut cursor = 0.0;
        for ch in text.chars() {
            let glyph = self.glyph(ch);
            segments.extend(glyph.segments.into_iter().map(|s| s.translate(cursor, 0.0)));
            cursor += glyph.advance;
        }
        segments
    }
}

/// Hershey simplex Roman, covering printable ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct HersheySimplex;

impl HersheySimplex {
    pub fn new() -> Self {
        Self
    }

    fn entry(ch: char) -> Option<&'static (i8, &'static [i8])> {
        let ch = if ch == '\t' { ' ' } else { ch };
        let index = (ch as u32).checked_sub(simplex::FIRST_CHAR)?;
        simplex::SIMPLEX.get(index as usize)
    }
}

impl FontStore for HersheySimplex {
    fn glyph(&self, ch: char) -> Glyph {
        let Some(&(advance, vertices)) = Self::entry(ch).or_else(|| Self::entry(' ')) else {
            return Glyph::default();
        };

        let mut segments = Vec::new();
        let mut previous: Option<Point<FontUnits>> = None;
        for pair in vertices.chunks_exact(2) {
            if pair == [-1, -1] {
                previous = None;
                continue;
            }
            let point = Point::<FontUnits>::new(f64::from(pair[0]), f64::from(pair[1]));
            if let Some(from) = previous {
                segments.push(Segment::new(from, point));
            }
            previous = Some(point);
        }

        Glyph {
            segments,
            advance: f64::from(advance),
        }
    }
}
