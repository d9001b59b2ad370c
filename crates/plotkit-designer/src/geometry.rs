//! Points, segments and bounding boxes tagged by coordinate space.
//!
//! Geometry moves through three spaces: raw font units, millimeters on the
//! workspace, and millimeters that have been clamped into the drawable
//! area. The space is part of the type so a conversion is always explicit.

use std::fmt;
use std::marker::PhantomData;

/// Native units of the stroke font (y up, baseline at 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontUnits;

/// Millimeters on the workspace (y up, origin at the lower-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Millimeters;

/// Millimeters guaranteed to lie inside the workspace margins.
///
/// Only [`crate::layout::Workspace::clamp`] produces points in this space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clamped;

/// A 2D point in coordinate space `S`.
#[derive(Clone, Copy, PartialEq)]
pub struct Point<S> {
    pub x: f64,
    pub y: f64,
    space: PhantomData<S>,
}

impl<S> Point<S> {
    pub(crate) const fn in_space(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }

    pub fn distance_to(&self, other: &Point<S>) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Shift by `(dx, dy)` without leaving the space.
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::in_space(self.x + dx, self.y + dy)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::FontUnits {}
    impl Sealed for super::Millimeters {}
}

/// Spaces whose points may be constructed freely.
pub trait Unclamped: sealed::Sealed {}
impl Unclamped for FontUnits {}
impl Unclamped for Millimeters {}

impl<S: Unclamped> Point<S> {
    pub const fn new(x: f64, y: f64) -> Self {
        Self::in_space(x, y)
    }
}

impl Point<Clamped> {
    /// Forget the clamp guarantee.
    pub fn unclamped(self) -> Point<Millimeters> {
        Point::in_space(self.x, self.y)
    }
}

impl<S> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// A directed straight stroke from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<S> {
    pub start: Point<S>,
    pub end: Point<S>,
}

impl<S> Segment<S> {
    pub fn new(start: Point<S>, end: Point<S>) -> Self {
        Self { start, end }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.start.translate(dx, dy), self.end.translate(dx, dy))
    }

    /// Map both endpoints, possibly into another space.
    pub fn map<T>(self, mut f: impl FnMut(Point<S>) -> Point<T>) -> Segment<T> {
        Segment::new(f(self.start), f(self.end))
    }
}

/// Axis-aligned bounds of a non-empty point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<S> {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    space: PhantomData<S>,
}

impl<S> BoundingBox<S> {
    /// Bounds of a set of points; `None` when the set is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point<S>>,
        S: 'a,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bbox = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
            space: PhantomData,
        };
        for p in points {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    /// Bounds of every endpoint of `segments`; `None` when there are none.
    pub fn from_segments<'a, I>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Segment<S>>,
        S: 'a,
    {
        Self::from_points(
            segments
                .into_iter()
                .flat_map(|segment| [&segment.start, &segment.end]),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }
}
