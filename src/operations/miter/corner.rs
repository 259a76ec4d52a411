use crate::math::Point2;

/// Resolution state of one offset-edge corner at a junction.
///
/// Resolution is attempted in declaration order; an edge stays in the first
/// state that yields a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeCorner {
    /// No corner found; the polygon uses the butt-joint offset point.
    Unresolved,
    /// Finite offset segments cross.
    Segment(Point2),
    /// Offset edges only meet once extended to infinite lines.
    Extension(Point2),
}

impl EdgeCorner {
    #[must_use]
    pub fn point(&self) -> Option<Point2> {
        match self {
            Self::Unresolved => None,
            Self::Segment(p) | Self::Extension(p) => Some(*p),
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    #[must_use]
    pub fn is_segment(&self) -> bool {
        matches!(self, Self::Segment(_))
    }

    /// Resolved point, or `fallback` (the unmitered offset point).
    #[must_use]
    pub fn point_or(&self, fallback: Point2) -> Point2 {
        self.point().unwrap_or(fallback)
    }
}

/// Extra outline vertex placed between a wall's two corners at a junction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Apex {
    /// Straight-through junction with an anti-parallel partner wall.
    Collinear(Point2),
    /// Three-or-more-wall junction whose corners both crossed finitely.
    Junction(Point2),
}

impl Apex {
    #[must_use]
    pub fn point(&self) -> Point2 {
        match self {
            Self::Collinear(p) | Self::Junction(p) => *p,
        }
    }
}
