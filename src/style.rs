//! Evaluated line style parameters.
//!
//! Style evaluation itself (zoom curves, data-driven expressions) happens
//! upstream; by the time a bucket is built, every parameter here is a
//! plain scalar or enum value that stays fixed for the whole build.

/// Describes the cap at the end of lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineCap {
    /// Squared ends that do not extend beyond the end-point of the line.
    Butt,
    /// Rounded end-points. Each end is a semi-circle with radius equal to
    /// half of the line width.
    Round,
    /// Squared ends that extend beyond the end of the line by half of the
    /// line width.
    Square,
}

/// Describes how two adjacent line sub-segments are joined.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineJoin {
    /// A single triangle fills the wedge between the two sub-segments.
    Bevel,
    /// The wedge is filled with an approximated circular arc.
    Round,
    /// The two outer edges are extended until they meet, up to the miter
    /// limit.
    Miter,
}

/// Evaluated layout parameters for one line layer.
///
/// Layout parameters shape the tessellated geometry, unlike paint
/// parameters which only affect shading and can change without a rebuild.
#[derive(Debug, Clone)]
pub struct LineLayout {
    /// Line cap, applied at both ends of every open line.
    pub cap: LineCap,
    /// Join applied at interior vertices and at ring wrap-around points.
    pub join: LineJoin,
    /// Maximum ratio between the miter extension and half the line width
    /// before a miter join falls back to a bevel.
    pub miter_limit: f64,
    /// Miter-length threshold below which a round join is approximated by
    /// a plain miter.
    pub round_limit: f64,
    /// Line width, in tile units. Tessellation never reads it: extrusions
    /// are emitted at unit scale and the vertex shader multiplies in the
    /// width.
    pub width: f64,
}

impl Default for LineLayout {
    fn default() -> LineLayout {
        LineLayout {
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 2.0,
            round_limit: 1.05,
            width: 1.0,
        }
    }
}

/// Evaluated paint parameters relevant to hit-testing.
#[derive(Debug, Clone)]
pub struct LinePaint {
    /// Rendered width of the line, in tile units.
    pub width: f64,
    /// Width of the gap for gap-lines (casing); zero for solid lines.
    pub gap_width: f64,
    /// Blur radius applied at the line edges.
    pub blur: f64,
}

impl LinePaint {
    /// Total rendered width of the line.
    ///
    /// A line with a gap is drawn as two parallel strokes of `width`
    /// separated by `gap_width`, so its overall footprint is wider than
    /// `width` alone.
    pub fn rendered_width(&self) -> f64 {
        if self.gap_width > 0.0 {
            self.gap_width + 2.0 * self.width
        } else {
            self.width
        }
    }
}
