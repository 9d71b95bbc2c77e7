//! Height oracle boundary and line-height caching.
//!
//! The core never lays text out itself. Everything it knows about geometry
//! comes from a [`HeightOracle`] supplied by the host: a real renderer, or a
//! deterministic double in tests.

use crate::fragment::Fragment;

/// Multiplier applied to the font size when line-height resolves to `normal`.
pub const NORMAL_LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Resolved `line-height` of the fragment root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineHeight {
    /// No explicit value; derived from the font size.
    Normal,
    /// Explicit pixel value.
    Px(f32),
}

impl LineHeight {
    /// Parse a computed-style string such as `normal`, `20px` or `18.5`.
    ///
    /// Anything unparseable resolves to [`LineHeight::Normal`].
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("normal") {
            return Self::Normal;
        }
        let number = trimmed
            .strip_suffix("px")
            .or_else(|| trimmed.strip_suffix("PX"))
            .unwrap_or(trimmed)
            .trim();
        match number.parse::<f32>() {
            Ok(px) if px.is_finite() && px > 0.0 => Self::Px(px),
            _ => Self::Normal,
        }
    }

    /// Line height in whole pixels for a root font size of `font_size_px`.
    pub fn resolve_px(self, font_size_px: f32) -> f32 {
        match self {
            Self::Normal => (font_size_px * NORMAL_LINE_HEIGHT_FACTOR).ceil(),
            Self::Px(px) => px.ceil(),
        }
    }
}

/// Geometry queries answered by the host renderer.
///
/// Implementations must reflect the fragment's current text on every call to
/// [`measured_height`](Self::measured_height); the core mutates text between
/// probes and relies on fresh layout each time.
pub trait HeightOracle {
    /// Current rendered height of the fragment root in pixels.
    fn measured_height(&self, fragment: &Fragment) -> f32;

    /// Computed `line-height` of the fragment root.
    fn computed_line_height(&self, fragment: &Fragment) -> LineHeight;

    /// Computed `font-size` of the fragment root in pixels.
    fn computed_font_size(&self, fragment: &Fragment) -> f32;
}

impl<T: HeightOracle + ?Sized> HeightOracle for &T {
    fn measured_height(&self, fragment: &Fragment) -> f32 {
        (**self).measured_height(fragment)
    }

    fn computed_line_height(&self, fragment: &Fragment) -> LineHeight {
        (**self).computed_line_height(fragment)
    }

    fn computed_font_size(&self, fragment: &Fragment) -> f32 {
        (**self).computed_font_size(fragment)
    }
}

/// Single-slot line-height cache owned by the orchestrator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineMetrics {
    cached_line_height: Option<f32>,
}

impl LineMetrics {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Line height in whole pixels, resolved once and then served from cache.
    pub fn line_height<O: HeightOracle + ?Sized>(&mut self, oracle: &O, fragment: &Fragment) -> f32 {
        if let Some(cached) = self.cached_line_height {
            return cached;
        }
        let resolved = oracle
            .computed_line_height(fragment)
            .resolve_px(oracle.computed_font_size(fragment));
        log::trace!("resolved line height {}px", resolved);
        self.cached_line_height = Some(resolved);
        resolved
    }

    /// Cached value, if any.
    pub fn cached(&self) -> Option<f32> {
        self.cached_line_height
    }

    /// Drop the cached value.
    pub fn invalidate(&mut self) {
        self.cached_line_height = None;
    }
}
