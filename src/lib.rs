//! # text-clamp
//!
//! Clamp rendered text to a number of lines or a pixel height while keeping
//! the surrounding inline markup intact.
//!
//! The crate never lays text out. A host renderer answers geometry queries
//! through [`HeightOracle`]; the clamp mutates text leaves of a [`Fragment`]
//! and re-measures until the content fits, always cutting from the end at a
//! word boundary and appending a marker.
//!
//! ```rust
//! use text_clamp::{Clamp, ClampConfig, Fragment, HeightOracle, LineHeight, PassOutcome};
//!
//! // Twelve characters per 20px line.
//! struct Monospace;
//!
//! impl HeightOracle for Monospace {
//!     fn measured_height(&self, fragment: &Fragment) -> f32 {
//!         let chars = fragment.text_content().chars().count();
//!         (chars.div_ceil(12) * 20) as f32
//!     }
//!     fn computed_line_height(&self, _fragment: &Fragment) -> LineHeight {
//!         LineHeight::Px(20.0)
//!     }
//!     fn computed_font_size(&self, _fragment: &Fragment) -> f32 {
//!         16.0
//!     }
//! }
//!
//! # fn main() -> Result<(), text_clamp::ClampError> {
//! let mut fragment = Fragment::from_markup("Read <b>all of this text</b> please")?;
//! let mut clamp = Clamp::new(ClampConfig::default().with_lines(1));
//! assert_eq!(clamp.on_attached(&mut fragment, &Monospace), PassOutcome::Truncated);
//! assert_eq!(fragment.to_markup(), "Read <b>all of…</b>");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod clamp;
pub mod config;
pub mod error;
pub mod fit;
pub mod fragment;
pub mod markup;
pub mod oracle;
pub mod walker;

pub use clamp::{Clamp, ClampEvent, PassOutcome, Phase};
pub use config::{
    ClampConfig, ClampDiagnostic, ConfigField, ConfigFields, Constraint, COMPONENT_NAME,
    DEFAULT_MARKER,
};
pub use error::{ClampError, ClampLimitContext};
pub use fit::{fit_node, FitReport};
pub use fragment::{Attribute, Fragment, NodeId, NodeKind};
pub use markup::{
    is_void_element, parse_fragment, parse_fragment_with_limits, serialize_fragment, MarkupLimits,
};
pub use oracle::{HeightOracle, LineHeight, LineMetrics, NORMAL_LINE_HEIGHT_FACTOR};
pub use walker::find_rightmost_text;
