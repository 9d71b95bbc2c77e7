//! Clamp configuration, validation, and change tracking.

extern crate alloc;

use alloc::string::String;
use bitflags::bitflags;
use core::fmt;

/// Component name used as the diagnostic prefix.
pub const COMPONENT_NAME: &str = "textClamp";

/// Default truncation marker.
pub const DEFAULT_MARKER: &str = "…";

/// Host-supplied clamp settings.
///
/// When `lines` is set and positive it wins over `max_height` outright; the
/// stricter of the two is not computed.
#[derive(Clone, Debug, PartialEq)]
pub struct ClampConfig {
    /// Maximum number of rendered lines.
    pub lines: Option<i32>,
    /// Maximum rendered height in pixels.
    pub max_height: Option<f32>,
    /// Text appended at the cut point.
    pub marker: String,
}

impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            lines: None,
            max_height: None,
            marker: String::from(DEFAULT_MARKER),
        }
    }
}

impl ClampConfig {
    /// Clamp to `lines` rendered lines.
    pub fn with_lines(mut self, lines: i32) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Clamp to `max_height` pixels.
    pub fn with_max_height(mut self, max_height: f32) -> Self {
        self.max_height = Some(max_height);
        self
    }

    /// Replace the truncation marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Classify the configuration for one pass.
    pub fn validate(&self) -> Constraint {
        let lines = self.lines.unwrap_or(0);
        let max_height = self.max_height.unwrap_or(0.0);
        if lines == 0 && max_height == 0.0 {
            return Constraint::Unconstrained;
        }
        if lines < 0 {
            return Constraint::Invalid(ClampDiagnostic::NotPositive {
                field: ConfigField::Lines,
                received: f64::from(lines),
            });
        }
        if max_height < 0.0 || max_height.is_nan() {
            return Constraint::Invalid(ClampDiagnostic::NotPositive {
                field: ConfigField::MaxHeight,
                received: f64::from(max_height),
            });
        }
        if lines > 0 {
            return Constraint::Lines(lines.unsigned_abs());
        }
        Constraint::MaxHeight(max_height)
    }

    /// Fields whose values differ between `self` and `other`.
    pub fn diff(&self, other: &ClampConfig) -> ConfigFields {
        let mut changed = ConfigFields::empty();
        if self.lines != other.lines {
            changed |= ConfigFields::LINES;
        }
        if self.max_height != other.max_height {
            changed |= ConfigFields::MAX_HEIGHT;
        }
        if self.marker != other.marker {
            changed |= ConfigFields::MARKER;
        }
        changed
    }
}

/// Outcome of [`ClampConfig::validate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constraint {
    /// Neither limit is set; nothing to do.
    Unconstrained,
    /// A limit is negative; report and do nothing.
    Invalid(ClampDiagnostic),
    /// Target height is `line_height * lines`.
    Lines(u32),
    /// Target height is the given pixel value.
    MaxHeight(f32),
}

/// A single configurable field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigField {
    /// [`ClampConfig::lines`]
    Lines,
    /// [`ClampConfig::max_height`]
    MaxHeight,
    /// [`ClampConfig::marker`]
    Marker,
}

impl ConfigField {
    /// Host-facing input name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lines => "lines",
            Self::MaxHeight => "maxHeight",
            Self::Marker => "truncationText",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of fields touched by a configuration change.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ConfigFields: u8 {
        const LINES = 0b0000_0001;
        const MAX_HEIGHT = 0b0000_0010;
        const MARKER = 0b0000_0100;
    }
}

impl ConfigFields {
    /// `true` when the change requires a fresh truncation pass.
    pub fn triggers_pass(self) -> bool {
        self.intersects(Self::LINES | Self::MAX_HEIGHT)
    }
}

impl From<ConfigField> for ConfigFields {
    fn from(field: ConfigField) -> Self {
        match field {
            ConfigField::Lines => Self::LINES,
            ConfigField::MaxHeight => Self::MAX_HEIGHT,
            ConfigField::Marker => Self::MARKER,
        }
    }
}

/// Non-fatal configuration problem reported to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClampDiagnostic {
    /// A limit was negative.
    NotPositive {
        /// Offending field.
        field: ConfigField,
        /// Value as received.
        received: f64,
    },
}

impl fmt::Display for ClampDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive { field, received } => write!(
                f,
                "{}: {} must be a positive number. Received: {}",
                COMPONENT_NAME, field, received
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unconstrained_with_ellipsis_marker() {
        let cfg = ClampConfig::default();
        assert_eq!(cfg.marker, "…");
        assert_eq!(cfg.validate(), Constraint::Unconstrained);
        assert_eq!(
            ClampConfig::default().with_lines(0).validate(),
            Constraint::Unconstrained
        );
        assert_eq!(
            ClampConfig::default().with_max_height(0.0).validate(),
            Constraint::Unconstrained
        );
    }

    #[test]
    fn lines_take_precedence_over_max_height() {
        let cfg = ClampConfig::default().with_lines(1).with_max_height(500.0);
        assert_eq!(cfg.validate(), Constraint::Lines(1));
    }

    #[test]
    fn max_height_applies_when_lines_unset() {
        let cfg = ClampConfig::default().with_lines(0).with_max_height(40.0);
        assert_eq!(cfg.validate(), Constraint::MaxHeight(40.0));
    }

    #[test]
    fn negative_values_are_rejected_with_fixed_message() {
        let Constraint::Invalid(diag) = ClampConfig::default().with_lines(-1).validate() else {
            panic!("expected invalid");
        };
        assert_eq!(
            diag.to_string(),
            "textClamp: lines must be a positive number. Received: -1"
        );

        let Constraint::Invalid(diag) = ClampConfig::default().with_max_height(-100.0).validate()
        else {
            panic!("expected invalid");
        };
        assert_eq!(
            diag.to_string(),
            "textClamp: maxHeight must be a positive number. Received: -100"
        );
    }

    #[test]
    fn negative_max_height_is_rejected_even_with_valid_lines() {
        let cfg = ClampConfig::default().with_lines(2).with_max_height(-5.0);
        assert!(matches!(
            cfg.validate(),
            Constraint::Invalid(ClampDiagnostic::NotPositive {
                field: ConfigField::MaxHeight,
                ..
            })
        ));
    }

    #[test]
    fn diff_reports_changed_fields() {
        let a = ClampConfig::default().with_lines(2);
        let b = a.clone().with_lines(3).with_marker(" more");
        let changed = a.diff(&b);
        assert_eq!(changed, ConfigFields::LINES | ConfigFields::MARKER);
        assert!(changed.triggers_pass());
        assert!(!ConfigFields::from(ConfigField::Marker).triggers_pass());
        assert!(a.diff(&a).is_empty());
    }
}
