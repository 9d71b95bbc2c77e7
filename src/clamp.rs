//! Clamp orchestration: host call-ins, pass state machine, and outbound events.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::config::{ClampConfig, ClampDiagnostic, ConfigFields, Constraint};
use crate::fit::{fit_node, FitReport};
use crate::fragment::Fragment;
use crate::oracle::{HeightOracle, LineMetrics};
use crate::walker::find_rightmost_text;

/// Pass state. Every call-in runs a pass to [`Phase::Done`] before returning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No pass has run since construction or detach.
    Idle,
    /// Validating configuration and measuring the fragment.
    Measuring,
    /// Content already fits.
    NoTruncationNeeded,
    /// Walking and fitting text.
    Truncating,
    /// Pass finished.
    Done,
}

/// Result of one host call-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// No limit configured, a limit was invalid, or no pass was triggered.
    NotAttempted,
    /// Content fits; nothing was changed.
    Fits,
    /// Content was cut down.
    Truncated,
    /// Content overflowed but held no text leaf to cut.
    NothingToTruncate,
}

impl PassOutcome {
    /// Value carried by the `Clamped` event for this outcome, if one is sent.
    pub fn clamped(self) -> Option<bool> {
        match self {
            Self::Fits => Some(false),
            Self::Truncated => Some(true),
            Self::NotAttempted | Self::NothingToTruncate => None,
        }
    }
}

/// Outbound notification to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClampEvent {
    /// A pass reached a fits/does-not-fit decision.
    Clamped(bool),
    /// Configuration was rejected.
    Diagnostic(ClampDiagnostic),
}

type EventSink = Box<dyn FnMut(ClampEvent) + Send + 'static>;

/// Height-driven text clamp bound to one host fragment.
///
/// The host owns the [`Fragment`] and the [`HeightOracle`]; both are lent to
/// each call-in. The clamp keeps a pristine copy of the fragment taken on
/// first attach so that later reconfigurations start from the original
/// content instead of compounding earlier cuts.
pub struct Clamp {
    config: ClampConfig,
    metrics: LineMetrics,
    snapshot: Option<Fragment>,
    phase: Phase,
    last_outcome: Option<PassOutcome>,
    last_fit: Option<FitReport>,
    event_sink: Option<EventSink>,
}

impl fmt::Debug for Clamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clamp")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("attached", &self.snapshot.is_some())
            .field("phase", &self.phase)
            .field("last_outcome", &self.last_outcome)
            .field("has_event_sink", &self.event_sink.is_some())
            .finish()
    }
}

impl Default for Clamp {
    fn default() -> Self {
        Self::new(ClampConfig::default())
    }
}

impl Clamp {
    /// Create an idle clamp.
    pub fn new(config: ClampConfig) -> Self {
        Self {
            config,
            metrics: LineMetrics::new(),
            snapshot: None,
            phase: Phase::Idle,
            last_outcome: None,
            last_fit: None,
            event_sink: None,
        }
    }

    /// Route outbound events to `sink`.
    pub fn set_event_sink<F>(&mut self, sink: F)
    where
        F: FnMut(ClampEvent) + Send + 'static,
    {
        self.event_sink = Some(Box::new(sink));
    }

    /// Current configuration.
    pub fn config(&self) -> &ClampConfig {
        &self.config
    }

    /// Mutable configuration. Follow edits with
    /// [`on_config_changed`](Self::on_config_changed).
    pub fn config_mut(&mut self) -> &mut ClampConfig {
        &mut self.config
    }

    /// Current pass state.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Outcome of the most recent call-in.
    pub fn last_outcome(&self) -> Option<PassOutcome> {
        self.last_outcome
    }

    /// Fit report of the most recent truncating pass.
    pub fn last_fit(&self) -> Option<FitReport> {
        self.last_fit
    }

    /// Line-height cache state.
    pub fn line_metrics(&self) -> &LineMetrics {
        &self.metrics
    }

    /// `true` between attach and detach.
    pub fn is_attached(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Serialized markup captured on first attach.
    pub fn original_markup(&self) -> Option<String> {
        self.snapshot.as_ref().map(Fragment::to_markup)
    }

    /// Host rendered the fragment for the first time.
    pub fn on_attached<O: HeightOracle + ?Sized>(
        &mut self,
        fragment: &mut Fragment,
        oracle: &O,
    ) -> PassOutcome {
        let snapshot = self.snapshot.get_or_insert_with(|| fragment.clone());
        *fragment = snapshot.clone();
        self.run_pass(fragment, oracle)
    }

    /// Host changed `changed` fields of [`config_mut`](Self::config_mut).
    ///
    /// Only line or height changes rerun the pass; a marker change is picked
    /// up by the next one. Before the first attach nothing runs.
    pub fn on_config_changed<O: HeightOracle + ?Sized>(
        &mut self,
        changed: ConfigFields,
        fragment: &mut Fragment,
        oracle: &O,
    ) -> PassOutcome {
        if changed.is_empty() {
            return PassOutcome::NotAttempted;
        }
        self.metrics.invalidate();
        if !changed.triggers_pass() {
            log::debug!("config change {:?} does not require a pass", changed);
            return PassOutcome::NotAttempted;
        }
        let Some(snapshot) = &self.snapshot else {
            log::debug!("config change {:?} before attach; deferring", changed);
            return PassOutcome::NotAttempted;
        };
        *fragment = snapshot.clone();
        self.run_pass(fragment, oracle)
    }

    /// Replace the whole configuration and rerun if a limit changed.
    pub fn reconfigure<O: HeightOracle + ?Sized>(
        &mut self,
        config: ClampConfig,
        fragment: &mut Fragment,
        oracle: &O,
    ) -> PassOutcome {
        let changed = self.config.diff(&config);
        self.config = config;
        self.on_config_changed(changed, fragment, oracle)
    }

    /// Host tore the component down.
    pub fn on_detached(&mut self) {
        self.metrics.invalidate();
        self.snapshot = None;
        self.last_fit = None;
        self.transition(Phase::Idle);
    }

    fn run_pass<O: HeightOracle + ?Sized>(
        &mut self,
        fragment: &mut Fragment,
        oracle: &O,
    ) -> PassOutcome {
        self.transition(Phase::Measuring);
        self.last_fit = None;

        let target_height = match self.config.validate() {
            Constraint::Unconstrained => return self.finish(PassOutcome::NotAttempted),
            Constraint::Invalid(diagnostic) => {
                log::warn!("{}", diagnostic);
                self.emit(ClampEvent::Diagnostic(diagnostic));
                return self.finish(PassOutcome::NotAttempted);
            }
            Constraint::Lines(lines) => self.metrics.line_height(oracle, fragment) * lines as f32,
            Constraint::MaxHeight(max_height) => max_height,
        };

        let measured = oracle.measured_height(fragment);
        if target_height >= measured {
            self.transition(Phase::NoTruncationNeeded);
            self.emit(ClampEvent::Clamped(false));
            return self.finish(PassOutcome::Fits);
        }

        self.transition(Phase::Truncating);
        let Some(start) = find_rightmost_text(fragment, &self.config.marker) else {
            log::debug!("fragment overflows but holds no text");
            return self.finish(PassOutcome::NothingToTruncate);
        };
        let report = fit_node(fragment, oracle, start, target_height, &self.config.marker);
        log::debug!(
            "clamped from {}px to target {}px keeping {} words in node {}",
            measured,
            target_height,
            report.words_kept,
            report.node.index()
        );
        self.last_fit = Some(report);
        self.emit(ClampEvent::Clamped(true));
        self.finish(PassOutcome::Truncated)
    }

    fn transition(&mut self, next: Phase) {
        log::trace!("clamp phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    fn finish(&mut self, outcome: PassOutcome) -> PassOutcome {
        self.transition(Phase::Done);
        self.last_outcome = Some(outcome);
        outcome
    }

    fn emit(&mut self, event: ClampEvent) {
        let Some(sink) = self.event_sink.as_mut() else {
            return;
        };
        sink(event);
    }
}
