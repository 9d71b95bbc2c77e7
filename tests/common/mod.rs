#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use text_clamp::{Clamp, ClampEvent, Fragment, HeightOracle, LineHeight};

pub const LINE_PX: f32 = 20.0;

/// Monospace grid: `columns` characters per line, block structure ignored.
pub struct CharGridOracle {
    pub columns: usize,
    pub measurements: Cell<usize>,
}

impl CharGridOracle {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            measurements: Cell::new(0),
        }
    }
}

impl HeightOracle for CharGridOracle {
    fn measured_height(&self, fragment: &Fragment) -> f32 {
        self.measurements.set(self.measurements.get() + 1);
        let chars = fragment.text_content().chars().count();
        chars.div_ceil(self.columns) as f32 * LINE_PX
    }

    fn computed_line_height(&self, _fragment: &Fragment) -> LineHeight {
        LineHeight::Px(LINE_PX)
    }

    fn computed_font_size(&self, _fragment: &Fragment) -> f32 {
        16.0
    }
}

/// Returns canned heights in call order, then `fallback` forever.
pub struct ScriptedOracle {
    pub heights: RefCell<VecDeque<f32>>,
    pub fallback: f32,
    pub line_height: LineHeight,
    pub font_size: f32,
}

impl ScriptedOracle {
    pub fn new(heights: &[f32], fallback: f32) -> Self {
        Self {
            heights: RefCell::new(heights.iter().copied().collect()),
            fallback,
            line_height: LineHeight::Px(LINE_PX),
            font_size: 16.0,
        }
    }
}

impl HeightOracle for ScriptedOracle {
    fn measured_height(&self, _fragment: &Fragment) -> f32 {
        self.heights.borrow_mut().pop_front().unwrap_or(self.fallback)
    }

    fn computed_line_height(&self, _fragment: &Fragment) -> LineHeight {
        self.line_height
    }

    fn computed_font_size(&self, _fragment: &Fragment) -> f32 {
        self.font_size
    }
}

pub fn record_events(clamp: &mut Clamp) -> Arc<Mutex<Vec<ClampEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    clamp.set_event_sink(move |event| sink.lock().unwrap().push(event));
    events
}

pub fn clamped_values(events: &Arc<Mutex<Vec<ClampEvent>>>) -> Vec<bool> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            ClampEvent::Clamped(value) => Some(*value),
            ClampEvent::Diagnostic(_) => None,
        })
        .collect()
}

pub fn diagnostics(events: &Arc<Mutex<Vec<ClampEvent>>>) -> Vec<String> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            ClampEvent::Diagnostic(diag) => Some(diag.to_string()),
            ClampEvent::Clamped(_) => None,
        })
        .collect()
}
