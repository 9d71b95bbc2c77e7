//! Word-granular fit search against the height oracle.

extern crate alloc;

use alloc::string::String;
use smallvec::SmallVec;

use crate::fragment::{Fragment, NodeId};
use crate::oracle::HeightOracle;
use crate::walker::find_rightmost_text;

const WORD_SEPARATOR: char = ' ';

/// Summary of one fit search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitReport {
    /// Leaf that received the final `words + marker` payload, or the leaf left
    /// holding the bare marker.
    pub node: NodeId,
    /// Words kept in `node`, zero when it holds only the marker.
    pub words_kept: usize,
    /// Number of height measurements issued.
    pub probes: usize,
    /// `true` when the fragment still overflows with every leaf collapsed.
    pub exhausted: bool,
}

/// Cut text from the end of the fragment until it measures at or below
/// `target_height`, starting with the leaf `start`.
///
/// The leaf's payload is split on single spaces and the largest word prefix
/// whose `prefix + marker` fits is found by binary search, so each leaf costs
/// `O(log words)` measurements. A leaf that cannot keep a single word is
/// collapsed to the marker and re-measured; if the fragment still overflows
/// the search moves to the previous text leaf in document order. When nothing
/// is left, the last collapsed leaf is kept in the tree holding only the
/// marker.
pub fn fit_node<O: HeightOracle + ?Sized>(
    fragment: &mut Fragment,
    oracle: &O,
    start: NodeId,
    target_height: f32,
    marker: &str,
) -> FitReport {
    let mut node = start;
    let mut probes = 0usize;
    loop {
        let payload: String = fragment
            .text(node)
            .map(|text| strip_marker(text, marker).into())
            .unwrap_or_default();
        let words: SmallVec<[&str; 32]> = payload.split(WORD_SEPARATOR).collect();

        if words.len() > 1 {
            let kept = largest_fitting_prefix(
                fragment,
                oracle,
                node,
                &words,
                target_height,
                marker,
                &mut probes,
            );
            if kept > 0 {
                fragment.set_text(node, compose(&words[..kept], marker));
                let report = FitReport {
                    node,
                    words_kept: kept,
                    probes,
                    exhausted: false,
                };
                log::debug!("fit search settled: {:?}", report);
                return report;
            }
        }

        fragment.set_text(node, marker);
        probes += 1;
        if oracle.measured_height(fragment) <= target_height {
            let report = FitReport {
                node,
                words_kept: 0,
                probes,
                exhausted: false,
            };
            log::debug!("marker alone fits in leaf {}: {:?}", node.index(), report);
            return report;
        }
        match find_rightmost_text(fragment, marker) {
            Some(previous) if previous != node => {
                log::trace!(
                    "leaf {} cannot keep a word, moving to leaf {}",
                    node.index(),
                    previous.index()
                );
                node = previous;
            }
            _ => {
                if !fragment.is_attached(node) {
                    fragment.reattach_to_nearest_ancestor(node);
                }
                let report = FitReport {
                    node,
                    words_kept: 0,
                    probes,
                    exhausted: true,
                };
                log::debug!("fit search exhausted the fragment: {:?}", report);
                return report;
            }
        }
    }
}

fn largest_fitting_prefix<O: HeightOracle + ?Sized>(
    fragment: &mut Fragment,
    oracle: &O,
    node: NodeId,
    words: &[&str],
    target_height: f32,
    marker: &str,
    probes: &mut usize,
) -> usize {
    let mut low = 0usize;
    let mut high = words.len();
    while low < high {
        let mid = (low + high + 1) / 2;
        fragment.set_text(node, compose(&words[..mid], marker));
        *probes += 1;
        let height = oracle.measured_height(fragment);
        log::trace!("probe words={} height={} target={}", mid, height, target_height);
        if height <= target_height {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    low
}

fn strip_marker<'a>(text: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return text;
    }
    text.strip_suffix(marker).unwrap_or(text)
}

fn compose(words: &[&str], marker: &str) -> String {
    let mut out = words.join(" ");
    out.push_str(marker);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;
    use crate::oracle::LineHeight;
    use core::cell::Cell;

    /// Every character is one column; lines wrap hard at `columns`.
    struct Columns {
        columns: usize,
        probes: Cell<usize>,
    }

    impl Columns {
        fn new(columns: usize) -> Self {
            Self {
                columns,
                probes: Cell::new(0),
            }
        }
    }

    impl HeightOracle for Columns {
        fn measured_height(&self, fragment: &Fragment) -> f32 {
            self.probes.set(self.probes.get() + 1);
            let chars = fragment.text_content().chars().count();
            (chars.div_ceil(self.columns) * 10) as f32
        }

        fn computed_line_height(&self, _fragment: &Fragment) -> LineHeight {
            LineHeight::Px(10.0)
        }

        fn computed_font_size(&self, _fragment: &Fragment) -> f32 {
            8.0
        }
    }

    #[test]
    fn keeps_largest_word_prefix_that_fits() {
        let mut frag = parse_fragment("one two three four five six").unwrap();
        let leaf = frag.children(frag.root())[0];
        let oracle = Columns::new(12);
        let report = fit_node(&mut frag, &oracle, leaf, 10.0, "…");
        assert_eq!(frag.text(leaf), Some("one two…"));
        assert_eq!(report.words_kept, 2);
        assert!(!report.exhausted);
    }

    #[test]
    fn probe_count_is_logarithmic_in_word_count() {
        let text = (0..256).map(|i| format!("w{}", i % 10)).collect::<Vec<_>>().join(" ");
        let mut frag = parse_fragment(&text).unwrap();
        let leaf = frag.children(frag.root())[0];
        let oracle = Columns::new(40);
        let report = fit_node(&mut frag, &oracle, leaf, 20.0, "…");
        assert!(report.probes <= 9, "probes={}", report.probes);
        assert_eq!(report.probes, oracle.probes.get());
        assert!(oracle.measured_height(&frag) <= 20.0);
    }

    #[test]
    fn falls_back_to_previous_leaf_when_nothing_fits() {
        let mut frag = parse_fragment("alpha beta gamma <b>unbreakableword</b>").unwrap();
        let bold_text = frag.children(frag.children(frag.root())[1])[0];
        let oracle = Columns::new(14);
        let report = fit_node(&mut frag, &oracle, bold_text, 10.0, "…");
        assert_eq!(frag.to_markup(), "alpha beta…");
        assert_eq!(report.words_kept, 2);
        assert!(!report.exhausted);
        assert!(!frag.is_attached(bold_text));
    }

    #[test]
    fn collapsed_leaf_keeps_marker_when_fragment_then_fits() {
        let mut frag = parse_fragment("alpha beta <b>unbreakableword</b>").unwrap();
        let bold_text = frag.children(frag.children(frag.root())[1])[0];
        let oracle = Columns::new(14);
        let report = fit_node(&mut frag, &oracle, bold_text, 10.0, "…");
        assert_eq!(frag.to_markup(), "alpha beta <b>…</b>");
        assert_eq!(report.node, bold_text);
        assert_eq!(report.words_kept, 0);
        assert_eq!(report.probes, 1);
        assert!(!report.exhausted);
    }

    #[test]
    fn strips_previous_marker_before_tokenizing() {
        let mut frag = parse_fragment("red green blue…").unwrap();
        let leaf = frag.children(frag.root())[0];
        let oracle = Columns::new(10);
        fit_node(&mut frag, &oracle, leaf, 10.0, "…");
        assert_eq!(frag.text(leaf), Some("red green…"));
    }

    #[test]
    fn exhausted_fragment_keeps_marker_only() {
        let mut frag = parse_fragment("<span>Supercalifragilistic</span>").unwrap();
        let span = frag.children(frag.root())[0];
        let leaf = frag.children(span)[0];
        let oracle = Columns::new(2);
        let report = fit_node(&mut frag, &oracle, leaf, 10.0, "...");
        assert!(report.exhausted);
        assert_eq!(report.words_kept, 0);
        assert_eq!(frag.text_content(), "...");
        assert!(frag.is_attached(leaf));
    }
}
