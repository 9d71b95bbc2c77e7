//! Right-most text leaf discovery with pruning of dead trailing nodes.

use crate::fragment::{Fragment, NodeId, NodeKind};

/// Find the deepest, right-most text leaf that still carries content.
///
/// Descends through last-child links. A trailing leaf that is empty,
/// whitespace-only or exactly `marker`, and a trailing element with no
/// children, is detached from its parent and the descent restarts at the
/// root. Every prune shrinks the attached tree, so the loop terminates.
///
/// Returns `None` once the root has no children left.
pub fn find_rightmost_text(fragment: &mut Fragment, marker: &str) -> Option<NodeId> {
    let root = fragment.root();
    let mut current = root;
    loop {
        let Some(last) = fragment.last_child(current) else {
            return fragment.is_text(current).then_some(current);
        };
        if !fragment.children(last).is_empty() {
            current = last;
            continue;
        }
        if is_dead_leaf(fragment, last, marker) {
            log::trace!("pruning trailing node {}", last.index());
            fragment.remove(last);
            current = root;
            continue;
        }
        return Some(last);
    }
}

fn is_dead_leaf(fragment: &Fragment, id: NodeId, marker: &str) -> bool {
    match fragment.kind(id) {
        Some(NodeKind::Text(text)) => text.trim().is_empty() || text == marker,
        Some(NodeKind::Element { .. }) => true,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;

    #[test]
    fn returns_last_text_leaf_of_flat_fragment() {
        let mut frag = parse_fragment("plain words").unwrap();
        let id = find_rightmost_text(&mut frag, "…").unwrap();
        assert_eq!(frag.text(id), Some("plain words"));
    }

    #[test]
    fn descends_into_nested_containers() {
        let mut frag = parse_fragment("a <b>b <i>deep text</i></b>").unwrap();
        let id = find_rightmost_text(&mut frag, "…").unwrap();
        assert_eq!(frag.text(id), Some("deep text"));
        assert_eq!(frag.attached_count(), 6);
    }

    #[test]
    fn prunes_empty_and_marker_leaves_then_restarts() {
        let mut frag = parse_fragment("<p>keep me</p><p><span>…</span><b></b>  </p>").unwrap();
        let id = find_rightmost_text(&mut frag, "…").unwrap();
        assert_eq!(frag.text(id), Some("keep me"));
        assert_eq!(frag.to_markup(), "<p>keep me</p>");
    }

    #[test]
    fn prunes_trailing_void_elements() {
        let mut frag = parse_fragment("line one<br><img src=\"x.png\">").unwrap();
        let id = find_rightmost_text(&mut frag, "…").unwrap();
        assert_eq!(frag.text(id), Some("line one"));
        assert_eq!(frag.children(frag.root()).len(), 1);
    }

    #[test]
    fn leaves_sibling_order_untouched() {
        let mut frag = parse_fragment("<i>one</i><b>two</b><u>three</u>").unwrap();
        let before = frag.to_markup();
        find_rightmost_text(&mut frag, "…");
        assert_eq!(frag.to_markup(), before);
    }

    #[test]
    fn empty_fragment_has_no_candidate() {
        let mut frag = parse_fragment("").unwrap();
        assert_eq!(find_rightmost_text(&mut frag, "…"), None);
    }

    #[test]
    fn fragment_of_only_dead_nodes_is_emptied() {
        let mut frag = parse_fragment("<p> </p><span>...</span>").unwrap();
        assert_eq!(find_rightmost_text(&mut frag, "..."), None);
        assert_eq!(frag.attached_count(), 1);
    }
}
