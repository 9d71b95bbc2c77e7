//! Markup codec: inner-markup strings to [`Fragment`] arenas and back.
//!
//! Parsing is streaming over `quick-xml` events with an HTML-tolerant
//! element stack (void elements need no closing tag). Whitespace inside text
//! is kept verbatim so truncation operates on exactly what the host renders.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::ClampError;
use crate::fragment::{Attribute, Fragment, NodeId, NodeKind};

/// Tag used for the synthetic root created by [`parse_fragment`].
pub const DEFAULT_ROOT_TAG: &str = "div";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Structural limits applied while decoding markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkupLimits {
    /// Maximum element nesting depth below the root.
    pub max_depth: usize,
    /// Maximum number of nodes in the resulting arena.
    pub max_nodes: usize,
}

impl Default for MarkupLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_nodes: 16 * 1024,
        }
    }
}

/// `true` for HTML elements that never carry children.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(tag))
}

/// Parse inner markup under a `div` root with default limits.
pub fn parse_fragment(markup: &str) -> Result<Fragment, ClampError> {
    parse_fragment_with_limits(markup, DEFAULT_ROOT_TAG, MarkupLimits::default())
}

/// Parse inner markup under a root element named `root_tag`.
pub fn parse_fragment_with_limits(
    markup: &str,
    root_tag: &str,
    limits: MarkupLimits,
) -> Result<Fragment, ClampError> {
    let mut fragment = Fragment::new(root_tag);
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<(String, NodeId)> = Vec::with_capacity(8);
    let mut pending = String::new();

    loop {
        let offset = reader_token_offset(&reader);
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                flush_text(&mut fragment, &stack, &mut pending, limits, offset)?;
                let (tag, attrs) = decode_start(&reader, &e, offset)?;
                let parent = current_parent(&fragment, &stack);
                let void = is_void_element(&tag);
                let id = append_checked(&mut fragment, limits, offset, |frag| {
                    frag.append_element_with_attrs(parent, &tag, attrs)
                })?;
                if !void {
                    if stack.len() >= limits.max_depth {
                        return Err(ClampError::new(
                            "MARKUP_LIMIT_EXCEEDED",
                            format!("element <{}> nests deeper than max_depth", tag),
                        )
                        .with_offset(offset)
                        .with_limit("max_depth", stack.len() + 1, limits.max_depth));
                    }
                    stack.push((tag, id));
                }
            }
            Ok(Event::Empty(e)) => {
                flush_text(&mut fragment, &stack, &mut pending, limits, offset)?;
                let (tag, attrs) = decode_start(&reader, &e, offset)?;
                let parent = current_parent(&fragment, &stack);
                append_checked(&mut fragment, limits, offset, |frag| {
                    frag.append_element_with_attrs(parent, &tag, attrs)
                })?;
            }
            Ok(Event::End(e)) => {
                flush_text(&mut fragment, &stack, &mut pending, limits, offset)?;
                let tag = decode_name(&reader, e.name().as_ref(), offset)?;
                if is_void_element(&tag) {
                    continue;
                }
                let Some(open_at) = stack.iter().rposition(|(open, _)| *open == tag) else {
                    return Err(ClampError::new(
                        "MARKUP_TOKENIZE_ERROR",
                        format!("closing tag </{}> has no matching start tag", tag),
                    )
                    .with_offset(offset));
                };
                stack.truncate(open_at);
            }
            Ok(Event::Text(e)) => {
                let text = e.decode().map_err(|err| {
                    ClampError::new("MARKUP_TOKENIZE_ERROR", format!("Decode error: {:?}", err))
                        .with_offset(offset)
                })?;
                pending.push_str(text.as_ref());
            }
            Ok(Event::CData(e)) => {
                let text = reader.decoder().decode(&e).map_err(|err| {
                    ClampError::new("MARKUP_TOKENIZE_ERROR", format!("Decode error: {:?}", err))
                        .with_offset(offset)
                })?;
                pending.push_str(text.as_ref());
            }
            Ok(Event::GeneralRef(e)) => {
                let name = e.decode().map_err(|err| {
                    ClampError::new("MARKUP_TOKENIZE_ERROR", format!("Decode error: {:?}", err))
                        .with_offset(offset)
                })?;
                push_entity(&mut pending, name.as_ref());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(ClampError::new(
                    "MARKUP_TOKENIZE_ERROR",
                    format!("XML error: {:?}", err),
                )
                .with_offset(reader_token_offset(&reader)));
            }
        }
    }

    let offset = reader_token_offset(&reader);
    flush_text(&mut fragment, &stack, &mut pending, limits, offset)?;
    Ok(fragment)
}

fn reader_token_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn current_parent(fragment: &Fragment, stack: &[(String, NodeId)]) -> NodeId {
    stack.last().map(|(_, id)| *id).unwrap_or(fragment.root())
}

fn append_checked<F>(
    fragment: &mut Fragment,
    limits: MarkupLimits,
    offset: usize,
    append: F,
) -> Result<NodeId, ClampError>
where
    F: FnOnce(&mut Fragment) -> Result<NodeId, ClampError>,
{
    if fragment.len() >= limits.max_nodes {
        return Err(ClampError::new(
            "MARKUP_LIMIT_EXCEEDED",
            "fragment holds more nodes than max_nodes",
        )
        .with_offset(offset)
        .with_limit("max_nodes", fragment.len() + 1, limits.max_nodes));
    }
    append(fragment)
}

fn flush_text(
    fragment: &mut Fragment,
    stack: &[(String, NodeId)],
    pending: &mut String,
    limits: MarkupLimits,
    offset: usize,
) -> Result<(), ClampError> {
    if pending.is_empty() {
        return Ok(());
    }
    let parent = current_parent(fragment, stack);
    let text = core::mem::take(pending);
    append_checked(fragment, limits, offset, |frag| frag.append_text(parent, text))?;
    Ok(())
}

fn decode_name(reader: &Reader<&[u8]>, raw: &[u8], offset: usize) -> Result<String, ClampError> {
    let decoded = reader.decoder().decode(raw).map_err(|err| {
        ClampError::new("MARKUP_TOKENIZE_ERROR", format!("Decode error: {:?}", err))
            .with_offset(offset)
    })?;
    Ok(decoded.to_ascii_lowercase())
}

fn decode_start(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    offset: usize,
) -> Result<(String, Vec<Attribute>), ClampError> {
    let tag = decode_name(reader, e.name().as_ref(), offset)?;
    let mut attrs = Vec::new();
    for attr in e.html_attributes().flatten() {
        let name = match reader.decoder().decode(attr.key.as_ref()) {
            Ok(v) => v.to_string(),
            Err(_) => continue,
        };
        let raw = match reader.decoder().decode(&attr.value) {
            Ok(v) => v.to_string(),
            Err(_) => continue,
        };
        let value = match unescape(&raw) {
            Ok(v) => v.into_owned(),
            Err(_) => raw,
        };
        attrs.push(Attribute { name, value });
    }
    Ok((tag, attrs))
}

fn push_entity(out: &mut String, name: &str) {
    let mut entity = String::with_capacity(name.len() + 2);
    entity.push('&');
    entity.push_str(name);
    entity.push(';');
    if let Ok(resolved) = unescape(&entity) {
        out.push_str(resolved.as_ref());
        return;
    }
    match html_entity(name) {
        Some(ch) => out.push(ch),
        None => out.push_str(&entity),
    }
}

fn html_entity(name: &str) -> Option<char> {
    Some(match name {
        "nbsp" => '\u{00A0}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "middot" => '\u{00B7}',
        "shy" => '\u{00AD}',
        _ => return None,
    })
}

enum Step {
    Open(NodeId),
    Close(NodeId),
}

/// Serialize the children of the fragment root as inner markup.
pub fn serialize_fragment(fragment: &Fragment) -> String {
    let mut out = String::new();
    let mut steps: Vec<Step> = fragment
        .children(fragment.root())
        .iter()
        .rev()
        .map(|id| Step::Open(*id))
        .collect();
    while let Some(step) = steps.pop() {
        match step {
            Step::Open(id) => match fragment.kind(id) {
                Some(NodeKind::Text(text)) => out.push_str(&partial_escape(text.as_str())),
                Some(NodeKind::Element { tag, attrs }) => {
                    out.push('<');
                    out.push_str(tag);
                    for attr in attrs {
                        out.push(' ');
                        out.push_str(&attr.name);
                        out.push_str("=\"");
                        out.push_str(&escape(attr.value.as_str()));
                        out.push('"');
                    }
                    out.push('>');
                    if is_void_element(tag) {
                        continue;
                    }
                    steps.push(Step::Close(id));
                    steps.extend(fragment.children(id).iter().rev().map(|c| Step::Open(*c)));
                }
                None => {}
            },
            Step::Close(id) => {
                if let Some(tag) = fragment.tag(id) {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
        }
    }
    out
}

impl Fragment {
    /// Parse inner markup; see [`parse_fragment`].
    pub fn from_markup(markup: &str) -> Result<Self, ClampError> {
        parse_fragment(markup)
    }

    /// Serialized inner markup of the root; see [`serialize_fragment`].
    pub fn to_markup(&self) -> String {
        serialize_fragment(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_inline_markup() {
        let frag = parse_fragment("Hello <b>bold <a href=\"/x\">link</a></b> tail").unwrap();
        let root = frag.root();
        let children = frag.children(root).to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(frag.text(children[0]), Some("Hello "));
        assert_eq!(frag.tag(children[1]), Some("b"));
        assert_eq!(frag.text(children[2]), Some(" tail"));
        let link = frag.children(children[1])[1];
        assert_eq!(frag.attrs(link), &[Attribute::new("href", "/x")]);
        assert_eq!(frag.text_content(), "Hello bold link tail");
    }

    #[test]
    fn keeps_whitespace_verbatim() {
        let frag = parse_fragment("\n    <p>First  paragraph</p>\n").unwrap();
        assert_eq!(frag.text_content(), "\n    First  paragraph\n");
    }

    #[test]
    fn decodes_entities_into_single_text_leaf() {
        let frag = parse_fragment("Fish &amp; chips&nbsp;&#39;n&#39; &bogus;").unwrap();
        let children = frag.children(frag.root());
        assert_eq!(children.len(), 1);
        assert_eq!(
            frag.text(children[0]),
            Some("Fish & chips\u{00A0}'n' &bogus;")
        );
    }

    #[test]
    fn void_elements_do_not_need_closing_tags() {
        let frag = parse_fragment("<p>one<br>two</p><p>three</p>").unwrap();
        let paragraphs = frag.children(frag.root()).to_vec();
        assert_eq!(paragraphs.len(), 2);
        let first = frag.children(paragraphs[0]);
        assert_eq!(first.len(), 3);
        assert_eq!(frag.tag(first[1]), Some("br"));
        assert_eq!(frag.text(first[2]), Some("two"));
    }

    #[test]
    fn rejects_unmatched_closing_tag() {
        let err = parse_fragment("<b>text</i>").unwrap_err();
        assert_eq!(err.code, "MARKUP_TOKENIZE_ERROR");
        assert!(err.offset.is_some());
    }

    #[test]
    fn enforces_depth_limit() {
        let limits = MarkupLimits {
            max_depth: 2,
            ..MarkupLimits::default()
        };
        let err = parse_fragment_with_limits("<a><b><i>x</i></b></a>", "div", limits).unwrap_err();
        assert_eq!(err.code, "MARKUP_LIMIT_EXCEEDED");
        assert_eq!(err.limit.map(|l| l.kind), Some("max_depth"));
    }

    #[test]
    fn enforces_node_limit() {
        let limits = MarkupLimits {
            max_nodes: 3,
            ..MarkupLimits::default()
        };
        let err = parse_fragment_with_limits("a<b>b</b>c", "div", limits).unwrap_err();
        assert_eq!(err.limit.map(|l| l.kind), Some("max_nodes"));
    }

    #[test]
    fn serializes_back_to_equivalent_markup() {
        let source = "Tom &amp; <b class=\"x\">Jerry<br></b><i></i>";
        let frag = parse_fragment(source).unwrap();
        assert_eq!(frag.to_markup(), source);
        assert_eq!(parse_fragment(&frag.to_markup()).unwrap(), frag);
    }

    #[test]
    fn detached_nodes_are_not_serialized() {
        let mut frag = parse_fragment("<p>keep</p><p>drop</p>").unwrap();
        let second = frag.children(frag.root())[1];
        frag.remove(second);
        assert_eq!(frag.to_markup(), "<p>keep</p>");
    }
}
