//! Text cleaning shared by the extraction modes

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

/// Subtrees whose text is never visible content
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "title", "head", "object",
    "canvas",
];

/// Elements that start a new text block
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "aside", "nav", "h1", "h2",
    "h3", "h4", "h5", "h6", "li", "ul", "ol", "dl", "dt", "dd", "blockquote", "pre", "table",
    "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "figure", "figcaption", "form",
    "fieldset", "address", "details", "summary", "body", "html",
];

static BOILERPLATE_RE: OnceLock<Regex> = OnceLock::new();

fn boilerplate_re() -> &'static Regex {
    BOILERPLATE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(skip to (main )?content|(accept|reject|manage) (all )?cookies|advertisement|share (this|on \w+)|sign in|log in|subscribe( now)?|read more|back to top|menu|search)[.!]?$",
        )
        .expect("boilerplate regex")
    })
}

/// A block of visible text and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    /// CSS-like descriptor of the block element (e.g. `p`, `div#intro`)
    pub source: String,
}

/// Decodes entities left in the text and collapses whitespace
///
/// The HTML parser already decodes entities once; this catches
/// double-encoded content such as `&amp;eacute;`.
pub fn clean_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true for short navigation and consent lines
pub fn is_boilerplate(text: &str) -> bool {
    boilerplate_re().is_match(text)
}

/// Visible text of an element, cleaned, as one string
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut buf = String::new();
    collect_inline(element, &mut buf);
    clean_text(&buf)
}

/// Splits the visible text under `root` into blocks
///
/// Block boundaries follow block-level elements. Script, style and similar
/// subtrees are skipped. Empty blocks are dropped; no length filtering is
/// applied here.
pub fn text_blocks(root: ElementRef<'_>) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    walk(root, &describe(root), &mut current, &mut blocks);
    flush(&mut current, &describe(root), &mut blocks);
    blocks
}

fn walk(element: ElementRef<'_>, source: &str, current: &mut String, blocks: &mut Vec<TextBlock>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => current.push_str(&text.text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.name();
                if is_excluded(child_el) {
                    continue;
                }
                if name == "br" {
                    current.push(' ');
                } else if BLOCK_TAGS.contains(&name) {
                    flush(current, source, blocks);
                    let child_source = describe(child_el);
                    walk(child_el, &child_source, current, blocks);
                    flush(current, &child_source, blocks);
                } else {
                    walk(child_el, source, current, blocks);
                }
            }
            _ => {}
        }
    }
}

fn collect_inline(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(&text.text),
            Node::Element(el) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if is_excluded(child_el) {
                        continue;
                    }
                    // Keep words from adjacent blocks apart
                    let name = el.name();
                    let spaced = name == "br" || BLOCK_TAGS.contains(&name);
                    if spaced {
                        buf.push(' ');
                    }
                    collect_inline(child_el, buf);
                    if spaced {
                        buf.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

fn flush(current: &mut String, source: &str, blocks: &mut Vec<TextBlock>) {
    let text = clean_text(current);
    current.clear();
    if !text.is_empty() {
        blocks.push(TextBlock {
            text,
            source: source.to_string(),
        });
    }
}

fn is_excluded(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    EXCLUDED_TAGS.contains(&name) || element.value().attr("hidden").is_some()
}

/// CSS-like descriptor of an element: `tag#id`, `tag.class` or `tag`
pub fn describe(element: ElementRef<'_>) -> String {
    let el = element.value();
    if let Some(id) = el.id() {
        return format!("{}#{}", el.name(), id);
    }
    match el.classes().next() {
        Some(class) => format!("{}.{}", el.name(), class),
        None => el.name().to_string(),
    }
}

/// Counts elements under `root`, excluding `root` itself
pub fn descendant_element_count(root: ElementRef<'_>) -> usize {
    root.descendants()
        .skip(1)
        .filter(|n| n.value().is_element())
        .count()
}

/// Parses a selector that is known to be valid
pub(crate) fn static_selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}
