//! HTML extraction of the fields used in the analysis
//!
//! This module pulls a fixed set of SEO-relevant fields out of a page:
//! - Page title and meta description (falling back to `og:description`)
//! - The first `<h1>` and every non-empty `<h2>` in document order
//! - Word and structural-unit counts over the main content root

use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as content
const EXCLUDED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside",
];

/// Content root candidates, tried in order
const CONTENT_ROOTS: &[&str] = &["main", "article", "div.content", "body"];

/// Fields extracted from one HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub primary_heading: Option<String>,
    pub sub_headings: Vec<String>,
    pub word_count: usize,
    pub structural_units: usize,
}

/// Extracts the SEO fields from an HTML document
///
/// Parsing is lenient: malformed markup still yields whatever fields can be
/// found, and missing fields are `None` or empty.
///
/// # Example
///
/// ```
/// use seo_analyzer::fetch::extract_page;
///
/// let html = r#"<html><head><title>Brewing Guide</title></head>
///     <body><h1>Pour over</h1><p>Grind beans first.</p></body></html>"#;
/// let page = extract_page(html);
/// assert_eq!(page.title.as_deref(), Some("Brewing Guide"));
/// assert_eq!(page.word_count, 5);
/// ```
pub fn extract_page(html: &str) -> PageContent {
    let document = Html::parse_document(html);

    let mut content = PageContent {
        title: first_text(&document, "title"),
        description: extract_description(&document),
        primary_heading: first_text(&document, "h1"),
        sub_headings: all_texts(&document, "h2"),
        ..PageContent::default()
    };

    if let Some(root) = find_content_root(&document) {
        let mut fragments = Vec::new();
        collect_text(root, &mut fragments);

        let spaced = fragments.join(" ");
        content.word_count = count_words(&spaced);

        let raw: String = fragments.concat();
        let blank_line_groups = raw.split("\n\n").count();
        let paragraphs = count_paragraphs(root);
        content.structural_units = paragraphs.max(blank_line_groups.saturating_sub(1)).max(1);
    }

    content
}

/// Counts words in mixed CJK / space-separated text
///
/// Each CJK ideograph counts as one word. Every whitespace-separated token that
/// contains at least one non-CJK character adds one more.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .map(|token| {
            let ideographs = token.chars().filter(|c| is_cjk(*c)).count();
            let has_other = token.chars().any(|c| !is_cjk(c));
            ideographs + usize::from(has_other)
        })
        .sum()
}

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = collapse_whitespace(&element.text().collect::<String>());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document.select(&selector).next().and_then(element_text)
}

fn all_texts(document: &Html, css: &str) -> Vec<String> {
    match selector(css) {
        Some(selector) => document.select(&selector).filter_map(element_text).collect(),
        None => Vec::new(),
    }
}

fn extract_description(document: &Html) -> Option<String> {
    ["meta[name='description']", "meta[property='og:description']"]
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(collapse_whitespace)
                .filter(|s| !s.is_empty())
        })
}

fn find_content_root(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_ROOTS
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|selector| document.select(&selector).next())
}

/// Gathers text nodes below `element`, skipping excluded subtrees
fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push(&**text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !EXCLUDED_ELEMENTS.contains(&child.value().name()) {
                collect_text(child, out);
            }
        }
    }
}

fn count_paragraphs(root: ElementRef<'_>) -> usize {
    let Some(p) = selector("p") else {
        return 0;
    };
    root.select(&p)
        .filter(|paragraph| {
            !paragraph.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| EXCLUDED_ELEMENTS.contains(&element.name()))
            })
        })
        .count()
}
