//! Small DOM helpers shared by the classifier and the content extractor

use scraper::{ElementRef, Html, Selector};

/// Collects the text of an element: trimmed text nodes joined by single spaces
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw text length of an element, in characters
pub fn raw_text_len(element: ElementRef<'_>) -> usize {
    element.text().map(|t| t.chars().count()).sum()
}

/// Number of element descendants, excluding the element itself
pub fn descendant_tag_count(element: ElementRef<'_>) -> usize {
    element
        .descendants()
        .skip(1)
        .filter(|node| node.value().is_element())
        .count()
}

/// Detaches every element matching one of the CSS selectors
pub fn remove_selected(document: &mut Html, selectors: &[&str]) {
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Detaches every element for which `predicate` returns true
pub fn remove_where<F>(document: &mut Html, predicate: F)
where
    F: Fn(ElementRef<'_>) -> bool,
{
    let ids: Vec<_> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| predicate(*el))
        .map(|el| el.id())
        .collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Strips markup from an HTML fragment (feed summaries, content:encoded)
pub fn html_to_text(fragment: &str) -> String {
    if !fragment.contains('<') {
        return fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    let mut document = Html::parse_fragment(fragment);
    remove_selected(&mut document, &["script", "style"]);
    element_text(document.root_element())
}
