//! Element lookup inside fetched HTML.

use scraper::{ElementRef, Html};

use crate::models::SelectionCriterion;

/// Finds the element a target's fingerprint is computed over.
pub trait ElementLocator: Send + Sync {
    /// Serialized markup of the first matching element, if any.
    fn locate(&self, html: &str, criterion: &SelectionCriterion) -> Option<String>;
}

/// [`ElementLocator`] backed by `scraper`.
///
/// Matches on tag name and exact attribute values. For `class`, a value also
/// matches when it is one of the element's space-separated classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLocator;

impl HtmlLocator {
    fn matches(element: &ElementRef<'_>, criterion: &SelectionCriterion) -> bool {
        let value = element.value();

        if let Some(tag) = &criterion.tag_name {
            if !value.name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        criterion.attributes.iter().all(|(name, expected)| {
            match value.attr(name) {
                Some(actual) if actual == expected => true,
                Some(actual) if name == "class" => {
                    actual.split_ascii_whitespace().any(|class| class == expected)
                }
                _ => false,
            }
        })
    }
}

impl ElementLocator for HtmlLocator {
    fn locate(&self, html: &str, criterion: &SelectionCriterion) -> Option<String> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let found = root
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| Self::matches(element, criterion))
            .map(|element| element.html());

        match &found {
            Some(markup) => log::debug!("Matched {} ({} bytes)", criterion, markup.len()),
            None => log::debug!("No element matched {}", criterion),
        }
        found
    }
}
