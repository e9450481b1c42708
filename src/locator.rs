use headless_chrome::browser::tab::element::Element;
use headless_chrome::Tab;
use regex::RegexBuilder;
use std::time::{Duration, Instant};

use crate::utils::error::{AppError, Result};

/// How often a bounded wait re-tries its candidate list.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One way of locating a form control.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// First element matching a CSS selector.
    Css(&'static str),
    /// The n-th element matching a CSS selector (0-based).
    NthCss(&'static str, usize),
    /// Element from a CSS pool whose accessible label matches a
    /// case-insensitive regex. The label is the `aria-label` attribute when
    /// present, otherwise the element's inner text.
    Label {
        pool: &'static str,
        pattern: &'static str,
    },
}

/// A form control together with its ordered candidate matchers. Candidates
/// are tried in sequence; the first one that resolves wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldTarget {
    pub name: &'static str,
    pub candidates: &'static [Matcher],
}

impl Matcher {
    fn resolve<'a>(&self, tab: &'a Tab) -> Option<Element<'a>> {
        match self {
            Matcher::Css(selector) => tab.find_element(selector).ok(),
            Matcher::NthCss(selector, index) => {
                let elements = tab.find_elements(selector).ok()?;
                elements.into_iter().nth(*index)
            }
            Matcher::Label { pool, pattern } => {
                let elements = tab.find_elements(pool).ok()?;
                elements
                    .into_iter()
                    .find(|element| label_matches(pattern, &accessible_label(element)))
            }
        }
    }
}

/// Best-effort accessible label: `aria-label` when set, inner text otherwise.
fn accessible_label(element: &Element) -> String {
    if let Ok(Some(label)) = element.get_attribute_value("aria-label") {
        if !label.trim().is_empty() {
            return label;
        }
    }
    element.get_inner_text().unwrap_or_default()
}

pub fn label_matches(pattern: &str, label: &str) -> bool {
    let Ok(regex) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
        return false;
    };
    regex.is_match(label)
}

/// Try every candidate matcher for `field` in order, polling until `timeout`
/// elapses. The first matcher that yields an element wins.
pub fn find_first<'a>(tab: &'a Tab, field: &FieldTarget, timeout: Duration) -> Result<Element<'a>> {
    let deadline = Instant::now() + timeout;
    loop {
        for matcher in field.candidates {
            if let Some(element) = matcher.resolve(tab) {
                return Ok(element);
            }
        }
        if Instant::now() >= deadline {
            return Err(AppError::ElementNotFound {
                field: field.name.to_string(),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
