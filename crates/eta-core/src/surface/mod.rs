//! Render-surface abstraction.
//!
//! The engine never touches a concrete DOM. Hosts implement [`Surface`] and
//! [`Element`] over whatever document they have: a live browser DOM
//! (`eta-wasm`), or parsed HTML snapshots ([`HtmlSnapshot`],
//! [`PagedSnapshot`]) for native replays and tests.

mod snapshot;

pub use snapshot::{HtmlSnapshot, PagedSnapshot, SurfaceAction};

/// One element of a render surface.
pub trait Element: Sized {
    /// Text content of the element and its descendants.
    fn text(&self) -> String;

    /// Whether the element carries a class name.
    fn has_class(&self, class: &str) -> bool;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// Descendants matching a CSS selector, in document order.
    ///
    /// An invalid selector matches nothing.
    fn select(&self, selector: &str) -> Vec<Self>;

    /// Whether the element itself matches a CSS selector.
    fn matches(&self, selector: &str) -> bool;

    /// First descendant matching a CSS selector.
    fn select_first(&self, selector: &str) -> Option<Self> {
        self.select(selector).into_iter().next()
    }

    /// Trimmed text content.
    fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// Whether the element is a disabled control.
    fn is_disabled(&self) -> bool {
        self.attr("disabled").is_some()
            || self.attr("aria-disabled").is_some_and(|v| v == "true")
    }
}

/// The live, mutable document the scraper reads and drives.
pub trait Surface {
    /// Element handle borrowed from the surface.
    type Node<'a>: Element
    where
        Self: 'a;

    /// Elements matching a CSS selector, in document order.
    fn select<'a>(&'a self, selector: &str) -> Vec<Self::Node<'a>>;

    /// First element matching a CSS selector.
    fn select_first<'a>(&'a self, selector: &str) -> Option<Self::Node<'a>> {
        self.select(selector).into_iter().next()
    }

    /// Activate a control as a user click would.
    fn click(&self, node: &Self::Node<'_>);

    /// Set the value of an input control.
    fn set_value(&self, node: &Self::Node<'_>, value: &str);

    /// Dispatch a bubbling event of the given type on a node.
    fn dispatch(&self, node: &Self::Node<'_>, event: &str);

    /// Whether the surface is still attached to a live host.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Trimmed text of the first match of the first probe that yields non-empty
/// text.
pub fn probe_text<E: Element>(scope: &E, probes: &[String]) -> Option<String> {
    probes.iter().find_map(|selector| {
        scope
            .select_first(selector)
            .map(|el| el.trimmed_text())
            .filter(|text| !text.is_empty())
    })
}
