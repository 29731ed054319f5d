//! Render surfaces backed by parsed HTML snapshots.

use std::cell::{Cell, RefCell};
use std::path::Path;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{Element, Surface};
use crate::models::config::PaginationSelectors;

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!("Invalid selector {:?}: {}", selector, e);
            None
        }
    }
}

impl<'a> Element for ElementRef<'a> {
    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn has_class(&self, class: &str) -> bool {
        self.value().classes().any(|c| c == class)
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn select(&self, selector: &str) -> Vec<Self> {
        let Some(sel) = parse_selector(selector) else {
            return Vec::new();
        };
        // Match descendants only, like `querySelectorAll`.
        ElementRef::select(self, &sel)
            .filter(|el| el.id() != self.id())
            .collect()
    }

    fn matches(&self, selector: &str) -> bool {
        parse_selector(selector).is_some_and(|sel| sel.matches(self))
    }
}

/// A single static HTML document.
///
/// Interaction is a no-op: clicking a control in a saved page changes
/// nothing. Used for one-page scans and secondary documents.
pub struct HtmlSnapshot {
    html: Html,
}

impl HtmlSnapshot {
    /// Parse a complete HTML document.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Read and parse an HTML file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }
}

impl Surface for HtmlSnapshot {
    type Node<'a> = ElementRef<'a>;

    fn select<'a>(&'a self, selector: &str) -> Vec<ElementRef<'a>> {
        match parse_selector(selector) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    fn click(&self, _node: &ElementRef<'_>) {}

    fn set_value(&self, _node: &ElementRef<'_>, _value: &str) {}

    fn dispatch(&self, _node: &ElementRef<'_>, _event: &str) {}
}

/// An interaction recorded by [`PagedSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceAction {
    /// A next-page control was clicked.
    Next,
    /// A direct page control was clicked.
    Page(u32),
    /// A go/submit control was clicked.
    Go,
    /// A click on anything else.
    OtherClick,
    /// An input value was set.
    SetValue(String),
    /// An event was dispatched.
    Dispatch(String),
}

/// A saved multi-page portal session.
///
/// Each page is the full document as rendered for that page number.
/// Clicking the portal's pagination controls switches the current page, so
/// the engine can replay a traversal without a browser.
pub struct PagedSnapshot {
    pages: Vec<Html>,
    current: Cell<usize>,
    pending_input: RefCell<Option<String>>,
    selectors: PaginationSelectors,
    actions: RefCell<Vec<SurfaceAction>>,
    attached: Cell<bool>,
}

impl PagedSnapshot {
    /// Build a session from page sources, page 1 first.
    pub fn new<I, S>(pages: I, selectors: PaginationSelectors) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            pages: pages
                .into_iter()
                .map(|src| Html::parse_document(src.as_ref()))
                .collect(),
            current: Cell::new(0),
            pending_input: RefCell::new(None),
            selectors,
            actions: RefCell::new(Vec::new()),
            attached: Cell::new(true),
        }
    }

    /// Read a session from files, page 1 first.
    pub fn from_files<P: AsRef<Path>>(
        paths: &[P],
        selectors: PaginationSelectors,
    ) -> std::io::Result<Self> {
        let sources = paths
            .iter()
            .map(std::fs::read_to_string)
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self::new(sources, selectors))
    }

    /// Number of pages in the session.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Currently displayed page (1-based).
    pub fn current_page(&self) -> u32 {
        self.current.get() as u32 + 1
    }

    /// Interactions so far, oldest first.
    pub fn actions(&self) -> Vec<SurfaceAction> {
        self.actions.borrow().clone()
    }

    /// Simulate the host tearing the page down.
    pub fn detach(&self) {
        self.attached.set(false);
    }

    fn show(&self, page: u32) {
        if page >= 1 && (page as usize) <= self.pages.len() {
            self.current.set(page as usize - 1);
        } else {
            debug!("Snapshot has no page {}", page);
        }
    }

    fn resolve_click(&self, node: &ElementRef<'_>) -> SurfaceAction {
        if self
            .selectors
            .next_controls
            .iter()
            .any(|sel| Element::matches(node, sel))
        {
            return SurfaceAction::Next;
        }

        for page in 1..=self.pages.len() as u32 {
            if self
                .selectors
                .page_controls_for(page)
                .iter()
                .any(|sel| Element::matches(node, sel))
            {
                return SurfaceAction::Page(page);
            }
        }

        if Element::matches(node, &self.selectors.go_button) {
            return SurfaceAction::Go;
        }

        SurfaceAction::OtherClick
    }
}

impl Surface for PagedSnapshot {
    type Node<'a> = ElementRef<'a>;

    fn select<'a>(&'a self, selector: &str) -> Vec<ElementRef<'a>> {
        let Some(page) = self.pages.get(self.current.get()) else {
            return Vec::new();
        };
        match parse_selector(selector) {
            Some(sel) => page.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    fn click(&self, node: &ElementRef<'_>) {
        let action = self.resolve_click(node);
        match &action {
            SurfaceAction::Next => self.show(self.current_page() + 1),
            SurfaceAction::Page(page) => self.show(*page),
            SurfaceAction::Go => {
                let target = self
                    .pending_input
                    .borrow()
                    .as_deref()
                    .and_then(|v| v.trim().parse::<u32>().ok());
                if let Some(page) = target {
                    self.show(page);
                }
            }
            _ => {}
        }
        self.actions.borrow_mut().push(action);
    }

    fn set_value(&self, _node: &ElementRef<'_>, value: &str) {
        *self.pending_input.borrow_mut() = Some(value.to_string());
        self.actions
            .borrow_mut()
            .push(SurfaceAction::SetValue(value.to_string()));
    }

    fn dispatch(&self, _node: &ElementRef<'_>, event: &str) {
        self.actions
            .borrow_mut()
            .push(SurfaceAction::Dispatch(event.to_string()));
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROW_PAGE: &str = r#"
        <html><body>
          <div class="ms-DetailsRow" role="row" id="r1">
            <div class="ms-DetailsRow-cell"><span class="griCellTitleGray"> A </span></div>
            <div class="ms-DetailsRow-cell"><span class="griCellTitleGray">B</span></div>
          </div>
          <button class="ms-Button" disabled>x</button>
        </body></html>
    "#;

    fn page(n: u32) -> String {
        format!(
            r#"<html><body>
                 <span class="eta-pageNumber is-checked">{n}</span>
                 <button aria-label="Page 1" class="eta-pageNumber" data-page="1">1</button>
                 <button aria-label="Page 2" class="eta-pageNumber" data-page="2">2</button>
                 <button aria-label="Next page">next</button>
                 <input type="number" aria-label="page number" />
                 <button aria-label="Go">go</button>
               </body></html>"#
        )
    }

    #[test]
    fn test_element_queries() {
        let doc = HtmlSnapshot::parse(ROW_PAGE);
        let rows = doc.select(r#".ms-DetailsRow[role="row"]"#);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert!(row.has_class("ms-DetailsRow"));
        assert_eq!(Element::attr(row, "id").as_deref(), Some("r1"));

        let cells = Element::select(row, ".ms-DetailsRow-cell");
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].trimmed_text(), "A");
        assert!(Element::matches(&cells[1], "div.ms-DetailsRow-cell"));
    }

    #[test]
    fn test_select_excludes_self() {
        let doc = HtmlSnapshot::parse(ROW_PAGE);
        let row = doc.select_first(".ms-DetailsRow").unwrap();
        assert!(Element::select(&row, ".ms-DetailsRow").is_empty());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = HtmlSnapshot::parse(ROW_PAGE);
        assert!(doc.select("[[[").is_empty());
    }

    #[test]
    fn test_disabled_control() {
        let doc = HtmlSnapshot::parse(ROW_PAGE);
        let button = doc.select_first("button").unwrap();
        assert!(button.is_disabled());
    }

    #[test]
    fn test_paged_snapshot_navigation() {
        let surface = PagedSnapshot::new(
            [page(1), page(2)],
            PaginationSelectors::default(),
        );
        assert_eq!(surface.current_page(), 1);

        let next = surface.select_first(r#"[aria-label="Next page"]"#).unwrap();
        surface.click(&next);
        assert_eq!(surface.current_page(), 2);

        let first = surface.select_first(r#"[aria-label="Page 1"]"#).unwrap();
        surface.click(&first);
        assert_eq!(surface.current_page(), 1);

        let input = surface.select_first(r#"input[type="number"]"#).unwrap();
        surface.set_value(&input, "2");
        let go = surface.select_first(r#"[aria-label*="Go"]"#).unwrap();
        surface.click(&go);
        assert_eq!(surface.current_page(), 2);

        assert_eq!(
            surface.actions(),
            vec![
                SurfaceAction::Next,
                SurfaceAction::Page(1),
                SurfaceAction::SetValue("2".to_string()),
                SurfaceAction::Go,
            ]
        );
    }

    #[test]
    fn test_next_past_last_page_stays() {
        let surface = PagedSnapshot::new([page(1)], PaginationSelectors::default());
        let next = surface.select_first(r#"[aria-label="Next page"]"#).unwrap();
        surface.click(&next);
        assert_eq!(surface.current_page(), 1);
    }
}
