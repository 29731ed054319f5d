//! Render surface over the live browser DOM.

use wasm_bindgen::JsCast;
use web_sys::{Document, Event, EventInit, HtmlElement, HtmlInputElement, NodeList};

use eta_core::{Element, Surface};

/// Element handle of a live document.
#[derive(Debug, Clone)]
pub struct DomElement(pub web_sys::Element);

/// Elements of a node list, skipping non-element nodes.
pub(crate) fn elements(list: &NodeList) -> Vec<DomElement> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .map(DomElement)
        .collect()
}

impl Element for DomElement {
    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn select(&self, selector: &str) -> Vec<Self> {
        match self.0.query_selector_all(selector) {
            Ok(list) => elements(&list),
            Err(_) => Vec::new(),
        }
    }

    fn matches(&self, selector: &str) -> bool {
        self.0.matches(selector).unwrap_or(false)
    }
}

/// A browser document the engine reads and drives.
#[derive(Debug, Clone)]
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl Surface for DomSurface {
    type Node<'a> = DomElement;

    fn select<'a>(&'a self, selector: &str) -> Vec<DomElement> {
        match self.document.query_selector_all(selector) {
            Ok(list) => elements(&list),
            Err(_) => Vec::new(),
        }
    }

    fn click(&self, node: &DomElement) {
        if let Some(el) = node.0.dyn_ref::<HtmlElement>() {
            el.click();
        }
    }

    fn set_value(&self, node: &DomElement, value: &str) {
        if let Some(input) = node.0.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        }
    }

    fn dispatch(&self, node: &DomElement, event: &str) {
        let init = EventInit::new();
        init.set_bubbles(true);
        if let Ok(event) = Event::new_with_event_init_dict(event, &init) {
            let _ = node.0.dispatch_event(&event);
        }
    }

    fn is_attached(&self) -> bool {
        self.document.body().is_some_and(|body| body.is_connected())
    }
}
