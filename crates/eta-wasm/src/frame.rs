//! Detail pages loaded into a hidden iframe.

use js_sys::Promise;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlIFrameElement};

use eta_core::{DocumentLoader, RemoteError, Surface};

use crate::dom::{DomElement, DomSurface};

fn load_error(err: JsValue) -> RemoteError {
    RemoteError::Load(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

/// Removes the iframe from the page when dropped.
struct FrameGuard(HtmlIFrameElement);

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.0.remove();
    }
}

/// A loaded detail page; the iframe lives as long as this value.
pub struct FrameDocument {
    surface: DomSurface,
    _frame: FrameGuard,
}

impl Surface for FrameDocument {
    type Node<'a> = DomElement;

    fn select<'a>(&'a self, selector: &str) -> Vec<DomElement> {
        self.surface.select(selector)
    }

    fn click(&self, node: &DomElement) {
        self.surface.click(node)
    }

    fn set_value(&self, node: &DomElement, value: &str) {
        self.surface.set_value(node, value)
    }

    fn dispatch(&self, node: &DomElement, event: &str) {
        self.surface.dispatch(node, event)
    }
}

/// Loads same-origin detail pages into zero-size hidden iframes.
#[derive(Debug, Clone)]
pub struct IframeLoader {
    document: Document,
}

impl IframeLoader {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn create_frame(&self, url: &str) -> Result<HtmlIFrameElement, JsValue> {
        let frame: HtmlIFrameElement = self.document.create_element("iframe")?.dyn_into()?;
        let style = frame.style();
        style.set_property("display", "none")?;
        style.set_property("width", "0")?;
        style.set_property("height", "0")?;
        frame.set_src(url);
        Ok(frame)
    }
}

impl DocumentLoader for IframeLoader {
    type Document = FrameDocument;

    async fn load(&self, url: &str) -> Result<FrameDocument, RemoteError> {
        let body = self
            .document
            .body()
            .ok_or_else(|| RemoteError::Load("page has no body".to_string()))?;
        let frame = self.create_frame(url).map_err(load_error)?;

        let loaded = Promise::new(&mut |resolve, reject| {
            frame.set_onload(Some(&resolve));
            frame.set_onerror(Some(&reject));
        });
        body.append_child(&frame).map_err(load_error)?;
        let guard = FrameGuard(frame);

        JsFuture::from(loaded).await.map_err(load_error)?;
        guard.0.set_onload(None);
        guard.0.set_onerror(None);

        let document = guard
            .0
            .content_document()
            .ok_or_else(|| RemoteError::Load("detail page is not readable".to_string()))?;
        Ok(FrameDocument {
            surface: DomSurface::new(document),
            _frame: guard,
        })
    }
}
