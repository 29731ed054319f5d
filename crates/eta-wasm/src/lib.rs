//! WASM content-script host for the ETA portal scraper.
//!
//! The extension's content script constructs a [`ContentScript`] once the
//! portal page is loaded and forwards every runtime message to
//! [`ContentScript::handle_message`].

mod clock;
mod dom;
mod fetch;
mod frame;

pub use clock::BrowserClock;
pub use dom::{DomElement, DomSurface};
pub use fetch::FetchApi;
pub use frame::{FrameDocument, IframeLoader};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Promise};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{MutationObserver, MutationObserverInit, MutationRecord};

use eta_core::{
    ChangeMonitor, Clock, Command, DetailResolver, Dispatcher, InvoiceData, NullProgress,
    PendingRescan, PortalScraper, ProgressEvent, ProgressFn, ProgressUpdate, Response,
    ScraperConfig,
};

type PageDispatcher = Dispatcher<DomSurface, BrowserClock, FetchApi, IframeLoader>;
type MutationCallback = Closure<dyn FnMut(Array, MutationObserver)>;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Whether the reply to `request` is produced asynchronously, so the
/// message channel must stay open.
#[wasm_bindgen(js_name = isAsyncRequest)]
pub fn is_async_request(request: JsValue) -> bool {
    serde_wasm_bindgen::from_value::<serde_json::Value>(request)
        .ok()
        .and_then(|value| Command::parse(&value).ok())
        .is_some_and(|command| command.is_async())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// State shared with the observer and timer callbacks.
struct Shared {
    dispatcher: RefCell<PageDispatcher>,
    /// Records of the last scan, readable while a command holds the scraper.
    held: RefCell<InvoiceData>,
    monitor: RefCell<ChangeMonitor>,
    timer: Cell<Option<i32>>,
    clock: BrowserClock,
}

impl Shared {
    fn on_mutation(self: &Rc<Self>, added: &[DomElement]) {
        let pending = self.monitor.borrow_mut().observe(added, self.clock.now_ms());
        if let Some(pending) = pending {
            self.schedule(pending);
        }
    }

    fn cancel_timer(&self) {
        if let (Some(handle), Some(window)) = (self.timer.take(), web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }
    }

    fn schedule(self: &Rc<Self>, pending: PendingRescan) {
        self.cancel_timer();
        let Some(window) = web_sys::window() else {
            return;
        };

        let weak: Weak<Shared> = Rc::downgrade(self);
        let token = pending.token;
        let callback = Closure::once_into_js(move || {
            if let Some(shared) = weak.upgrade() {
                shared.fire(token);
            }
        });
        let delay = pending.due_at_ms.saturating_sub(self.clock.now_ms());
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay.min(i32::MAX as u64) as i32,
        ) {
            Ok(handle) => self.timer.set(Some(handle)),
            Err(_) => log("eta: could not schedule rescan"),
        }
    }

    fn fire(&self, token: u64) {
        self.timer.set(None);
        if !self.monitor.borrow_mut().fire(token) {
            return;
        }
        match self.dispatcher.try_borrow_mut() {
            Ok(mut dispatcher) => {
                let count = dispatcher.scraper_mut().rescan().len();
                self.held.replace(dispatcher.scraper().invoice_data());
                log(&format!("eta: rescanned page, {count} invoices"));
            }
            Err(_) => log("eta: rescan skipped, a command is running"),
        }
    }
}

/// The scraper bound to the current portal page.
#[wasm_bindgen]
pub struct ContentScript {
    shared: Rc<Shared>,
    observer: Option<MutationObserver>,
    mutation_callback: Option<MutationCallback>,
}

#[wasm_bindgen]
impl ContentScript {
    /// Scan the current page and start watching it for changes.
    ///
    /// `config` is an optional partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ContentScript, JsValue> {
        let config: ScraperConfig = if config.is_undefined() || config.is_null() {
            ScraperConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let surface = DomSurface::new(document.clone());
        let mut scraper = PortalScraper::new(surface, BrowserClock, config.clone());
        let found = scraper.rescan().len();
        log(&format!("eta: initial scan found {found} invoices"));

        let monitor = scraper.change_monitor();
        let held = scraper.invoice_data();
        let resolver = DetailResolver::new(
            FetchApi,
            IframeLoader::new(document.clone()),
            BrowserClock,
            &config,
        );
        let shared = Rc::new(Shared {
            dispatcher: RefCell::new(Dispatcher::new(scraper, resolver)),
            held: RefCell::new(held),
            monitor: RefCell::new(monitor),
            timer: Cell::new(None),
            clock: BrowserClock,
        });

        let mut script = ContentScript {
            shared,
            observer: None,
            mutation_callback: None,
        };
        if let Some(body) = document.body() {
            script.observe(&body)?;
        }
        Ok(script)
    }

    /// Handle one runtime message; resolves to the reply object.
    ///
    /// `progressCallback` receives `progressUpdate` events when the request
    /// subscribed to them.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, request: JsValue, progress_callback: Option<Function>) -> Promise {
        let shared = self.shared.clone();
        future_to_promise(async move {
            let request: serde_json::Value = serde_wasm_bindgen::from_value(request)?;

            // A command holds the scraper until its reply is ready; reads of
            // held records are answered from the last scan meanwhile.
            let Ok(mut dispatcher) = shared.dispatcher.try_borrow_mut() else {
                let read_only = Command::parse(&request).is_ok_and(|c| c.is_read_only());
                if read_only {
                    return to_js(&Response::Invoices {
                        success: true,
                        data: shared.held.borrow().clone(),
                    });
                }
                return to_js(&Response::Failure {
                    success: false,
                    error: "scraper busy".to_string(),
                });
            };

            let reply = match progress_callback {
                Some(callback) => {
                    let mut sink = ProgressFn(move |update: &ProgressUpdate| {
                        let delivered = to_js(&ProgressEvent::new(update))
                            .and_then(|event| callback.call1(&JsValue::NULL, &event));
                        if let Err(e) = delivered {
                            log(&format!("eta: progress callback failed: {e:?}"));
                        }
                    });
                    dispatcher.handle(&request, &mut sink).await
                }
                None => dispatcher.handle(&request, &mut NullProgress).await,
            };
            shared.held.replace(dispatcher.scraper().invoice_data());
            to_js(&reply)
        })
    }

    /// Records of the last scan, as `getInvoiceData` returns them.
    #[wasm_bindgen(js_name = invoiceData)]
    pub fn invoice_data(&self) -> Result<JsValue, JsValue> {
        to_js(&*self.shared.held.borrow())
    }

    /// Stop observing the page and cancel any pending rescan.
    pub fn cleanup(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.mutation_callback = None;
        self.shared.monitor.borrow_mut().disconnect();
        self.shared.cancel_timer();
    }
}

impl ContentScript {
    fn observe(&mut self, target: &web_sys::Node) -> Result<(), JsValue> {
        let weak = Rc::downgrade(&self.shared);
        let callback: MutationCallback = Closure::new(move |records: Array, _: MutationObserver| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let added: Vec<DomElement> = records
                .iter()
                .filter_map(|record| record.dyn_into::<MutationRecord>().ok())
                .flat_map(|record| dom::elements(&record.added_nodes()))
                .collect();
            if !added.is_empty() {
                shared.on_mutation(&added);
            }
        });

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(target, &options)?;

        self.observer = Some(observer);
        self.mutation_callback = Some(callback);
        Ok(())
    }
}

impl Drop for ContentScript {
    fn drop(&mut self) {
        self.cleanup();
    }
}
