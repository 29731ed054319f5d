//! Browser time source.

use std::future::Future;

use js_sys::Promise;
use wasm_bindgen_futures::JsFuture;

use eta_core::Clock;

/// Clock backed by `Date.now()` and `setTimeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn sleep(&self, ms: u64) -> impl Future<Output = ()> {
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    &resolve,
                    ms.min(i32::MAX as u64) as i32,
                );
            }
        });
        async move {
            let _ = JsFuture::from(promise).await;
        }
    }
}
