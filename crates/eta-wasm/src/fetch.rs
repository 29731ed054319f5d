//! Document API over `fetch`.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, Response};

use eta_core::{DetailApi, DocumentResponse, RemoteError};

fn js_error(err: JsValue) -> RemoteError {
    RemoteError::Network(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

/// Calls the portal's document endpoint with the page's own session.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchApi;

impl FetchApi {
    fn request(url: &str) -> Result<Request, JsValue> {
        let headers = Headers::new()?;
        headers.set("Accept", "application/json")?;
        headers.set("X-Requested-With", "XMLHttpRequest")?;

        let init = RequestInit::new();
        init.set_method("GET");
        init.set_credentials(RequestCredentials::Include);
        init.set_headers(&headers);
        Request::new_with_str_and_init(url, &init)
    }
}

impl DetailApi for FetchApi {
    async fn fetch_document(&self, url: &str) -> Result<DocumentResponse, RemoteError> {
        let window = web_sys::window().ok_or_else(|| RemoteError::Network("no window".to_string()))?;
        let request = Self::request(url).map_err(js_error)?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        if !response.ok() {
            return Err(RemoteError::Status(response.status()));
        }

        let body = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();
        Ok(serde_json::from_str(&body)?)
    }
}
