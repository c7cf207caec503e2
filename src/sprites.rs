//! Browser image decoding for queued sprite and backdrop loads.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlImageElement;
use crate::assets::{AssetTarget, Bitmap, LoadRequest};
use crate::error::AssetError;
use crate::network::WeakClient;

impl Bitmap for HtmlImageElement {
    fn pixel_width(&self) -> f64 {
        self.natural_width() as f64
    }

    fn pixel_height(&self) -> f64 {
        self.natural_height() as f64
    }
}

const PNG_DATA_PREFIX: &str = "data:image/png;base64,";

/// Sprite frames arrive as inline payloads. Bare base64 is assumed to be PNG.
pub fn sprite_src(payload: &str) -> String {
    if payload.starts_with("data:") {
        payload.to_string()
    } else {
        format!("{}{}", PNG_DATA_PREFIX, payload.trim())
    }
}

fn failure(target: &AssetTarget, source: &str) -> AssetError {
    match target {
        AssetTarget::Sprite(key) => AssetError::Sprite(key.clone()),
        AssetTarget::Backdrop => AssetError::Backdrop(source.to_string()),
    }
}

fn finish(client: &WeakClient, target: &AssetTarget, generation: u64, result: Result<HtmlImageElement, AssetError>) {
    if let Some(client) = client.upgrade() {
        client.borrow_mut().asset_loaded(target, generation, result);
    }
}

/// Start one decode per request. Results are reported back to the client as
/// they complete, in whatever order the browser finishes them.
pub fn decode_all(client: &WeakClient, requests: Vec<LoadRequest>) {
    for LoadRequest { target, generation, source } in requests {
        let src = match target {
            AssetTarget::Sprite(_) => sprite_src(&source),
            AssetTarget::Backdrop => source.clone(),
        };

        let img = match HtmlImageElement::new() {
            Ok(img) => img,
            Err(_) => {
                finish(client, &target, generation, Err(failure(&target, &source)));
                continue;
            }
        };

        let onload = {
            let client = client.clone();
            let target = target.clone();
            let img = img.clone();
            Closure::once_into_js(move || {
                finish(&client, &target, generation, Ok(img));
            })
        };
        let onerror = {
            let client = client.clone();
            let err = failure(&target, &source);
            Closure::once_into_js(move || {
                finish(&client, &target, generation, Err(err));
            })
        };

        img.set_onload(Some(onload.unchecked_ref::<js_sys::Function>()));
        img.set_onerror(Some(onerror.unchecked_ref::<js_sys::Function>()));
        img.set_src(&src);
    }
}
