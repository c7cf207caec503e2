use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};
use crate::network::SharedClient;

fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now())
}

pub fn setup_input(client: SharedClient, canvas: &HtmlCanvasElement) {
    let Some(window) = web_sys::window() else { return };
    let Some(document) = window.document() else { return };

    // Key down
    let client_kd = client.clone();
    let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
        let handled = if e.repeat() {
            crate::controls::direction_for_key(&e.key()).is_some()
        } else {
            client_kd.borrow_mut().key_down(&e.key(), now())
        };
        // keep arrow keys from scrolling the page
        if handled {
            e.prevent_default();
        }
    }) as Box<dyn FnMut(KeyboardEvent)>);
    let _ = document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
    keydown.forget();

    // Key up
    let client_ku = client.clone();
    let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
        if client_ku.borrow_mut().key_up(&e.key()) {
            e.prevent_default();
        }
    }) as Box<dyn FnMut(KeyboardEvent)>);
    let _ = document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref());
    keyup.forget();

    // Focus loss: keyup never arrives for keys released elsewhere
    let client_blur = client.clone();
    let blur = Closure::wrap(Box::new(move |_: web_sys::Event| {
        client_blur.borrow_mut().blur();
    }) as Box<dyn FnMut(web_sys::Event)>);
    let _ = window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref());
    blur.forget();

    // Click to move
    let client_md = client.clone();
    let canvas_md = canvas.clone();
    let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
        if e.button() != 0 {
            return;
        }
        let rect = canvas_md.get_bounding_client_rect();
        let sx = e.client_x() as f64 - rect.left();
        let sy = e.client_y() as f64 - rect.top();
        client_md.borrow_mut().click(sx, sy);
    }) as Box<dyn FnMut(MouseEvent)>);
    let _ = canvas.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref());
    mousedown.forget();

    // Context menu
    let contextmenu = Closure::wrap(Box::new(move |e: web_sys::Event| {
        e.prevent_default();
    }) as Box<dyn FnMut(web_sys::Event)>);
    let _ = canvas.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref());
    contextmenu.forget();
}
