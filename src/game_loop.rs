use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::CanvasRenderingContext2d;
use crate::canvas::CanvasSurface;
use crate::network::SharedClient;

fn request_frame(f: &Closure<dyn FnMut(f64)>) {
    if let Some(window) = web_sys::window() {
        let _ = window.request_animation_frame(f.as_ref().unchecked_ref());
    }
}

/// Drive `Client::tick` once per animation frame for the lifetime of the page.
pub fn start_game_loop(client: SharedClient, ctx: CanvasRenderingContext2d) {
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let mut surface = CanvasSurface::new(ctx);

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        client.borrow_mut().tick(timestamp, &mut surface);

        // Request next frame
        if let Some(next) = f.borrow().as_ref() {
            request_frame(next);
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(first) = g.borrow().as_ref() {
        request_frame(first);
    };
}
