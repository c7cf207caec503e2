use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};
use crate::constants::{CLEAR_COLOR, LABEL_FILL, LABEL_FONT, LABEL_OUTLINE, LABEL_OUTLINE_WIDTH};
use crate::network::SharedClient;
use crate::renderer::{Rect, Surface};

pub const CANVAS_ID: &str = "gameCanvas";

/// Fit the canvas to the window and hand the new size to the camera.
pub fn resize(client: &SharedClient) {
    let Some(window) = web_sys::window() else { return };
    let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);

    if let Some(canvas) = get_canvas(CANVAS_ID) {
        canvas.set_width(w as u32);
        canvas.set_height(h as u32);
    }

    client.borrow_mut().resize(w.floor(), h.floor());
}

pub fn setup_resize_handler(client: SharedClient) {
    let closure = Closure::wrap(Box::new(move |_: web_sys::Event| {
        resize(&client);
    }) as Box<dyn FnMut(web_sys::Event)>);

    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

pub fn get_canvas(id: &str) -> Option<HtmlCanvasElement> {
    let document = web_sys::window()?.document()?;
    document.get_element_by_id(id)?.dyn_into().ok()
}

pub fn get_canvas_context(id: &str) -> Option<CanvasRenderingContext2d> {
    get_canvas(id)?
        .get_context("2d")
        .ok()?
        .and_then(|c| c.dyn_into().ok())
}

/// `Surface` backed by a 2D canvas context.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Surface for CanvasSurface {
    type Image = HtmlImageElement;

    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.set_fill_style_str(CLEAR_COLOR);
        self.ctx.fill_rect(0.0, 0.0, width, height);
    }

    fn draw_backdrop(&mut self, image: &HtmlImageElement, src: Rect, dest: Rect) {
        let _ = self.ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
            image, src.x, src.y, src.w, src.h, dest.x, dest.y, dest.w, dest.h,
        );
    }

    fn draw_sprite(&mut self, image: &HtmlImageElement, dest: Rect, mirrored: bool) {
        let ctx = &self.ctx;
        if !mirrored {
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(image, dest.x, dest.y, dest.w, dest.h);
            return;
        }
        // flip around the sprite's right edge so it lands on the same rect
        ctx.save();
        let _ = ctx.translate(dest.x + dest.w, dest.y);
        let _ = ctx.scale(-1.0, 1.0);
        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(image, 0.0, 0.0, dest.w, dest.h);
        ctx.restore();
    }

    fn draw_label(&mut self, text: &str, x: f64, y: f64) {
        let ctx = &self.ctx;
        ctx.set_font(LABEL_FONT);
        ctx.set_text_align("center");
        ctx.set_text_baseline("alphabetic");
        ctx.set_line_join("round");
        ctx.set_line_width(LABEL_OUTLINE_WIDTH);
        ctx.set_stroke_style_str(LABEL_OUTLINE);
        let _ = ctx.stroke_text(text, x, y);
        ctx.set_fill_style_str(LABEL_FILL);
        let _ = ctx.fill_text(text, x, y);
    }
}
