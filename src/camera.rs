//! Viewport offset that keeps the local player centered inside the world.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportOffset {
    pub x: f64,
    pub y: f64,
}

impl ViewportOffset {
    pub fn world_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.x, y - self.y)
    }

    pub fn screen_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.x, y + self.y)
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    offset: ViewportOffset,
    canvas_w: f64,
    canvas_h: f64,
    world_w: f64,
    world_h: f64,
    // Last followed position, replayed on resize
    target: Option<(f64, f64)>,
}

/// Clamp one axis into `[0, world - canvas]`, or 0 when the canvas is wider than the world.
fn clamp_axis(pos: f64, canvas: f64, world: f64) -> f64 {
    let max = (world - canvas).max(0.0);
    (pos - canvas / 2.0).clamp(0.0, max)
}

impl Camera {
    pub fn new(world_w: f64, world_h: f64) -> Self {
        Self {
            offset: ViewportOffset::default(),
            canvas_w: 0.0,
            canvas_h: 0.0,
            world_w,
            world_h,
            target: None,
        }
    }

    pub fn offset(&self) -> ViewportOffset {
        self.offset
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_w, self.canvas_h)
    }

    #[cfg(test)]
    pub(crate) fn world_size(&self) -> (f64, f64) {
        (self.world_w, self.world_h)
    }

    /// Returns true when the offset moved.
    pub fn follow(&mut self, x: f64, y: f64) -> bool {
        self.target = Some((x, y));
        let next = ViewportOffset {
            x: clamp_axis(x, self.canvas_w, self.world_w),
            y: clamp_axis(y, self.canvas_h, self.world_h),
        };
        let changed = next != self.offset;
        self.offset = next;
        changed
    }

    pub fn resize(&mut self, canvas_w: f64, canvas_h: f64) {
        self.canvas_w = canvas_w;
        self.canvas_h = canvas_h;
        if let Some((x, y)) = self.target {
            self.follow(x, y);
        }
    }
}
