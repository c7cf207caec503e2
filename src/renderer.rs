use crate::assets::{AssetCache, Bitmap};
use crate::camera::Camera;
use crate::constants::{CULL_MARGIN, LABEL_OFFSET, SPRITE_HEIGHT};
use crate::protocol::{Facing, PlayerState};
use crate::state::WorldState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// 2D drawing target for one frame.
pub trait Surface {
    type Image: Bitmap;

    fn clear(&mut self, width: f64, height: f64);
    /// Blit `src` (image pixels) into `dest` (canvas pixels).
    fn draw_backdrop(&mut self, image: &Self::Image, src: Rect, dest: Rect);
    fn draw_sprite(&mut self, image: &Self::Image, dest: Rect, mirrored: bool);
    /// Outlined text centered on `x` with its baseline at `y`.
    fn draw_label(&mut self, text: &str, x: f64, y: f64);
}

/// Which frames to draw for a facing, and whether to flip them.
/// Left-facing players reuse the right frames mirrored unless the avatar has its own.
fn sprite_source(world: &WorldState, p: &PlayerState) -> (Facing, bool) {
    if p.facing != Facing::Left {
        return (p.facing, false);
    }
    let has_left = world
        .avatar(&p.avatar_name)
        .and_then(|a| a.frames.get(&Facing::Left))
        .map_or(false, |f| !f.is_empty());
    if has_left {
        (Facing::Left, false)
    } else {
        (Facing::Right, true)
    }
}

fn draw_backdrop<S: Surface>(surface: &mut S, image: &S::Image, camera: &Camera) {
    let offset = camera.offset();
    let (canvas_w, canvas_h) = camera.canvas_size();
    // Crop to whatever part of the image lies under the canvas
    let w = canvas_w.min(image.pixel_width() - offset.x);
    let h = canvas_h.min(image.pixel_height() - offset.y);
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    surface.draw_backdrop(
        image,
        Rect { x: offset.x, y: offset.y, w, h },
        Rect { x: 0.0, y: 0.0, w, h },
    );
}

/// Compose one frame: backdrop, then each visible player's sprite and label.
pub fn render<S: Surface>(surface: &mut S, world: &WorldState, camera: &Camera, assets: &AssetCache<S::Image>) {
    let (canvas_w, canvas_h) = camera.canvas_size();
    surface.clear(canvas_w, canvas_h);

    if let Some(backdrop) = assets.backdrop() {
        draw_backdrop(surface, backdrop, camera);
    }

    let offset = camera.offset();

    // Back-to-front so lower players overlap higher ones
    let mut players: Vec<&PlayerState> = world.players().collect();
    players.sort_by(|a, b| a.y.total_cmp(&b.y).then_with(|| a.id.cmp(&b.id)));

    for p in players {
        let (sx, sy) = offset.world_to_screen(p.x, p.y);
        if sx < -CULL_MARGIN || sx > canvas_w + CULL_MARGIN || sy < -CULL_MARGIN || sy > canvas_h + CULL_MARGIN {
            continue;
        }

        let (facing, mirrored) = sprite_source(world, p);
        if let Some(img) = assets.get(&p.avatar_name, facing, p.animation_frame as usize) {
            if img.pixel_height() > 0.0 {
                let h = SPRITE_HEIGHT;
                let w = h * img.pixel_width() / img.pixel_height();
                let dest = Rect { x: sx - w / 2.0, y: sy - h, w, h };
                surface.draw_sprite(img, dest, mirrored);
            }
        }

        surface.draw_label(&p.username, sx, sy - SPRITE_HEIGHT - LABEL_OFFSET);
    }
}
