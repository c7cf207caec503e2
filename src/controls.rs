//! Keyboard and pointer input turned into outbound movement commands.
//!
//! Held keys produce an immediate move on press, a periodic re-affirmation
//! while held (the server times out continuous movement) and a single stop
//! once the last key is released. Clicks become absolute move targets.

use crate::camera::ViewportOffset;
use crate::connection::CommandSink;
use crate::protocol::{ClientCommand, Facing};

// Re-affirmation precedence when several keys are held
const PRECEDENCE: [Facing; 4] = [Facing::Up, Facing::Down, Facing::Left, Facing::Right];

/// Map a DOM `KeyboardEvent.key` value to a movement direction.
pub fn direction_for_key(key: &str) -> Option<Facing> {
    match key {
        "ArrowUp" | "w" | "W" => Some(Facing::Up),
        "ArrowDown" | "s" | "S" => Some(Facing::Down),
        "ArrowLeft" | "a" | "A" => Some(Facing::Left),
        "ArrowRight" | "d" | "D" => Some(Facing::Right),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct HeldKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    pub fn is_held(&self, dir: Facing) -> bool {
        match dir {
            Facing::Up => self.up,
            Facing::Down => self.down,
            Facing::Left => self.left,
            Facing::Right => self.right,
        }
    }

    fn set(&mut self, dir: Facing, held: bool) {
        match dir {
            Facing::Up => self.up = held,
            Facing::Down => self.down = held,
            Facing::Left => self.left = held,
            Facing::Right => self.right = held,
        }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Highest-precedence held direction, independent of press order.
    pub fn dominant(&self) -> Option<Facing> {
        PRECEDENCE.into_iter().find(|d| self.is_held(*d))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct InputController {
    held: HeldKeys,
    // None until the first move goes out
    last_move_time: Option<f64>,
    move_interval: f64,
}

impl InputController {
    pub fn new(move_interval: f64) -> Self {
        Self {
            held: HeldKeys::default(),
            last_move_time: None,
            move_interval,
        }
    }

    #[cfg(test)]
    pub(crate) fn held(&self) -> HeldKeys {
        self.held
    }

    fn send_move(&mut self, dir: Facing, now: f64, sink: &mut impl CommandSink) {
        if !sink.can_send() {
            return;
        }
        sink.submit(ClientCommand::Move(dir));
        self.last_move_time = Some(now);
    }

    /// Key-down for a direction. Repeats for an already-held key are ignored.
    pub fn key_down(&mut self, dir: Facing, now: f64, sink: &mut impl CommandSink) {
        if self.held.is_held(dir) {
            return;
        }
        self.held.set(dir, true);
        self.send_move(dir, now, sink);
    }

    pub fn key_up(&mut self, dir: Facing, sink: &mut impl CommandSink) {
        if !self.held.is_held(dir) {
            return;
        }
        self.held.set(dir, false);
        if !self.held.any() && sink.can_send() {
            sink.submit(ClientCommand::Stop);
        }
    }

    /// Drop every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self, sink: &mut impl CommandSink) {
        if !self.held.any() {
            return;
        }
        self.held.clear();
        if sink.can_send() {
            sink.submit(ClientCommand::Stop);
        }
    }

    /// Periodic re-affirmation, called once per frame. Sends stay on the
    /// `move_interval` grid instead of drifting by a frame each time.
    pub fn tick(&mut self, now: f64, sink: &mut impl CommandSink) {
        let Some(dir) = self.held.dominant() else { return };
        let slot = match self.last_move_time {
            Some(last) if now - last < self.move_interval => return,
            // re-anchor after a stall rather than bursting to catch up
            Some(last) if now - last < 2.0 * self.move_interval => last + self.move_interval,
            _ => now,
        };
        self.send_move(dir, slot, sink);
    }

    /// Click-to-move; `screen` is relative to the canvas.
    pub fn click(&self, screen_x: f64, screen_y: f64, offset: ViewportOffset, sink: &mut impl CommandSink) {
        if !sink.can_send() {
            return;
        }
        let (wx, wy) = offset.screen_to_world(screen_x, screen_y);
        sink.submit(ClientCommand::MoveTo {
            x: wx.round() as i64,
            y: wy.round() as i64,
        });
    }
}
