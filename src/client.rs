//! Client core: routes connection events into the world mirror and camera,
//! keyboard and pointer input into commands, and draws on request.
//!
//! Every entry point runs to completion on the single browser thread, so the
//! renderer always observes a fully applied world.

use crate::assets::{AssetCache, AssetTarget, Bitmap, LoadRequest};
use crate::camera::Camera;
use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionState, InboundEvent, Transport};
use crate::controls::{direction_for_key, InputController};
use crate::error::AssetError;
use crate::renderer::{self, Surface};
use crate::state::WorldState;

pub struct Client<T: Transport, B: Bitmap> {
    config: ClientConfig,
    connection: ConnectionManager<T>,
    world: WorldState,
    camera: Camera,
    input: InputController,
    assets: AssetCache<B>,
    redraw: bool,
    join_error: Option<String>,
}

impl<T: Transport, B: Bitmap> Client<T, B> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let connection = ConnectionManager::new(
            transport,
            config.server_url.clone(),
            config.username.clone(),
            config.reconnect_delay_ms,
        );
        Self {
            camera: Camera::new(config.world_w, config.world_h),
            input: InputController::new(config.move_interval_ms),
            connection,
            world: WorldState::new(),
            assets: AssetCache::new(),
            redraw: true,
            join_error: None,
            config,
        }
    }

    #[cfg(test)]
    pub(crate) fn world(&self) -> &WorldState {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn camera(&self) -> &Camera {
        &self.camera
    }

    #[cfg(test)]
    pub(crate) fn assets(&self) -> &AssetCache<B> {
        &self.assets
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn join_error(&self) -> Option<&str> {
        self.join_error.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn redraw_requested(&self) -> bool {
        self.redraw
    }

    /// Queue the backdrop and open the connection. Returns a reconnect delay
    /// when the first attempt failed outright.
    pub fn start(&mut self) -> Option<u32> {
        self.assets.request_backdrop(&self.config.backdrop_url);
        self.connection.connect()
    }

    pub fn reconnect(&mut self) -> Option<u32> {
        self.connection.reconnect()
    }

    pub fn handle_open(&mut self) {
        self.join_error = None;
        self.connection.handle_open();
    }

    pub fn handle_close(&mut self) -> Option<u32> {
        let delay = self.connection.handle_close();
        // held keys do not carry over into the next session
        self.input.release_all(&mut self.connection);
        delay
    }

    pub fn handle_error(&mut self, reason: &str) -> Option<u32> {
        let delay = self.connection.handle_error(reason);
        self.input.release_all(&mut self.connection);
        delay
    }

    pub fn handle_text(&mut self, text: &str) {
        if let Some(event) = self.connection.handle_text(text) {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Joined(accepted) => {
                self.world
                    .apply_join_ack(accepted.player_id, accepted.players, accepted.avatars);
                for avatar in self.world.avatars() {
                    self.assets.ensure_loaded(avatar);
                }
                self.recenter();
            }
            InboundEvent::JoinRejected(reason) => {
                self.join_error = Some(reason);
            }
            InboundEvent::PlayersMoved(patches) => {
                self.world.apply_players_moved(&patches);
                let me_moved = self.world.my_id().map_or(false, |id| patches.contains_key(id));
                if me_moved {
                    self.recenter();
                }
            }
            InboundEvent::PlayerJoined { player, avatar } => {
                let is_me = self.world.my_id() == Some(player.id.as_str());
                self.assets.ensure_loaded(&avatar);
                self.world.apply_player_joined(player, avatar);
                if is_me {
                    self.recenter();
                }
            }
            InboundEvent::PlayerLeft(id) => {
                if !self.world.apply_player_left(&id) {
                    return;
                }
            }
        }
        self.redraw = true;
    }

    fn recenter(&mut self) {
        if let Some(me) = self.world.me() {
            self.camera.follow(me.x, me.y);
        }
    }

    pub fn resize(&mut self, canvas_w: f64, canvas_h: f64) {
        self.camera.resize(canvas_w, canvas_h);
        self.redraw = true;
    }

    /// Returns true when the key is a movement key.
    pub fn key_down(&mut self, key: &str, now: f64) -> bool {
        let Some(dir) = direction_for_key(key) else { return false };
        self.input.key_down(dir, now, &mut self.connection);
        true
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        let Some(dir) = direction_for_key(key) else { return false };
        self.input.key_up(dir, &mut self.connection);
        true
    }

    pub fn blur(&mut self) {
        self.input.release_all(&mut self.connection);
    }

    /// Pointer click at canvas-relative coordinates.
    pub fn click(&mut self, screen_x: f64, screen_y: f64) {
        self.input.click(screen_x, screen_y, self.camera.offset(), &mut self.connection);
    }

    pub fn drain_load_requests(&mut self) -> Vec<LoadRequest> {
        self.assets.drain_requests()
    }

    pub fn asset_loaded(&mut self, target: &AssetTarget, generation: u64, result: Result<B, AssetError>) {
        if self.assets.complete(target, generation, result) {
            self.redraw = true;
        }
    }

    /// One frame: movement re-affirmation, then a redraw if anything changed.
    pub fn tick<S: Surface<Image = B>>(&mut self, now: f64, surface: &mut S) -> bool {
        self.input.tick(now, &mut self.connection);
        if !self.redraw {
            return false;
        }
        renderer::render(surface, &self.world, &self.camera, &self.assets);
        self.redraw = false;
        true
    }
}
