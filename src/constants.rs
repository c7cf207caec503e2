// World constants (must match server)
pub const WORLD_W: f64 = 2048.0;
pub const WORLD_H: f64 = 2048.0;

// Rendering
pub const SPRITE_HEIGHT: f64 = 64.0; // display height, width follows the bitmap's aspect ratio
pub const CULL_MARGIN: f64 = 50.0; // px around the canvas before a player is skipped
pub const LABEL_OFFSET: f64 = 8.0; // gap between sprite top and username baseline
pub const LABEL_FONT: &str = "bold 12px monospace";
pub const LABEL_FILL: &str = "#ffffff";
pub const LABEL_OUTLINE: &str = "#000000";
pub const LABEL_OUTLINE_WIDTH: f64 = 3.0;
pub const BACKDROP_URL: &str = "assets/world.png";
pub const CLEAR_COLOR: &str = "#000000";

// Network
pub const MOVE_INTERVAL_MS: f64 = 100.0;
pub const RECONNECT_DELAY: u32 = 2000; // ms
pub const WS_PATH: &str = "/ws";

// Player defaults
pub const DEFAULT_USERNAME: &str = "Guest";
pub const MAX_USERNAME_LEN: usize = 16;
