mod app;
mod assets;
mod camera;
mod canvas;
mod client;
mod config;
mod connection;
mod constants;
mod controls;
mod error;
mod game_loop;
mod input;
mod network;
mod protocol;
mod renderer;
mod sprites;
mod state;

fn main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    leptos::mount::mount_to_body(app::App);
}
