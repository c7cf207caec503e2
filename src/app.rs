use leptos::prelude::*;
use crate::canvas::{self, CANVAS_ID};
use crate::config::ClientConfig;
use crate::connection::ConnectionState;
use crate::game_loop;
use crate::input;
use crate::network::{self, StatusSignals};

#[component]
pub fn App() -> impl IntoView {
    let config = ClientConfig::from_window();
    log::info!("starting as {} against {}", config.username, config.server_url);

    let status = StatusSignals {
        state: RwSignal::new(ConnectionState::Disconnected),
        join_error: RwSignal::new(None::<String>),
    };
    let client = network::new_shared_client(config, status);

    // Wire the canvas once mounted
    let client_for_mount = send_wrapper::SendWrapper::new(client);
    Effect::new(move |_| {
        let client = (*client_for_mount).clone();

        let Some(canvas_el) = canvas::get_canvas(CANVAS_ID) else {
            log::error!("#{} missing, client not started", CANVAS_ID);
            return;
        };
        let Some(ctx) = canvas::get_canvas_context(CANVAS_ID) else {
            log::error!("2d context unavailable, client not started");
            return;
        };

        canvas::resize(&client);
        canvas::setup_resize_handler(client.clone());
        input::setup_input(client.clone(), &canvas_el);
        game_loop::start_game_loop(client.clone(), ctx);
        network::start(&client, status);
    });

    view! {
        <canvas id=CANVAS_ID></canvas>
        <ConnectionStatus status=status />
    }
}

#[component]
fn ConnectionStatus(status: StatusSignals) -> impl IntoView {
    let class = move || match status.state.get() {
        ConnectionState::Joined => "status online",
        ConnectionState::Disconnected => "status offline",
        _ => "status pending",
    };
    let text = move || match status.join_error.get() {
        Some(reason) => format!("Join rejected: {}", reason),
        None => status.state.get().label().to_string(),
    };

    view! {
        <div id="connectionStatus" class=class>{text}</div>
    }
}
