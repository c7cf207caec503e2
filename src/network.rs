use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, HtmlImageElement, MessageEvent, WebSocket};
use leptos::prelude::{RwSignal, Set};
use crate::client::Client;
use crate::config::ClientConfig;
use crate::connection::{ConnectionState, Transport};
use crate::error::TransportError;
use crate::sprites;

pub type GameClient = Client<WsTransport, HtmlImageElement>;
pub type SharedClient = Rc<RefCell<GameClient>>;
pub type WeakClient = Weak<RefCell<GameClient>>;

/// UI signals mirrored from the client after every socket event.
#[derive(Clone, Copy)]
pub struct StatusSignals {
    pub state: RwSignal<ConnectionState>,
    pub join_error: RwSignal<Option<String>>,
}

#[derive(Clone)]
struct SocketHooks {
    client: WeakClient,
    status: StatusSignals,
}

pub struct WsTransport {
    ws: Option<WebSocket>,
    hooks: SocketHooks,
    // Store closures to prevent them from being dropped
    _on_open: Option<Closure<dyn FnMut()>>,
    _on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
    _on_close: Option<Closure<dyn FnMut(CloseEvent)>>,
    _on_error: Option<Closure<dyn FnMut(Event)>>,
}

impl WsTransport {
    fn new(client: WeakClient, status: StatusSignals) -> Self {
        Self {
            ws: None,
            hooks: SocketHooks { client, status },
            _on_open: None,
            _on_message: None,
            _on_close: None,
            _on_error: None,
        }
    }

    fn detach(&mut self) {
        if let Some(old) = self.ws.take() {
            old.set_onopen(None);
            old.set_onmessage(None);
            old.set_onclose(None);
            old.set_onerror(None);
        }
    }
}

impl Transport for WsTransport {
    fn open(&mut self, url: &str) -> Result<(), TransportError> {
        self.detach();
        let ws = WebSocket::new(url).map_err(|e| TransportError::Open {
            url: url.to_string(),
            reason: format!("{:?}", e),
        })?;

        let hooks = self.hooks.clone();
        let on_open = Closure::wrap(Box::new(move || {
            dispatch(&hooks, |c| c.handle_open());
        }) as Box<dyn FnMut()>);

        let hooks = self.hooks.clone();
        let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
            match e.data().as_string() {
                Some(text) => {
                    dispatch(&hooks, |c| c.handle_text(&text));
                }
                None => log::debug!("non-text frame ignored"),
            }
        }) as Box<dyn FnMut(MessageEvent)>);

        let hooks = self.hooks.clone();
        let on_close = Closure::wrap(Box::new(move |_: CloseEvent| {
            if let Some(Some(delay)) = dispatch(&hooks, |c| c.handle_close()) {
                schedule_reconnect(hooks.clone(), delay);
            }
        }) as Box<dyn FnMut(CloseEvent)>);

        let hooks = self.hooks.clone();
        // browsers hand WebSocket errors over as a bare Event with no detail
        let on_error = Closure::wrap(Box::new(move |e: Event| {
            let reason = format!("{} event", e.type_());
            if let Some(Some(delay)) = dispatch(&hooks, |c| c.handle_error(&reason)) {
                schedule_reconnect(hooks.clone(), delay);
            }
        }) as Box<dyn FnMut(Event)>);

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        self.ws = Some(ws);
        self._on_open = Some(on_open);
        self._on_message = Some(on_message);
        self._on_close = Some(on_close);
        self._on_error = Some(on_error);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.ws
            .as_ref()
            .map_or(false, |ws| ws.ready_state() == WebSocket::OPEN)
    }

    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        let Some(ws) = &self.ws else {
            return Err(TransportError::Send("no socket".into()));
        };
        ws.send_with_str(text)
            .map_err(|e| TransportError::Send(format!("{:?}", e)))
    }
}

/// Run `f` against the client, then publish status and start any decodes it queued.
/// Returns None once the client has been dropped.
fn dispatch<R>(hooks: &SocketHooks, f: impl FnOnce(&mut GameClient) -> R) -> Option<R> {
    let client = hooks.client.upgrade()?;
    let out = f(&mut client.borrow_mut());
    settle(&client, hooks.status);
    Some(out)
}

fn settle(client: &SharedClient, status: StatusSignals) {
    let (state, join_error, requests) = {
        let mut c = client.borrow_mut();
        (c.connection_state(), c.join_error().map(str::to_string), c.drain_load_requests())
    };
    status.state.set(state);
    status.join_error.set(join_error);
    sprites::decode_all(&Rc::downgrade(client), requests);
}

fn schedule_reconnect(hooks: SocketHooks, delay: u32) {
    log::info!("reconnecting in {}ms", delay);
    gloo_timers::callback::Timeout::new(delay, move || {
        if let Some(Some(next)) = dispatch(&hooks, |c| c.reconnect()) {
            schedule_reconnect(hooks.clone(), next);
        }
    })
    .forget();
}

pub fn new_shared_client(config: ClientConfig, status: StatusSignals) -> SharedClient {
    Rc::new_cyclic(|weak: &WeakClient| {
        RefCell::new(Client::new(config, WsTransport::new(weak.clone(), status)))
    })
}

/// Kick off the backdrop load and the first connection attempt.
pub fn start(client: &SharedClient, status: StatusSignals) {
    let hooks = SocketHooks { client: Rc::downgrade(client), status };
    if let Some(Some(delay)) = dispatch(&hooks, |c| c.start()) {
        schedule_reconnect(hooks, delay);
    }
}
