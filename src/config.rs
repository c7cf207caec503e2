use crate::constants::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub username: String,
    pub server_url: String,
    pub world_w: f64,
    pub world_h: f64,
    pub move_interval_ms: f64,
    pub reconnect_delay_ms: u32,
    pub backdrop_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            server_url: format!("ws://localhost{}", WS_PATH),
            world_w: WORLD_W,
            world_h: WORLD_H,
            move_interval_ms: MOVE_INTERVAL_MS,
            reconnect_delay_ms: RECONNECT_DELAY,
            backdrop_url: BACKDROP_URL.to_string(),
        }
    }
}

/// Trim and cap a requested username, falling back to the default.
pub fn sanitize_username(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_USERNAME_LEN).collect();
    if name.is_empty() {
        DEFAULT_USERNAME.to_string()
    } else {
        name
    }
}

/// WebSocket endpoint on the page's own host.
pub fn socket_url(page_protocol: &str, host: &str) -> String {
    let ws_proto = if page_protocol == "https:" { "wss:" } else { "ws:" };
    format!("{}//{}{}", ws_proto, host, WS_PATH)
}

impl ClientConfig {
    /// Build from page location parts and the `name` / `server` query parameters.
    pub fn from_page(page_protocol: &str, host: &str, name: Option<String>, server: Option<String>) -> Self {
        Self {
            username: sanitize_username(name.as_deref().unwrap_or("")),
            server_url: server
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| socket_url(page_protocol, host)),
            ..Self::default()
        }
    }

    pub fn from_window() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let location = window.location();
        let protocol = location.protocol().unwrap_or_default();
        let host = location.host().unwrap_or_default();
        let search = location.search().unwrap_or_default();
        let params = web_sys::UrlSearchParams::new_with_str(&search).ok();
        let name = params.as_ref().and_then(|p| p.get("name"));
        let server = params.as_ref().and_then(|p| p.get("server"));
        Self::from_page(&protocol, &host, name, server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_trimmed_and_capped() {
        assert_eq!(sanitize_username("  ann  "), "ann");
        assert_eq!(sanitize_username(""), DEFAULT_USERNAME);
        assert_eq!(sanitize_username("   "), DEFAULT_USERNAME);
        assert_eq!(sanitize_username("abcdefghijklmnopqrstuvwxyz").chars().count(), MAX_USERNAME_LEN);
    }

    #[test]
    fn socket_url_follows_page_protocol() {
        assert_eq!(socket_url("https:", "example.com"), "wss://example.com/ws");
        assert_eq!(socket_url("http:", "localhost:8080"), "ws://localhost:8080/ws");
    }

    #[test]
    fn explicit_server_overrides_page_host() {
        let cfg = ClientConfig::from_page("http:", "a.test", Some("bob".into()), Some("ws://b.test/game".into()));
        assert_eq!(cfg.username, "bob");
        assert_eq!(cfg.server_url, "ws://b.test/game");
        assert_eq!(cfg.move_interval_ms, MOVE_INTERVAL_MS);

        let cfg = ClientConfig::from_page("https:", "a.test", None, Some(" ".into()));
        assert_eq!(cfg.username, DEFAULT_USERNAME);
        assert_eq!(cfg.server_url, "wss://a.test/ws");
    }
}
