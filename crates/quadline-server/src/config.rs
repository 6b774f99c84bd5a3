//! Server configuration, overridable from the environment.

/// Runtime configuration for a Quadline server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Display name of the single lobby this server hosts.
    pub lobby_name: String,
    /// Maximum members per room; a room auto-starts when it fills.
    pub room_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            lobby_name: "FourPlayerThreeInARow".to_string(),
            room_capacity: 4,
        }
    }
}

impl Config {
    /// Builds a config from `QUADLINE_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("QUADLINE_BIND")
                .unwrap_or(defaults.bind_addr),
            lobby_name: std::env::var("QUADLINE_LOBBY_NAME")
                .unwrap_or(defaults.lobby_name),
            room_capacity: std::env::var("QUADLINE_ROOM_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.room_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3001");
        assert_eq!(config.lobby_name, "FourPlayerThreeInARow");
        assert_eq!(config.room_capacity, 4);
    }
}
