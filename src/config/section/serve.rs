//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port number
//! ws_port = 35729             # Live reload WebSocket port
//! ```
//!
//! Both ports are starting points: when one is taken the next free port is
//! used instead.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Live reload WebSocket port.
    pub ws_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
        }
    }
}

impl ServeConfig {
    /// Host part of URLs printed for the user.
    pub fn display_host(&self) -> String {
        if self.interface.is_unspecified() || self.interface.is_loopback() {
            "localhost".to_string()
        } else {
            self.interface.to_string()
        }
    }

    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.port == self.ws_port {
            errors.push(format!(
                "[serve].port and [serve].ws_port must differ (both are {})",
                self.port
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config =
            test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nws_port = 9000");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 9000);
        assert_eq!(config.serve.display_host(), "localhost");
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.ws_port, 35729);
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_serve_config_lan_host() {
        let config = test_parse_config("[serve]\ninterface = \"192.168.1.20\"");
        assert_eq!(config.serve.display_host(), "192.168.1.20");
    }

    #[test]
    fn test_same_ports_rejected() {
        let config = test_parse_config("[serve]\nport = 4000\nws_port = 4000");
        let mut errors = Vec::new();
        config.serve.validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must differ"));
    }
}
