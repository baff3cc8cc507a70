use log::warn;
use std::env;
use std::net::SocketAddr;

const BIND_VAR: &str = "FILMCLUB_BIND";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_bind(env::var(BIND_VAR).ok().as_deref())
    }

    fn from_bind(bind: Option<&str>) -> Self {
        let mut config = Config::default();
        if let Some(value) = bind {
            match value.parse() {
                Ok(addr) => config.bind = addr,
                Err(err) => warn!(
                    "Ignoring {}={:?} ({}), using {}",
                    BIND_VAR, value, err, config.bind
                ),
            }
        }
        config
    }
}
