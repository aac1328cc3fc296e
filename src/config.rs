use std::env;

use log::warn;

use crate::error::{Error, Result};

pub const VIRTUAL_NODES_ENV: &str = "CRUSTYRING_VIRTUAL_NODES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Ring positions per physical server.
    pub virtual_node_count: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        RingConfig {
            virtual_node_count: 1,
        }
    }
}

impl RingConfig {
    pub fn new(virtual_node_count: usize) -> Self {
        RingConfig { virtual_node_count }
    }

    /// Reads `CRUSTYRING_VIRTUAL_NODES`, falling back to the default when unset.
    pub fn from_env() -> Result<Self> {
        match env::var(VIRTUAL_NODES_ENV) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                let config = RingConfig::default();
                warn!(
                    "{} not set, using {} virtual node(s) per server",
                    VIRTUAL_NODES_ENV, config.virtual_node_count
                );
                Ok(config)
            }
        }
    }

    fn parse(value: &str) -> Result<Self> {
        let virtual_node_count = value.trim().parse::<usize>().map_err(|err| {
            Error::Parse(format!("{}={:?}: {}", VIRTUAL_NODES_ENV, value, err))
        })?;
        Ok(RingConfig { virtual_node_count })
    }
}
