pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod persona;
pub mod protocol;
pub mod server;
pub mod tokenizer;
pub mod upstream;

pub use config::{ConfigError, ConfigValidator, PolicyConfig, ProxyConfig};
pub use error::ProxyError;
pub use handler::ChatProxy;
