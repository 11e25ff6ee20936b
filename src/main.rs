use clap::Parser;
use log::LevelFilter;
use snark_proxy::config::{
    ConfigValidator, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TOKEN_LIMIT,
    PolicyConfig, ProxyConfig,
};
use snark_proxy::handler::ChatProxy;
use snark_proxy::logging::init_logging;
use snark_proxy::server::startup;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "snark-proxy")]
#[command(about = "Sarcastic chat proxy - moderates and streams chat completions")]
struct CliArgs {
    /// Host address to bind the server
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// API key for the moderation and completion endpoints
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Model used for completions and token counting
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature for completions
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f64,

    /// Requests reaching this many tokens (persona included) are rejected
    #[arg(long, default_value_t = DEFAULT_TOKEN_LIMIT)]
    token_limit: usize,

    /// Upper bound in seconds for a whole upstream request, streaming included
    #[arg(long, default_value_t = 600)]
    request_timeout_secs: u64,

    /// Timeout in seconds for connecting to the upstream API
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: String,
}

impl CliArgs {
    fn to_proxy_config(&self) -> ProxyConfig {
        let log_level = self.log_level.parse().unwrap_or(LevelFilter::Info);
        ProxyConfig {
            host: self.host.clone(),
            port: self.port,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            policy: PolicyConfig {
                model: self.model.clone(),
                temperature: self.temperature,
                token_limit: self.token_limit,
            },
            request_timeout_secs: self.request_timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
            log_level,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = args.to_proxy_config();
    init_logging(config.log_level);

    ConfigValidator::validate(&config)?;
    if config.api_key().is_none() {
        log::warn!("OPENAI_API_KEY is not set; every chat request will fail");
    }
    log::debug!("Configuration: {:?}", config);

    let proxy = ChatProxy::from_config(&config)?;

    actix_web::rt::System::new().block_on(async move {
        tokio::select! {
            res = startup(config, proxy) => res.map_err(anyhow::Error::from),
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    })
}
