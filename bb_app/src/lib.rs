use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

/// Optional configuration file, read from the working directory.
pub const CONFIG_FILE: &str = "beatbuddy.toml";

pub trait ContextProvider<Config> {
    fn new(config: Config) -> impl Future<Output = Self>;
}

/// Initialize the application context with configuration from the
/// optional config file and environment variables.
/// The configuration is extracted using figment.
///
/// # Returns
/// The application context with the configuration as specified by the trait.
///
/// # Errors
/// If the configuration cannot be extracted from the config file or the
/// environment variables.
///
pub async fn create_app_context<A, Config>() -> Result<A, figment::Error>
where
    A: ContextProvider<Config>,
    Config: DeserializeOwned,
{
    init_tracing();

    let config: Config = load_config().inspect_err(|e| {
        tracing::error!("failed to load configuration: {e}");
    })?;

    let context = A::new(config).await;

    Ok(context)
}

/// Extracts the configuration. Environment variables win over the values in
/// [`CONFIG_FILE`].
///
/// # Errors
/// If a value is missing or cannot be parsed into the expected type.
pub fn load_config<Config: DeserializeOwned>()
-> Result<Config, figment::Error> {
    let figment = Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::raw());

    figment.extract()
}

/// Installs the global tracing subscriber.
///
/// The log level comes from `RUST_LOG` and falls back to `info`. Setting
/// `LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            // this needs to be set to remove duplicated information in the log.
            .with_current_span(false)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
