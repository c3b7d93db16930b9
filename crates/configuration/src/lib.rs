use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError as Error;
pub use settings::{
    BenchmarkSettings, ClassificationThresholds, Config, ElasticityParams, ScoringWeights,
};

/// Loads the application configuration from the `config.toml` file.
///
/// Every section defaults to the shipped business constants, so a missing
/// file is not an error: callers get a fully usable `Config::default()`.
/// A present-but-invalid file is still rejected loudly.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml").required(false))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;

    Ok(config)
}
