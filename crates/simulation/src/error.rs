use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Product-scoped scenarios require a target_variant_id")]
    MissingTarget,

    #[error("is_killed only applies to product-scoped scenarios with a target")]
    KillRequiresTarget,

    #[error("Target variant {0} is not part of the simulation input")]
    UnknownTarget(String),
}
