//! Image generation drivers.

mod black_forest;

pub use black_forest::{
    payload, validate_dimension, validate_range, AspectRatio, BlackForestDriver,
    BlackForestDriverBuilder, DriverConfig, FluxModel, FluxPayload, ModelCapabilities,
    PayloadRequest, VariationInput, API_KEY_ENV,
};
