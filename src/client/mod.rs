pub mod generation_client;
pub mod traits;

pub use generation_client::GenerationClient;
pub use traits::{CostEstimator, ImageGenerator};
