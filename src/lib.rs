pub mod client;
pub mod codec;
pub mod config;
pub mod debounce;
pub mod error;
pub mod logger;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod session;

pub use client::{CostEstimator, GenerationClient, ImageGenerator};
pub use codec::PixelCodec;
pub use config::{ClientConfig, Config, EstimatorConfig};
pub use debounce::{DebounceToken, Debouncer};
pub use error::{Result, RetroError};
pub use media::{
    AuthorizationProvider, AuthorizationStatus, CapabilityScope, DirectoryMediaStore, MediaStore,
    PermissionedSaver, SaveError, SaveOutcome, StaticAuthorization, WriteFailure,
};
pub use models::{
    CostEstimate, EncodedPayload, GenerationParameters, GenerationResult, ModelStyle, RawImage,
};
pub use orchestrator::{CostEstimationOrchestrator, EstimateState};
pub use session::GenerationSession;
