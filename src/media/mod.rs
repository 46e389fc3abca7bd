pub mod directory;
pub mod saver;
pub mod traits;

pub use directory::{DirectoryMediaStore, StaticAuthorization};
pub use saver::{PermissionedSaver, SaveError, SaveOutcome};
pub use traits::{
    AuthorizationProvider, AuthorizationStatus, CapabilityScope, MediaStore, WriteFailure,
};
