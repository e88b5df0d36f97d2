// Public modules
pub mod credential;
pub mod error;
pub mod keychain;
pub mod notifier;
pub mod registry;
pub mod release;
pub mod server;
pub mod settings;

// Internal modules - not part of public API
pub(crate) mod local_files;
pub(crate) mod paths;

// Re-export common types for convenience
pub use credential::{Credential, Secret};
pub use error::{Error, ErrorCode, Result};
pub use notifier::{Notifier, NotifyOutcome};
pub use registry::{CredentialRegistry, RegistrySnapshot};
pub use release::{ReleaseOptions, ReleaseStatus, ReleaseTemplateView, ReleaseView};
pub use server::{ReleaseServer, ServerConnection, XlReleaseServer};
pub use settings::{JsonSettingsStore, Settings, SettingsStore};
