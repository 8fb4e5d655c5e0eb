//! Project discovery subsystem.
//!
//! # Data Flow
//! ```text
//! --applicationpath, --outdir
//!     → layout.rs (pilet dir, dist dir, manifests)
//!     → resolver.rs (pilet.json / package.json → PiralInstance)
//!     → app shell dir (node_modules/<instance>/app)
//! ```
//!
//! Runs exactly once at startup. Any failure here is fatal.

pub mod layout;
pub mod resolver;

pub use layout::ProjectLayout;
pub use resolver::{find_piral_instance, website_emulator_files};

/// The app shell the pilet is debugged against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiralInstance {
    pub name: String,
    /// The shell is an emulated website whose assets come through the feed.
    pub is_website: bool,
}

impl PiralInstance {
    pub fn new(name: impl Into<String>, is_website: bool) -> Self {
        Self {
            name: name.into(),
            is_website,
        }
    }
}

impl std::fmt::Display for PiralInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (website: {})", self.name, self.is_website)
    }
}

/// Error type for instance resolution.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("No Piral instance has been found. Cannot start the server.")]
    NotFound,
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
