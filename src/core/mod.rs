pub mod config;
pub mod error;
pub mod state;

pub use config::BioGraphConfig;
pub use error::{BioGraphError, Result};
pub use state::AppState;
