pub mod linker;
pub mod live;
pub mod local;

use thiserror::Error;

pub use linker::{DiseaseHit, DiseaseLinker, KeywordDiseaseLinker};
pub use live::LiveGraphBuilder;
pub use local::{Direction, LocalGraph};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph file parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}
