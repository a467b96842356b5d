//! Production build: chunk planning.
//!
//! # Data Flow
//! ```text
//! module graph JSON
//!     → graph.rs (parse, check imports, index)
//!     → chunks.rs (manualChunks + default split)
//!     → manifest.rs (file names, sourcemap/minify settings)
//!     → {outDir}/chunk-manifest.json
//! ```
//!
//! # Design Decisions
//! - Assignment is a pure function of (config, graph)
//! - A configured module missing from the graph fails the build

pub mod chunks;
pub mod graph;
pub mod manifest;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use chunks::{Chunk, ChunkGroup, ChunkKind, ChunkMap, ChunkPlan};
pub use graph::{Module, ModuleGraph};
pub use manifest::{ChunkManifest, ManifestChunk, MANIFEST_FILE};

use crate::config::DevConfig;
use crate::observability::metrics;

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("chunk {chunk:?} lists module {module:?}, which is not in the dependency graph")]
    UnresolvedModule { chunk: String, module: String },

    #[error("module identifier {identifier:?} matches several modules: {}", .candidates.join(", "))]
    AmbiguousModule {
        identifier: String,
        candidates: Vec<String>,
    },

    #[error("module {module:?} is assigned to both {first:?} and {second:?}")]
    ConflictingAssignment {
        module: String,
        first: String,
        second: String,
    },

    #[error("module {module:?} imports unknown module {import:?}")]
    UnknownImport { module: String, import: String },

    #[error("module {0:?} appears more than once in the graph")]
    DuplicateModule(String),

    #[error("dependency graph has no entry module")]
    NoEntry,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Assign every module of `graph` and describe the resulting files.
pub fn plan_build(config: &DevConfig, graph: &ModuleGraph) -> Result<ChunkManifest, BuildError> {
    let map = ChunkMap::from_config(&config.build);
    let plan = map.assign(graph)?;

    for chunk in &plan.chunks {
        tracing::debug!(chunk = %chunk.name, kind = ?chunk.kind, modules = chunk.modules.len(), "Chunk planned");
    }
    if !plan.unreachable.is_empty() {
        tracing::info!(count = plan.unreachable.len(), "Modules unreachable from any entry were dropped");
    }

    Ok(ChunkManifest::new(&config.build, &plan))
}

/// Load the graph, plan the chunks and write the manifest.
///
/// `out_dir` overrides `build.outDir`.
pub fn run_build(
    config: &DevConfig,
    graph_path: &Path,
    out_dir: Option<&Path>,
) -> Result<PathBuf, BuildError> {
    let graph = ModuleGraph::load(graph_path)?;
    tracing::info!(path = %graph_path.display(), modules = graph.len(), "Module graph loaded");

    let manifest = plan_build(config, &graph)?;
    metrics::record_chunks_emitted(manifest.chunks.len());

    let out_dir = out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.build.out_dir));
    let path = manifest.write(&out_dir)?;

    tracing::info!(path = %path.display(), chunks = manifest.chunks.len(), "Chunk manifest written");
    Ok(path)
}
