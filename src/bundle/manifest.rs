//! Chunk manifest emitted by the build.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bundle::chunks::{ChunkKind, ChunkPlan};
use crate::bundle::BuildError;
use crate::config::{BuildOptions, MinifyEngine};

/// File name of the manifest inside `outDir`.
pub const MANIFEST_FILE: &str = "chunk-manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkManifest {
    pub out_dir: String,
    pub assets_dir: String,
    pub sourcemap: bool,
    pub minify: Option<MinifyEngine>,
    pub chunks: Vec<ManifestChunk>,
    pub unreachable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestChunk {
    pub name: String,
    pub kind: ChunkKind,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_file: Option<String>,
    pub modules: Vec<String>,
}

impl ChunkManifest {
    pub fn new(build: &BuildOptions, plan: &ChunkPlan) -> Self {
        let chunks = plan
            .chunks
            .iter()
            .map(|chunk| {
                let file_name = chunk_file_name(&build.assets_dir, &chunk.name);
                let map_file = build.sourcemap.then(|| format!("{file_name}.map"));
                ManifestChunk {
                    name: chunk.name.clone(),
                    kind: chunk.kind,
                    file_name,
                    map_file,
                    modules: chunk.modules.clone(),
                }
            })
            .collect();

        Self {
            out_dir: build.out_dir.clone(),
            assets_dir: build.assets_dir.clone(),
            sourcemap: build.sourcemap,
            minify: build.minify.engine(),
            chunks,
            unreachable: plan.unreachable.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the manifest into `out_dir`, creating it if needed.
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf, BuildError> {
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(MANIFEST_FILE);
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(&path, json)?;
        Ok(path)
    }
}

/// `assets/vendor.js`, or `vendor.js` when `assets_dir` is empty.
pub fn chunk_file_name(assets_dir: &str, name: &str) -> String {
    let dir = assets_dir.trim_matches('/');
    if dir.is_empty() || dir == "." {
        format!("{name}.js")
    } else {
        format!("{dir}/{name}.js")
    }
}
