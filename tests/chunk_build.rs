//! Production build: chunk manifest from a module graph file.

use std::fs;

use devproxy::bundle::{self, BuildError, ChunkKind, ChunkManifest, MANIFEST_FILE};
use devproxy::config::{parse_config, DevConfig};

const GRAPH: &str = r#"{ "modules": [
    { "id": "src/main.ts", "isEntry": true,
      "imports": ["node_modules/vue/index.js", "node_modules/element-plus/index.js",
                  "node_modules/@element-plus/icons-vue/index.js", "src/App.vue"] },
    { "id": "src/App.vue", "imports": ["node_modules/vue/index.js", "node_modules/axios/index.js"] },
    { "id": "node_modules/vue/index.js", "specifier": "vue" },
    { "id": "node_modules/element-plus/index.js", "specifier": "element-plus",
      "imports": ["node_modules/vue/index.js"] },
    { "id": "node_modules/@element-plus/icons-vue/index.js", "specifier": "@element-plus/icons-vue",
      "imports": ["node_modules/vue/index.js"] },
    { "id": "node_modules/axios/index.js", "specifier": "axios" }
] }"#;

fn write_graph(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("graph.json");
    fs::write(&path, GRAPH).unwrap();
    path
}

#[test]
fn test_build_writes_vendor_and_icons_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_graph(dir.path());
    let out = dir.path().join("dist");

    let path = bundle::run_build(&DevConfig::default(), &graph, Some(&out)).unwrap();
    assert_eq!(path, out.join(MANIFEST_FILE));

    let manifest: ChunkManifest = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let vendor = manifest.chunks.iter().find(|c| c.name == "vendor").unwrap();
    assert_eq!(vendor.kind, ChunkKind::Manual);
    assert_eq!(vendor.file_name, "assets/vendor.js");
    assert!(vendor.modules.contains(&"node_modules/vue/index.js".to_string()));
    assert!(!vendor.modules.contains(&"src/main.ts".to_string()));
    assert!(!vendor.modules.iter().any(|m| m.starts_with("src/")));

    let icons = manifest.chunks.iter().find(|c| c.name == "icons").unwrap();
    assert_eq!(icons.modules, vec!["node_modules/@element-plus/icons-vue/index.js"]);

    let main = manifest.chunks.iter().find(|c| c.name == "main").unwrap();
    assert_eq!(main.kind, ChunkKind::Entry);
    assert_eq!(
        main.modules,
        vec!["src/main.ts", "src/App.vue", "node_modules/axios/index.js"]
    );
}

#[test]
fn test_rebuild_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_graph(dir.path());

    let first_out = dir.path().join("a");
    let second_out = dir.path().join("b");
    let first = bundle::run_build(&DevConfig::default(), &graph, Some(&first_out)).unwrap();
    let second = bundle::run_build(&DevConfig::default(), &graph, Some(&second_out)).unwrap();

    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn test_unresolved_manual_chunk_member_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write_graph(dir.path());
    let config = parse_config(
        r#"
        [build.rollupOptions.output.manualChunks]
        vendor = ["vue", "pinia"]
        "#,
    )
    .unwrap();

    let out = dir.path().join("dist");
    let err = bundle::run_build(&config, &graph, Some(&out)).unwrap_err();
    assert!(matches!(
        err,
        BuildError::UnresolvedModule { ref chunk, ref module } if chunk == "vendor" && module == "pinia"
    ));
    assert!(err.to_string().contains("pinia"));
    assert!(!out.join(MANIFEST_FILE).exists());
}

#[test]
fn test_malformed_graph_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    let graph = dir.path().join("graph.json");
    fs::write(&graph, "{ \"modules\": [").unwrap();

    let err = bundle::run_build(&DevConfig::default(), &graph, Some(dir.path())).unwrap_err();
    assert!(matches!(err, BuildError::Json(_)));

    let missing = dir.path().join("missing.json");
    let err = bundle::run_build(&DevConfig::default(), &missing, Some(dir.path())).unwrap_err();
    assert!(matches!(err, BuildError::Io(_)));
}
