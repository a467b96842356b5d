//! Chunk assignment.
//!
//! Modules named in `manualChunks` go to their group. Modules reachable only
//! through a group's members follow them into that group. Everything else is
//! split by which entries reach it: one entry means that entry's chunk,
//! several entries mean a shared chunk.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bundle::graph::ModuleGraph;
use crate::bundle::BuildError;
use crate::config::BuildOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Declared in `manualChunks`.
    Manual,
    /// Rooted at an application entry.
    Entry,
    /// Shared by several entries.
    Shared,
}

/// A named output bundle and the modules it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub name: String,
    pub kind: ChunkKind,
    pub modules: Vec<String>,
}

/// One `manualChunks` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkGroup {
    pub name: String,
    pub members: Vec<String>,
}

/// The configured grouping of modules into named chunks. Immutable.
#[derive(Debug, Clone, Default)]
pub struct ChunkMap {
    groups: Vec<ChunkGroup>,
}

/// Result of assigning every module of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    pub chunks: Vec<Chunk>,
    /// Modules no entry and no manual chunk reaches.
    pub unreachable: Vec<String>,
}

impl ChunkPlan {
    /// The chunk holding `module_id`, if any.
    pub fn chunk_of(&self, module_id: &str) -> Option<&Chunk> {
        self.chunks
            .iter()
            .find(|chunk| chunk.modules.iter().any(|m| m == module_id))
    }

    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.name == name)
    }
}

impl ChunkMap {
    pub fn new(groups: Vec<ChunkGroup>) -> Self {
        Self { groups }
    }

    pub fn from_config(build: &BuildOptions) -> Self {
        let groups = build
            .manual_chunks()
            .iter()
            .map(|(name, members)| ChunkGroup {
                name: name.clone(),
                members: members.clone(),
            })
            .collect();
        Self { groups }
    }

    /// Name of the group that lists `identifier`.
    pub fn group_of(&self, identifier: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|group| group.members.iter().any(|m| m == identifier))
            .map(|group| group.name.as_str())
    }

    /// Partition `graph` into chunks.
    pub fn assign(&self, graph: &ModuleGraph) -> Result<ChunkPlan, BuildError> {
        let n = graph.len();
        let mut owner: Vec<Option<usize>> = vec![None; n];
        let mut manual_modules: Vec<Vec<usize>> = vec![Vec::new(); self.groups.len()];

        // Listed members. A module belongs to the group listing its id or its specifier.
        for (gi, group) in self.groups.iter().enumerate() {
            for member in &group.members {
                let idx = graph
                    .resolve(member)?
                    .ok_or_else(|| BuildError::UnresolvedModule {
                        chunk: group.name.clone(),
                        module: member.clone(),
                    })?;
                let module = graph.module(idx);
                let other = std::iter::once(module.id.as_str())
                    .chain(module.specifier.as_deref())
                    .filter_map(|identifier| self.group_of(identifier))
                    .find(|&name| name != group.name);
                if let Some(other) = other {
                    return Err(BuildError::ConflictingAssignment {
                        module: module.id.clone(),
                        first: group.name.clone(),
                        second: other.to_string(),
                    });
                }
                if owner[idx].is_none() {
                    owner[idx] = Some(gi);
                    manual_modules[gi].push(idx);
                }
            }
        }

        // Which entries reach each module without crossing a manual chunk or another entry.
        let entries = graph.entries();
        let mut reached_by: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        let mut discovery: Vec<Vec<usize>> = Vec::with_capacity(entries.len());
        for (ei, &entry) in entries.iter().enumerate() {
            let order = graph.walk(entry, |idx| {
                owner[idx].is_some() || (graph.is_entry(idx) && idx != entry)
            });
            for &idx in &order {
                reached_by[idx].insert(ei);
            }
            discovery.push(order);
        }

        // Private dependencies follow their manual chunk.
        for gi in 0..self.groups.len() {
            let members = manual_modules[gi].clone();
            for member in members {
                let pulled = graph.walk(member, |idx| {
                    owner[idx].is_some() || graph.is_entry(idx) || !reached_by[idx].is_empty()
                });
                for idx in pulled {
                    if owner[idx].is_none() {
                        owner[idx] = Some(gi);
                        manual_modules[gi].push(idx);
                    }
                }
            }
        }

        let mut chunks = Vec::new();
        let mut taken: HashSet<String> = HashSet::new();

        for (gi, group) in self.groups.iter().enumerate() {
            taken.insert(group.name.clone());
            if manual_modules[gi].is_empty() {
                tracing::warn!(chunk = %group.name, "Manual chunk has no modules, skipping");
                continue;
            }
            chunks.push(Chunk {
                name: group.name.clone(),
                kind: ChunkKind::Manual,
                modules: ids(graph, &manual_modules[gi]),
            });
        }

        let entry_names: Vec<String> = entries
            .iter()
            .map(|&entry| unique_name(entry_stem(&graph.module(entry).id), &mut taken))
            .collect();

        let mut shared: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut placed = vec![false; n];
        for (ei, order) in discovery.iter().enumerate() {
            let mut own = Vec::new();
            for &idx in order {
                if owner[idx].is_some() || placed[idx] {
                    continue;
                }
                let reach = &reached_by[idx];
                if idx == entries[ei] || reach.len() == 1 {
                    own.push(idx);
                } else {
                    let name = reach
                        .iter()
                        .map(|&e| entry_names[e].as_str())
                        .collect::<BTreeSet<_>>()
                        .into_iter()
                        .collect::<Vec<_>>()
                        .join("~");
                    shared.entry(name).or_default().push(idx);
                }
                placed[idx] = true;
            }
            if !own.is_empty() {
                chunks.push(Chunk {
                    name: entry_names[ei].clone(),
                    kind: ChunkKind::Entry,
                    modules: ids(graph, &own),
                });
            }
        }

        for (name, modules) in shared {
            let name = unique_name(name, &mut taken);
            chunks.push(Chunk {
                name,
                kind: ChunkKind::Shared,
                modules: ids(graph, &modules),
            });
        }

        let unreachable = (0..n)
            .filter(|&idx| owner[idx].is_none() && !placed[idx])
            .map(|idx| graph.module(idx).id.clone())
            .collect();

        Ok(ChunkPlan { chunks, unreachable })
    }
}

fn ids(graph: &ModuleGraph, indices: &[usize]) -> Vec<String> {
    indices.iter().map(|&idx| graph.module(idx).id.clone()).collect()
}

/// `src/main.ts` → `main`.
fn entry_stem(id: &str) -> String {
    Path::new(id)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("entry")
        .to_string()
}

/// `base`, or `base-2`, `base-3`, ... if already taken.
fn unique_name(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::graph::Module;

    /// A small Vue application: one entry, the vendor libraries and the icon set.
    fn app_graph() -> ModuleGraph {
        ModuleGraph::new(vec![
            Module::entry("src/main.ts").importing([
                "node_modules/vue/index.js",
                "node_modules/element-plus/index.js",
                "node_modules/@element-plus/icons-vue/index.js",
                "src/App.vue",
            ]),
            Module::new("src/App.vue").importing([
                "node_modules/vue/index.js",
                "src/components/Upload.vue",
            ]),
            Module::new("src/components/Upload.vue")
                .importing(["node_modules/@element-plus/icons-vue/index.js"]),
            Module::new("node_modules/vue/index.js")
                .with_specifier("vue")
                .importing(["node_modules/@vue/runtime-dom/index.js"]),
            Module::new("node_modules/@vue/runtime-dom/index.js"),
            Module::new("node_modules/element-plus/index.js")
                .with_specifier("element-plus")
                .importing(["node_modules/vue/index.js", "node_modules/lodash-es/index.js"]),
            Module::new("node_modules/lodash-es/index.js"),
            Module::new("node_modules/@element-plus/icons-vue/index.js")
                .with_specifier("@element-plus/icons-vue")
                .importing(["node_modules/vue/index.js"]),
        ])
        .unwrap()
    }

    fn default_map() -> ChunkMap {
        ChunkMap::from_config(&BuildOptions::default())
    }

    #[test]
    fn test_group_of_is_a_pure_lookup() {
        let map = default_map();
        assert_eq!(map.group_of("vue"), Some("vendor"));
        assert_eq!(map.group_of("element-plus"), Some("vendor"));
        assert_eq!(map.group_of("@element-plus/icons-vue"), Some("icons"));
        assert_eq!(map.group_of("axios"), None);
    }

    #[test]
    fn test_default_chunks_for_app() {
        let plan = default_map().assign(&app_graph()).unwrap();

        let names: Vec<_> = plan.chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["icons", "vendor", "main"]);

        let vendor = plan.chunk("vendor").unwrap();
        assert_eq!(vendor.kind, ChunkKind::Manual);
        assert_eq!(
            vendor.modules,
            vec![
                "node_modules/vue/index.js",
                "node_modules/element-plus/index.js",
                "node_modules/@vue/runtime-dom/index.js",
                "node_modules/lodash-es/index.js",
            ]
        );
        assert!(!vendor.modules.iter().any(|m| m.starts_with("src/")));

        let icons = plan.chunk("icons").unwrap();
        assert_eq!(icons.modules, vec!["node_modules/@element-plus/icons-vue/index.js"]);

        let main = plan.chunk("main").unwrap();
        assert_eq!(main.kind, ChunkKind::Entry);
        assert_eq!(
            main.modules,
            vec!["src/main.ts", "src/App.vue", "src/components/Upload.vue"]
        );
        assert!(plan.unreachable.is_empty());
    }

    #[test]
    fn test_assignment_is_idempotent() {
        let map = default_map();
        let graph = app_graph();
        let first = map.assign(&graph).unwrap();
        let second = map.assign(&graph).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.chunk_of("node_modules/vue/index.js").unwrap().name, "vendor");
    }

    #[test]
    fn test_dependency_shared_with_entry_stays_out_of_manual_chunk() {
        let graph = ModuleGraph::new(vec![
            Module::entry("src/main.ts").importing(["node_modules/vue/index.js", "src/util.ts"]),
            Module::new("node_modules/vue/index.js")
                .with_specifier("vue")
                .importing(["src/util.ts"]),
            Module::new("src/util.ts"),
        ])
        .unwrap();
        let map = ChunkMap::new(vec![ChunkGroup {
            name: "vendor".into(),
            members: vec!["vue".into()],
        }]);

        let plan = map.assign(&graph).unwrap();
        assert_eq!(plan.chunk("vendor").unwrap().modules, vec!["node_modules/vue/index.js"]);
        assert_eq!(plan.chunk_of("src/util.ts").unwrap().name, "main");
    }

    #[test]
    fn test_shared_chunk_for_multiple_entries() {
        let graph = ModuleGraph::new(vec![
            Module::entry("src/main.ts").importing(["src/api.ts"]),
            Module::entry("src/admin.ts").importing(["src/api.ts", "src/admin-only.ts"]),
            Module::new("src/api.ts"),
            Module::new("src/admin-only.ts"),
            Module::new("src/dead.ts"),
        ])
        .unwrap();

        let plan = ChunkMap::default().assign(&graph).unwrap();
        let names: Vec<_> = plan.chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["main", "admin", "admin~main"]);
        assert_eq!(plan.chunk("admin~main").unwrap().kind, ChunkKind::Shared);
        assert_eq!(plan.chunk("admin~main").unwrap().modules, vec!["src/api.ts"]);
        assert_eq!(plan.chunk("admin").unwrap().modules, vec!["src/admin.ts", "src/admin-only.ts"]);
        assert_eq!(plan.unreachable, vec!["src/dead.ts"]);
    }

    #[test]
    fn test_unresolved_member_fails() {
        let map = ChunkMap::new(vec![ChunkGroup {
            name: "vendor".into(),
            members: vec!["react".into()],
        }]);
        let err = map.assign(&app_graph()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnresolvedModule { chunk, module } if chunk == "vendor" && module == "react"
        ));
    }

    #[test]
    fn test_two_identifiers_for_one_module_in_different_groups() {
        let map = ChunkMap::new(vec![
            ChunkGroup {
                name: "a".into(),
                members: vec!["vue".into()],
            },
            ChunkGroup {
                name: "b".into(),
                members: vec!["node_modules/vue/index.js".into()],
            },
        ]);
        let err = map.assign(&app_graph()).unwrap_err();
        assert!(matches!(err, BuildError::ConflictingAssignment { first, second, .. } if first == "a" && second == "b"));
    }

    #[test]
    fn test_entry_name_collision_gets_suffix() {
        let graph = ModuleGraph::new(vec![
            Module::entry("src/vendor.ts").importing(["node_modules/vue/index.js"]),
            Module::new("node_modules/vue/index.js").with_specifier("vue"),
        ])
        .unwrap();
        let map = ChunkMap::new(vec![ChunkGroup {
            name: "vendor".into(),
            members: vec!["vue".into()],
        }]);

        let plan = map.assign(&graph).unwrap();
        let names: Vec<_> = plan.chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["vendor", "vendor-2"]);
    }

    #[test]
    fn test_group_named_after_its_own_member() {
        let graph = ModuleGraph::new(vec![
            Module::entry("src/main.ts").importing(["node_modules/vue/index.js"]),
            Module::new("node_modules/vue/index.js").with_specifier("vue"),
        ])
        .unwrap();
        let map = ChunkMap::new(vec![ChunkGroup {
            name: "vue".into(),
            members: vec!["vue".into(), "node_modules/vue/index.js".into()],
        }]);

        let plan = map.assign(&graph).unwrap();
        assert_eq!(plan.chunk("vue").unwrap().modules, vec!["node_modules/vue/index.js"]);
    }

    #[test]
    fn test_dependency_of_two_groups_goes_to_first_by_name() {
        let graph = ModuleGraph::new(vec![
            Module::entry("src/main.ts").importing([
                "node_modules/element-plus/index.js",
                "node_modules/@element-plus/icons-vue/index.js",
            ]),
            Module::new("node_modules/element-plus/index.js")
                .with_specifier("element-plus")
                .importing(["node_modules/vue/index.js"]),
            Module::new("node_modules/@element-plus/icons-vue/index.js")
                .with_specifier("@element-plus/icons-vue")
                .importing(["node_modules/vue/index.js"]),
            Module::new("node_modules/vue/index.js").with_specifier("vue"),
        ])
        .unwrap();

        let mut build = BuildOptions::default();
        let chunks = &mut build.rollup_options.output.manual_chunks;
        chunks.clear();
        chunks.insert("vendor".into(), vec!["element-plus".into()]);
        chunks.insert("icons".into(), vec!["@element-plus/icons-vue".into()]);

        let plan = ChunkMap::from_config(&build).assign(&graph).unwrap();
        assert_eq!(plan.chunk_of("node_modules/vue/index.js").unwrap().name, "icons");
        assert_eq!(plan.chunk("vendor").unwrap().modules, vec!["node_modules/element-plus/index.js"]);
    }
}
