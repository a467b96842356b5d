//! Module dependency graph handed over by the bundler.
//!
//! The graph is read once per build, checked for dangling imports and
//! duplicate ids, and then only queried.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bundle::BuildError;

/// One resolved module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Resolved path, unique within the graph.
    pub id: String,

    /// Bare import name that resolved to this module, e.g. `vue`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,

    /// Ids of the modules this one imports, in source order.
    #[serde(default)]
    pub imports: Vec<String>,

    /// Application entry point.
    #[serde(default)]
    pub is_entry: bool,
}

impl Module {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            specifier: None,
            imports: Vec::new(),
            is_entry: false,
        }
    }

    pub fn entry(id: impl Into<String>) -> Self {
        Self {
            is_entry: true,
            ..Self::new(id)
        }
    }

    pub fn with_specifier(mut self, specifier: impl Into<String>) -> Self {
        self.specifier = Some(specifier.into());
        self
    }

    pub fn importing<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GraphFile {
    modules: Vec<Module>,
}

/// Validated, index-based view of the module graph.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    edges: Vec<Vec<usize>>,
    by_id: HashMap<String, usize>,
}

impl ModuleGraph {
    pub fn new(modules: Vec<Module>) -> Result<Self, BuildError> {
        let mut by_id = HashMap::with_capacity(modules.len());
        for (idx, module) in modules.iter().enumerate() {
            if by_id.insert(module.id.clone(), idx).is_some() {
                return Err(BuildError::DuplicateModule(module.id.clone()));
            }
        }

        let mut edges = Vec::with_capacity(modules.len());
        for module in &modules {
            let targets = module
                .imports
                .iter()
                .map(|import| {
                    by_id.get(import).copied().ok_or_else(|| BuildError::UnknownImport {
                        module: module.id.clone(),
                        import: import.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            edges.push(targets);
        }

        if !modules.iter().any(|m| m.is_entry) {
            return Err(BuildError::NoEntry);
        }

        Ok(Self {
            modules,
            edges,
            by_id,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, BuildError> {
        let file: GraphFile = serde_json::from_str(content)?;
        Self::new(file.modules)
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, idx: usize) -> &Module {
        &self.modules[idx]
    }

    /// Indices of the modules `idx` imports, in import order.
    pub fn imports(&self, idx: usize) -> &[usize] {
        &self.edges[idx]
    }

    pub fn is_entry(&self, idx: usize) -> bool {
        self.modules[idx].is_entry
    }

    /// Entry module indices in graph order.
    pub fn entries(&self) -> Vec<usize> {
        (0..self.modules.len()).filter(|&i| self.is_entry(i)).collect()
    }

    /// Resolve a configured identifier: exact id first, then bare specifier.
    ///
    /// `Ok(None)` means nothing matched.
    pub fn resolve(&self, identifier: &str) -> Result<Option<usize>, BuildError> {
        if let Some(&idx) = self.by_id.get(identifier) {
            return Ok(Some(idx));
        }

        let candidates: Vec<usize> = self
            .modules
            .iter()
            .enumerate()
            .filter(|(_, m)| m.specifier.as_deref() == Some(identifier))
            .map(|(idx, _)| idx)
            .collect();

        match candidates.as_slice() {
            [] => Ok(None),
            [idx] => Ok(Some(*idx)),
            _ => Err(BuildError::AmbiguousModule {
                identifier: identifier.to_string(),
                candidates: candidates
                    .iter()
                    .map(|&idx| self.modules[idx].id.clone())
                    .collect(),
            }),
        }
    }

    /// Depth-first preorder from `root`, never entering nodes where `blocked` is true.
    ///
    /// The root itself is always visited.
    pub fn walk<B>(&self, root: usize, blocked: B) -> Vec<usize>
    where
        B: Fn(usize) -> bool,
    {
        let mut visited = vec![false; self.modules.len()];
        let mut order = Vec::new();
        let mut stack = vec![root];

        while let Some(idx) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            order.push(idx);

            for &next in self.imports(idx).iter().rev() {
                if !visited[next] && !blocked(next) {
                    stack.push(next);
                }
            }
        }
        order
    }
}
