//! Wiring graph construction and traversal, for post-resolve diagnostics.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use modwire_core::namespace::Namespace;
use modwire_core::resource::ResourceId;
use modwire_core::wire::Wire;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Edge label: which requirement a wire satisfied.
#[derive(Debug, Clone)]
pub struct WireEdge {
    pub namespace: Namespace,
    pub name: String,
}

impl fmt::Display for WireEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.namespace, self.name)
    }
}

/// A resolved wiring viewed as a directed graph: requirers point at their
/// providers, one edge per wire.
pub struct WiringGraph {
    graph: DiGraph<ResourceId, WireEdge>,
    index: HashMap<ResourceId, NodeIndex>,
}

impl WiringGraph {
    pub fn from_wiring(wiring: &BTreeMap<ResourceId, Vec<Wire>>) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };
        for (resource, wires) in wiring {
            let from = graph.add_node(resource.clone());
            for wire in wires {
                let to = graph.add_node(wire.provider().clone());
                graph.graph.add_edge(
                    from,
                    to,
                    WireEdge {
                        namespace: wire.requirement.namespace,
                        name: wire.requirement.name.clone(),
                    },
                );
            }
        }
        graph
    }

    fn add_node(&mut self, id: ResourceId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id, idx);
        idx
    }

    pub fn find(&self, id: &ResourceId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ResourceId {
        &self.graph[idx]
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Providers this module is wired to.
    pub fn providers_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &WireEdge)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect()
    }

    /// Modules wired to this provider.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &WireEdge)> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect()
    }

    /// Print the provider tree below one module.
    pub fn print_tree(&self, root: &ResourceId, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root_idx) = self.find(root) else {
            return output;
        };
        output.push_str(&format!("{root}\n"));
        let mut visited = HashSet::new();
        visited.insert(root_idx);
        let providers = self.providers_of(root_idx);
        let count = providers.len();
        for (i, (idx, edge)) in providers.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(&mut output, *idx, edge, "", is_last, 1, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        edge: &WireEdge,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} ({edge})\n"));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let providers = self.providers_of(idx);
        let count = providers.len();
        for (i, (child, child_edge)) in providers.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(
                output,
                *child,
                child_edge,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Print the inverted tree for one provider: everything wired to it.
    pub fn print_inverted_tree(&self, target: &ResourceId) -> String {
        let mut output = String::new();
        let Some(idx) = self.find(target) else {
            return output;
        };
        output.push_str(&format!("{target}\n"));
        let mut visited = HashSet::new();
        visited.insert(idx);
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, edge)) in dependents.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(&mut output, *dep_idx, edge, "", is_last, &mut visited);
        }
        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        edge: &WireEdge,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} ({edge})\n"));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, dep_edge)) in dependents.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(output, *dep_idx, dep_edge, &child_prefix, is_last, visited);
        }

        visited.remove(&idx);
    }
}
