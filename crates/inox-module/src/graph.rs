//! Directed graph of module imports, used to reject cycles and deep import chains.
//!
//! The graph only knows resource names; it is checked after every edge
//! insertion, before the imported module is fetched.

use indexmap::IndexSet;
use parking_lot::Mutex;

use crate::error::{ModuleError, ModuleResult, DEFAULT_MAX_MOD_GRAPH_PATH_LEN};

/// Index of a node in a [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphNodeId(u32);

impl GraphNodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The graph contains a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDetected {
    /// Nodes of one cycle, the first node repeated at the end.
    pub cycle: Vec<GraphNodeId>,
}

#[derive(Debug, Default)]
struct GraphInner {
    names: IndexSet<String>,
    edges: Vec<Vec<GraphNodeId>>,
}

/// Thread-safe import graph shared by every module of one resolution.
#[derive(Debug)]
pub struct ModuleGraph {
    inner: Mutex<GraphInner>,
    max_path_len: usize,
}

impl Default for ModuleGraph {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MOD_GRAPH_PATH_LEN)
    }
}

impl ModuleGraph {
    pub fn new(max_path_len: usize) -> Self {
        Self {
            inner: Mutex::new(GraphInner::default()),
            max_path_len,
        }
    }

    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    /// Adds a node unless one with the same name exists; returns its id.
    pub fn add_node(&self, name: &str) -> GraphNodeId {
        let mut inner = self.inner.lock();
        inner.add_node(name)
    }

    pub fn node_id(&self, name: &str) -> Option<GraphNodeId> {
        let inner = self.inner.lock();
        inner.names.get_index_of(name).map(|i| GraphNodeId(i as u32))
    }

    pub fn name(&self, id: GraphNodeId) -> Option<String> {
        let inner = self.inner.lock();
        inner.names.get_index(id.index()).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().names.len()
    }

    /// Adds `from -> to`. Setting an existing edge again is a no-op.
    pub fn set_edge(&self, from: GraphNodeId, to: GraphNodeId) {
        let mut inner = self.inner.lock();
        inner.set_edge(from, to);
    }

    /// Nodes of the longest path and its length in edges.
    ///
    /// A graph without edges has an empty longest path of length 0.
    pub fn longest_path(&self) -> Result<(Vec<GraphNodeId>, usize), CycleDetected> {
        self.inner.lock().longest_path()
    }

    /// Checks that the graph has no cycle and no path longer than the maximum.
    pub fn check(&self) -> ModuleResult<()> {
        let inner = self.inner.lock();
        inner.check(self.max_path_len)
    }

    /// Registers the import `from -> to` and checks the graph, atomically.
    pub fn add_import(&self, from: &str, to: &str) -> ModuleResult<()> {
        let mut inner = self.inner.lock();
        let from_id = inner.add_node(from);
        let to_id = inner.add_node(to);
        if from_id == to_id {
            return Err(ModuleError::ImportCycleDetected(format!("module {} imports itself", to)));
        }
        inner.set_edge(from_id, to_id);
        inner.check(self.max_path_len)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl GraphInner {
    fn add_node(&mut self, name: &str) -> GraphNodeId {
        let (index, inserted) = self.names.insert_full(name.to_string());
        if inserted {
            self.edges.push(Vec::new());
        }
        GraphNodeId(index as u32)
    }

    fn set_edge(&mut self, from: GraphNodeId, to: GraphNodeId) {
        let targets = &mut self.edges[from.index()];
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    fn path_names(&self, path: &[GraphNodeId]) -> String {
        path.iter()
            .filter_map(|id| self.names.get_index(id.index()).map(String::as_str))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn check(&self, max_path_len: usize) -> ModuleResult<()> {
        match self.longest_path() {
            Err(CycleDetected { cycle }) => Err(ModuleError::ImportCycleDetected(self.path_names(&cycle))),
            Ok((path, len)) if len > max_path_len => Err(ModuleError::MaxModuleImportDepthExceeded {
                max: max_path_len,
                path: self.path_names(&path),
            }),
            Ok(_) => Ok(()),
        }
    }

    /// Depth-first topological order; finds a cycle on the way.
    fn topological_order(&self) -> Result<Vec<GraphNodeId>, CycleDetected> {
        let count = self.names.len();
        let mut marks = vec![Mark::Unvisited; count];
        let mut order = Vec::with_capacity(count);
        let mut stack: Vec<GraphNodeId> = Vec::new();

        for root in 0..count {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // (node, index of the next edge to follow)
            let mut frames: Vec<(GraphNodeId, usize)> = vec![(GraphNodeId(root as u32), 0)];
            marks[root] = Mark::InProgress;
            stack.push(GraphNodeId(root as u32));

            while let Some(frame) = frames.last_mut() {
                let (node, next) = *frame;
                if let Some(&target) = self.edges[node.index()].get(next) {
                    frame.1 += 1;
                    match marks[target.index()] {
                        Mark::Unvisited => {
                            marks[target.index()] = Mark::InProgress;
                            stack.push(target);
                            frames.push((target, 0));
                        }
                        Mark::InProgress => {
                            let start = stack.iter().position(|&n| n == target).unwrap_or(0);
                            let mut cycle = stack[start..].to_vec();
                            cycle.push(target);
                            return Err(CycleDetected { cycle });
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node.index()] = Mark::Done;
                    order.push(node);
                    stack.pop();
                    frames.pop();
                }
            }
        }

        order.reverse();
        Ok(order)
    }

    fn longest_path(&self) -> Result<(Vec<GraphNodeId>, usize), CycleDetected> {
        let order = self.topological_order()?;
        let count = self.names.len();
        let mut dist = vec![0usize; count];
        let mut prev: Vec<Option<GraphNodeId>> = vec![None; count];

        for &node in &order {
            for &target in &self.edges[node.index()] {
                if dist[node.index()] + 1 > dist[target.index()] {
                    dist[target.index()] = dist[node.index()] + 1;
                    prev[target.index()] = Some(node);
                }
            }
        }

        let Some((end, &len)) = dist.iter().enumerate().max_by_key(|(_, d)| **d) else {
            return Ok((Vec::new(), 0));
        };
        if len == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut path = vec![GraphNodeId(end as u32)];
        let mut current = prev[end];
        while let Some(node) = current {
            path.push(node);
            current = prev[node.index()];
        }
        path.reverse();
        Ok((path, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_edgeless() {
        let graph = ModuleGraph::default();
        assert_eq!(graph.longest_path(), Ok((vec![], 0)));
        graph.add_node("A");
        graph.add_node("B");
        assert_eq!(graph.longest_path(), Ok((vec![], 0)));
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let graph = ModuleGraph::default();
        let a = graph.add_node("A");
        assert_eq!(graph.add_node("A"), a);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.name(a).as_deref(), Some("A"));
    }

    #[test]
    fn test_longest_path() {
        let graph = ModuleGraph::default();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        let c = graph.add_node("C");
        let d = graph.add_node("D");
        graph.set_edge(a, b);
        graph.set_edge(b, c);
        graph.set_edge(a, d);
        assert_eq!(graph.longest_path(), Ok((vec![a, b, c], 2)));
    }

    #[test]
    fn test_cycle() {
        let graph = ModuleGraph::default();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        graph.set_edge(a, b);
        graph.set_edge(b, a);
        let err = graph.longest_path().unwrap_err();
        assert_eq!(err.cycle.len(), 3);
        assert!(graph.check().unwrap_err().is_import_cycle());
    }

    #[test]
    fn test_self_import() {
        let graph = ModuleGraph::default();
        let err = graph.add_import("/a.ix", "/a.ix").unwrap_err();
        assert_eq!(err.to_string(), "import cycle detected: module /a.ix imports itself");
    }

    #[test]
    fn test_depth_exceeded() {
        let graph = ModuleGraph::new(2);
        graph.add_import("/a.ix", "/b.ix").unwrap();
        graph.add_import("/b.ix", "/c.ix").unwrap();
        let err = graph.add_import("/c.ix", "/d.ix").unwrap_err();
        assert_eq!(
            err.to_string(),
            "the module import depth has exceeded the maximum (2): path is /a.ix -> /b.ix -> /c.ix -> /d.ix"
        );
    }
}
