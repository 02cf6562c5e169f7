//! Generic dependency graph with cycle-aware resolution.
//!
//! Nodes are slug-keyed and carry an arbitrary payload; an edge u → v
//! means "u depends on v", so v must be costed (or otherwise processed)
//! before u. Resolution walks the graph iteratively with an explicit
//! frame stack — recipe hierarchies can nest arbitrarily deep and must
//! not be able to overflow the call stack.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Errors raised by graph mutation and resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {id}")]
    NodeNotFound { id: String },
    /// A dependency cycle. The path starts and ends at the repeated id,
    /// e.g. `["cheese", "base-pizza", "cheese"]`.
    #[error("dependency cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

/// A single node: payload plus outgoing edge targets in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node<T> {
    pub id: String,
    pub value: T,
    /// Outgoing edges ("this node depends on…"). Set semantics, but
    /// declaration order is preserved — resolution order depends on it.
    pub deps: Vec<String>,
}

/// Selects what `dependencies` returns for each resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Ids,
    Values,
}

/// The resolved dependency sequence, projected per [`Projection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'g, T> {
    Ids(Vec<&'g str>),
    Values(Vec<&'g T>),
}

/// A mutable directed graph of slug-identified nodes.
///
/// Not safe for concurrent mutation; the calling layer serializes edits
/// against reads. Resolution borrows `&self` and never mutates, so
/// concurrent reads of an unmutated graph are fine. Every resolution
/// walks from scratch — there is no cross-call visited-set, so results
/// always reflect the current graph state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph<T> {
    nodes: BTreeMap<String, Node<T>>,
}

impl<T> DependencyGraph<T> {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Number of distinct node ids.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert a node, or replace the value of an existing one.
    /// Idempotent with respect to `len()`; edges of an existing node
    /// are left untouched.
    pub fn insert(&mut self, id: impl Into<String>, value: T) {
        let id = id.into();
        match self.nodes.get_mut(&id) {
            Some(node) => node.value = value,
            None => {
                self.nodes.insert(
                    id.clone(),
                    Node {
                        id,
                        value,
                        deps: Vec::new(),
                    },
                );
            }
        }
    }

    /// Update an existing node's payload without touching its edges.
    pub fn set_value(&mut self, id: &str, value: T) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(id).ok_or_else(|| GraphError::NodeNotFound {
            id: id.to_string(),
        })?;
        node.value = value;
        Ok(())
    }

    /// Current payload of a node. Absence is not an error.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.nodes.get(id).map(|n| &n.value)
    }

    pub fn node(&self, id: &str) -> Option<&Node<T>> {
        self.nodes.get(id)
    }

    /// Declare a directed edge `from → to` ("from depends on to").
    ///
    /// Both endpoints must already exist — edge declaration never
    /// creates nodes, a dangling slug is a data error the caller must
    /// see. Duplicate declarations are no-ops.
    pub fn set_dependency(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(to) {
            return Err(GraphError::NodeNotFound { id: to.to_string() });
        }
        let node = self
            .nodes
            .get_mut(from)
            .ok_or_else(|| GraphError::NodeNotFound {
                id: from.to_string(),
            })?;
        if !node.deps.iter().any(|d| d == to) {
            node.deps.push(to.to_string());
        }
        Ok(())
    }

    /// Resolve everything transitively reachable from `start`, excluding
    /// `start` itself, in depth-first post-order: a node is emitted only
    /// after all of its own dependencies. Among a node's direct
    /// dependencies the most-recently-declared edge is explored first.
    ///
    /// Fails with [`GraphError::Cycle`] the moment a node on the active
    /// path is re-encountered — cycles are never silently truncated.
    pub fn dependencies(
        &self,
        start: &str,
        projection: Projection,
    ) -> Result<Resolved<'_, T>, GraphError> {
        let order = self.resolve_order(start)?;
        Ok(match projection {
            Projection::Ids => Resolved::Ids(order),
            Projection::Values => Resolved::Values(
                order
                    .iter()
                    .filter_map(|id| self.nodes.get(*id).map(|n| &n.value))
                    .collect(),
            ),
        })
    }

    /// Convenience wrapper: resolved ids.
    pub fn dependency_ids(&self, start: &str) -> Result<Vec<&str>, GraphError> {
        self.resolve_order(start)
    }

    /// Convenience wrapper: resolved payloads.
    pub fn dependency_values(&self, start: &str) -> Result<Vec<&T>, GraphError> {
        match self.dependencies(start, Projection::Values)? {
            Resolved::Values(values) => Ok(values),
            Resolved::Ids(_) => unreachable!("Values projection was requested"),
        }
    }

    /// Iterative post-order DFS with an explicit frame stack.
    fn resolve_order(&self, start: &str) -> Result<Vec<&str>, GraphError> {
        struct Frame<'g> {
            id: &'g str,
            deps: &'g [String],
            /// Count of edges already explored (from the back of `deps`).
            cursor: usize,
        }

        let root = self.nodes.get(start).ok_or_else(|| GraphError::NodeNotFound {
            id: start.to_string(),
        })?;

        let mut stack: Vec<Frame<'_>> = vec![Frame {
            id: root.id.as_str(),
            deps: &root.deps,
            cursor: 0,
        }];
        let mut on_path: HashSet<&str> = HashSet::from([root.id.as_str()]);
        let mut done: HashSet<&str> = HashSet::new();
        let mut order: Vec<&str> = Vec::new();

        while let Some(frame) = stack.last_mut() {
            if frame.cursor < frame.deps.len() {
                // Last-declared edge first.
                let idx = frame.deps.len() - 1 - frame.cursor;
                frame.cursor += 1;
                let dep = frame.deps[idx].as_str();

                if done.contains(dep) {
                    continue;
                }
                if on_path.contains(dep) {
                    let mut path: Vec<String> = stack
                        .iter()
                        .skip_while(|f| f.id != dep)
                        .map(|f| f.id.to_string())
                        .collect();
                    path.push(dep.to_string());
                    return Err(GraphError::Cycle { path });
                }

                // Edges are only ever declared between existing nodes and
                // nodes are never removed, so the lookup cannot miss.
                let node = self.nodes.get(dep).ok_or_else(|| GraphError::NodeNotFound {
                    id: dep.to_string(),
                })?;
                on_path.insert(node.id.as_str());
                stack.push(Frame {
                    id: node.id.as_str(),
                    deps: &node.deps,
                    cursor: 0,
                });
            } else if let Some(finished) = stack.pop() {
                on_path.remove(finished.id);
                done.insert(finished.id);
                if finished.id != start {
                    order.push(finished.id);
                }
            }
        }

        debug!(start, resolved = order.len(), "resolved dependency order");
        Ok(order)
    }
}
