//! Exhaustive simple-path enumeration between two nodes.
//!
//! Answers the diagnostic question "how does recipe X reach ingredient
//! Y, via which sub-recipes" by backtracking over partial paths. This is
//! independent of cost computation and read-only over the graph.

use crate::graph::DependencyGraph;
use std::collections::HashSet;

/// All simple paths (no repeated node) from `start` to `end`, as id
/// sequences, capped at `limit` results.
///
/// Unknown endpoints yield no paths; `start == end` yields the single
/// zero-length path. Sibling edges are extended in declaration order,
/// so earlier-declared routes surface first.
pub fn all_paths<'g, T>(
    graph: &'g DependencyGraph<T>,
    start: &str,
    end: &str,
    limit: usize,
) -> Vec<Vec<&'g str>> {
    let Some(root) = graph.node(start) else {
        return Vec::new();
    };
    if !graph.contains(end) || limit == 0 {
        return Vec::new();
    }
    if start == end {
        return vec![vec![root.id.as_str()]];
    }

    struct Frame<'g> {
        id: &'g str,
        deps: &'g [String],
        cursor: usize,
    }

    let mut results: Vec<Vec<&'g str>> = Vec::new();
    let mut stack: Vec<Frame<'g>> = vec![Frame {
        id: root.id.as_str(),
        deps: &root.deps,
        cursor: 0,
    }];
    let mut on_path: HashSet<&'g str> = HashSet::from([root.id.as_str()]);

    while let Some(frame) = stack.last_mut() {
        if results.len() >= limit {
            break;
        }
        if frame.cursor < frame.deps.len() {
            let dep = frame.deps[frame.cursor].as_str();
            frame.cursor += 1;

            // Simple paths only.
            if on_path.contains(dep) {
                continue;
            }
            let Some(node) = graph.node(dep) else {
                continue;
            };
            if node.id == end {
                let mut path: Vec<&'g str> = stack.iter().map(|f| f.id).collect();
                path.push(node.id.as_str());
                results.push(path);
                continue;
            }
            on_path.insert(node.id.as_str());
            stack.push(Frame {
                id: node.id.as_str(),
                deps: &node.deps,
                cursor: 0,
            });
        } else if let Some(finished) = stack.pop() {
            on_path.remove(finished.id);
        }
    }

    results
}

/// [`all_paths`], projected onto node payloads.
pub fn all_path_values<'g, T>(
    graph: &'g DependencyGraph<T>,
    start: &str,
    end: &str,
    limit: usize,
) -> Vec<Vec<&'g T>> {
    all_paths(graph, start, end, limit)
        .into_iter()
        .map(|path| {
            path.into_iter()
                .filter_map(|id| graph.get(id))
                .collect()
        })
        .collect()
}
