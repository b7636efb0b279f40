//! An id-indexed directed multigraph plus an iterative Tarjan SCC pass
//! (§4.4, §9 design note: node-id -> out-edges rather than object pointers,
//! so SCC computation doesn't blow the stack on a large module graph).

use std::collections::{BTreeMap, BTreeSet};

/// A directed graph over a fixed, sorted set of module names.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// Sorted module names; index into this vec is the node id used below.
    pub nodes: Vec<String>,
    /// node id -> deduplicated set of outgoing neighbor ids (a multigraph
    /// collapsed to its simple-graph projection for SCC/fan-out purposes).
    edges: BTreeMap<usize, BTreeSet<usize>>,
}

impl ModuleGraph {
    /// Build from a module set and a list of (from, to) module-name edges.
    /// Self-edges and edges to modules outside `modules` are dropped (§4.4
    /// step 5: "self-imports and imports to modules not in moduleSet are
    /// dropped").
    #[must_use]
    pub fn build(modules: &BTreeSet<String>, raw_edges: &[(String, String)]) -> Self {
        let nodes: Vec<String> = modules.iter().cloned().collect();
        let index: BTreeMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let mut edges: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for (from, to) in raw_edges {
            if from == to {
                continue;
            }
            let (Some(&f), Some(&t)) = (index.get(from.as_str()), index.get(to.as_str())) else {
                continue;
            };
            edges.entry(f).or_default().insert(t);
        }
        ModuleGraph { nodes, edges }
    }

    #[must_use]
    pub fn node_name(&self, id: usize) -> &str {
        &self.nodes[id]
    }

    /// Deduplicated outgoing edge count for `id` (§4.4 fan-out).
    #[must_use]
    pub fn fan_out(&self, id: usize) -> usize {
        self.edges.get(&id).map_or(0, BTreeSet::len)
    }

    fn neighbors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.get(&id).into_iter().flatten().copied()
    }

    /// Tarjan's SCC algorithm, computed iteratively against an explicit
    /// stack of work frames rather than recursion (§9).
    ///
    /// Each returned group is a `Vec<usize>` of node ids in the order
    /// Tarjan discovers them; callers that need a deterministic display
    /// order should sort group members themselves.
    #[must_use]
    pub fn tarjan_scc(&self) -> Vec<Vec<usize>> {
        let n = self.nodes.len();
        let mut index_of: Vec<Option<usize>> = vec![None; n];
        let mut lowlink: Vec<usize> = vec![0; n];
        let mut on_stack: Vec<bool> = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut next_index = 0usize;
        let mut result = Vec::new();

        // Explicit work-stack frame: the node being visited and an
        // iterator cursor over its neighbor list.
        struct Frame {
            node: usize,
            neighbor_idx: usize,
            neighbors: Vec<usize>,
        }

        for start in 0..n {
            if index_of[start].is_some() {
                continue;
            }
            let mut work: Vec<Frame> = vec![Frame {
                node: start,
                neighbor_idx: 0,
                neighbors: self.neighbors(start).collect(),
            }];
            index_of[start] = Some(next_index);
            lowlink[start] = next_index;
            next_index += 1;
            stack.push(start);
            on_stack[start] = true;

            while let Some(frame) = work.last_mut() {
                if frame.neighbor_idx < frame.neighbors.len() {
                    let w = frame.neighbors[frame.neighbor_idx];
                    frame.neighbor_idx += 1;
                    if index_of[w].is_none() {
                        index_of[w] = Some(next_index);
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        work.push(Frame {
                            node: w,
                            neighbor_idx: 0,
                            neighbors: self.neighbors(w).collect(),
                        });
                    } else if on_stack[w] {
                        let v = frame.node;
                        lowlink[v] = lowlink[v].min(index_of[w].expect("checked Some above"));
                    }
                } else {
                    let v = frame.node;
                    work.pop();
                    if let Some(parent) = work.last() {
                        let p = parent.node;
                        lowlink[p] = lowlink[p].min(lowlink[v]);
                    }
                    if lowlink[v] == index_of[v].expect("visited nodes always have an index") {
                        let mut component = Vec::new();
                        loop {
                            let w = stack.pop().expect("SCC root must be on the stack");
                            on_stack[w] = false;
                            component.push(w);
                            if w == v {
                                break;
                            }
                        }
                        result.push(component);
                    }
                }
            }
        }
        result
    }
}
