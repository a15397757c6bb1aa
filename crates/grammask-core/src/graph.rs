//! Doubly-linked labeled multigraph.
//!
//! Edges live in a side vector addressed by integer id; each edge is
//! threaded into the out-chain of its source and the in-chain of its
//! destination. Insertion is O(1), removal O(degree), and nodes never hold
//! owning pointers to each other, so cyclic automata are representable
//! without reference cycles.

/// Sentinel edge id terminating adjacency chains.
pub const INVALID_EDGE: i32 = -1;

/// One labeled directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge<L> {
    pub label: L,
    pub src: i32,
    pub dst: i32,
    next_out: i32,
    next_in: i32,
}

/// Directed multigraph over `i32` node ids with labels of type `L`.
#[derive(Debug, Clone)]
pub struct Graph<L> {
    edges: Vec<GraphEdge<L>>,
    /// Per-node `(first_out, first_in)` chain heads.
    adj_heads: Vec<(i32, i32)>,
    /// Per-node `(out_degree, in_degree)` counters.
    degrees: Vec<(i32, i32)>,
}

impl<L: Copy> Graph<L> {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            adj_heads: Vec::new(),
            degrees: Vec::new(),
        }
    }

    pub fn with_nodes(count: usize) -> Self {
        Self {
            edges: Vec::new(),
            adj_heads: vec![(INVALID_EDGE, INVALID_EDGE); count],
            degrees: vec![(0, 0); count],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.adj_heads.len()
    }

    /// Number of edge slots ever allocated; removed edges stay unlinked but
    /// keep their slot. Degree counters are the authoritative live counts.
    pub fn num_edge_slots(&self) -> usize {
        self.edges.len()
    }

    pub fn add_node(&mut self) -> i32 {
        self.adj_heads.push((INVALID_EDGE, INVALID_EDGE));
        self.degrees.push((0, 0));
        (self.adj_heads.len() - 1) as i32
    }

    pub fn add_edge(&mut self, src: i32, dst: i32, label: L) -> i32 {
        let id = self.edges.len() as i32;
        self.edges.push(GraphEdge {
            label,
            src,
            dst,
            next_out: self.adj_heads[src as usize].0,
            next_in: self.adj_heads[dst as usize].1,
        });
        self.adj_heads[src as usize].0 = id;
        self.adj_heads[dst as usize].1 = id;
        self.degrees[src as usize].0 += 1;
        self.degrees[dst as usize].1 += 1;
        id
    }

    pub fn edge(&self, edge_id: i32) -> &GraphEdge<L> {
        &self.edges[edge_id as usize]
    }

    pub fn first_out_edge(&self, node: i32) -> i32 {
        self.adj_heads[node as usize].0
    }

    pub fn next_out_edge(&self, edge_id: i32) -> i32 {
        self.edges[edge_id as usize].next_out
    }

    pub fn first_in_edge(&self, node: i32) -> i32 {
        self.adj_heads[node as usize].1
    }

    pub fn next_in_edge(&self, edge_id: i32) -> i32 {
        self.edges[edge_id as usize].next_in
    }

    pub fn out_degree(&self, node: i32) -> i32 {
        self.degrees[node as usize].0
    }

    pub fn in_degree(&self, node: i32) -> i32 {
        self.degrees[node as usize].1
    }

    /// Iterate the out-edges of `node` as `(edge_id, &edge)`.
    pub fn out_edges(&self, node: i32) -> EdgeIter<'_, L> {
        EdgeIter {
            graph: self,
            cur: self.first_out_edge(node),
            outgoing: true,
        }
    }

    /// Iterate the in-edges of `node` as `(edge_id, &edge)`.
    pub fn in_edges(&self, node: i32) -> EdgeIter<'_, L> {
        EdgeIter {
            graph: self,
            cur: self.first_in_edge(node),
            outgoing: false,
        }
    }

    /// Next edge from `src` to `dst` after `last_edge_id` in the out-chain,
    /// or `INVALID_EDGE`. Pass `INVALID_EDGE` to start the scan.
    pub fn next_edge_from_to(&self, src: i32, dst: i32, last_edge_id: i32) -> i32 {
        let mut eid = if last_edge_id == INVALID_EDGE {
            self.first_out_edge(src)
        } else {
            self.next_out_edge(last_edge_id)
        };
        while eid != INVALID_EDGE {
            if self.edges[eid as usize].dst == dst {
                return eid;
            }
            eid = self.next_out_edge(eid);
        }
        INVALID_EDGE
    }

    fn remove_out_edge(&mut self, src: i32, edge_id: i32) {
        let mut prev = INVALID_EDGE;
        let mut eid = self.first_out_edge(src);
        while eid != INVALID_EDGE {
            if eid == edge_id {
                let next = self.next_out_edge(eid);
                if prev == INVALID_EDGE {
                    self.adj_heads[src as usize].0 = next;
                } else {
                    self.edges[prev as usize].next_out = next;
                }
                break;
            }
            prev = eid;
            eid = self.next_out_edge(eid);
        }
        self.degrees[src as usize].0 -= 1;
    }

    fn remove_in_edge(&mut self, dst: i32, edge_id: i32) {
        let mut prev = INVALID_EDGE;
        let mut eid = self.first_in_edge(dst);
        while eid != INVALID_EDGE {
            if eid == edge_id {
                let next = self.next_in_edge(eid);
                if prev == INVALID_EDGE {
                    self.adj_heads[dst as usize].1 = next;
                } else {
                    self.edges[prev as usize].next_in = next;
                }
                break;
            }
            prev = eid;
            eid = self.next_in_edge(eid);
        }
        self.degrees[dst as usize].1 -= 1;
    }

    /// Unlink an edge from both endpoint chains. The slot stays allocated.
    pub fn remove_edge(&mut self, edge_id: i32) {
        let (src, dst) = {
            let edge = &self.edges[edge_id as usize];
            (edge.src, edge.dst)
        };
        self.remove_out_edge(src, edge_id);
        self.remove_in_edge(dst, edge_id);
    }

    /// Merge `rhs` into `lhs`: in-edges of `rhs` are rewired to point at
    /// `lhs`, out-edges of `rhs` are re-sourced from `lhs`, edges between
    /// the two nodes and self-loops on `rhs` are dropped. `rhs` ends up
    /// fully disconnected.
    pub fn coalesce(&mut self, lhs: i32, rhs: i32) {
        debug_assert_ne!(lhs, rhs, "cannot coalesce a node with itself");

        let in_ids: Vec<i32> = self.in_edges(rhs).map(|(id, _)| id).collect();
        for eid in in_ids {
            let edge = self.edges[eid as usize];
            self.remove_edge(eid);
            if edge.src != lhs && edge.src != rhs {
                self.add_edge(edge.src, lhs, edge.label);
            }
        }

        let out_ids: Vec<i32> = self.out_edges(rhs).map(|(id, _)| id).collect();
        for eid in out_ids {
            let edge = self.edges[eid as usize];
            self.remove_edge(eid);
            if edge.dst != lhs && edge.dst != rhs {
                self.add_edge(lhs, edge.dst, edge.label);
            }
        }

        debug_assert!(self.well_formed(), "graph not well-formed after coalesce");
    }

    /// Consistency check: every linked edge is reachable from both endpoint
    /// chains and the degree counters match the chain lengths. Intended for
    /// debug assertions only.
    pub fn well_formed(&self) -> bool {
        for node in 0..self.num_nodes() as i32 {
            let mut out_count = 0;
            let mut eid = self.first_out_edge(node);
            while eid != INVALID_EDGE {
                let edge = &self.edges[eid as usize];
                if edge.src != node {
                    return false;
                }
                out_count += 1;
                let mut found = false;
                let mut other = self.first_in_edge(edge.dst);
                while other != INVALID_EDGE {
                    if other == eid {
                        found = true;
                        break;
                    }
                    other = self.next_in_edge(other);
                }
                if !found {
                    return false;
                }
                eid = self.next_out_edge(eid);
            }
            if out_count != self.out_degree(node) {
                return false;
            }

            let mut in_count = 0;
            let mut eid = self.first_in_edge(node);
            while eid != INVALID_EDGE {
                let edge = &self.edges[eid as usize];
                if edge.dst != node {
                    return false;
                }
                in_count += 1;
                let mut found = false;
                let mut other = self.first_out_edge(edge.src);
                while other != INVALID_EDGE {
                    if other == eid {
                        found = true;
                        break;
                    }
                    other = self.next_out_edge(other);
                }
                if !found {
                    return false;
                }
                eid = self.next_in_edge(eid);
            }
            if in_count != self.in_degree(node) {
                return false;
            }
        }
        true
    }

    /// Rebuild the graph keeping only nodes reachable from `roots` by
    /// out-edges. Returns the new graph, the old-to-new node mapping
    /// (`-1` for dropped nodes), and the relabeled roots. Discovery is BFS,
    /// so the relabeling is stable for a given root order.
    pub fn simplify(&self, roots: &[i32]) -> (Graph<L>, Vec<i32>, Vec<i32>) {
        let mut old_to_new = vec![-1i32; self.num_nodes()];
        let mut order: Vec<i32> = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        for &root in roots {
            if old_to_new[root as usize] == -1 {
                old_to_new[root as usize] = order.len() as i32;
                order.push(root);
                queue.push_back(root);
            }
        }
        while let Some(node) = queue.pop_front() {
            for (_, edge) in self.out_edges(node) {
                if old_to_new[edge.dst as usize] == -1 {
                    old_to_new[edge.dst as usize] = order.len() as i32;
                    order.push(edge.dst);
                    queue.push_back(edge.dst);
                }
            }
        }

        let mut out = Graph::with_nodes(order.len());
        for &old in &order {
            // Out-chains yield most-recent-first; reverse for stable output.
            let mut edges: Vec<GraphEdge<L>> = self.out_edges(old).map(|(_, e)| *e).collect();
            edges.reverse();
            for edge in edges {
                out.add_edge(
                    old_to_new[edge.src as usize],
                    old_to_new[edge.dst as usize],
                    edge.label,
                );
            }
        }
        let new_roots = roots.iter().map(|&r| old_to_new[r as usize]).collect();
        (out, old_to_new, new_roots)
    }
}

impl<L: Copy> Default for Graph<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over one adjacency chain.
pub struct EdgeIter<'a, L> {
    graph: &'a Graph<L>,
    cur: i32,
    outgoing: bool,
}

impl<'a, L: Copy> Iterator for EdgeIter<'a, L> {
    type Item = (i32, &'a GraphEdge<L>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == INVALID_EDGE {
            return None;
        }
        let id = self.cur;
        let edge = &self.graph.edges[id as usize];
        self.cur = if self.outgoing {
            edge.next_out
        } else {
            edge.next_in
        };
        Some((id, edge))
    }
}
