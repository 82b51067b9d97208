//! Graph walker framework
//!
//! A `Walker` drives every vertex through UNSEEN -> SEEN -> FINISHED.
//! Exploring an edge from a SEEN vertex discovers the neighbour if it is still
//! UNSEEN and only reports it through `see` otherwise, so undirected walks
//! that come back over their parent edge never re-discover anything.
//!
//! Traversal order and direction are plain configuration; side effects are
//! supplied through a `Visitor` whose hooks all default to no-ops. Per-vertex
//! and per-edge state is kept in an `Annotation<WalkerInfo>` owned by the
//! walker, which can be handed to a later walker (e.g. a tree-restricted one).

use crate::annotation::Annotation;
use crate::error::GraphError;
use crate::graph::{Digraph, EdgeId, VertexId};
use std::collections::VecDeque;

/// Traversal state of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Unseen,
    Seen,
    Finished,
}

/// Scratch state kept per vertex and per edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkerInfo {
    pub status: Status,
    /// Edge over which the vertex was discovered
    pub parent: Option<EdgeId>,
    /// Set on edges that discovered their far end
    pub tree: bool,
    /// Hops from the root (breadth-first)
    pub distance: usize,
    /// Discovery timestamp
    pub discover: usize,
    /// Finish timestamp
    pub finish: usize,
    /// Free for visitors
    pub mark: usize,
}

impl WalkerInfo {
    /// Return to the freshly created state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How walker state is prepared before a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitCode {
    /// The caller manages state; every touched element must have data
    None,
    /// Clear existing data; every vertex must already have data
    Reset,
    /// Materialize fresh data for every vertex and edge up front
    Create,
    /// Materialize data on first touch
    Dynamic,
}

/// Order in which discovered vertices are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Breadth,
    Depth,
}

/// Which edges are explored from a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Out-edges
    Forward,
    /// In-edges
    Reverse,
    /// Both
    Undirected,
}

/// Hooks invoked by a `Walker`
pub trait Visitor<V, E> {
    /// `vertex` turned SEEN. `info` already holds its state.
    fn discover(&mut self, _graph: &Digraph<V, E>, _vertex: VertexId, _info: &Annotation<WalkerInfo>) {}

    /// Filter for edges about to be explored from `from`.
    fn explore(&mut self, _graph: &Digraph<V, E>, _from: VertexId, _edge: EdgeId) -> bool {
        true
    }

    /// `edge` leads from `from` to the already discovered `to`.
    fn see(
        &mut self,
        _graph: &Digraph<V, E>,
        _from: VertexId,
        _edge: EdgeId,
        _to: VertexId,
        _info: &Annotation<WalkerInfo>,
    ) {
    }

    /// All edges of `vertex` have been explored.
    fn finish(&mut self, _graph: &Digraph<V, E>, _vertex: VertexId, _info: &Annotation<WalkerInfo>) {}

    /// Polled after every step; `true` drops all pending work.
    fn stop(&self) -> bool {
        false
    }
}

impl<V, E> Visitor<V, E> for () {}

struct Frame {
    vertex: VertexId,
    pending: Vec<(EdgeId, VertexId)>,
    next: usize,
}

/// Configurable BFS/DFS driver
#[derive(Debug)]
pub struct Walker {
    order: Order,
    direction: Direction,
    init: InitCode,
    tree_only: bool,
    info: Annotation<WalkerInfo>,
    clock: usize,
    queue: VecDeque<VertexId>,
}

impl Walker {
    /// Create a walker with dynamic initialization
    pub fn new(order: Order, direction: Direction) -> Self {
        Self {
            order,
            direction,
            init: InitCode::Dynamic,
            tree_only: false,
            info: Annotation::with_factory(WalkerInfo::default),
            clock: 0,
            queue: VecDeque::new(),
        }
    }

    /// Forward breadth-first search
    pub fn bfs() -> Self {
        Self::new(Order::Breadth, Direction::Forward)
    }

    /// Forward depth-first search
    pub fn dfs() -> Self {
        Self::new(Order::Depth, Direction::Forward)
    }

    /// Breadth-first search over in-edges
    pub fn reverse_bfs() -> Self {
        Self::new(Order::Breadth, Direction::Reverse)
    }

    /// Depth-first search over in-edges
    pub fn reverse_dfs() -> Self {
        Self::new(Order::Depth, Direction::Reverse)
    }

    /// Breadth-first search ignoring edge direction
    pub fn undirected_bfs() -> Self {
        Self::new(Order::Breadth, Direction::Undirected)
    }

    /// Depth-first search ignoring edge direction
    pub fn undirected_dfs() -> Self {
        Self::new(Order::Depth, Direction::Undirected)
    }

    /// Choose the initialization policy
    pub fn with_init(mut self, init: InitCode) -> Self {
        self.init = init;
        self
    }

    /// Only follow edges marked `tree` by an earlier walk, away from parents.
    ///
    /// Neighbours are treated as UNSEEN whatever their recorded status, and
    /// the parent/tree bookkeeping of the earlier walk is left untouched.
    pub fn tree_only(mut self) -> Self {
        self.tree_only = true;
        self
    }

    /// Start from the state of an earlier walk
    pub fn with_info(mut self, mut info: Annotation<WalkerInfo>) -> Self {
        info.set_factory(WalkerInfo::default);
        self.info = info;
        self
    }

    /// Walker state
    pub fn info(&self) -> &Annotation<WalkerInfo> {
        &self.info
    }

    /// Give up the walker state, e.g. for a following tree walk
    pub fn into_info(self) -> Annotation<WalkerInfo> {
        self.info
    }

    /// Status of a vertex; UNSEEN if the walker never touched it
    pub fn status<V, E>(&self, graph: &Digraph<V, E>, vertex: VertexId) -> Status {
        self.info
            .vertex(graph, vertex)
            .map(|info| info.status)
            .unwrap_or_default()
    }

    /// Walk from every vertex still UNSEEN, in index order
    pub fn run<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<(), GraphError> {
        let roots: Vec<VertexId> = graph.vertex_ids().collect();
        self.run_roots(graph, roots, visitor)
    }

    /// Walk from a single vertex
    pub fn run_from<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        start: VertexId,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<(), GraphError> {
        self.run_roots(graph, [start], visitor)
    }

    /// Walk from each of `roots` that is still UNSEEN when its turn comes
    pub fn run_roots<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        roots: impl IntoIterator<Item = VertexId>,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<(), GraphError> {
        self.prepare(graph)?;

        for root in roots {
            if !graph.contains_vertex(root) {
                return Err(GraphError::MissingVertex(root));
            }
            if !self.tree_only && self.vertex_info(graph, root)?.status != Status::Unseen {
                continue;
            }

            self.discover(graph, root, None, visitor)?;
            match self.order {
                Order::Breadth => self.drain(graph, visitor)?,
                Order::Depth => self.descend(graph, root, visitor)?,
            }

            if visitor.stop() {
                break;
            }
        }
        Ok(())
    }

    fn prepare<V, E>(&mut self, graph: &Digraph<V, E>) -> Result<(), GraphError> {
        self.clock = 0;
        self.queue.clear();

        match self.init {
            InitCode::None => {}
            InitCode::Reset => {
                for vertex in graph.vertex_ids() {
                    self.info.vertex_mut(graph, vertex)?.reset();
                }
                for info in self.info.edge_values_mut() {
                    info.reset();
                }
            }
            InitCode::Create => {
                self.info.clear();
                for vertex in graph.vertex_ids() {
                    self.info.set_vertex(graph, vertex, WalkerInfo::default())?;
                }
                for edge in graph.edge_ids() {
                    self.info.set_edge(graph, edge, WalkerInfo::default())?;
                }
            }
            InitCode::Dynamic => self.info.clear(),
        }
        Ok(())
    }

    fn vertex_info<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        vertex: VertexId,
    ) -> Result<&mut WalkerInfo, GraphError> {
        match self.init {
            InitCode::Dynamic => self.info.vertex_or_create(graph, vertex),
            _ => self.info.vertex_mut(graph, vertex),
        }
    }

    fn edge_info<V, E>(&mut self, graph: &Digraph<V, E>, edge: EdgeId) -> Result<&mut WalkerInfo, GraphError> {
        match self.init {
            InitCode::Dynamic => self.info.edge_or_create(graph, edge),
            _ => self.info.edge_mut(graph, edge),
        }
    }

    /// Edges to explore from `vertex`, paired with the far end
    fn incident<V, E>(
        &self,
        graph: &Digraph<V, E>,
        vertex: VertexId,
    ) -> Result<Vec<(EdgeId, VertexId)>, GraphError> {
        let mut edges = Vec::new();
        if matches!(self.direction, Direction::Forward | Direction::Undirected) {
            for &edge in graph.out_edges(vertex) {
                edges.push((edge, graph.head(edge)?));
            }
        }
        if matches!(self.direction, Direction::Reverse | Direction::Undirected) {
            for &edge in graph.in_edges(vertex) {
                edges.push((edge, graph.tail(edge)?));
            }
        }

        if self.tree_only {
            let parent = self.info.vertex(graph, vertex)?.parent;
            edges.retain(|(edge, _)| {
                Some(*edge) != parent
                    && self
                        .info
                        .edge(graph, *edge)
                        .map(|info| info.tree)
                        .unwrap_or(false)
            });
        }
        Ok(edges)
    }

    fn discover<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        vertex: VertexId,
        via: Option<(VertexId, EdgeId)>,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<(), GraphError> {
        let distance = match via {
            Some((from, _)) => self.vertex_info(graph, from)?.distance + 1,
            None => 0,
        };
        self.clock += 1;
        let clock = self.clock;
        let tree_only = self.tree_only;

        let info = self.vertex_info(graph, vertex)?;
        info.status = Status::Seen;
        info.discover = clock;
        if !tree_only {
            info.parent = via.map(|(_, edge)| edge);
            info.distance = distance;
            if let Some((_, edge)) = via {
                self.edge_info(graph, edge)?.tree = true;
            }
        }

        visitor.discover(graph, vertex, &self.info);
        if self.order == Order::Breadth {
            self.queue.push_back(vertex);
        }
        Ok(())
    }

    /// Returns whether the far end was discovered
    fn explore<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        from: VertexId,
        edge: EdgeId,
        to: VertexId,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<bool, GraphError> {
        if !visitor.explore(graph, from, edge) {
            return Ok(false);
        }

        let status = if self.tree_only {
            Status::Unseen
        } else {
            self.vertex_info(graph, to)?.status
        };

        if status == Status::Unseen {
            self.discover(graph, to, Some((from, edge)), visitor)?;
            Ok(true)
        } else {
            visitor.see(graph, from, edge, to, &self.info);
            Ok(false)
        }
    }

    fn finish<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        vertex: VertexId,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<(), GraphError> {
        self.clock += 1;
        let clock = self.clock;
        let info = self.vertex_info(graph, vertex)?;
        info.status = Status::Finished;
        info.finish = clock;
        visitor.finish(graph, vertex, &self.info);
        Ok(())
    }

    /// Breadth-first: visit queued vertices until the queue runs dry
    fn drain<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<(), GraphError> {
        while let Some(vertex) = self.queue.pop_front() {
            for (edge, to) in self.incident(graph, vertex)? {
                self.explore(graph, vertex, edge, to, visitor)?;
                if visitor.stop() {
                    break;
                }
            }
            self.finish(graph, vertex, visitor)?;
            if visitor.stop() {
                self.queue.clear();
            }
        }
        Ok(())
    }

    /// Depth-first with an explicit stack of frames
    fn descend<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        root: VertexId,
        visitor: &mut impl Visitor<V, E>,
    ) -> Result<(), GraphError> {
        let mut stack = vec![Frame {
            vertex: root,
            pending: self.incident(graph, root)?,
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let vertex = frame.vertex;
            match frame.pending.get(frame.next).copied() {
                Some((edge, to)) => {
                    frame.next += 1;
                    if self.explore(graph, vertex, edge, to, visitor)? {
                        let pending = self.incident(graph, to)?;
                        stack.push(Frame {
                            vertex: to,
                            pending,
                            next: 0,
                        });
                    }
                }
                None => {
                    stack.pop();
                    self.finish(graph, vertex, visitor)?;
                }
            }

            if visitor.stop() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the order of hook calls
    #[derive(Default)]
    struct Recorder {
        discovered: Vec<VertexId>,
        finished: Vec<VertexId>,
        seen: Vec<(VertexId, VertexId)>,
    }

    impl<V, E> Visitor<V, E> for Recorder {
        fn discover(&mut self, _: &Digraph<V, E>, vertex: VertexId, _: &Annotation<WalkerInfo>) {
            self.discovered.push(vertex);
        }

        fn see(&mut self, _: &Digraph<V, E>, from: VertexId, _: EdgeId, to: VertexId, _: &Annotation<WalkerInfo>) {
            self.seen.push((from, to));
        }

        fn finish(&mut self, _: &Digraph<V, E>, vertex: VertexId, _: &Annotation<WalkerInfo>) {
            self.finished.push(vertex);
        }
    }

    //     a
    //    / \
    //   b   c
    //    \ /
    //     d
    fn diamond() -> (Digraph<(), ()>, [VertexId; 4]) {
        let mut g = Digraph::new();
        let a = g.add_vertex(());
        let b = g.add_vertex(());
        let c = g.add_vertex(());
        let d = g.add_vertex(());
        g.add_edge(a, b, ()).unwrap();
        g.add_edge(a, c, ()).unwrap();
        g.add_edge(b, d, ()).unwrap();
        g.add_edge(c, d, ()).unwrap();
        (g, [a, b, c, d])
    }

    #[test]
    fn test_bfs_distances() {
        let (g, [a, b, c, d]) = diamond();
        let mut walker = Walker::bfs();
        let mut rec = Recorder::default();
        walker.run_from(&g, a, &mut rec).unwrap();

        assert_eq!(rec.discovered, vec![a, b, c, d]);
        assert_eq!(rec.seen, vec![(c, d)]);
        let info = walker.info();
        assert_eq!(info.vertex(&g, a).unwrap().distance, 0);
        assert_eq!(info.vertex(&g, b).unwrap().distance, 1);
        assert_eq!(info.vertex(&g, d).unwrap().distance, 2);
        assert_eq!(walker.status(&g, d), Status::Finished);
    }

    #[test]
    fn test_dfs_covers_unreachable_parts() {
        let (mut g, [a, _, _, d]) = diamond();
        let lone = g.add_vertex(());
        let mut walker = Walker::dfs();
        let mut rec = Recorder::default();
        walker.run(&g, &mut rec).unwrap();

        assert_eq!(rec.discovered.len(), 5);
        assert_eq!(rec.finished.len(), 5);
        assert!(rec.discovered.contains(&lone));
        // Depth-first: d finishes before a
        let ia = walker.info().vertex(&g, a).unwrap().clone();
        let id = walker.info().vertex(&g, d).unwrap().clone();
        assert!(ia.discover < id.discover && id.finish < ia.finish);
    }

    #[test]
    fn test_reverse_bfs() {
        let (g, [a, b, c, d]) = diamond();
        let mut walker = Walker::reverse_bfs();
        let mut rec = Recorder::default();
        walker.run_from(&g, d, &mut rec).unwrap();
        assert_eq!(rec.discovered, vec![d, b, c, a]);
    }

    #[test]
    fn test_undirected_revisits_parent_without_rediscovery() {
        let (g, [_, b, _, _]) = diamond();
        let mut walker = Walker::undirected_bfs();
        let mut rec = Recorder::default();
        walker.run_from(&g, b, &mut rec).unwrap();
        assert_eq!(rec.discovered.len(), 4);
        assert!(rec.seen.len() >= 3);
    }

    #[test]
    fn test_undirected_dfs_reaches_everything() {
        let (g, [_, _, _, d]) = diamond();
        let mut walker = Walker::undirected_dfs();
        let mut rec = Recorder::default();
        walker.run_from(&g, d, &mut rec).unwrap();
        assert_eq!(rec.discovered.len(), 4);
    }

    #[test]
    fn test_tree_walk_follows_previous_tree() {
        let (g, [a, b, c, d]) = diamond();
        let mut first = Walker::bfs();
        first.run_from(&g, a, &mut ()).unwrap();

        let mut tree = Walker::bfs()
            .tree_only()
            .with_init(InitCode::None)
            .with_info(first.into_info());
        let mut rec = Recorder::default();
        tree.run_from(&g, a, &mut rec).unwrap();

        // c -> d is not a tree edge, so d is reached exactly once via b
        assert_eq!(rec.discovered, vec![a, b, c, d]);
        let info = tree.info();
        let parent = info.vertex(&g, d).unwrap().parent.unwrap();
        assert_eq!(g.tail(parent).unwrap(), b);
    }

    #[test]
    fn test_none_init_fails_loudly() {
        let (g, [a, _, _, _]) = diamond();
        let mut walker = Walker::bfs().with_init(InitCode::None);
        assert_eq!(
            walker.run_from(&g, a, &mut ()),
            Err(GraphError::MissingVertexData(a))
        );
    }

    #[test]
    fn test_reset_reuses_state() {
        let (g, [a, _, _, d]) = diamond();
        let mut walker = Walker::bfs().with_init(InitCode::Create);
        walker.run_from(&g, a, &mut ()).unwrap();
        walker = Walker::bfs()
            .with_init(InitCode::Reset)
            .with_info(walker.into_info());
        walker.run_from(&g, d, &mut ()).unwrap();
        assert_eq!(walker.status(&g, d), Status::Finished);
        assert_eq!(walker.status(&g, a), Status::Unseen);
    }

    struct StopAt(VertexId, bool);

    impl<V, E> Visitor<V, E> for StopAt {
        fn discover(&mut self, _: &Digraph<V, E>, vertex: VertexId, _: &Annotation<WalkerInfo>) {
            if vertex == self.0 {
                self.1 = true;
            }
        }

        fn stop(&self) -> bool {
            self.1
        }
    }

    #[test]
    fn test_stop_prunes_queue() {
        let (g, [a, b, _, d]) = diamond();
        let mut walker = Walker::bfs();
        walker.run_from(&g, a, &mut StopAt(b, false)).unwrap();
        assert_eq!(walker.status(&g, d), Status::Unseen);
    }
}
