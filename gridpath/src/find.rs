use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    fmt::{Debug, Display},
};

use log::{debug, trace};
use serde::Serialize;

use crate::{
    config::{Policy, SearchConfig},
    cost::Step,
    error::{GridError, Result},
};

/// Supertrait that collects all the requirements on the NodeReference values
/// Must be copy, comparable and not references (hence 'static)
pub trait NodeReference: Copy + Eq + Debug + 'static {}

pub trait MapTrait {
    /// The type that can be used to reference nodes in the map
    type Reference: NodeReference;

    /// The type that the map uses for storage
    type Storage<T: Default + Copy + Clone + 'static>: MapStorage<T, Reference = Self::Reference>;

    /// Fails with `OutOfBounds` if the node is not part of the map
    fn validate(&self, node: Self::Reference) -> Result<()>;

    /// Return an iterator over the passable neighbors of the provided node and the kind of step
    /// needed to go there
    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = (Self::Reference, Step)>;

    /// Row and column distance between two nodes, used by the heuristic
    fn distance(&self, from: Self::Reference, to: Self::Reference) -> (usize, usize);

    /// Create a storage for values of type T
    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T>;
}

pub trait MapStorage<T> {
    type Reference: NodeReference;

    fn is_valid(&self, node: Self::Reference) -> bool;
    /// Number of slots, one per node of the map
    fn len(&self) -> usize;
    fn get(&self, node: Self::Reference) -> T;
    fn get_mut(&mut self, node: Self::Reference) -> &mut T;
}

/// Scratch storage of a search over the map `M`
pub type SearchStorage<M> =
    <M as MapTrait>::Storage<SearchNode<<M as MapTrait>::Reference>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeStatus {
    #[default]
    Unseen,
    /// on the frontier
    Open,
    /// expanded
    Closed,
}

/// Per-node search state, kept outside the map so the map is never written to
#[derive(Clone, Copy, Debug)]
pub struct SearchNode<R> {
    pub g: usize,
    pub h: usize,
    pub parent: Option<R>,
    pub status: NodeStatus,
    /// discovery order, used to break ties on the frontier
    order: usize,
    /// `f` as recorded by the legacy policy: the value `g + h` had before the last write, so 0
    /// for a node that was never updated after its discovery
    recorded_f: usize,
}

impl<R> Default for SearchNode<R> {
    fn default() -> Self {
        SearchNode {
            g: 0,
            h: 0,
            parent: None,
            status: NodeStatus::Unseen,
            order: 0,
            recorded_f: 0,
        }
    }
}

impl<R> SearchNode<R> {
    pub fn f(&self) -> usize {
        self.g.saturating_add(self.h)
    }
}

impl<R> Display for SearchNode<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            NodeStatus::Unseen => write!(f, "{:>4} ", ""),
            _ => write!(f, "{:04} ", self.g),
        }
    }
}

/// The objects that we store in the priority queue
#[derive(Debug)]
struct ToVisit<R> {
    key: usize,
    order: usize,
    point: R,
}

impl<R> Ord for ToVisit<R> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // reverse for BinaryHeap to be a min-heap, earlier discoveries first on equal keys
        (self.key, self.order)
            .cmp(&(other.key, other.order))
            .reverse()
    }
}

impl<R> PartialOrd for ToVisit<R> {
    fn partial_cmp(&self, other: &ToVisit<R>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R> PartialEq for ToVisit<R> {
    fn eq(&self, other: &ToVisit<R>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<R> Eq for ToVisit<R> {}

#[derive(Debug, PartialEq, Clone, Eq, Serialize)]
pub struct PathResult<R> {
    /// From start to goal, both included
    pub path: Vec<R>,
    pub start: R,
    pub goal: R,
    pub total_cost: usize,
    /// Number of nodes moved to the visited set
    pub expanded: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState<R> {
    Computing,
    NoPathFound,
    PathFound(PathResult<R>),
}

impl<R> PathFinderState<R> {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }
}

/// A single best-first search from `start` to `goal`.
///
/// The frontier holds the discovered nodes that still have to be expanded, the storage marks
/// which ones are already visited. Each call to [`PathFinder::step`] expands one node.
pub struct PathFinder<M: MapTrait> {
    start: M::Reference,
    goal: M::Reference,
    config: SearchConfig,
    visited: SearchStorage<M>,
    visit_list: BinaryHeap<ToVisit<M::Reference>>,
    discovered: usize,
    expanded: usize,
    state: PathFinderState<M::Reference>,
}

impl<M: MapTrait> PathFinder<M> {
    pub fn new(
        map: &M,
        start: M::Reference,
        goal: M::Reference,
        config: SearchConfig,
    ) -> Result<Self> {
        map.validate(start)?;
        map.validate(goal)?;

        let mut visited = map.create_storage::<SearchNode<M::Reference>>();
        *visited.get_mut(start) = SearchNode {
            status: NodeStatus::Open,
            ..Default::default()
        };

        Ok(Self {
            start,
            goal,
            config,
            visited,
            visit_list: BinaryHeap::from([ToVisit {
                key: 0,
                order: 0,
                point: start,
            }]),
            discovered: 1,
            expanded: 0,
            state: PathFinderState::Computing,
        })
    }

    pub fn finish(mut self, map: &M) -> Result<(PathFinderState<M::Reference>, SearchStorage<M>)> {
        loop {
            match self.step(map)? {
                PathFinderState::Computing => {}
                s => return Ok((s, self.visited)),
            }
        }
    }

    pub fn step(&mut self, map: &M) -> Result<PathFinderState<M::Reference>> {
        if self.state.is_done() {
            return Ok(self.state.clone());
        }

        let Some(current) = self.pop() else {
            debug!(
                "frontier exhausted after {} expansions, no path to {:?}",
                self.expanded, self.goal
            );
            self.state = PathFinderState::NoPathFound;
            return Ok(self.state.clone());
        };

        self.expand(map, current);

        if current == self.goal {
            let path = reconstruct_path(&self.visited, self.start, self.goal)?;
            let total_cost = self.visited.get(self.goal).g;
            debug!(
                "found goal {:?}: cost={} steps={} expanded={}",
                self.goal,
                total_cost,
                path.len() - 1,
                self.expanded
            );

            self.state = PathFinderState::PathFound(PathResult {
                path,
                start: self.start,
                goal: self.goal,
                total_cost,
                expanded: self.expanded,
            });
        }

        Ok(self.state.clone())
    }

    /// Remove the most promising node from the frontier
    fn pop(&mut self) -> Option<M::Reference> {
        while let Some(visit) = self.visit_list.pop() {
            let node = self.visited.get(visit.point);
            // entries left behind by a cost update or an earlier pop
            if node.status != NodeStatus::Open || self.key(&node) != visit.key {
                continue;
            }
            return Some(visit.point);
        }
        None
    }

    fn push(&mut self, point: M::Reference) {
        let node = self.visited.get(point);
        self.visit_list.push(ToVisit {
            key: self.key(&node),
            order: node.order,
            point,
        });
    }

    fn key(&self, node: &SearchNode<M::Reference>) -> usize {
        match self.config.policy {
            Policy::Standard => node.f(),
            Policy::Legacy => node.g,
        }
    }

    /// Discover or update every passable neighbor of `current`, then close it
    fn expand(&mut self, map: &M, current: M::Reference) {
        let node = self.visited.get(current);
        trace!("expanding {:?}: g={} h={}", current, node.g, node.h);

        for (point, step) in map.neighbors_of(current) {
            let neighbor = self.visited.get(point);
            let g = self.config.costs.advance(node.g, step);

            match neighbor.status {
                NodeStatus::Closed => continue,
                NodeStatus::Unseen => {
                    let (d_row, d_col) = map.distance(point, self.goal);
                    *self.visited.get_mut(point) = SearchNode {
                        g,
                        h: self
                            .config
                            .heuristic
                            .estimate(d_row, d_col, &self.config.costs),
                        parent: Some(current),
                        status: NodeStatus::Open,
                        order: self.discovered,
                        recorded_f: neighbor.f(),
                    };
                    self.discovered += 1;
                }
                NodeStatus::Open => {
                    let improves = match self.config.policy {
                        Policy::Standard => g < neighbor.g,
                        // compares the neighbor as it stands against the recorded f of the
                        // current node, which stays 0 until that node has been updated
                        Policy::Legacy => neighbor.f() < node.recorded_f,
                    };
                    if !improves {
                        continue;
                    }
                    let slot = self.visited.get_mut(point);
                    slot.g = g;
                    slot.parent = Some(current);
                    slot.recorded_f = neighbor.f();
                }
            }

            self.push(point);
        }

        self.visited.get_mut(current).status = NodeStatus::Closed;
        self.expanded += 1;
    }

    pub fn state(&self) -> &PathFinderState<M::Reference> {
        &self.state
    }

    pub fn get_visited(&self) -> &SearchStorage<M> {
        &self.visited
    }

    pub fn start(&self) -> M::Reference {
        self.start
    }

    pub fn goal(&self) -> M::Reference {
        self.goal
    }
}

/// Walk the parent links back from `goal` and return the path from `start` to `goal`.
///
/// A chain that ends before reaching `start`, or that is longer than the map has nodes, is
/// reported as `BrokenPath`.
pub fn reconstruct_path<R, S>(visited: &S, start: R, goal: R) -> Result<Vec<R>>
where
    R: NodeReference,
    S: MapStorage<SearchNode<R>, Reference = R>,
{
    let mut path = vec![goal];
    let mut current = goal;

    while current != start {
        if !visited.is_valid(current) || path.len() > visited.len() {
            return Err(GridError::BrokenPath {
                at: format!("{:?}", current),
            });
        }
        current = visited
            .get(current)
            .parent
            .ok_or_else(|| GridError::BrokenPath {
                at: format!("{:?}", current),
            })?;
        path.push(current);
    }

    path.reverse();
    Ok(path)
}

/// Run a complete search. Never returns [`PathFinderState::Computing`].
pub fn find_path<M: MapTrait>(
    map: &M,
    start: M::Reference,
    goal: M::Reference,
    config: &SearchConfig,
) -> Result<PathFinderState<M::Reference>> {
    debug!(
        "searching {:?} -> {:?} ({:?}, {} heuristic)",
        start, goal, config.policy, config.heuristic
    );
    let (state, _) = PathFinder::new(map, start, goal, *config)?.finish(map)?;
    Ok(state)
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::cost::Heuristic;
    use crate::grid::{field_from_ascii, Field, Point, Terrain};

    fn create_basic_map() -> Field {
        field_from_ascii(&[
            "#######", //
            "#.###.#", //
            "#.###.#", //
            "#.#...#", //
            "#.#.###", //
            "#......", //
            "#######",
        ])
    }

    fn octile() -> SearchConfig {
        SearchConfig {
            heuristic: Heuristic::Octile,
            ..Default::default()
        }
    }

    fn found(state: PathFinderState<Point>) -> PathResult<Point> {
        match state {
            PathFinderState::PathFound(result) => result,
            s => panic!("expected a path, got {:?}", s),
        }
    }

    fn assert_connected(path: &[Point]) {
        for pair in path.windows(2) {
            let (d_row, d_col) = pair[0].distance(pair[1]);
            assert!(d_row <= 1 && d_col <= 1 && (d_row, d_col) != (0, 0));
        }
    }

    #[test]
    fn test_start_is_goal() {
        let map = Field::filled(1, 1, Terrain::Land).unwrap();
        let p = Point::new(0, 0);

        for config in [SearchConfig::default(), SearchConfig::legacy()] {
            let result = found(find_path(&map, p, p, &config).unwrap());
            assert_eq!(result.path, vec![p]);
            assert_eq!(result.total_cost, 0);
            assert_eq!(result.expanded, 1);
        }
    }

    #[test]
    fn test_diagonal_route() {
        let map = Field::filled(3, 3, Terrain::Land).unwrap();
        let expected = vec![Point::new(0, 0), Point::new(1, 1), Point::new(2, 2)];

        let result = found(
            find_path(&map, Point::new(0, 0), Point::new(2, 2), &SearchConfig::default()).unwrap(),
        );
        assert_eq!(result.path, expected);
        assert_eq!(result.total_cost, 28);
        assert_eq!(result.expanded, 3);

        // lowest-g selection sweeps the whole field before reaching the corner
        let result = found(
            find_path(&map, Point::new(0, 0), Point::new(2, 2), &SearchConfig::legacy()).unwrap(),
        );
        assert_eq!(result.path, expected);
        assert_eq!(result.total_cost, 28);
        assert_eq!(result.expanded, 9);
    }

    #[test]
    fn test_enclosed_goal() {
        let map = field_from_ascii(&[
            ".....", //
            ".###.", //
            ".#.#.", //
            ".###.", //
            ".....",
        ]);

        for config in [SearchConfig::default(), SearchConfig::legacy(), octile()] {
            assert_eq!(
                find_path(&map, Point::new(0, 0), Point::new(2, 2), &config),
                Ok(PathFinderState::NoPathFound)
            );
        }
    }

    #[test]
    fn test_blocked_corner() {
        let map = field_from_ascii(&[
            ".#.", //
            "#..", //
            "...",
        ]);

        for config in [SearchConfig::default(), SearchConfig::legacy()] {
            let (state, visited) = PathFinder::new(&map, Point::new(0, 0), Point::new(2, 2), config)
                .unwrap()
                .finish(&map)
                .unwrap();
            assert_eq!(state, PathFinderState::NoPathFound);
            assert_eq!(visited.get(Point::new(1, 1)).status, NodeStatus::Unseen);
        }
    }

    #[test]
    fn test_basic_route() {
        let map = create_basic_map();

        for config in [SearchConfig::default(), SearchConfig::legacy(), octile()] {
            let result = found(
                find_path(&map, Point::new(1, 1), Point::new(1, 5), &config).unwrap(),
            );
            // every diagonal in the corridor would cut a wall corner
            assert_eq!(result.total_cost, 120);
            assert_eq!(result.path.len(), 13);
            assert_eq!(result.path.first(), Some(&Point::new(1, 1)));
            assert_eq!(result.path.last(), Some(&Point::new(1, 5)));
            assert_connected(&result.path);
        }
    }

    #[test]
    fn test_basic_no_route() {
        let map = create_basic_map();

        // no route to target
        assert_eq!(
            find_path(&map, Point::new(1, 1), Point::new(0, 5), &SearchConfig::default()),
            Ok(PathFinderState::NoPathFound)
        );
    }

    #[test]
    fn test_basic_shortcut() {
        let map = create_basic_map()
            .with_terrain(Terrain::Land, [Point::new(3, 2)])
            .unwrap();

        let expected = vec![
            Point::new(1, 1),
            Point::new(2, 1),
            Point::new(3, 1),
            Point::new(3, 2),
            Point::new(3, 3),
            Point::new(3, 4),
            Point::new(3, 5),
            Point::new(2, 5),
            Point::new(1, 5),
        ];

        for config in [octile(), SearchConfig::legacy()] {
            let result = found(find_path(&map, Point::new(1, 1), Point::new(1, 5), &config).unwrap());
            assert_eq!(result.path, expected);
            assert_eq!(result.total_cost, 80);
        }
    }

    #[test]
    fn test_legacy_keeps_first_parent() {
        let map = field_from_ascii(&[
            "#####", //
            "#...#", //
            "#...#", //
            "#...#", //
            "#####",
        ]);

        // (2, 1) is first reached straight from the start and never re-parented
        let result = found(
            find_path(&map, Point::new(1, 1), Point::new(2, 1), &SearchConfig::legacy()).unwrap(),
        );
        assert_eq!(result.path, vec![Point::new(1, 1), Point::new(2, 1)]);
        assert_eq!(result.total_cost, 10);

        let map = Field::filled(12, 12, Terrain::Land).unwrap();
        let result = found(
            find_path(&map, Point::new(0, 0), Point::new(1, 0), &SearchConfig::legacy()).unwrap(),
        );
        assert_eq!(result.path, vec![Point::new(0, 0), Point::new(1, 0)]);
        assert_eq!(result.total_cost, 10);
    }

    #[test]
    fn test_open_field_step_count() {
        let map = Field::filled(6, 8, Terrain::Land).unwrap();

        let result = found(find_path(&map, Point::new(0, 0), Point::new(3, 7), &octile()).unwrap());
        // three diagonal steps and four straight ones
        assert_eq!(result.path.len() - 1, 7);
        assert_eq!(result.total_cost, 82);
        assert_connected(&result.path);

        let result = found(find_path(&map, Point::new(5, 1), Point::new(1, 5), &octile()).unwrap());
        assert_eq!(
            result.path,
            (0..5)
                .map(|i| Point::new(5 - i, 1 + i))
                .collect::<Vec<_>>()
        );
        assert_eq!(result.total_cost, 56);
    }

    #[test]
    fn test_repeatable() {
        let make = || {
            field_from_ascii(&[
                "..........", //
                "..#####...", //
                "......#...", //
                ".####.#.#.", //
                "......#.#.", //
                "..........",
            ])
        };

        for config in [SearchConfig::default(), SearchConfig::legacy(), octile()] {
            let first = find_path(&make(), Point::new(0, 0), Point::new(4, 7), &config).unwrap();
            let second = find_path(&make(), Point::new(0, 0), Point::new(4, 7), &config).unwrap();
            assert!(matches!(first, PathFinderState::PathFound(_)));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_map_is_reusable() {
        let map = create_basic_map();
        let config = SearchConfig::default();

        let there = found(find_path(&map, Point::new(1, 1), Point::new(1, 5), &config).unwrap());
        let back = found(find_path(&map, Point::new(1, 5), Point::new(1, 1), &config).unwrap());
        assert_eq!(there.total_cost, back.total_cost);
        assert_eq!(
            there.path,
            back.path.iter().rev().copied().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_stepping() {
        let map = Field::filled(3, 3, Terrain::Land).unwrap();
        let mut finder =
            PathFinder::new(&map, Point::new(0, 0), Point::new(2, 2), SearchConfig::default())
                .unwrap();

        assert_eq!(finder.step(&map), Ok(PathFinderState::Computing));
        assert_eq!(finder.get_visited().get(Point::new(0, 0)).status, NodeStatus::Closed);
        assert_eq!(finder.get_visited().get(Point::new(1, 1)).status, NodeStatus::Open);
        assert_eq!(finder.get_visited().get(Point::new(1, 1)).f(), 34);

        assert_eq!(finder.step(&map), Ok(PathFinderState::Computing));
        let done = finder.step(&map).unwrap();
        assert!(done.is_done());

        // further steps keep reporting the result
        assert_eq!(finder.step(&map), Ok(done.clone()));
        assert_eq!(finder.state(), &done);
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let map = Field::filled(3, 3, Terrain::Land).unwrap();

        assert!(matches!(
            find_path(&map, Point::new(3, 0), Point::new(0, 0), &SearchConfig::default()),
            Err(GridError::OutOfBounds { .. })
        ));
        assert!(matches!(
            PathFinder::new(&map, Point::new(0, 0), Point::new(0, 9), SearchConfig::default()),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_broken_parent_chain() {
        let map = Field::filled(2, 2, Terrain::Land).unwrap();
        let (a, b, start) = (Point::new(1, 0), Point::new(1, 1), Point::new(0, 0));

        let mut visited = map.create_storage::<SearchNode<Point>>();
        assert!(matches!(
            reconstruct_path(&visited, start, a),
            Err(GridError::BrokenPath { .. })
        ));

        visited.get_mut(a).parent = Some(b);
        visited.get_mut(b).parent = Some(a);
        assert!(matches!(
            reconstruct_path(&visited, start, a),
            Err(GridError::BrokenPath { .. })
        ));

        visited.get_mut(b).parent = Some(start);
        assert_eq!(reconstruct_path(&visited, start, a), Ok(vec![start, b, a]));
    }
}
