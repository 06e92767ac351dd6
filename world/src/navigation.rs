//! Navigation graph over overlapping walkable rectangles.
//!
//! Cells sharing a region of positive area are connected through an
//! [`Overlap`]. Paths are never materialised: a query floods the graph from
//! the cells containing the target, and agents later read the next doorway to
//! head for from the cell they stand in.

use std::{cmp::Ordering, collections::BinaryHeap};

use glam::Vec2;
use umbra_core::BoundingBox;

use crate::SceneError;

/// Identifier of a navigation cell, assigned in scene order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavCellId(u32);

impl NavCellId {
    /// Creates a new cell identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of an [`Overlap`] within the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlapId(u32);

impl OverlapId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shared region of two adjacent cells; an undirected edge of the graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    region: BoundingBox,
    center: Vec2,
    cells: [NavCellId; 2],
}

impl Overlap {
    /// Intersection of the two cells.
    #[must_use]
    pub const fn region(&self) -> BoundingBox {
        self.region
    }

    /// Midpoint of the intersection; path lengths are measured between these.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// The two cells joined by the overlap.
    #[must_use]
    pub const fn cells(&self) -> [NavCellId; 2] {
        self.cells
    }
}

#[derive(Clone, Copy, Debug)]
struct NavLink {
    neighbor: NavCellId,
    overlap: OverlapId,
}

/// Per-query scratch, valid only while `visited_query` matches the graph's counter.
#[derive(Clone, Copy, Debug)]
struct PathState {
    visited_query: u64,
    length: f32,
    via: Option<OverlapId>,
}

/// Navigation view of a walkable rectangle.
#[derive(Clone, Debug)]
pub struct NavNode {
    bbox: BoundingBox,
    links: Vec<NavLink>,
    path: PathState,
}

impl NavNode {
    /// Extent of the cell.
    #[must_use]
    pub const fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Adjacent cells, index-aligned with [`NavNode::overlaps`].
    pub fn neighbors(&self) -> impl Iterator<Item = NavCellId> + '_ {
        self.links.iter().map(|link| link.neighbor)
    }

    /// Overlaps shared with each neighbor.
    pub fn overlaps(&self) -> impl Iterator<Item = OverlapId> + '_ {
        self.links.iter().map(|link| link.overlap)
    }
}

/// Totals reported after flooding the graph for a new target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathSummary {
    /// Cells containing the target.
    pub sources: usize,
    /// Cells tagged with a path length during the query.
    pub reached: usize,
    /// Frontier entries expanded, stale ones excluded.
    pub expanded: usize,
}

/// Graph of walkable cells with incremental multi-source Dijkstra.
#[derive(Clone, Debug, Default)]
pub struct NavigationGraph {
    nodes: Vec<NavNode>,
    overlaps: Vec<Overlap>,
    query_id: u64,
    path_end: Vec2,
    frontier: BinaryHeap<FrontierEntry>,
}

impl NavigationGraph {
    /// Connects every pair of intersecting cells.
    ///
    /// `cells[i]` is the box of cell `i`. Pairs are tested exhaustively, which
    /// is acceptable for the small, static cell counts of a map.
    pub fn build(cells: &[BoundingBox]) -> Result<Self, SceneError> {
        let mut nodes: Vec<NavNode> = cells
            .iter()
            .map(|bbox| NavNode {
                bbox: *bbox,
                links: Vec::new(),
                path: PathState {
                    visited_query: 0,
                    length: 0.0,
                    via: None,
                },
            })
            .collect();
        let mut overlaps = Vec::new();

        for first in 0..cells.len() {
            for second in (first + 1)..cells.len() {
                let Some(region) = cells[first].intersection(&cells[second]) else {
                    continue;
                };

                let first_id = NavCellId(index_u32(first)?);
                let second_id = NavCellId(index_u32(second)?);
                let overlap = OverlapId(index_u32(overlaps.len())?);
                overlaps.push(Overlap {
                    region,
                    center: region.center(),
                    cells: [first_id, second_id],
                });
                nodes[first].links.push(NavLink {
                    neighbor: second_id,
                    overlap,
                });
                nodes[second].links.push(NavLink {
                    neighbor: first_id,
                    overlap,
                });
            }
        }

        Ok(Self {
            nodes,
            overlaps,
            ..Self::default()
        })
    }

    /// Number of cells in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the map declared no walkable cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node backing `cell`.
    #[must_use]
    pub fn node(&self, cell: NavCellId) -> &NavNode {
        &self.nodes[cell.index()]
    }

    /// Every overlap created while building the graph.
    #[must_use]
    pub fn overlaps(&self) -> &[Overlap] {
        &self.overlaps
    }

    /// Overlap stored under `id`.
    #[must_use]
    pub fn overlap(&self, id: OverlapId) -> &Overlap {
        &self.overlaps[id.index()]
    }

    /// Identifier of the most recent path query; zero before the first one.
    #[must_use]
    pub const fn query_id(&self) -> u64 {
        self.query_id
    }

    /// Target of the most recent path query.
    #[must_use]
    pub const fn path_end(&self) -> Vec2 {
        self.path_end
    }

    /// Path length from `cell` to the current target, if the last query reached it.
    #[must_use]
    pub fn path_length(&self, cell: NavCellId) -> Option<f32> {
        let node = self.nodes.get(cell.index())?;
        (node.path.visited_query == self.query_id && self.query_id != 0)
            .then_some(node.path.length)
    }

    /// Doorway `cell` should leave through, if the last query reached it.
    ///
    /// `None` is also returned for the cells containing the target itself.
    #[must_use]
    pub fn path_overlap(&self, cell: NavCellId) -> Option<&Overlap> {
        let node = self.nodes.get(cell.index())?;
        if node.path.visited_query != self.query_id || self.query_id == 0 {
            return None;
        }
        node.path.via.map(|overlap| self.overlap(overlap))
    }

    /// Floods the graph outward from `sources`, the cells containing `target`.
    ///
    /// Path length accumulates between consecutive overlap centers, starting
    /// from `target` itself, so agents favour straight lines through doorways.
    /// Only the cells reached by this query are touched; everything else is
    /// invalidated by bumping the query counter.
    pub fn construct_path_ending_at(&mut self, target: Vec2, sources: &[NavCellId]) -> PathSummary {
        self.query_id += 1;
        self.path_end = target;
        self.frontier.clear();

        let query_id = self.query_id;
        let mut summary = PathSummary::default();

        for &source in sources {
            let Some(node) = self.nodes.get_mut(source.index()) else {
                continue;
            };
            if node.path.visited_query == query_id {
                continue;
            }
            node.path = PathState {
                visited_query: query_id,
                length: 0.0,
                via: None,
            };
            summary.sources += 1;
            summary.reached += 1;
            self.frontier.push(FrontierEntry {
                length: 0.0,
                cell: source,
            });
        }

        while let Some(entry) = self.frontier.pop() {
            let current = self.nodes[entry.cell.index()].path;
            if entry.length > current.length {
                continue;
            }
            summary.expanded += 1;

            let origin = match current.via {
                Some(overlap) => self.overlaps[overlap.index()].center,
                None => target,
            };

            for index in 0..self.nodes[entry.cell.index()].links.len() {
                let link = self.nodes[entry.cell.index()].links[index];
                let doorway = self.overlaps[link.overlap.index()].center;
                let length = current.length + origin.distance(doorway);

                let neighbor = &mut self.nodes[link.neighbor.index()];
                let first_visit = neighbor.path.visited_query != query_id;
                if first_visit || length < neighbor.path.length {
                    if first_visit {
                        summary.reached += 1;
                    }
                    neighbor.path = PathState {
                        visited_query: query_id,
                        length,
                        via: Some(link.overlap),
                    };
                    self.frontier.push(FrontierEntry {
                        length,
                        cell: link.neighbor,
                    });
                }
            }
        }

        summary
    }

    /// Point an agent standing at `start` should head for to follow the current path.
    ///
    /// `candidates` are the cells containing `start`. The reached candidate
    /// with the shortest path wins, ties going to the lowest cell id. Agents
    /// inside a target cell head straight for the target; everyone else heads
    /// for the doorway, keeping `2 * radius` clear of its corners when it is
    /// wide enough and aiming at its center otherwise.
    #[must_use]
    pub fn move_target_from_path(
        &self,
        start: Vec2,
        radius: f32,
        candidates: &[NavCellId],
    ) -> Option<Vec2> {
        let mut best: Option<(NavCellId, f32)> = None;
        for &cell in candidates {
            let Some(length) = self.path_length(cell) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((best_cell, best_length)) => {
                    length < best_length || (length == best_length && cell < best_cell)
                }
            };
            if better {
                best = Some((cell, length));
            }
        }

        let (cell, _) = best?;
        let Some(overlap) = self.path_overlap(cell) else {
            return Some(self.path_end);
        };

        let region = overlap.region();
        let margin = radius * 2.0;
        let mut waypoint = overlap.center();
        if region.width() > margin * 2.0 {
            waypoint.x = start
                .x
                .max(region.left() + margin)
                .min(region.right() - margin);
        }
        if region.height() > margin * 2.0 {
            waypoint.y = start
                .y
                .max(region.bottom() + margin)
                .min(region.top() - margin);
        }
        Some(waypoint)
    }
}

fn index_u32(index: usize) -> Result<u32, SceneError> {
    u32::try_from(index).map_err(|_| SceneError::TooManyNodes)
}

/// Min-heap entry: shorter paths first, lower cell ids breaking ties.
#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    length: f32,
    cell: NavCellId,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .length
            .total_cmp(&self.length)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}
