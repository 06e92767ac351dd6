#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative static map state for Umbra.
//!
//! A [`Map`] owns the vertex list, the polygon and entity hierarchies, and the
//! navigation graph built from the entity tree's walkable rectangles. Systems
//! and adapters read it through the [`query`] module; the only mutation after
//! loading is the per-query path scratch written by
//! [`Map::construct_path_ending_at`].

pub mod navigation;
pub mod tree;

use std::fmt;

use glam::Vec2;
use thiserror::Error;
use tracing::debug;
use umbra_core::{scene::SceneDescription, BoundingBox};

pub use navigation::{NavCellId, NavNode, NavigationGraph, Overlap, OverlapId, PathSummary};
pub use tree::{Leaf, NodeId, Region, SpatialNode, SpatialTree};

/// Identifies which of the two map hierarchies a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeKind {
    /// Render polygons.
    Polygons,
    /// Collision edges and navigation rectangles.
    Entities,
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polygons => f.write_str("polygon"),
            Self::Entities => f.write_str("entity"),
        }
    }
}

/// Failures raised while turning a scene description into a [`Map`].
#[derive(Debug, Error)]
pub enum SceneError {
    /// The JSON document did not match the scene schema.
    #[error("failed to parse scene description")]
    Parse(#[from] serde_json::Error),
    /// A record carried a box whose edges are out of order.
    #[error("{kind} record has malformed bounding box {bbox:?}")]
    MalformedBoundingBox {
        /// Tag of the offending record.
        kind: &'static str,
        /// Box as written in the scene.
        bbox: [f32; 4],
    },
    /// A branch box does not enclose one of its children.
    #[error("branch {branch:?} does not enclose child {child:?}")]
    BranchDoesNotEnclose {
        /// Box of the branch.
        branch: [f32; 4],
        /// Box of the escaping child.
        child: [f32; 4],
    },
    /// A leaf referenced a vertex that does not exist.
    #[error("vertex index {index} is out of range for {vertex_count} vertices")]
    VertexOutOfRange {
        /// Referenced index.
        index: u32,
        /// Length of the vertex list.
        vertex_count: usize,
    },
    /// A polygon's index list is not a whole number of triangles.
    #[error("polygon index list of length {len} is not a triangle list")]
    InvalidTriangleList {
        /// Number of indices in the list.
        len: usize,
    },
    /// A leaf appeared in the hierarchy that cannot hold it.
    #[error("{kind} record cannot appear in the {tree} tree")]
    UnexpectedLeaf {
        /// Tree being built.
        tree: TreeKind,
        /// Tag of the offending record.
        kind: &'static str,
    },
    /// The scene holds more records than node identifiers can address.
    #[error("scene holds more nodes than can be addressed")]
    TooManyNodes,
}

/// Static geometry of a loaded map together with its navigation graph.
#[derive(Clone, Debug)]
pub struct Map {
    vertices: Vec<Vec2>,
    polygons: SpatialTree,
    entities: SpatialTree,
    navigation: NavigationGraph,
    sources: Vec<NavCellId>,
}

impl Map {
    /// Builds both hierarchies and the navigation graph from a parsed scene.
    pub fn from_scene(scene: &SceneDescription) -> Result<Self, SceneError> {
        let mut cells = Vec::new();
        let polygons = SpatialTree::from_scene(
            TreeKind::Polygons,
            &scene.polygons,
            &scene.vertices,
            &mut cells,
        )?;
        let entities = SpatialTree::from_scene(
            TreeKind::Entities,
            &scene.entities,
            &scene.vertices,
            &mut cells,
        )?;
        let navigation = NavigationGraph::build(&cells)?;

        debug!(
            vertices = scene.vertices.len(),
            polygon_nodes = polygons.len(),
            entity_nodes = entities.len(),
            cells = navigation.len(),
            overlaps = navigation.overlaps().len(),
            "map loaded"
        );

        Ok(Self {
            vertices: scene.vertices.clone(),
            polygons,
            entities,
            navigation,
            sources: Vec::new(),
        })
    }

    /// Parses a JSON scene description and builds the map from it.
    pub fn from_json_str(raw: &str) -> Result<Self, SceneError> {
        let scene: SceneDescription = serde_json::from_str(raw)?;
        Self::from_scene(&scene)
    }

    /// Rebuilds the path scratch so every reachable cell leads toward `target`.
    ///
    /// Positions outside every walkable cell seed nothing, leaving the whole
    /// graph unreachable until the next query.
    pub fn construct_path_ending_at(&mut self, target: Vec2) -> PathSummary {
        let mut sources = std::mem::take(&mut self.sources);
        query::cells_containing(self, target, &mut sources);
        let summary = self.navigation.construct_path_ending_at(target, &sources);
        self.sources = sources;

        debug!(
            query = self.navigation.query_id(),
            x = target.x,
            y = target.y,
            sources = summary.sources,
            reached = summary.reached,
            "path rebuilt"
        );
        summary
    }

    /// Point an agent of `radius` standing at `start` should steer toward.
    ///
    /// `scratch` receives the cells containing `start`; callers keep it
    /// between steps to avoid reallocating.
    #[must_use]
    pub fn move_target_from_path(
        &self,
        start: Vec2,
        radius: f32,
        scratch: &mut Vec<NavCellId>,
    ) -> Option<Vec2> {
        query::cells_containing(self, start, scratch);
        self.navigation.move_target_from_path(start, radius, scratch)
    }

    /// Union of the boxes of both tree roots.
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        let polygons = self.polygons.node(self.polygons.root()).bbox();
        let entities = self.entities.node(self.entities.root()).bbox();
        polygons.union(&entities)
    }
}

/// Read-only views over a [`Map`].
pub mod query {
    use glam::Vec2;
    use umbra_core::{BoundingBox, Segment};

    use super::{Leaf, Map, NavCellId, NavigationGraph, Region, SpatialTree};

    /// Flat vertex list indexed by polygon leaves.
    #[must_use]
    pub fn vertices(map: &Map) -> &[Vec2] {
        &map.vertices
    }

    /// Hierarchy over render polygons.
    #[must_use]
    pub fn polygon_tree(map: &Map) -> &SpatialTree {
        &map.polygons
    }

    /// Hierarchy over collision edges and walkable cells.
    #[must_use]
    pub fn entity_tree(map: &Map) -> &SpatialTree {
        &map.entities
    }

    /// Navigation graph and its current path scratch.
    #[must_use]
    pub fn navigation(map: &Map) -> &NavigationGraph {
        &map.navigation
    }

    /// Calls `visit` with the triangle list of every polygon intersecting `view`.
    pub fn for_each_visible_polygon<F>(map: &Map, view: BoundingBox, mut visit: F)
    where
        F: FnMut(&[u16]),
    {
        map.polygons.traverse(Region::Within(view), &mut |leaf| {
            if let Leaf::Polygon { indices, .. } = leaf {
                visit(indices);
            }
        });
    }

    /// Replaces `out` with the concatenated triangle lists of polygons intersecting `view`.
    pub fn visible_polygons(map: &Map, view: BoundingBox, out: &mut Vec<u16>) {
        out.clear();
        for_each_visible_polygon(map, view, |indices| out.extend_from_slice(indices));
    }

    /// Replaces `out` with the edges intersecting `view`.
    pub fn shadow_casters(map: &Map, view: BoundingBox, out: &mut Vec<Segment>) {
        out.clear();
        edges_within(map, view, out);
    }

    /// Replaces `out` with every edge an agent of `radius` moving by `delta`
    /// from `start` could touch.
    pub fn potential_colliders(
        map: &Map,
        start: Vec2,
        delta: Vec2,
        radius: f32,
        out: &mut Vec<Segment>,
    ) {
        out.clear();
        let reach = BoundingBox::from_point_and_distance(start, radius + delta.length());
        edges_within(map, reach, out);
    }

    /// Replaces `out` with the cells whose interior contains `point`.
    pub fn cells_containing(map: &Map, point: Vec2, out: &mut Vec<NavCellId>) {
        out.clear();
        let probe = BoundingBox::from_point_and_distance(point, 0.0);
        map.entities.traverse(Region::Within(probe), &mut |leaf| {
            if let Leaf::Cell { cell, .. } = leaf {
                out.push(cell);
            }
        });
    }

    fn edges_within(map: &Map, region: BoundingBox, out: &mut Vec<Segment>) {
        map.entities.traverse(Region::Within(region), &mut |leaf| {
            if let Leaf::Edge { segment, .. } = leaf {
                out.push(*segment);
            }
        });
    }

    /// Structural totals of a loaded map.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MapStats {
        /// Entries in the vertex list.
        pub vertices: usize,
        /// Nodes of the polygon tree, branches included.
        pub polygon_nodes: usize,
        /// Depth of the polygon tree.
        pub polygon_depth: usize,
        /// Render polygons.
        pub polygons: usize,
        /// Triangles across all render polygons.
        pub triangles: usize,
        /// Nodes of the entity tree, branches included.
        pub entity_nodes: usize,
        /// Depth of the entity tree.
        pub entity_depth: usize,
        /// Collision edges.
        pub edges: usize,
        /// Degenerate collision edges.
        pub degenerate_edges: usize,
        /// Walkable cells.
        pub cells: usize,
        /// Overlaps joining adjacent cells.
        pub overlaps: usize,
    }

    /// Counts the contents of both trees and the navigation graph.
    #[must_use]
    pub fn stats(map: &Map) -> MapStats {
        let mut stats = MapStats {
            vertices: map.vertices.len(),
            polygon_nodes: map.polygons.len(),
            polygon_depth: map.polygons.depth(),
            entity_nodes: map.entities.len(),
            entity_depth: map.entities.depth(),
            cells: map.navigation.len(),
            overlaps: map.navigation.overlaps().len(),
            ..MapStats::default()
        };

        map.polygons.traverse(Region::All, &mut |leaf| {
            if let Leaf::Polygon { indices, .. } = leaf {
                stats.polygons += 1;
                stats.triangles += indices.len() / 3;
            }
        });
        map.entities.traverse(Region::All, &mut |leaf| {
            if let Leaf::Edge { segment, .. } = leaf {
                stats.edges += 1;
                if segment.is_degenerate() {
                    stats.degenerate_edges += 1;
                }
            }
        });

        stats
    }
}
