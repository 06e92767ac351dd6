//! Static bounding-volume hierarchy over map geometry.

use glam::Vec2;
use tracing::warn;
use umbra_core::{scene::SceneNode, BoundingBox, Segment};

use crate::{navigation::NavCellId, SceneError, TreeKind};

/// Index of a node within a [`SpatialTree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Single node of the hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub enum SpatialNode {
    /// Inner node whose box encloses both children.
    Branch {
        /// Union of the children's boxes.
        bbox: BoundingBox,
        /// First child.
        sub1: NodeId,
        /// Second child.
        sub2: NodeId,
    },
    /// Render polygon stored as a triangle list.
    Polygon {
        /// Box enclosing the referenced vertices.
        bbox: BoundingBox,
        /// Vertex indices, three per triangle.
        indices: Vec<u16>,
    },
    /// Collidable, shadow casting wall.
    Edge {
        /// Box enclosing both endpoints.
        bbox: BoundingBox,
        /// Wall geometry.
        segment: Segment,
    },
    /// Walkable rectangle registered with the navigation graph.
    Cell {
        /// Extent of the walkable region.
        bbox: BoundingBox,
        /// Navigation graph node backing the rectangle.
        cell: NavCellId,
    },
}

impl SpatialNode {
    /// Bounding box of the node regardless of its variant.
    #[must_use]
    pub fn bbox(&self) -> BoundingBox {
        match self {
            Self::Branch { bbox, .. }
            | Self::Polygon { bbox, .. }
            | Self::Edge { bbox, .. }
            | Self::Cell { bbox, .. } => *bbox,
        }
    }

    fn as_leaf(&self) -> Option<Leaf<'_>> {
        match self {
            Self::Branch { .. } => None,
            Self::Polygon { bbox, indices } => Some(Leaf::Polygon {
                bbox: *bbox,
                indices,
            }),
            Self::Edge { bbox, segment } => Some(Leaf::Edge {
                bbox: *bbox,
                segment,
            }),
            Self::Cell { bbox, cell } => Some(Leaf::Cell {
                bbox: *bbox,
                cell: *cell,
            }),
        }
    }
}

/// Borrowed view of a leaf handed to traversal visitors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Leaf<'a> {
    /// Render polygon.
    Polygon {
        /// Box enclosing the polygon.
        bbox: BoundingBox,
        /// Vertex indices, three per triangle.
        indices: &'a [u16],
    },
    /// Collision and shadow edge.
    Edge {
        /// Box enclosing the edge.
        bbox: BoundingBox,
        /// Wall geometry.
        segment: &'a Segment,
    },
    /// Navigation cell.
    Cell {
        /// Extent of the cell.
        bbox: BoundingBox,
        /// Navigation graph node backing the cell.
        cell: NavCellId,
    },
}

impl Leaf<'_> {
    /// Bounding box of the leaf.
    #[must_use]
    pub fn bbox(&self) -> BoundingBox {
        match self {
            Self::Polygon { bbox, .. } | Self::Edge { bbox, .. } | Self::Cell { bbox, .. } => {
                *bbox
            }
        }
    }
}

/// Region restricting which leaves a traversal visits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Region {
    /// Every leaf under the starting node.
    All,
    /// Leaves whose box intersects the provided box.
    Within(BoundingBox),
}

/// Immutable hierarchy of bounding boxes stored in a flat arena.
#[derive(Clone, Debug)]
pub struct SpatialTree {
    nodes: Vec<SpatialNode>,
    root: NodeId,
}

impl SpatialTree {
    /// Root node of the hierarchy.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Node stored under `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SpatialNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes, branches included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Trees always hold at least the root record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of branches on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth_from(self.root)
    }

    fn depth_from(&self, id: NodeId) -> usize {
        match self.node(id) {
            SpatialNode::Branch { sub1, sub2, .. } => {
                1 + self.depth_from(*sub1).max(self.depth_from(*sub2))
            }
            _ => 0,
        }
    }

    /// Visits every leaf of the tree that falls within `region`.
    pub fn traverse<'a, F>(&'a self, region: Region, visit: &mut F)
    where
        F: FnMut(Leaf<'a>),
    {
        self.traverse_from(self.root, region, visit);
    }

    /// Visits every leaf under `start` that falls within `region`.
    ///
    /// Leaves are visited when their box intersects the query box. Subtrees
    /// lying strictly inside the query are enumerated without further
    /// clipping; a subtree touching the query border is still clipped, since
    /// flat leaves on that border do not intersect.
    pub fn traverse_from<'a, F>(&'a self, start: NodeId, region: Region, visit: &mut F)
    where
        F: FnMut(Leaf<'a>),
    {
        match region {
            Region::All => self.visit_all(start, visit),
            Region::Within(query) => self.visit_child(start, &query, visit),
        }
    }

    fn visit_child<'a, F>(&'a self, id: NodeId, query: &BoundingBox, visit: &mut F)
    where
        F: FnMut(Leaf<'a>),
    {
        let bbox = self.node(id).bbox();
        if !bbox.intersects(query) {
            return;
        }

        if bbox.is_strictly_inside(query) {
            self.visit_all(id, visit);
        } else {
            self.visit_within(id, query, visit);
        }
    }

    fn visit_within<'a, F>(&'a self, id: NodeId, query: &BoundingBox, visit: &mut F)
    where
        F: FnMut(Leaf<'a>),
    {
        let node = self.node(id);
        match node {
            SpatialNode::Branch { sub1, sub2, .. } => {
                self.visit_child(*sub1, query, visit);
                self.visit_child(*sub2, query, visit);
            }
            _ => {
                if let Some(leaf) = node.as_leaf() {
                    visit(leaf);
                }
            }
        }
    }

    fn visit_all<'a, F>(&'a self, id: NodeId, visit: &mut F)
    where
        F: FnMut(Leaf<'a>),
    {
        let node = self.node(id);
        match node {
            SpatialNode::Branch { sub1, sub2, .. } => {
                self.visit_all(*sub1, visit);
                self.visit_all(*sub2, visit);
            }
            _ => {
                if let Some(leaf) = node.as_leaf() {
                    visit(leaf);
                }
            }
        }
    }

    /// Builds the arena from a serialized tree.
    ///
    /// Navigation rectangles are numbered in the order they are met and their
    /// boxes appended to `cells`, so `cells[id]` describes cell `id`.
    pub(crate) fn from_scene(
        kind: TreeKind,
        root: &SceneNode,
        vertices: &[Vec2],
        cells: &mut Vec<BoundingBox>,
    ) -> Result<Self, SceneError> {
        let mut builder = TreeBuilder {
            kind,
            vertices,
            cells,
            nodes: Vec::new(),
        };
        let root = builder.push(root)?;
        Ok(Self {
            nodes: builder.nodes,
            root,
        })
    }
}

struct TreeBuilder<'a> {
    kind: TreeKind,
    vertices: &'a [Vec2],
    cells: &'a mut Vec<BoundingBox>,
    nodes: Vec<SpatialNode>,
}

impl TreeBuilder<'_> {
    fn push(&mut self, record: &SceneNode) -> Result<NodeId, SceneError> {
        let bbox = record.bbox();
        if !bbox.is_well_formed() {
            return Err(SceneError::MalformedBoundingBox {
                kind: record.kind(),
                bbox: record.raw_bbox(),
            });
        }

        let node = match record {
            SceneNode::Branch { sub1, sub2, .. } => {
                let first = self.push(sub1)?;
                let second = self.push(sub2)?;
                for child in [first, second] {
                    let child_bbox = self.nodes[child.index()].bbox();
                    if !child_bbox.is_contained_in(&bbox) {
                        return Err(SceneError::BranchDoesNotEnclose {
                            branch: record.raw_bbox(),
                            child: [
                                child_bbox.left(),
                                child_bbox.right(),
                                child_bbox.bottom(),
                                child_bbox.top(),
                            ],
                        });
                    }
                }
                SpatialNode::Branch {
                    bbox,
                    sub1: first,
                    sub2: second,
                }
            }
            SceneNode::Polygon { value, .. } => {
                self.expect_kind(TreeKind::Polygons, record)?;
                if value.len() % 3 != 0 {
                    return Err(SceneError::InvalidTriangleList { len: value.len() });
                }
                for &index in value {
                    let _ = self.vertex(u32::from(index))?;
                }
                SpatialNode::Polygon {
                    bbox,
                    indices: value.clone(),
                }
            }
            SceneNode::Edge { value, .. } => {
                self.expect_kind(TreeKind::Entities, record)?;
                let segment = Segment::new(self.vertex(value[0])?, self.vertex(value[1])?);
                if segment.is_degenerate() {
                    warn!(
                        vertex = value[0],
                        "edge endpoints coincide; it will collide as a point and never slide"
                    );
                }
                SpatialNode::Edge { bbox, segment }
            }
            SceneNode::Rectangle { .. } => {
                self.expect_kind(TreeKind::Entities, record)?;
                let cell = NavCellId::new(
                    u32::try_from(self.cells.len()).map_err(|_| SceneError::TooManyNodes)?,
                );
                self.cells.push(bbox);
                SpatialNode::Cell { bbox, cell }
            }
        };

        let id = NodeId(u32::try_from(self.nodes.len()).map_err(|_| SceneError::TooManyNodes)?);
        self.nodes.push(node);
        Ok(id)
    }

    fn expect_kind(&self, expected: TreeKind, record: &SceneNode) -> Result<(), SceneError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(SceneError::UnexpectedLeaf {
                tree: self.kind,
                kind: record.kind(),
            })
        }
    }

    fn vertex(&self, index: u32) -> Result<Vec2, SceneError> {
        usize::try_from(index)
            .ok()
            .and_then(|offset| self.vertices.get(offset).copied())
            .ok_or(SceneError::VertexOutOfRange {
                index,
                vertex_count: self.vertices.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f32, right: f32, bottom: f32, top: f32) -> SceneNode {
        SceneNode::Rectangle {
            bbox: [left, right, bottom, top],
        }
    }

    fn branch(sub1: SceneNode, sub2: SceneNode) -> SceneNode {
        let bbox = sub1.bbox().union(&sub2.bbox());
        SceneNode::Branch {
            bbox: [bbox.left(), bbox.right(), bbox.bottom(), bbox.top()],
            sub1: Box::new(sub1),
            sub2: Box::new(sub2),
        }
    }

    fn build(root: &SceneNode) -> (SpatialTree, Vec<BoundingBox>) {
        let mut cells = Vec::new();
        let tree = SpatialTree::from_scene(TreeKind::Entities, root, &[], &mut cells)
            .expect("tree builds");
        (tree, cells)
    }

    fn visited_cells(tree: &SpatialTree, region: Region) -> Vec<u32> {
        let mut visited = Vec::new();
        tree.traverse(region, &mut |leaf| {
            if let Leaf::Cell { cell, .. } = leaf {
                visited.push(cell.get());
            }
        });
        visited.sort_unstable();
        visited
    }

    #[test]
    fn cells_are_numbered_in_scene_order() {
        let root = branch(rect(0.0, 1.0, 0.0, 1.0), rect(2.0, 3.0, 0.0, 1.0));
        let (tree, cells) = build(&root);

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1], BoundingBox::new(2.0, 3.0, 0.0, 1.0));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.depth(), 1);
        assert!(matches!(tree.node(tree.root()), SpatialNode::Branch { .. }));
    }

    #[test]
    fn unbounded_traversal_visits_every_leaf() {
        let root = branch(
            branch(rect(0.0, 1.0, 0.0, 1.0), rect(2.0, 3.0, 0.0, 1.0)),
            rect(5.0, 6.0, 5.0, 6.0),
        );
        let (tree, _) = build(&root);
        assert_eq!(visited_cells(&tree, Region::All), vec![0, 1, 2]);
    }

    #[test]
    fn bounded_traversal_culls_distant_leaves() {
        let root = branch(
            branch(rect(0.0, 1.0, 0.0, 1.0), rect(2.0, 3.0, 0.0, 1.0)),
            rect(5.0, 6.0, 5.0, 6.0),
        );
        let (tree, _) = build(&root);

        let query = BoundingBox::new(0.5, 2.5, 0.5, 0.6);
        assert_eq!(visited_cells(&tree, Region::Within(query)), vec![0, 1]);

        let nothing = BoundingBox::new(10.0, 11.0, 10.0, 11.0);
        assert!(visited_cells(&tree, Region::Within(nothing)).is_empty());
    }

    #[test]
    fn root_leaf_is_clipped_like_any_other_leaf() {
        let root = rect(0.0, 1.0, 0.0, 1.0);
        let (tree, _) = build(&root);

        let far = BoundingBox::new(4.0, 5.0, 4.0, 5.0);
        assert!(visited_cells(&tree, Region::Within(far)).is_empty());
        let near = BoundingBox::new(0.5, 5.0, 0.5, 5.0);
        assert_eq!(visited_cells(&tree, Region::Within(near)), vec![0]);
    }

    #[test]
    fn flat_leaf_on_query_border_is_skipped() {
        let vertices = [Vec2::new(0.0, 2.0), Vec2::new(0.0, 8.0)];
        let root = branch(
            SceneNode::Edge {
                bbox: [0.0, 0.0, 2.0, 8.0],
                value: [0, 1],
            },
            rect(0.0, 4.0, 1.0, 9.0),
        );
        let mut cells = Vec::new();
        let tree = SpatialTree::from_scene(TreeKind::Entities, &root, &vertices, &mut cells)
            .expect("tree builds");

        let query = BoundingBox::new(0.0, 5.0, 0.0, 10.0);
        let mut edges = 0;
        let mut cells_seen = 0;
        tree.traverse(Region::Within(query), &mut |leaf| match leaf {
            Leaf::Edge { .. } => edges += 1,
            Leaf::Cell { .. } => cells_seen += 1,
            Leaf::Polygon { .. } => {}
        });
        assert_eq!(edges, 0);
        assert_eq!(cells_seen, 1);
    }

    #[test]
    fn rejects_branch_that_does_not_enclose_children() {
        let root = SceneNode::Branch {
            bbox: [0.0, 1.0, 0.0, 1.0],
            sub1: Box::new(rect(0.0, 1.0, 0.0, 1.0)),
            sub2: Box::new(rect(0.0, 2.0, 0.0, 1.0)),
        };
        let mut cells = Vec::new();
        let error = SpatialTree::from_scene(TreeKind::Entities, &root, &[], &mut cells)
            .expect_err("branch must enclose children");
        assert!(matches!(error, SceneError::BranchDoesNotEnclose { .. }));
    }

    #[test]
    fn rejects_inverted_bounding_box() {
        let root = rect(1.0, 0.0, 0.0, 1.0);
        let mut cells = Vec::new();
        let error = SpatialTree::from_scene(TreeKind::Entities, &root, &[], &mut cells)
            .expect_err("inverted box is malformed");
        assert!(matches!(
            error,
            SceneError::MalformedBoundingBox {
                kind: "rectangle",
                ..
            }
        ));
    }

    #[test]
    fn rejects_leaves_of_the_wrong_tree() {
        let mut cells = Vec::new();
        let error =
            SpatialTree::from_scene(TreeKind::Polygons, &rect(0.0, 1.0, 0.0, 1.0), &[], &mut cells)
                .expect_err("rectangles belong to the entity tree");
        assert!(matches!(
            error,
            SceneError::UnexpectedLeaf {
                tree: TreeKind::Polygons,
                kind: "rectangle"
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_edge_vertex() {
        let vertices = [Vec2::ZERO];
        let edge = SceneNode::Edge {
            bbox: [0.0, 0.0, 0.0, 0.0],
            value: [0, 3],
        };
        let mut cells = Vec::new();
        let error = SpatialTree::from_scene(TreeKind::Entities, &edge, &vertices, &mut cells)
            .expect_err("vertex 3 does not exist");
        assert_eq!(
            error.to_string(),
            SceneError::VertexOutOfRange {
                index: 3,
                vertex_count: 1
            }
            .to_string()
        );
    }
}
