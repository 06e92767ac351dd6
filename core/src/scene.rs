//! Serialized scene description produced by the map build tool.
//!
//! Both trees arrive pre-built: every record carries its bounding box as
//! `[left, right, bottom, top]` and a `kind` tag. Edge and polygon leaves refer
//! to the flat vertex list by index.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Complete static description of a single map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Flat vertex list referenced by polygon and edge leaves.
    pub vertices: Vec<Vec2>,
    /// Hierarchy over render polygons.
    pub polygons: SceneNode,
    /// Hierarchy over collision edges and navigation rectangles.
    pub entities: SceneNode,
}

/// Single record of a serialized bounding-volume tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SceneNode {
    /// Inner node with exactly two children.
    Branch {
        /// Union of both children's boxes.
        bbox: [f32; 4],
        /// First child.
        sub1: Box<SceneNode>,
        /// Second child.
        sub2: Box<SceneNode>,
    },
    /// Triangle list rendered as part of the floor geometry.
    Polygon {
        /// Box enclosing every referenced vertex.
        bbox: [f32; 4],
        /// Vertex indices, three per triangle.
        value: Vec<u16>,
    },
    /// Collidable, shadow casting wall segment.
    Edge {
        /// Box enclosing both endpoints.
        bbox: [f32; 4],
        /// Indices of the two endpoints.
        value: [u32; 2],
    },
    /// Walkable rectangle that becomes a navigation cell.
    Rectangle {
        /// Extent of the walkable region.
        bbox: [f32; 4],
    },
}

impl SceneNode {
    /// Raw `[left, right, bottom, top]` box carried by the record.
    #[must_use]
    pub fn raw_bbox(&self) -> [f32; 4] {
        match self {
            Self::Branch { bbox, .. }
            | Self::Polygon { bbox, .. }
            | Self::Edge { bbox, .. }
            | Self::Rectangle { bbox } => *bbox,
        }
    }

    /// Bounding box carried by the record.
    #[must_use]
    pub fn bbox(&self) -> BoundingBox {
        let [left, right, bottom, top] = self.raw_bbox();
        BoundingBox::new(left, right, bottom, top)
    }

    /// Lower-case tag naming the record kind, as written in scene files.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Branch { .. } => "branch",
            Self::Polygon { .. } => "polygon",
            Self::Edge { .. } => "edge",
            Self::Rectangle { .. } => "rectangle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "vertices": [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0]],
        "polygons": {"kind": "polygon", "bbox": [0.0, 4.0, 0.0, 4.0], "value": [0, 1, 2]},
        "entities": {
            "kind": "branch",
            "bbox": [0.0, 4.0, 0.0, 4.0],
            "sub1": {"kind": "edge", "bbox": [0.0, 4.0, 0.0, 0.0], "value": [0, 1]},
            "sub2": {"kind": "rectangle", "bbox": [0.0, 4.0, 0.0, 4.0]}
        }
    }"#;

    #[test]
    fn parses_kind_tagged_records() {
        let scene: SceneDescription = serde_json::from_str(SCENE).expect("scene parses");

        assert_eq!(scene.vertices.len(), 3);
        assert_eq!(scene.vertices[2], Vec2::new(4.0, 4.0));
        assert_eq!(scene.polygons.kind(), "polygon");

        let SceneNode::Branch { sub1, sub2, .. } = &scene.entities else {
            panic!("entities root should be a branch");
        };
        assert_eq!(
            **sub1,
            SceneNode::Edge {
                bbox: [0.0, 4.0, 0.0, 0.0],
                value: [0, 1],
            }
        );
        assert_eq!(sub2.bbox(), BoundingBox::new(0.0, 4.0, 0.0, 4.0));
    }

    #[test]
    fn rejects_unknown_kind() {
        let raw = r#"{"kind": "portal", "bbox": [0.0, 1.0, 0.0, 1.0]}"#;
        assert!(serde_json::from_str::<SceneNode>(raw).is_err());
    }

    #[test]
    fn rejects_branch_without_children() {
        let raw = r#"{"kind": "branch", "bbox": [0.0, 1.0, 0.0, 1.0]}"#;
        assert!(serde_json::from_str::<SceneNode>(raw).is_err());
    }
}
