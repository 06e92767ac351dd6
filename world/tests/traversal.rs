use glam::Vec2;
use umbra_core::{
    scene::{SceneDescription, SceneNode},
    BoundingBox,
};
use umbra_world::{query, Leaf, Map, Region};

fn raw(bbox: BoundingBox) -> [f32; 4] {
    [bbox.left(), bbox.right(), bbox.bottom(), bbox.top()]
}

fn balanced(mut leaves: Vec<SceneNode>) -> SceneNode {
    if leaves.len() == 1 {
        return leaves.remove(0);
    }
    let second = leaves.split_off(leaves.len() / 2);
    let sub1 = balanced(leaves);
    let sub2 = balanced(second);
    let bbox = sub1.bbox().union(&sub2.bbox());
    SceneNode::Branch {
        bbox: raw(bbox),
        sub1: Box::new(sub1),
        sub2: Box::new(sub2),
    }
}

/// Rooms on a jittered grid, each bordered by a wall along its bottom edge.
fn scene() -> SceneDescription {
    let mut vertices = Vec::new();
    let mut leaves = Vec::new();
    for row in 0..6 {
        for column in 0..7 {
            let jitter = ((row * 7 + column) % 5) as f32 * 0.3;
            let left = column as f32 * 4.0 - jitter;
            let bottom = row as f32 * 3.0 + jitter * 0.5;
            let cell = BoundingBox::new(left, left + 4.5, bottom, bottom + 3.4);
            leaves.push(SceneNode::Rectangle { bbox: raw(cell) });

            let index = vertices.len() as u32;
            vertices.push(Vec2::new(cell.left(), cell.bottom()));
            vertices.push(Vec2::new(cell.right(), cell.bottom()));
            leaves.push(SceneNode::Edge {
                bbox: [cell.left(), cell.right(), cell.bottom(), cell.bottom()],
                value: [index, index + 1],
            });
        }
    }

    SceneDescription {
        polygons: SceneNode::Polygon {
            bbox: [0.0, 1.0, 0.0, 1.0],
            value: vec![0, 1, 2],
        },
        vertices,
        entities: balanced(leaves),
    }
}

fn collect(map: &Map, region: Region) -> Vec<[u32; 4]> {
    let mut visited = Vec::new();
    query::entity_tree(map).traverse(region, &mut |leaf| {
        visited.push(raw(leaf.bbox()).map(f32::to_bits));
    });
    visited.sort_unstable();
    visited
}

#[test]
fn bounded_traversal_matches_brute_force_filter() {
    let map = Map::from_scene(&scene()).expect("scene loads");

    let mut all = Vec::new();
    query::entity_tree(&map).traverse(Region::All, &mut |leaf| all.push(leaf.bbox()));
    assert_eq!(all.len(), 84);

    let queries = [
        BoundingBox::new(-5.0, 50.0, -5.0, 50.0),
        BoundingBox::new(3.0, 9.0, 2.0, 7.5),
        BoundingBox::new(12.0, 12.0, 6.1, 6.1),
        BoundingBox::new(100.0, 110.0, 0.0, 5.0),
        BoundingBox::new(0.0, 28.0, 4.0, 4.2),
        BoundingBox::new(7.9, 8.1, -1.0, 20.0),
    ];

    for query in queries {
        let mut expected: Vec<[u32; 4]> = all
            .iter()
            .filter(|bbox| bbox.intersects(&query))
            .map(|bbox| raw(*bbox).map(f32::to_bits))
            .collect();
        expected.sort_unstable();

        assert_eq!(collect(&map, Region::Within(query)), expected, "query {query:?}");
    }
}

#[test]
fn shadow_casters_are_culled_to_view() {
    let map = Map::from_scene(&scene()).expect("scene loads");
    let mut casters = Vec::new();

    query::shadow_casters(&map, BoundingBox::new(1.0, 3.0, 1.0, 2.0), &mut casters);
    assert!(casters.is_empty());

    query::shadow_casters(&map, BoundingBox::new(-5.0, 50.0, -5.0, 50.0), &mut casters);
    assert_eq!(casters.len(), 42);
}

#[test]
fn potential_colliders_grow_with_motion() {
    let map = Map::from_scene(&scene()).expect("scene loads");
    let mut still = Vec::new();
    let mut moving = Vec::new();

    let start = Vec2::new(10.0, 10.0);
    query::potential_colliders(&map, start, Vec2::ZERO, 0.5, &mut still);
    query::potential_colliders(&map, start, Vec2::new(6.0, 0.0), 0.5, &mut moving);

    assert!(moving.len() > still.len());
    for segment in &still {
        assert!(moving.contains(segment));
    }
}

#[test]
fn leaves_carry_the_kind_they_were_loaded_as() {
    let map = Map::from_scene(&scene()).expect("scene loads");
    let mut cells = 0;
    let mut edges = 0;
    query::entity_tree(&map).traverse(Region::All, &mut |leaf| match leaf {
        Leaf::Cell { .. } => cells += 1,
        Leaf::Edge { .. } => edges += 1,
        Leaf::Polygon { .. } => panic!("polygons live in the polygon tree"),
    });
    assert_eq!((cells, edges), (42, 42));
}
