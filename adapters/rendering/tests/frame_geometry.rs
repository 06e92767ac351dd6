use glam::Vec2;
use umbra_rendering::{Camera, FrameGeometry};
use umbra_world::Map;

const DOORWAY: &str = include_str!("../../../demos/doorway.json");

#[test]
fn west_room_view_skips_east_geometry() {
    let map = Map::from_json_str(DOORWAY).expect("doorway scene loads");
    let mut camera = Camera::new(6.0, 6.0);
    camera.set_position(Vec2::new(4.0, 5.0));
    let mut frame = FrameGeometry::new();

    frame.collect(&map, &camera);

    assert_eq!(frame.indices(), &[0, 4, 7, 0, 7, 3]);
    assert_eq!(frame.triangle_count(), 2);
    // No wall reaches into [1, 7] x [2, 8].
    assert!(frame.shadow_casters().is_empty());
}

#[test]
fn wide_view_collects_everything() {
    let map = Map::from_json_str(DOORWAY).expect("doorway scene loads");
    let mut camera = Camera::new(40.0, 40.0);
    camera.set_position(Vec2::new(10.0, 5.0));
    let mut frame = FrameGeometry::new();

    frame.collect(&map, &camera);

    assert_eq!(frame.triangle_count(), 4);
    assert_eq!(frame.shadow_casters().len(), 6);
    assert_eq!(frame.view(), Some(camera.bounding_box()));
}

#[test]
fn buffers_are_refilled_not_appended() {
    let map = Map::from_json_str(DOORWAY).expect("doorway scene loads");
    let mut camera = Camera::new(40.0, 40.0);
    camera.set_position(Vec2::new(10.0, 5.0));
    let mut frame = FrameGeometry::new();

    frame.collect(&map, &camera);
    frame.collect(&map, &camera);
    assert_eq!(frame.triangle_count(), 4);

    camera.set_position(Vec2::new(100.0, 100.0));
    frame.collect(&map, &camera);
    assert!(frame.indices().is_empty());
    assert!(frame.shadow_casters().is_empty());
}

#[test]
fn following_camera_sees_the_divider_ahead() {
    let map = Map::from_json_str(DOORWAY).expect("doorway scene loads");
    let mut camera = Camera::new(9.0, 9.0);
    // Looking east: screen up points along +x.
    camera.set_angle(-std::f32::consts::FRAC_PI_2);
    camera.follow(Vec2::new(7.0, 5.0));
    let mut frame = FrameGeometry::new();

    frame.collect(&map, &camera);

    assert!(camera.position().abs_diff_eq(Vec2::new(10.5, 5.0), 1e-5));
    assert!(frame
        .shadow_casters()
        .iter()
        .any(|segment| segment.pt1.x == 10.0 && segment.pt2.x == 10.0));
}
