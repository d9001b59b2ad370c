use plotkit_designer::{Millimeters, Point, Workspace};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_clamp_is_idempotent(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        width in 20.0f64..400.0,
        height in 20.0f64..400.0,
        margin in 0.0f64..9.0,
    ) {
        let workspace = Workspace::new(width, height, margin).unwrap();
        let once = workspace.clamp(Point::<Millimeters>::new(x, y));
        let twice = workspace.clamp(once);
        prop_assert_eq!(once, twice);

        prop_assert!(once.x >= margin && once.x <= width - margin);
        prop_assert!(once.y >= margin && once.y <= height - margin);
    }
}

#[test]
fn test_clamped_point_converts_back() {
    let workspace = Workspace::default();
    let p = workspace.clamp(Point::<Millimeters>::new(200.0, 1.0));
    assert_eq!(p.unclamped(), Point::<Millimeters>::new(145.0, 5.0));
}
