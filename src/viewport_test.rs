#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- defaults ---

#[test]
fn default_is_identity() {
    let vp = Viewport::default();
    assert_eq!(vp.pan_x, 0.0);
    assert_eq!(vp.pan_y, 0.0);
    assert_eq!(vp.scale, 1.0);
}

// --- zoom ---

#[test]
fn zoom_in_multiplies_by_step() {
    let mut vp = Viewport::default();
    vp.zoom_in();
    assert!(approx_eq(vp.scale, 1.2));
}

#[test]
fn zoom_out_divides_by_step() {
    let mut vp = Viewport::default();
    vp.zoom_out();
    assert!(approx_eq(vp.scale, 1.0 / 1.2));
}

#[test]
fn zoom_in_clamps_at_max() {
    let mut vp = Viewport::default();
    for _ in 0..50 {
        vp.zoom_in();
    }
    assert_eq!(vp.scale, MAX_SCALE);
}

#[test]
fn zoom_out_clamps_at_min() {
    let mut vp = Viewport::default();
    for _ in 0..50 {
        vp.zoom_out();
    }
    assert_eq!(vp.scale, MIN_SCALE);
}

#[test]
fn set_scale_clamps_and_validates() {
    let mut vp = Viewport::default();
    vp.set_scale(10.0).unwrap();
    assert_eq!(vp.scale, 4.0);
    vp.set_scale(0.01).unwrap();
    assert_eq!(vp.scale, 0.25);
    assert!(vp.set_scale(f64::NAN).is_err());
    assert!(vp.set_scale(0.0).is_err());
    assert_eq!(vp.scale, 0.25);
}

// --- pan ---

#[test]
fn set_pan_rejects_nan_without_partial_update() {
    let mut vp = Viewport::default();
    assert!(vp.set_pan(f64::NAN, 5.0).is_err());
    assert_eq!(vp.pan_y, 0.0);
}

#[test]
fn pan_by_accumulates() {
    let mut vp = Viewport::default();
    vp.pan_by(10.0, -5.0).unwrap();
    vp.pan_by(2.5, 1.0).unwrap();
    assert!(approx_eq(vp.pan_x, 12.5));
    assert!(approx_eq(vp.pan_y, -4.0));
}

#[test]
fn reset_restores_default() {
    let mut vp = Viewport { pan_x: 3.0, pan_y: 4.0, scale: 2.0 };
    vp.reset();
    assert_eq!(vp, Viewport::default());
}

// --- center_on ---

#[test]
fn center_on_maps_target_to_canvas_center() {
    let mut vp = Viewport { pan_x: 0.0, pan_y: 0.0, scale: 2.0 };
    let target = Point::new(150.0, 90.0);
    vp.center_on(target);
    let screen = vp.canvas_to_screen(target);
    assert!(point_approx_eq(screen, Point::new(400.0, 300.0)));
}

#[test]
fn center_on_at_unit_scale() {
    let mut vp = Viewport::default();
    vp.center_on(Point::new(100.0, 100.0));
    assert!(approx_eq(vp.pan_x, 300.0));
    assert!(approx_eq(vp.pan_y, 200.0));
}

// --- conversions ---

#[test]
fn screen_canvas_round_trip() {
    let vp = Viewport { pan_x: 37.0, pan_y: -12.0, scale: 1.7 };
    let p = Point::new(123.4, 56.7);
    assert!(point_approx_eq(vp.screen_to_canvas(vp.canvas_to_screen(p)), p));
}

#[test]
fn set_pan_with_bad_y_leaves_x_untouched() {
    let mut vp = Viewport::default();
    assert!(vp.set_pan(5.0, f64::INFINITY).is_err());
    assert_eq!(vp.pan_x, 0.0);
}
