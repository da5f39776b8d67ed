#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn start_is_zero_length() {
    let m = Measurement::start(10.0, 20.0).unwrap();
    assert_eq!(m.start, m.end);
    assert_eq!(m.distance, 0.0);
}

#[test]
fn update_recomputes_from_start() {
    let mut m = Measurement::start(0.0, 0.0).unwrap();
    m.update(30.0, 40.0).unwrap();
    assert_eq!(m.distance, 50.0);
    m.update(0.0, 10.0).unwrap();
    assert_eq!(m.distance, 10.0);
    assert_eq!(m.start, Point::new(0.0, 0.0));
}

#[test]
fn diagonal_is_straight_line_not_grid_steps() {
    let mut m = Measurement::start(0.0, 0.0).unwrap();
    m.update(60.0, 60.0).unwrap();
    assert!((m.distance_in_cells(60.0) - std::f64::consts::SQRT_2).abs() < 1e-12);
}

#[test]
fn rejects_nan() {
    assert!(Measurement::start(f64::NAN, 0.0).is_err());
    let mut m = Measurement::start(0.0, 0.0).unwrap();
    assert!(m.update(0.0, f64::NAN).is_err());
    assert_eq!(m.distance, 0.0);
}
