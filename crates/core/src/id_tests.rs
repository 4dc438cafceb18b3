// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn display_matches_integer() {
    let id = TaskId::new(42);
    assert_eq!(id.to_string(), "42");
    assert_eq!(id.get(), 42);
}

#[test]
fn ordering_is_numeric() {
    let a = TaskId::new(2);
    let b = TaskId::new(10);
    assert!(a < b, "numeric ordering must not be lexicographic");
}

#[test]
fn round_trips_through_json() {
    let id = LaunchId::new(7);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "7");
    let back: LaunchId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn distinct_types_do_not_mix() {
    // Compile-time guarantee only; this just exercises both constructors.
    let t = TaskId::new(1);
    let l = LaunchId::new(1);
    assert_eq!(t.get(), l.get());
}
