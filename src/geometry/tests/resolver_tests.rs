//! Tests for the pure bounds resolution functions.

use crate::geometry::{
    Configuration, DisplayFrames, Insets, MinimumDimensions, Orientation, Rect, ResolveRequest,
    ResolverPolicy, Rotation, ScreenLayout, ScreenSize, WindowingMode,
    adjust_for_minimal_dimensions, compute_fullscreen_bounds, dp_to_px, fit_within_bounds,
    intersect_with_insets_if_fits, px_to_dp, resolve_override_configuration, rotate_bounds,
};
use rstest::{fixture, rstest};

const PORTRAIT_DISPLAY: Rect = Rect::new(0, 0, 1000, 2000);

#[fixture]
fn parent() -> Configuration {
    Configuration {
        windowing_mode: WindowingMode::Fullscreen,
        bounds: PORTRAIT_DISPLAY,
        app_bounds: PORTRAIT_DISPLAY,
        rotation: Some(Rotation::Deg0),
        density_dpi: Some(160),
        screen_width_dp: Some(1000),
        screen_height_dp: Some(2000),
        smallest_screen_width_dp: Some(1000),
        orientation: Orientation::Portrait,
        screen_layout: Some(ScreenLayout::new(ScreenSize::Large, true)),
    }
}

fn display_with_status_bar() -> DisplayFrames {
    DisplayFrames {
        logical_width: 1000,
        logical_height: 2000,
        rotation: Rotation::Deg0,
        non_decor_insets: Insets::new(0, 0, 0, 100),
        stable_insets: Insets::new(0, 50, 0, 100),
    }
}

fn request<'a>(parent: &'a Configuration, requested: &'a Configuration) -> ResolveRequest<'a> {
    ResolveRequest {
        parent,
        requested,
        previous_bounds: Rect::EMPTY,
        min_dimensions: MinimumDimensions::default(),
        enforce_default_min_size: true,
        child_orientation: Orientation::Undefined,
        parent_handles_orientation: false,
        display: None,
    }
}

#[rstest]
#[case(Orientation::Undefined)]
#[case(Orientation::Portrait)]
fn fullscreen_bounds_fill_parent_without_conflicting_orientation(#[case] forced: Orientation) {
    let bounds = compute_fullscreen_bounds(PORTRAIT_DISPLAY, Orientation::Portrait, forced);
    assert!(bounds.is_empty());
}

#[test]
fn landscape_request_on_portrait_parent_is_letterboxed() {
    let bounds = compute_fullscreen_bounds(
        PORTRAIT_DISPLAY,
        Orientation::Portrait,
        Orientation::Landscape,
    );
    assert_eq!(bounds, Rect::new(0, 750, 1000, 1250));
}

#[test]
fn portrait_request_on_landscape_parent_is_pillarboxed() {
    let bounds = compute_fullscreen_bounds(
        Rect::new(0, 0, 2000, 1000),
        Orientation::Landscape,
        Orientation::Portrait,
    );
    assert_eq!(bounds, Rect::new(750, 0, 1250, 1000));
}

#[test]
fn minimal_width_grows_from_anchored_right_edge() {
    let bounds = adjust_for_minimal_dimensions(
        Rect::new(100, 100, 200, 200),
        Rect::new(50, 100, 200, 200),
        Some(PORTRAIT_DISPLAY),
        Some(300),
        None,
    );
    assert_eq!(bounds, Rect::new(-100, 100, 200, 200));
}

#[test]
fn minimal_size_grows_right_and_down_without_previous_bounds() {
    let bounds = adjust_for_minimal_dimensions(
        Rect::new(100, 100, 200, 200),
        Rect::EMPTY,
        Some(PORTRAIT_DISPLAY),
        Some(300),
        Some(250),
    );
    assert_eq!(bounds, Rect::new(100, 100, 400, 350));
}

#[test]
fn minimal_height_grows_from_anchored_bottom_edge() {
    let bounds = adjust_for_minimal_dimensions(
        Rect::new(0, 500, 400, 600),
        Rect::new(0, 400, 400, 600),
        Some(PORTRAIT_DISPLAY),
        None,
        Some(300),
    );
    assert_eq!(bounds, Rect::new(0, 300, 400, 600));
}

#[test]
fn empty_bounds_stay_empty_when_parent_is_large_enough() {
    let bounds = adjust_for_minimal_dimensions(
        Rect::EMPTY,
        Rect::EMPTY,
        Some(PORTRAIT_DISPLAY),
        Some(300),
        Some(300),
    );
    assert!(bounds.is_empty());
}

#[test]
fn empty_bounds_take_parent_size_when_parent_is_too_small() {
    let bounds = adjust_for_minimal_dimensions(
        Rect::EMPTY,
        Rect::EMPTY,
        Some(Rect::new(0, 0, 100, 100)),
        Some(200),
        Some(200),
    );
    assert_eq!(bounds, Rect::new(0, 0, 200, 200));
}

#[rstest]
#[case(Rect::new(-500, 100, -100, 300), Rect::new(-352, 100, 48, 300))]
#[case(Rect::new(990, 100, 1390, 300), Rect::new(952, 100, 1352, 300))]
#[case(Rect::new(100, 100, 400, 300), Rect::new(100, 100, 400, 300))]
fn fit_within_bounds_keeps_a_visible_margin(#[case] bounds: Rect, #[case] expected: Rect) {
    let fitted = fit_within_bounds(bounds, Rect::new(0, 0, 1000, 1000), 48, 32);
    assert_eq!(fitted, expected);
}

#[test]
fn insets_are_applied_on_sides_that_fit() {
    let insets = Insets::new(0, 50, 0, 100);
    let fitted = intersect_with_insets_if_fits(PORTRAIT_DISPLAY, PORTRAIT_DISPLAY, insets);
    assert_eq!(fitted, Rect::new(0, 50, 1000, 1900));
}

#[test]
fn insets_are_skipped_on_overhanging_sides() {
    let oversized = Rect::new(-10, -10, 1010, 2010);
    let fitted =
        intersect_with_insets_if_fits(oversized, PORTRAIT_DISPLAY, Insets::new(0, 50, 0, 100));
    assert_eq!(fitted, oversized);
}

#[test]
fn rotation_there_and_back_restores_bounds() {
    let original = Rect::new(100, 200, 300, 600);

    let turned = rotate_bounds(original, Rotation::Deg0, Rotation::Deg90, 2000, 1000);
    let restored = rotate_bounds(turned, Rotation::Deg90, Rotation::Deg0, 1000, 2000);

    assert_eq!(turned, Rect::new(1400, 100, 1800, 300));
    assert_eq!(restored, original);
}

#[test]
fn half_turn_mirrors_both_axes() {
    let turned = rotate_bounds(
        Rect::new(100, 200, 300, 600),
        Rotation::Deg0,
        Rotation::Deg180,
        1000,
        2000,
    );
    assert_eq!(turned, Rect::new(700, 1400, 900, 1800));
}

#[rstest]
#[case(220, 160, 220)]
#[case(220, 320, 440)]
#[case(48, 480, 144)]
fn dp_converts_to_pixels(#[case] dp: u32, #[case] density: u32, #[case] px: i32) {
    assert_eq!(dp_to_px(dp, density), px);
}

#[test]
fn pixels_convert_to_truncated_dp() {
    assert_eq!(px_to_dp(1080, 480), 360);
    assert_eq!(px_to_dp(-10, 160), 0);
}

#[rstest]
fn fullscreen_task_with_landscape_child_is_letterboxed(parent: Configuration) {
    let requested = Configuration::EMPTY;
    let mut input = request(&parent, &requested);
    input.child_orientation = Orientation::Landscape;

    let resolved = resolve_override_configuration(&input, &ResolverPolicy::default());

    assert_eq!(resolved.bounds, Rect::new(0, 750, 1000, 1250));
    assert_eq!(resolved.screen_width_dp, Some(1000));
    assert_eq!(resolved.screen_height_dp, Some(500));
    assert_eq!(resolved.orientation, Orientation::Landscape);
}

#[rstest]
fn fullscreen_task_inherits_parent_when_orientation_matches(parent: Configuration) {
    let requested = Configuration::EMPTY;
    let mut input = request(&parent, &requested);
    input.child_orientation = Orientation::Portrait;

    let resolved = resolve_override_configuration(&input, &ResolverPolicy::default());

    assert!(resolved.bounds.is_empty());
    assert_eq!(resolved.orientation, Orientation::Portrait);
    assert_eq!(resolved.screen_width_dp, Some(1000));
}

#[rstest]
fn parent_that_rotates_itself_suppresses_letterboxing(parent: Configuration) {
    let requested = Configuration::EMPTY;
    let mut input = request(&parent, &requested);
    input.child_orientation = Orientation::Landscape;
    input.parent_handles_orientation = true;

    let resolved = resolve_override_configuration(&input, &ResolverPolicy::default());

    assert!(resolved.bounds.is_empty());
}

#[rstest]
fn freeform_task_is_pulled_back_on_screen(parent: Configuration) {
    let freeform_parent = parent.with_windowing_mode(WindowingMode::Freeform);
    let requested = Configuration::EMPTY.with_bounds(Rect::new(-900, 500, -400, 900));
    let mut input = request(&freeform_parent, &requested);
    input.display = Some(display_with_status_bar());

    let resolved = resolve_override_configuration(&input, &ResolverPolicy::default());

    assert_eq!(resolved.bounds, Rect::new(-452, 500, 48, 900));
}

#[rstest]
fn freeform_task_is_never_pushed_above_stable_top(parent: Configuration) {
    let freeform_parent = parent.with_windowing_mode(WindowingMode::Freeform);
    let requested = Configuration::EMPTY.with_bounds(Rect::new(100, 0, 600, 400));
    let mut input = request(&freeform_parent, &requested);
    input.display = Some(display_with_status_bar());

    let resolved = resolve_override_configuration(&input, &ResolverPolicy::default());

    assert_eq!(resolved.bounds, Rect::new(100, 50, 600, 450));
    assert_eq!(resolved.smallest_screen_width_dp, Some(400));
}

#[rstest]
fn freeform_task_below_default_minimum_is_grown(parent: Configuration) {
    let freeform_parent = parent.with_windowing_mode(WindowingMode::Freeform);
    let requested = Configuration::EMPTY.with_bounds(Rect::new(100, 100, 200, 200));
    let input = request(&freeform_parent, &requested);

    let resolved = resolve_override_configuration(&input, &ResolverPolicy::default());

    assert_eq!(resolved.bounds, Rect::new(100, 100, 320, 320));
}

#[rstest]
fn stable_insets_reduce_screen_dp(parent: Configuration) {
    let requested = Configuration::EMPTY;
    let mut input = request(&parent, &requested);
    input.display = Some(display_with_status_bar());

    let resolved = resolve_override_configuration(&input, &ResolverPolicy::default());

    assert_eq!(resolved.screen_height_dp, Some(1850));
    assert_eq!(resolved.screen_width_dp, Some(1000));
}
