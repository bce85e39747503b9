use fieldroute_core::{
    AddressCandidate, Coordinates, GeocodedStop, MapViewConfig, MarkerManager,
    NavigationController, RecordingMapSurface, Route, RouteSignature, SourceKind,
};
use std::rc::Rc;

fn located(candidate: AddressCandidate, lat: f64, lng: f64) -> GeocodedStop {
    let mut stop = GeocodedStop::from_candidate(candidate);
    stop.coordinates = Some(Coordinates::new(lat, lng));
    stop
}

fn three_stop_route() -> Rc<Route> {
    let stops = vec![
        located(AddressCandidate::start("100 Main St"), 1.0, 1.0),
        located(AddressCandidate::new("200 Oak Ave", SourceKind::Manual), 2.0, 2.0),
        located(AddressCandidate::new("300 Elm St", SourceKind::Manual), 3.0, 3.0),
    ];
    let signature = RouteSignature::from_texts(stops.iter().map(GeocodedStop::text));
    Rc::new(Route::new(stops, signature).unwrap())
}

fn displayed(route: &Route) -> MarkerManager<RecordingMapSurface> {
    let mut markers = MarkerManager::new(RecordingMapSurface::new(), MapViewConfig::default());
    markers.display_route(route);
    markers
}

#[test]
fn start_highlights_first_stop_and_fits_once() {
    let route = three_stop_route();
    let mut markers = displayed(&route);
    let zooms_before = markers.surface().zoom_changes();
    let mut navigation = NavigationController::new();

    navigation.start_navigation(Rc::clone(&route), &mut markers);

    assert_eq!(navigation.current_index(), Some(0));
    assert_eq!(markers.active_index(), Some(0));
    assert_eq!(markers.surface().zoom_changes(), zooms_before + 1);
    assert_eq!(navigation.progress().as_deref(), Some("1 / 3"));
    assert_eq!(
        navigation.current_stop().map(GeocodedStop::text),
        Some("100 Main St")
    );
}

#[test]
fn stepping_pans_without_changing_zoom() {
    let route = three_stop_route();
    let mut markers = displayed(&route);
    let mut navigation = NavigationController::new();
    navigation.start_navigation(Rc::clone(&route), &mut markers);
    let zooms = markers.surface().zoom_changes();

    assert_eq!(navigation.next(&mut markers), Some(1));
    assert_eq!(navigation.next(&mut markers), Some(2));
    assert_eq!(navigation.previous(&mut markers), Some(1));

    assert_eq!(markers.surface().zoom_changes(), zooms);
    assert_eq!(
        markers.surface().pans(),
        &[
            Coordinates::new(2.0, 2.0),
            Coordinates::new(3.0, 3.0),
            Coordinates::new(2.0, 2.0)
        ]
    );
    assert_eq!(markers.surface().active_markers().len(), 1);
    assert_eq!(markers.active_index(), Some(1));
}

#[test]
fn boundaries_are_no_ops() {
    let route = three_stop_route();
    let mut markers = displayed(&route);
    let mut navigation = NavigationController::new();
    navigation.start_navigation(Rc::clone(&route), &mut markers);

    assert_eq!(navigation.previous(&mut markers), None);
    assert_eq!(navigation.current_index(), Some(0));

    assert_eq!(navigation.jump_to(2, &mut markers), Some(2));
    assert_eq!(navigation.next(&mut markers), None);
    assert_eq!(navigation.current_index(), Some(2));
    assert_eq!(markers.active_index(), Some(2));
}

#[test]
fn out_of_range_jump_is_ignored() {
    let route = three_stop_route();
    let mut markers = displayed(&route);
    let mut navigation = NavigationController::new();
    navigation.start_navigation(Rc::clone(&route), &mut markers);

    assert_eq!(navigation.jump_to(3, &mut markers), None);
    assert_eq!(navigation.current_index(), Some(0));
    assert!(markers.surface().pans().is_empty());
}

#[test]
fn inactive_navigation_ignores_steps() {
    let route = three_stop_route();
    let mut markers = displayed(&route);
    let mut navigation = NavigationController::new();

    assert_eq!(navigation.next(&mut markers), None);
    assert_eq!(navigation.jump_to(1, &mut markers), None);
    assert!(!navigation.is_active());
    assert_eq!(markers.active_index(), None);
}

#[test]
fn stop_clears_highlight_but_keeps_route_displayed() {
    let route = three_stop_route();
    let mut markers = displayed(&route);
    let mut navigation = NavigationController::new();
    navigation.start_navigation(Rc::clone(&route), &mut markers);
    navigation.next(&mut markers);

    assert_eq!(navigation.stop_navigation(&mut markers), Some(route.id()));

    assert!(!navigation.is_active());
    assert!(navigation.route().is_none());
    assert!(markers.surface().active_markers().is_empty());
    assert_eq!(markers.surface().marker_count(), 3);
    assert_eq!(navigation.stop_navigation(&mut markers), None);
}
