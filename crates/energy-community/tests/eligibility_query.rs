mod common;

use common::west_virginia;
use energy_community::boundaries::hierarchy;
use energy_community::eligibility::QualifyingPath;
use energy_community::query::QueryError;
use energy_community::resolver::Resolution;
use energy_community::{
    BoundaryId, BoundaryLevel, DatasetKind, Determination, EligibilityService, Fact,
    SnapshotStore,
};
use std::sync::Arc;

fn loaded() -> (EligibilityService, common::DataDir) {
    let dir = west_virginia();
    let store = Arc::new(SnapshotStore::new());
    let report = store.reload(&dir.feed()).expect("reload fixture");
    assert!(report.orphans.is_empty(), "fixture is internally consistent");
    assert!(report.skipped.is_empty());
    (EligibilityService::new(store), dir)
}

fn id(value: &str) -> BoundaryId {
    BoundaryId::parse(value).expect("valid id")
}

#[test]
fn coal_closure_tract_qualifies_with_versioned_reason() {
    let (service, _dir) = loaded();
    let verdict = service.evaluate_point(-81.8, 38.5).expect("verdict");

    let location = verdict.location.as_ref().expect("resolved");
    assert_eq!(location.tract, id("54039000100"));
    assert_eq!(location.county, id("54039"));
    assert_eq!(location.state, id("54"));
    assert_eq!(location.county_name.as_deref(), Some("Kanawha"));
    assert_eq!(location.state_name.as_deref(), Some("West Virginia"));

    assert_eq!(verdict.qualifies, Determination::True);
    assert_eq!(verdict.reasons.len(), 1);
    let reason = &verdict.reasons[0];
    assert_eq!(reason.path, QualifyingPath::CoalClosure);
    assert_eq!(reason.source_dataset, DatasetKind::CoalClosure);
    assert_eq!(
        reason.dataset_version.map(|version| version.to_string()),
        Some("2.0".to_string())
    );
    assert!(reason
        .facts
        .iter()
        .any(|evidence| evidence.fact == Fact::MineClosed && evidence.value.is_true()));
}

#[test]
fn adjacency_is_reported_but_does_not_qualify() {
    let (service, _dir) = loaded();
    let verdict = service.evaluate_point(-81.2, 38.5).expect("verdict");

    assert_eq!(
        verdict.location.as_ref().map(|location| location.tract.clone()),
        Some(id("54039000200"))
    );
    assert_eq!(verdict.qualifies, Determination::False);
    assert!(verdict.reasons.is_empty());
    assert!(verdict
        .notes
        .iter()
        .any(|note| note.contains("adjoins a coal closure")));
}

#[test]
fn ffe_path_needs_both_thresholds() {
    let (service, _dir) = loaded();
    // Lewis: ffe and unemployment both met; tract has no coal record.
    let verdict = service.evaluate_point(-80.5, 38.5).expect("verdict");

    assert_eq!(verdict.qualifies, Determination::True);
    let paths: Vec<QualifyingPath> = verdict.reasons.iter().map(|reason| reason.path).collect();
    assert_eq!(paths, vec![QualifyingPath::FfeUnemployment]);

    let coal = verdict
        .paths
        .iter()
        .find(|outcome| outcome.path == QualifyingPath::CoalClosure)
        .expect("coal path evaluated");
    assert_eq!(coal.outcome, Determination::Unknown);
    assert!(verdict.notes.iter().any(|note| {
        note.starts_with(QualifyingPath::CoalClosure.label())
            && note.contains("54041000100 has no")
    }));
}

#[test]
fn point_on_shared_tract_edge_resolves_to_lowest_id() {
    let (service, _dir) = loaded();
    let located = service.resolve(-81.5, 38.5).expect("resolve");
    match located.resolution {
        Resolution::Resolved(location) => assert_eq!(location.tract, id("54039000100")),
        Resolution::Unresolved => panic!("edge point should resolve"),
    }
}

#[test]
fn point_outside_coverage_is_a_definite_non_match() {
    let (service, _dir) = loaded();
    let verdict = service.evaluate_point(-100.0, 45.0).expect("verdict");
    assert!(verdict.location.is_none());
    assert_eq!(verdict.qualifies, Determination::False);
}

#[test]
fn facts_lookup_works_at_every_level() {
    let (service, _dir) = loaded();

    let tract = service.facts_for("54039000100").expect("tract facts");
    assert_eq!(tract.sheet.level, BoundaryLevel::Tract);
    assert_eq!(tract.parent, Some(id("54039")));
    assert_eq!(
        tract.sheet.fact(DatasetKind::CoalClosure, Fact::MineClosed),
        Determination::True
    );

    let state = service.facts_for("54").expect("state facts");
    assert!(state.sheet.datasets.is_empty());
    assert_eq!(state.name.as_deref(), Some("West Virginia"));

    assert!(matches!(
        service.facts_for("5403900010"),
        Err(QueryError::MalformedIdentifier(_))
    ));
}

#[test]
fn repeated_queries_are_stable() {
    let (service, _dir) = loaded();
    let first = service.evaluate_point(-81.8, 38.5).expect("verdict");
    for _ in 0..5 {
        assert_eq!(service.evaluate_point(-81.8, 38.5).expect("verdict"), first);
    }
}

#[test]
fn fixture_interior_points_resolve_to_their_tract_and_loaded_parents() {
    let (service, _dir) = loaded();
    let samples = [
        (-81.75, 38.5, "54039000100"),
        (-81.25, 38.5, "54039000200"),
        (-80.5, 38.5, "54041000100"),
    ];

    for (lng, lat, expected) in samples {
        let located = service.resolve(lng, lat).expect("resolve");
        let location = located.resolution.location().expect("resolved");
        assert_eq!(location.tract, id(expected));

        let county = hierarchy::parent(&location.tract).expect("tract parent");
        let state = hierarchy::parent(&county).expect("county parent");
        assert_eq!(state, location.state);
        assert!(service
            .snapshots()
            .current()
            .geometry()
            .boundary(&state)
            .is_some());
    }
}
