use mapdiff_core::cache::CachedResult;
use mapdiff_core::compare::CompareOptions;
use mapdiff_core::config::AnalysisConfig;
use mapdiff_core::error::OptionsError;
use mapdiff_core::services::{CompareRequest, ComparisonService, DiffRequest};

const V1: &str = include_str!("fixtures/firmware_v1.map");
const V2: &str = include_str!("fixtures/firmware_v2.map");

#[test]
fn compare_returns_and_caches_with_id() {
    let service = ComparisonService::default();
    let response = service
        .compare(&CompareRequest { base: V1, target: V2, aggregate: false, options: None })
        .expect("compare");
    assert!(response.compare_id.starts_with("cmp-"));
    assert_eq!(response.result.summary.sections_added, 1);

    let cached = service.fetch(&response.compare_id).expect("cached");
    match &*cached {
        CachedResult::Compare(result) => assert_eq!(result, &response.result),
        other => panic!("unexpected kind {}", other.kind()),
    }
    assert_eq!(service.stats().count, 1);
    assert!(service.delete(&response.compare_id));
    assert!(service.fetch(&response.compare_id).is_none());
}

#[test]
fn response_flattens_result_next_to_id() {
    let service = ComparisonService::default();
    let response = service
        .diff(&DiffRequest { v1: V1, v2: V2, aggregate: false, options: None })
        .expect("diff");
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["diffId"], response.diff_id.as_str());
    assert!(json["summary"].is_object());
    assert!(json["diff"].is_array());
    assert!(json.get("result").is_none());
}

#[test]
fn service_config_supplies_default_options() {
    let mut config = AnalysisConfig::default();
    config.compare.top_n = 2;
    let service = ComparisonService::new(config);
    let response = service
        .compare(&CompareRequest { base: V1, target: V2, aggregate: false, options: None })
        .unwrap();
    assert_eq!(response.result.top_increases.len(), 2);
    assert_eq!(response.result.metadata.options_used.top_n, 2);
}

#[test]
fn invalid_options_are_rejected_at_the_boundary() {
    let service = ComparisonService::default();
    let err = service
        .compare(&CompareRequest {
            base: V1,
            target: V2,
            aggregate: false,
            options: Some(CompareOptions { top_n: 0, ..Default::default() }),
        })
        .unwrap_err();
    assert_eq!(err, OptionsError::ZeroTopN);
    assert_eq!(service.stats().count, 0);
}

#[test]
fn aggregated_compare_works_on_group_names() {
    let service = ComparisonService::default();
    let response = service
        .compare(&CompareRequest { base: V1, target: V2, aggregate: true, options: None })
        .unwrap();
    assert!(response.result.sections.iter().all(|d| d.name.split('.').count() <= 3));
    assert!(response.result.sections.iter().all(|d| d.file.is_none()));
}

#[test]
fn single_file_parse_goes_through_the_service() {
    let service = ComparisonService::default();
    let parsed = service.parse(V1);
    assert_eq!(parsed.sections.len(), 17);
    assert!(service.parse("not a map").is_empty());
}

#[test]
fn sweeper_can_be_started_from_the_service() {
    let service = ComparisonService::default();
    let handle = service.start_sweeper().expect("sweeper");
    handle.shutdown();
}
