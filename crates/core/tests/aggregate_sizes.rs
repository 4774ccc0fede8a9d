use mapdiff_core::aggregate::{aggregate_parsed, aggregate_sections};
use mapdiff_core::parse_map;

const V1: &str = include_str!("fixtures/firmware_v1.map");

#[test]
fn aggregation_preserves_total_size() {
    let parsed = parse_map(V1);
    let groups = aggregate_sections(&parsed.sections);
    let total: u64 = groups.iter().map(|g| g.size).sum();
    assert_eq!(total, parsed.total_size());
    let contributors: usize = groups.iter().map(|g| g.subsections).sum();
    assert_eq!(contributors, parsed.sections.len());
}

#[test]
fn fixture_groups_collapse_by_two_segments() {
    let groups = aggregate_sections(&parse_map(V1).sections);
    assert!(groups.windows(2).all(|w| w[0].size >= w[1].size));

    let isr = groups.iter().find(|g| g.name == ".isr_vector").unwrap();
    assert_eq!(isr.subsections, 2);
    assert_eq!(isr.size, 0x188 * 2);

    let bss_rx = groups.iter().find(|g| g.name == ".bss.rx_buffer").unwrap();
    assert_eq!(bss_rx.subsections, 1);
    assert!(groups.iter().all(|g| g.file_path.is_none()));

    let json = serde_json::to_value(&groups[0]).unwrap();
    assert!(json["filePath"].is_null());
    assert!(json["subsections"].is_u64());
}

#[test]
fn aggregated_view_feeds_the_comparers() {
    let parsed = parse_map(V1);
    let view = aggregate_parsed(&parsed);
    assert_eq!(view.memory, parsed.memory);
    assert_eq!(view.total_size(), parsed.total_size());
    assert!(view.sections.iter().all(|s| s.file_path.is_none()));
}
