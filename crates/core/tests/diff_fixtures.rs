use std::collections::HashMap;

use mapdiff_core::diff::{diff_versions, DiffEntry, DiffOptions, DiffStatus, LARGE_SECTION_BYTES};
use mapdiff_core::format::DiffSeverity;
use mapdiff_core::model::{ParsedResult, Region, Section};
use mapdiff_core::parse_map;

const V1: &str = include_str!("fixtures/firmware_v1.map");
const V2: &str = include_str!("fixtures/firmware_v2.map");

fn parsed(sections: Vec<Section>) -> ParsedResult {
    ParsedResult { sections, ..Default::default() }
}

fn by_key(entries: &[DiffEntry]) -> HashMap<&str, &DiffEntry> {
    entries.iter().map(|e| (e.key.as_str(), e)).collect()
}

#[test]
fn section_only_in_v2_is_added_ram_and_high() {
    let v1 = parsed(vec![]);
    let v2 = parsed(vec![Section::new(".bss.x", 2000).with_address("0x20000000")]);
    let result = diff_versions(&v1, &v2, &DiffOptions::default());

    let entry = &result.diff[0];
    assert_eq!(entry.status, DiffStatus::Added);
    assert_eq!(entry.region, Region::Ram);
    assert_eq!(entry.size_diff_pct, 100.0);

    assert_eq!(result.anomalies.len(), 1);
    let anomaly = &result.anomalies[0];
    assert!(anomaly.reasons.iter().any(|r| r.contains("New section")));
    assert_eq!(anomaly.severity, DiffSeverity::High);
}

#[test]
fn added_removed_threshold_ignores_options() {
    // The flat limit does not follow any caller-supplied threshold.
    assert_eq!(LARGE_SECTION_BYTES, 1024);
    let v1 = parsed(vec![]);
    let v2 = parsed(vec![Section::new(".text.small", 1000)]);
    let lenient = DiffOptions {
        anomaly_growth_threshold: 0.0,
        anomaly_shrink_threshold: 0.0,
        address_shift_threshold: 0,
    };
    assert!(diff_versions(&v1, &v2, &lenient).anomalies.is_empty());
}

#[test]
fn swapping_inputs_mirrors_every_entry() {
    let a = parse_map(V1);
    let b = parse_map(V2);
    let forward = diff_versions(&a, &b, &DiffOptions::default());
    let backward = diff_versions(&b, &a, &DiffOptions::default());
    assert_eq!(forward.diff.len(), backward.diff.len());

    let back = by_key(&backward.diff);
    for entry in &forward.diff {
        let mirror = back[entry.key.as_str()];
        assert_eq!(entry.size_v1, mirror.size_v2);
        assert_eq!(entry.size_v2, mirror.size_v1);
        assert_eq!(entry.size_diff, -mirror.size_diff);
        assert_eq!(entry.address_diff, mirror.address_diff.map(|d| -d));
        let expected = match entry.status {
            DiffStatus::Added => DiffStatus::Removed,
            DiffStatus::Removed => DiffStatus::Added,
            DiffStatus::Growth => DiffStatus::Shrink,
            DiffStatus::Shrink => DiffStatus::Growth,
            DiffStatus::Same => DiffStatus::Same,
        };
        assert_eq!(mirror.status, expected, "{}", entry.key);
    }
}

#[test]
fn fixture_entries_and_summary() {
    let result = diff_versions(&parse_map(V1), &parse_map(V2), &DiffOptions::default());
    assert_eq!(result.diff.len(), 18);
    assert!(result.diff.windows(2).all(|w| w[0].size_diff.abs() >= w[1].size_diff.abs()));

    let s = &result.summary;
    assert_eq!((s.added, s.removed, s.growth, s.shrink, s.same), (1, 1, 8, 0, 8));
    assert_eq!(s.total_entries, 18);
    assert_eq!(s.address_shifts, 6);
    assert_eq!((s.total_size_v1, s.total_size_v2), (16_958, 51_646));
    assert_eq!(s.total_size_diff, 34_688);

    let entries = by_key(&result.diff);
    let uart_write = entries[".text.uart_write:uart.o"];
    assert_eq!(uart_write.status, DiffStatus::Growth);
    assert_eq!(uart_write.size_diff_pct, 50.0);
    assert_eq!(uart_write.address_diff, Some(0x30c0));
    assert!(uart_write.address_shifted);
    assert_eq!(uart_write.region, Region::Flash);

    let isr = entries[".isr_vector:"];
    assert_eq!(isr.status, DiffStatus::Same);
    assert_eq!(isr.region, Region::Other);
    assert_eq!(isr.address_diff, Some(0));
}

#[test]
fn fixture_anomalies_by_severity() {
    let result = diff_versions(&parse_map(V1), &parse_map(V2), &DiffOptions::default());
    let ranked: Vec<(&str, DiffSeverity)> =
        result.anomalies.iter().map(|a| (a.key.as_str(), a.severity)).collect();
    assert_eq!(
        ranked,
        vec![
            (".text.sensor_fusion:sensor.o", DiffSeverity::Critical),
            (".text:", DiffSeverity::Critical),
            (".bss:", DiffSeverity::Critical),
            (".bss.rx_buffer:uart.o", DiffSeverity::Critical),
            (".bss.tx_buffer:uart.o", DiffSeverity::Critical),
            (".text.legacy_crc:crc.o", DiffSeverity::High),
            (".text.uart_write:uart.o", DiffSeverity::High),
            (".text.main:main.o", DiffSeverity::Medium),
            (".rodata:", DiffSeverity::Medium),
            (".rodata.str1.4:main.o", DiffSeverity::Medium),
            (".text.HAL_RCC_OscConfig:stm32f4xx_hal_rcc.o", DiffSeverity::Low),
            (".text.uart_init:uart.o", DiffSeverity::Low),
            (".text.memcpy:libc_nano.a(lib_a-memcpy.o)", DiffSeverity::Low),
        ]
    );

    let uart_write = &result.anomalies[6];
    assert_eq!(uart_write.reasons.len(), 2);
    assert!(uart_write.reasons[1].starts_with("Address shifted by +0x30c0"));
}

#[test]
fn fixture_memory_region_changes() {
    let result = diff_versions(&parse_map(V1), &parse_map(V2), &DiffOptions::default());
    let names: Vec<&str> = result.memory_changes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["FLASH", "RAM"]);
    assert!(!result.memory_changes[0].changed);
    assert!(result.memory_changes[1].changed);
}

#[test]
fn diff_result_json_contract() {
    let result = diff_versions(&parse_map(V1), &parse_map(V2), &DiffOptions::default());
    let json = serde_json::to_value(&result).unwrap();
    let first = &json["diff"][0];
    for key in ["sizeV1", "sizeV2", "sizeDiff", "sizeDiffPct", "addressV1", "addressV2", "addressDiff", "addressShifted", "status", "region"] {
        assert!(first.get(key).is_some(), "missing {key}");
    }
    assert_eq!(first["status"], "added");
    assert_eq!(first["region"], "FLASH");
    assert_eq!(json["anomalies"][0]["severity"], "critical");
    assert_eq!(json["metadata"]["optionsUsed"]["addressShiftThreshold"], 4096);
}
