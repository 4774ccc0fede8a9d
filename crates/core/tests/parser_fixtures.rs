use mapdiff_core::parser::{parse_file, parse_map, MapFileParser};

const V1: &str = include_str!("fixtures/firmware_v1.map");
const V2: &str = include_str!("fixtures/firmware_v2.map");

#[test]
fn memory_configuration_block_is_parsed() {
    let result = parse_map(V1);
    assert_eq!(result.memory.len(), 2, "*default* must not be recorded");

    let flash = &result.memory["FLASH"];
    assert_eq!(flash.origin_hex, "0x08000000");
    assert_eq!(flash.length_hex, "0x00100000");
    assert_eq!(flash.length_bytes, 1_048_576);

    assert_eq!(result.memory["RAM"].length_bytes, 0x20000);
    assert_eq!(parse_map(V2).memory["RAM"].length_bytes, 0x30000);
}

#[test]
fn memory_region_serializes_origin_and_length_strings() {
    let result = parse_map(V1);
    let json = serde_json::to_value(&result.memory["FLASH"]).unwrap();
    assert_eq!(json["origin"], "0x08000000");
    assert_eq!(json["length"], "0x00100000");
    assert_eq!(json["lengthBytes"], 1_048_576);
}

#[test]
fn section_line_fields_match_the_map() {
    let result = parse_map(".text.main    0x00000778    0x00000c00  main.o\n");
    assert_eq!(result.sections.len(), 1);
    let s = &result.sections[0];
    assert_eq!(s.name, ".text.main");
    assert_eq!(s.address.as_deref(), Some("0x00000778"));
    assert_eq!(s.size, 3072);
    assert_eq!(s.file_path.as_deref(), Some("main.o"));
}

#[test]
fn every_section_has_positive_size() {
    for text in [V1, V2] {
        let result = parse_map(text);
        assert!(!result.sections.is_empty());
        assert!(result.sections.iter().all(|s| s.size > 0));
    }
}

#[test]
fn sections_are_sorted_by_size_descending() {
    let result = parse_map(V1);
    assert_eq!(result.sections.len(), 17);
    assert!(result.sections.windows(2).all(|w| w[0].size >= w[1].size));
    assert_eq!(result.sections[0].name, ".text");
    assert_eq!(result.sections[0].size, 0x1540);
    assert_eq!(result.total_size(), 16_958);
}

#[test]
fn equal_sizes_keep_scan_order() {
    let text = " .text.b 0x0 0x10 b.o\n .text.a 0x10 0x10 a.o\n .text.c 0x20 0x20 c.o\n";
    let names: Vec<String> = parse_map(text).sections.into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec![".text.c", ".text.b", ".text.a"]);
}

#[test]
fn repeated_names_stay_separate_entries() {
    let result = parse_map(V1);
    let isr: Vec<_> = result.sections.iter().filter(|s| s.name == ".isr_vector").collect();
    assert_eq!(isr.len(), 2);
    // Output section first (scan order), then the startup.o contribution.
    assert_eq!(isr[0].file_path, None);
    assert_eq!(isr[1].file_path.as_deref(), Some("startup.o"));
}

#[test]
fn parsing_is_idempotent() {
    let first = serde_json::to_string(&parse_map(V2)).unwrap();
    let second = serde_json::to_string(&parse_map(V2)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn wrapped_long_names_are_joined_with_their_numbers() {
    let result = parse_map(V1);
    let hal = result.sections.iter().find(|s| s.name == ".text.HAL_RCC_OscConfig").unwrap();
    assert_eq!(hal.size, 0x800);
    assert_eq!(hal.address.as_deref(), Some("0x08000888"));
    // Windows-style path from the map reduced to its basename.
    assert_eq!(hal.file_path.as_deref(), Some("stm32f4xx_hal_rcc.o"));

    let attrs = result.sections.iter().find(|s| s.name == ".ARM.attributes").unwrap();
    assert_eq!(attrs.size, 0x2e);
}

#[test]
fn many_dotted_names_survive() {
    let text = " .text._ZN3app6sensor6Fusion4stepEv.isra.0.cold\n                0x08004000       0x3c build/obj/sensor.o\n";
    let result = parse_map(text);
    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].name, ".text._ZN3app6sensor6Fusion4stepEv.isra.0.cold");
    assert_eq!(result.sections[0].file_path.as_deref(), Some("sensor.o"));
}

#[test]
fn archive_members_and_load_addresses() {
    let result = parse_map(V1);
    let memcpy = result.sections.iter().find(|s| s.name == ".text.memcpy").unwrap();
    assert_eq!(memcpy.file_path.as_deref(), Some("libc_nano.a(lib_a-memcpy.o)"));
    let data = result.sections.iter().find(|s| s.name == ".data").unwrap();
    assert_eq!(data.file_path, None);
}

#[test]
fn discarded_zero_size_sections_are_dropped() {
    let result = parse_map(V1);
    // `.text 0x0 0x0 build/obj/main.o` from the discarded list.
    assert!(!result.sections.iter().any(|s| s.name == ".text" && s.file_path.is_some()));
}

#[test]
fn garbage_input_yields_empty_result() {
    let result = parse_map("this is not a map file\n\x00\x01 random bytes\n");
    assert!(result.is_empty());
    assert!(result.memory.is_empty());
    assert!(parse_map("").is_empty());
}

#[test]
fn parse_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fw.map");
    let mut bytes = V1.as_bytes().to_vec();
    // Invalid UTF-8 in a comment line must not reject the whole file.
    bytes.extend_from_slice(b"\n# \xff\xfe\n");
    std::fs::write(&path, bytes).unwrap();
    let result = parse_file(&path).unwrap();
    assert_eq!(result, MapFileParser::new().parse(V1));
    assert!(parse_file(dir.path().join("missing.map")).is_err());
}
