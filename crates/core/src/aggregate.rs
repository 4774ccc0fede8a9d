//! Collapse fine-grained input sections into their parent groups.

use std::collections::HashMap;

use crate::model::{AggregatedSection, ParsedResult, Section};

/// Group key: the first two dot-segments of a section name.
///
/// `.text.main.cold` and `.text.main` both map to `.text.main`; `.text` stays `.text`.
pub fn group_name(name: &str) -> String {
    name.split('.').take(3).collect::<Vec<_>>().join(".")
}

/// Sum sections per group, counting contributors, largest group first.
///
/// The summed size of the output always equals the summed size of the input.
pub fn aggregate_sections(sections: &[Section]) -> Vec<AggregatedSection> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<AggregatedSection> = Vec::new();

    for section in sections {
        let key = group_name(&section.name);
        match index.get(&key) {
            Some(&i) => {
                groups[i].size = groups[i].size.saturating_add(section.size);
                groups[i].subsections += 1;
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(AggregatedSection {
                    name: key,
                    address: section.address.clone(),
                    size: section.size,
                    file_path: None,
                    subsections: 1,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.size.cmp(&a.size));
    groups
}

/// A copy of `parsed` whose sections are the aggregated groups.
///
/// Lets either comparer run on the summary view; memory regions are kept.
pub fn aggregate_parsed(parsed: &ParsedResult) -> ParsedResult {
    let sections = aggregate_sections(&parsed.sections)
        .into_iter()
        .map(|g| Section { name: g.name, address: g.address, size: g.size, file_path: None })
        .collect();
    ParsedResult { memory: parsed.memory.clone(), sections }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_name_keeps_two_segments() {
        assert_eq!(group_name(".text.main.cold"), ".text.main");
        assert_eq!(group_name(".text.main"), ".text.main");
        assert_eq!(group_name(".text"), ".text");
        assert_eq!(group_name(".ARM.exidx.text.foo"), ".ARM.exidx");
    }

    #[test]
    fn group_sizes_saturate() {
        let sections = vec![Section::new(".text.a", u64::MAX), Section::new(".text.a.b", 7)];
        let groups = aggregate_sections(&sections);
        assert_eq!(groups[0].size, u64::MAX);
        assert_eq!(groups[0].subsections, 2);
    }

    #[test]
    fn aggregation_counts_contributors_and_drops_files() {
        let sections = vec![
            Section::new(".text.main", 100).with_file("main.o"),
            Section::new(".text.main.cold", 20).with_file("main.o"),
            Section::new(".bss", 300),
            Section::new(".text.main", 5).with_file("other.o"),
        ];
        let groups = aggregate_sections(&sections);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, ".bss");
        assert_eq!(groups[1].name, ".text.main");
        assert_eq!(groups[1].size, 125);
        assert_eq!(groups[1].subsections, 3);
        assert!(groups.iter().all(|g| g.file_path.is_none()));
    }

    #[test]
    fn aggregate_parsed_keeps_memory_and_sort_order() {
        let parsed = ParsedResult {
            sections: vec![
                Section::new(".text.a.x", 5),
                Section::new(".text.a", 5),
                Section::new(".bss", 8),
            ],
            ..Default::default()
        };
        let view = aggregate_parsed(&parsed);
        assert_eq!(view.sections[0].name, ".text.a");
        assert_eq!(view.sections[0].size, 10);
        assert_eq!(view.total_size(), parsed.total_size());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate_sections(&[]).is_empty());
    }
}
