//! NACE Rev. 2 structure parser.
//!
//! Reads the markdown rendition of the NACE structure document and produces
//! one [`ScopeRow`] per class, carrying its section, division and group.
//!
//! Recognised lines (each code line may carry a `######` heading prefix):
//! - `# Section A – AGRICULTURE, FORESTRY AND FISHING`
//! - `01 Crop and animal production, ...`      (division)
//! - `01.1 Growing of non-perennial crops`    (group)
//! - `01.11 Growing of cereals ...`            (class)
//!
//! Under a class, "This class includes:" / "This class excludes:" switch the
//! activity list; `-` lines are activities and `*` lines their sub-activities.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use sqlx::types::Json;
use tracing::info;

use crate::models::scope::{NaceActivity, ScopeRow};

pub const EXPECTED_CLASSES: usize = 615;
pub const EXPECTED_SECTIONS: usize = 21;
pub const EXPECTED_DIVISIONS: usize = 88;
pub const EXPECTED_GROUPS: usize = 272;

/// Lines searched after a heading for its "This ... includes" description.
const DESCRIPTION_LOOKAHEAD: usize = 10;
/// Lines joined when reading a description.
const DESCRIPTION_WINDOW: usize = 3;
/// Lines scanned after a class heading for its activity lists.
const ACTIVITY_LOOKAHEAD: usize = 50;

struct Patterns {
    section: Regex,
    division: Regex,
    group: Regex,
    class: Regex,
    section_start: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        section: Regex::new(r"^# Section ([A-Z])\s*[–—-]\s*(.+)$").expect("valid regex"),
        division: Regex::new(r"^(?:######\s*)?([0-9]{2})\s+(.+)$").expect("valid regex"),
        group: Regex::new(r"^(?:######\s*)?([0-9]{2}\.[0-9])\s+(.+)$").expect("valid regex"),
        class: Regex::new(r"^(?:######\s*)?([0-9]{2}\.[0-9]{2})\s+(.+)$").expect("valid regex"),
        section_start: Regex::new(r"^# Section [A-Z][ \t]*[–—-]").expect("valid regex"),
    })
}

#[derive(Debug, Clone, Default)]
struct Level {
    code: String,
    name: String,
    description: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ActivityMode {
    Includes,
    Excludes,
}

/// Looks ahead of `index` for `marker` and returns the text following it.
fn find_description(lines: &[&str], index: usize, marker: &str) -> String {
    let end = (index + DESCRIPTION_LOOKAHEAD).min(lines.len());
    for j in (index + 1)..end {
        let window_end = (j + DESCRIPTION_WINDOW).min(lines.len());
        let window = lines[j..window_end].join(" ");
        if let Some(pos) = window.find(marker) {
            return window[pos + marker.len()..].trim().to_string();
        }
    }
    String::new()
}

fn is_page_number(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_digit())
}

fn optional(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Parses NACE classes out of the structure document, sorted by class code.
pub fn parse_nace_activities(text: &str) -> Vec<ScopeRow> {
    let p = patterns();
    let lines: Vec<&str> = text.split('\n').collect();

    let mut activities = Vec::new();
    let mut processed: HashSet<String> = HashSet::new();

    let mut section = Level::default();
    let mut division = Level::default();
    let mut group = Level::default();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || is_page_number(line) {
            continue;
        }

        if let Some(caps) = p.section.captures(line) {
            section = Level {
                code: caps[1].to_string(),
                name: caps[2].to_string(),
                description: find_description(&lines, i, "This section includes"),
            };
        } else if let Some(caps) = p.division.captures(line) {
            division = Level {
                code: caps[1].to_string(),
                name: caps[2].to_string(),
                description: find_description(&lines, i, "This division includes"),
            };
        } else if let Some(caps) = p.group.captures(line) {
            let code = &caps[1];
            // Groups only count under their own division.
            if code.split('.').next() == Some(division.code.as_str()) {
                group = Level {
                    code: code.to_string(),
                    name: caps[2].to_string(),
                    description: find_description(&lines, i, "This group includes"),
                };
            }
        } else if let Some(caps) = p.class.captures(line) {
            let class_code = caps[1].to_string();
            if processed.contains(&class_code) {
                continue;
            }
            let division_code = &class_code[..2];
            let group_code = &class_code[..4];

            if division.code != division_code {
                division = Level {
                    code: division_code.to_string(),
                    ..Level::default()
                };
            }
            if group.code != group_code {
                group = Level {
                    code: group_code.to_string(),
                    ..Level::default()
                };
            }

            if section.code.is_empty() {
                continue;
            }

            let (included, excluded) = collect_activities(&lines, i);
            activities.push(ScopeRow {
                id: class_code.clone(),
                class_name: caps[2].to_string(),
                class_code: class_code.clone(),
                class_description: None,
                group_name: group.name.clone(),
                group_code: group.code.clone(),
                group_description: optional(group.description.clone()),
                division_name: division.name.clone(),
                division_code: division.code.clone(),
                division_description: optional(division.description.clone()),
                section_name: section.name.clone(),
                section_code: section.code.clone(),
                section_description: optional(section.description.clone()),
                included_activities: Some(Json(included)),
                excluded_activities: Some(Json(excluded)),
            });
            processed.insert(class_code);
        }
    }

    activities.sort_by(|a, b| a.class_code.cmp(&b.class_code));
    activities
}

/// Collects the include/exclude lists that follow the class heading at `index`.
fn collect_activities(lines: &[&str], index: usize) -> (Vec<NaceActivity>, Vec<NaceActivity>) {
    let p = patterns();
    let mut included: Vec<NaceActivity> = Vec::new();
    let mut excluded: Vec<NaceActivity> = Vec::new();
    let mut mode: Option<ActivityMode> = None;
    let mut seen_activity = false;

    let end = (index + ACTIVITY_LOOKAHEAD).min(lines.len());
    for raw in &lines[(index + 1)..end] {
        let line = raw.trim();

        if p.class.is_match(line) || line.starts_with('#') {
            break;
        }
        if line.contains("This class includes:") {
            mode = Some(ActivityMode::Includes);
        } else if line.contains("This class excludes:") {
            mode = Some(ActivityMode::Excludes);
        } else if line.is_empty() {
            continue;
        }

        let Some(mode) = mode else { continue };
        let list = match mode {
            ActivityMode::Includes => &mut included,
            ActivityMode::Excludes => &mut excluded,
        };

        if line.starts_with('-') {
            let activity = line
                .trim_start_matches(|c: char| c == '-' || c == ' ')
                .trim_end_matches(':')
                .to_string();
            list.push(NaceActivity {
                activity,
                subactivities: Vec::new(),
            });
            seen_activity = true;
        } else if line.starts_with('*') && seen_activity {
            let sub = line
                .trim_start_matches(|c: char| c == '*' || c == ' ')
                .trim()
                .to_string();
            if let Some(last) = list.last_mut() {
                last.subactivities.push(sub);
            }
        }
    }

    (included, excluded)
}

/// Counts extracted at each NACE level, compared with the official totals.
#[derive(Debug, Clone, Serialize)]
pub struct NaceValidationReport {
    pub total_classes: usize,
    pub sections: BTreeSet<String>,
    pub division_count: usize,
    pub group_count: usize,
    pub class_count: usize,
    pub classes_per_section: BTreeMap<String, usize>,
}

impl NaceValidationReport {
    pub fn is_complete(&self) -> bool {
        self.total_classes == EXPECTED_CLASSES
    }

    /// Human-readable summary for the maintenance CLI.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Total activities extracted: {} (expected {EXPECTED_CLASSES})\n\
             Sections: {} (expected {EXPECTED_SECTIONS}) - {}\n\
             Divisions: {} (expected {EXPECTED_DIVISIONS})\n\
             Groups: {} (expected {EXPECTED_GROUPS})\n\
             Classes: {}\n\nClasses per section:\n",
            self.total_classes,
            self.sections.len(),
            self.sections.iter().cloned().collect::<Vec<_>>().join(", "),
            self.division_count,
            self.group_count,
            self.class_count,
        );
        for (section, count) in &self.classes_per_section {
            out.push_str(&format!("Section {section}: {count} classes\n"));
        }
        out
    }
}

pub fn validate_nace_activities(activities: &[ScopeRow]) -> NaceValidationReport {
    let sections: BTreeSet<String> = activities.iter().map(|a| a.section_code.clone()).collect();
    let divisions: HashSet<&str> = activities.iter().map(|a| a.division_code.as_str()).collect();
    let groups: HashSet<&str> = activities.iter().map(|a| a.group_code.as_str()).collect();
    let classes: HashSet<&str> = activities.iter().map(|a| a.class_code.as_str()).collect();

    let mut classes_per_section = BTreeMap::new();
    for activity in activities {
        *classes_per_section
            .entry(activity.section_code.clone())
            .or_insert(0) += 1;
    }

    let report = NaceValidationReport {
        total_classes: activities.len(),
        sections,
        division_count: divisions.len(),
        group_count: groups.len(),
        class_count: classes.len(),
        classes_per_section,
    };
    info!(
        "NACE validation: {} classes, {} sections, {} divisions, {} groups",
        report.total_classes,
        report.sections.len(),
        report.division_count,
        report.group_count
    );
    report
}

/// One `# Section X – ...` block of the structure document.
#[derive(Debug, Clone, PartialEq)]
pub struct NaceSection {
    /// e.g. "Section A"
    pub name: String,
    pub content: String,
}

impl NaceSection {
    /// "Section A" -> "section_a.md"
    pub fn file_name(&self) -> String {
        format!("{}.md", self.name.to_lowercase().replace(' ', "_"))
    }
}

/// Splits the document at every section heading. Text before the first
/// heading is discarded; lines are trimmed.
pub fn split_nace_by_sections(text: &str) -> Vec<NaceSection> {
    let p = patterns();
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for raw in text.split('\n') {
        let line = raw.trim();
        if p.section_start.is_match(line) {
            if let Some((name, content)) = current.take() {
                sections.push(NaceSection {
                    name,
                    content: content.join("\n"),
                });
            }
            let name = ['–', '—', '-']
                .iter()
                .find(|sep| line.contains(**sep))
                .and_then(|sep| line.split(*sep).next())
                .unwrap_or(line)
                .trim()
                .trim_start_matches('#')
                .trim()
                .to_string();
            current = Some((name, vec![line]));
        } else if let Some((_, content)) = current.as_mut() {
            content.push(line);
        }
    }

    if let Some((name, content)) = current {
        sections.push(NaceSection {
            name,
            content: content.join("\n"),
        });
    }

    sections
}

/// Writes each section to `<dir>/section_x.md`, creating `dir` if needed.
pub fn write_section_files(sections: &[NaceSection], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(sections.len());
    for section in sections {
        let path = dir.join(section.file_name());
        std::fs::write(&path, &section.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Written: {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../../tests/fixtures/nace_excerpt.md");

    fn find<'a>(rows: &'a [ScopeRow], code: &str) -> &'a ScopeRow {
        rows.iter()
            .find(|r| r.class_code == code)
            .unwrap_or_else(|| panic!("class {code} not parsed"))
    }

    #[test]
    fn test_parses_all_fixture_classes_sorted() {
        let rows = parse_nace_activities(FIXTURE);
        let codes: Vec<&str> = rows.iter().map(|r| r.class_code.as_str()).collect();
        assert_eq!(codes, vec!["01.11", "01.12", "01.13", "01.21", "02.10", "10.11"]);
        assert!(rows.iter().all(|r| r.id == r.class_code));
    }

    #[test]
    fn test_hierarchy_carried_to_class() {
        let rows = parse_nace_activities(FIXTURE);
        let cereals = find(&rows, "01.11");
        assert_eq!(cereals.section_code, "A");
        assert_eq!(cereals.section_name, "AGRICULTURE, FORESTRY AND FISHING");
        assert_eq!(cereals.division_code, "01");
        assert_eq!(
            cereals.division_name,
            "Crop and animal production, hunting and related service activities"
        );
        assert_eq!(cereals.group_code, "01.1");
        assert_eq!(cereals.group_name, "Growing of non-perennial crops");
        assert!(cereals
            .section_description
            .as_deref()
            .unwrap()
            .starts_with("the exploitation of vegetable and animal natural resources"));
        assert!(cereals
            .group_description
            .as_deref()
            .unwrap()
            .starts_with("the growing of non-perennial crops"));
    }

    #[test]
    fn test_includes_excludes_and_subactivities() {
        let rows = parse_nace_activities(FIXTURE);
        let cereals = find(&rows, "01.11");
        let included = &cereals.included_activities.as_ref().unwrap().0;
        let excluded = &cereals.excluded_activities.as_ref().unwrap().0;

        assert_eq!(
            included[0].activity,
            "growing of cereals such as"
        );
        assert_eq!(
            included[0].subactivities,
            vec!["wheat", "grain maize", "sorghum"]
        );
        assert_eq!(included.len(), 3);
        assert_eq!(excluded.len(), 2);
        assert_eq!(excluded[0].activity, "growing of rice, see 01.12");
    }

    #[test]
    fn test_section_change_resets_nothing_but_section() {
        let rows = parse_nace_activities(FIXTURE);
        let meat = find(&rows, "10.11");
        assert_eq!(meat.section_code, "C");
        assert_eq!(meat.division_code, "10");
        assert_eq!(meat.group_code, "10.1");
    }

    #[test]
    fn test_class_without_group_heading_gets_blank_names() {
        // 02.10 appears under a division whose group heading is missing.
        let rows = parse_nace_activities(FIXTURE);
        let silviculture = find(&rows, "02.10");
        assert_eq!(silviculture.division_code, "02");
        assert_eq!(silviculture.division_name, "Forestry and logging");
        assert_eq!(silviculture.group_code, "02.1");
        assert_eq!(silviculture.group_name, "");
    }

    #[test]
    fn test_group_outside_division_is_ignored() {
        let text = "# Section A – AGRICULTURE\n01 Crop production\n02.1 Misplaced group\n01.11 Growing of cereals\n";
        let rows = parse_nace_activities(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group_code, "01.1");
        assert_eq!(rows[0].group_name, "");
    }

    #[test]
    fn test_duplicate_class_kept_once() {
        let text = "# Section A – AGRICULTURE\n01.11 Growing of cereals\n\n01.11 Growing of cereals (repeated in index)\n";
        let rows = parse_nace_activities(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].class_name, "Growing of cereals");
    }

    #[test]
    fn test_classes_before_any_section_are_skipped() {
        let text = "01.11 Growing of cereals\n# Section A - AGRICULTURE\n01.12 Growing of rice\n";
        let rows = parse_nace_activities(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].class_code, "01.12");
    }

    #[test]
    fn test_page_numbers_ignored() {
        let text = "# Section A – AGRICULTURE\n01 Crop production\n57\n01.11 Growing of cereals\n";
        let rows = parse_nace_activities(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].division_name, "Crop production");
    }

    #[test]
    fn test_subactivity_before_any_activity_is_ignored() {
        let text = "# Section A – X\n01.11 Growing\nThis class includes:\n* orphan\n- real activity:\n* child\n";
        let rows = parse_nace_activities(text);
        let included = &rows[0].included_activities.as_ref().unwrap().0;
        assert_eq!(included.len(), 1);
        assert_eq!(included[0].activity, "real activity");
        assert_eq!(included[0].subactivities, vec!["child"]);
    }

    #[test]
    fn test_validation_report_counts() {
        let rows = parse_nace_activities(FIXTURE);
        let report = validate_nace_activities(&rows);
        assert_eq!(report.total_classes, 6);
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.division_count, 3);
        assert_eq!(report.group_count, 4);
        assert_eq!(report.classes_per_section.get("A"), Some(&5));
        assert!(!report.is_complete());
        assert!(report.summary().contains("Section C: 1 classes"));
    }

    #[test]
    fn test_non_ascii_digits_are_not_codes() {
        let text = "# Section A – AGRICULTURE\n१२.३४ Devanagari digits\n१२ Division\n01.11 Growing of cereals\n";
        let activities = parse_nace_activities(text);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].class_code, "01.11");
        assert_eq!(activities[0].division_code, "01");
    }

    #[test]
    fn test_split_by_sections() {
        let sections = split_nace_by_sections(FIXTURE);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "Section A");
        assert_eq!(sections[1].name, "Section C");
        assert!(sections[0].content.starts_with("# Section A"));
        assert!(sections[0].content.contains("01.11"));
        assert!(!sections[0].content.contains("10.11"));
        assert_eq!(sections[1].file_name(), "section_c.md");
    }

    #[test]
    fn test_write_section_files() {
        let dir = tempfile::tempdir().unwrap();
        let sections = split_nace_by_sections(FIXTURE);
        let written = write_section_files(&sections, &dir.path().join("sections")).unwrap();
        assert_eq!(written.len(), 2);
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.starts_with("# Section A"));
    }
}
