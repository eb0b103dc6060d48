use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{
    classifier::{classify, Classification, ClassificationPolicy},
    node::{children_of, title_of, Node},
};

/// The label of the subject gathering the courses of a faculty in which no subject was found.
pub const FALLBACK_SUBJECT_TITLE: &str = "Autres";

/// A subject and the sorted, deduplicated titles of its courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub title: String,
    pub courses: Vec<String>,
}

/// The two-level summary of one faculty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultySummary {
    pub title: String,
    pub subjects: Vec<SubjectSummary>,
}

impl FacultySummary {
    pub fn course_count(&self) -> usize {
        self.subjects
            .iter()
            .map(|subject| subject.courses.len())
            .sum()
    }
}

/// Summarizes a faculty into its subjects and their courses under the given policy.
///
/// Course titles are deduplicated case-insensitively, keeping the casing of the first one met
/// in depth-first document order, then sorted case-insensitively. The faculty is only read.
pub fn extract(faculty: &Node, policy: ClassificationPolicy) -> FacultySummary {
    let subjects = match policy {
        ClassificationPolicy::TypeBased => extract_direct_children(faculty, policy),
        ClassificationPolicy::FolderAware => extract_breadth_first(faculty, policy),
    };
    let summary = FacultySummary {
        title: title_of(faculty),
        subjects,
    };
    log::debug!(
        "Extracted {} subjects and {} courses from the faculty {:?}",
        summary.subjects.len(),
        summary.course_count(),
        summary.title
    );

    summary
}

fn extract_direct_children(faculty: &Node, policy: ClassificationPolicy) -> Vec<SubjectSummary> {
    children_of(faculty)
        .iter()
        .map(|child| SubjectSummary {
            title: title_of(child),
            courses: collect_courses(std::slice::from_ref(child), policy),
        })
        .collect()
}

fn extract_breadth_first(faculty: &Node, policy: ClassificationPolicy) -> Vec<SubjectSummary> {
    let mut subjects = Vec::new();
    let mut queue: VecDeque<&Node> = children_of(faculty).iter().collect();

    while let Some(node) = queue.pop_front() {
        match classify(node, policy) {
            Classification::Subject => {
                let courses = collect_courses(children_of(node), policy);
                if !courses.is_empty() {
                    subjects.push(SubjectSummary {
                        title: title_of(node),
                        courses,
                    });
                }
            }
            Classification::Pass => queue.extend(children_of(node)),
            Classification::Course => {}
        }
    }

    if subjects.is_empty() {
        let courses = collect_courses(children_of(faculty), policy);
        if !courses.is_empty() {
            subjects.push(SubjectSummary {
                title: FALLBACK_SUBJECT_TITLE.to_string(),
                courses,
            });
        }
    }

    subjects
}

/// Collects the titles of the courses found depth-first in the given subtrees, without
/// descending below a course, then deduplicates and sorts them.
fn collect_courses(roots: &[Node], policy: ClassificationPolicy) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut courses = Vec::new();
    let mut stack: Vec<&Node> = roots.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if classify(node, policy) == Classification::Course {
            let title = title_of(node);
            if seen.insert(title.to_lowercase()) {
                courses.push(title);
            }
        } else {
            stack.extend(children_of(node).iter().rev());
        }
    }

    courses.sort_by_cached_key(|title| title.to_lowercase());
    courses
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn faculty(value: serde_json::Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    fn subject(title: &str, courses: &[&str]) -> SubjectSummary {
        SubjectSummary {
            title: title.to_string(),
            courses: courses.iter().map(|course| course.to_string()).collect(),
        }
    }

    #[test]
    fn type_based_keeps_every_direct_child_in_order() {
        let tree = faculty(json!({
            "title": "Sciences",
            "children": [
                {"title": "Semestre 2", "children": [
                    {"title": "physique", "type": "cours"},
                    {"title": "Chimie", "type": "cours"},
                    {"title": "Bloc", "children": [{"title": "Algèbre", "type": "cours"}]},
                ]},
                {"title": "Vide", "type": "ue"},
                {"title": "Semestre 1", "type": "ue", "children": [
                    {"title": "Algo", "type": "cours"},
                    {"title": "algo", "type": "cours"},
                ]},
            ]
        }));
        let summary = extract(&tree, ClassificationPolicy::TypeBased);
        assert_eq!(summary.title.as_str(), "Sciences");
        assert_eq!(
            summary.subjects,
            vec![
                subject("Semestre 2", &["Algèbre", "Chimie", "physique"]),
                subject("Vide", &[]),
                subject("Semestre 1", &["Algo"]),
            ]
        );
    }

    #[test]
    fn type_based_does_not_descend_below_courses() {
        let tree = faculty(json!({
            "title": "F",
            "children": [{"title": "S", "children": [
                {"title": "Cours", "type": "cours", "children": [{"title": "Chapitre", "type": "cours"}]},
            ]}]
        }));
        let summary = extract(&tree, ClassificationPolicy::TypeBased);
        assert_eq!(summary.subjects, vec![subject("S", &["Cours"])]);
    }

    #[test]
    fn folder_aware_finds_subjects_breadth_first() {
        let tree = faculty(json!({
            "title": "Droit",
            "children": [
                {"title": "Licence", "type": "ue", "isFolder": true, "children": [
                    {"title": "Droit civil", "type": "ue", "isFolder": false, "children": [
                        {"title": "Contrats", "type": "cours"},
                    ]},
                ]},
                {"title": "Méthodologie", "type": "category", "children": [
                    {"title": "Recherche", "type": "cours"},
                ]},
                {"title": "Sans cours", "type": "ue"},
            ]
        }));
        let summary = extract(&tree, ClassificationPolicy::FolderAware);
        assert_eq!(
            summary.subjects,
            vec![
                subject("Méthodologie", &["Recherche"]),
                subject("Droit civil", &["Contrats"]),
            ]
        );
    }

    #[test]
    fn nested_subjects_belong_to_the_outer_one() {
        let tree = faculty(json!({
            "title": "F",
            "children": [{"title": "Outer", "type": "category", "children": [
                {"title": "Inner", "type": "ue", "children": [{"title": "b", "type": "cours"}]},
                {"title": "A", "type": "cours"},
            ]}]
        }));
        let summary = extract(&tree, ClassificationPolicy::FolderAware);
        assert_eq!(summary.subjects, vec![subject("Outer", &["A", "b"])]);
    }

    #[test]
    fn folder_aware_falls_back_to_a_single_bucket() {
        let tree = faculty(json!({
            "title": "Lettres",
            "children": [{"title": "Semestre", "children": [
                {"title": "Dossier", "type": "ue", "isFolder": true, "children": [
                    {"title": "Poésie", "type": "cours"},
                ]},
                {"title": "Grammaire", "type": "cours"},
            ]}]
        }));
        let summary = extract(&tree, ClassificationPolicy::FolderAware);
        assert_eq!(
            summary.subjects,
            vec![subject(FALLBACK_SUBJECT_TITLE, &["Grammaire", "Poésie"])]
        );
    }

    #[test]
    fn folder_aware_without_courses_is_empty() {
        let tree = faculty(json!({
            "title": "F",
            "children": [{"title": "S", "type": "ue", "children": [{"title": "x"}]}]
        }));
        assert!(extract(&tree, ClassificationPolicy::FolderAware)
            .subjects
            .is_empty());
    }

    #[test]
    fn first_encountered_casing_wins() {
        let tree = faculty(json!({
            "title": "F",
            "children": [{"title": "S", "type": "ue", "children": [
                {"title": "Wrapper", "children": [{"title": "ALGO", "type": "cours"}]},
                {"title": "algo", "type": "cours"},
                {"title": "Algo", "type": "cours"},
            ]}]
        }));
        for policy in [
            ClassificationPolicy::TypeBased,
            ClassificationPolicy::FolderAware,
        ] {
            let summary = extract(&tree, policy);
            assert_eq!(summary.subjects, vec![subject("S", &["ALGO"])]);
        }
    }

    #[test]
    fn extraction_is_repeatable() {
        let tree = faculty(json!({
            "title": "F",
            "children": [{"title": "S", "type": "ue", "children": [
                {"title": "b", "type": "cours"}, {"title": "A", "type": "cours"},
            ]}]
        }));
        let snapshot = tree.clone();
        let first = extract(&tree, ClassificationPolicy::FolderAware);
        let second = extract(&tree, ClassificationPolicy::FolderAware);
        assert_eq!(first, second);
        assert_eq!(tree, snapshot);
    }
}
