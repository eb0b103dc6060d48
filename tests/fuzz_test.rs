use std::collections::HashSet;
use std::ops::Range;

use arborescence::{
    classifier::ClassificationPolicy,
    extractor::extract,
    filter::{filter_faculties, has_course},
    loader::{load_faculties, SourceDocument},
    node::{children_of, title_of, Node},
};
use rand::{prelude::SliceRandom as _, Rng};
use serde::Serialize as _;

struct RandomTreeConfiguration {
    faculties_to_generate: usize,
    maximum_depth: usize,
    children_range: Range<usize>,
    maximum_string_length: usize,
}

const CONFIGURATION: RandomTreeConfiguration = RandomTreeConfiguration {
    faculties_to_generate: 40,
    maximum_depth: 5,
    children_range: 0..5,
    maximum_string_length: 12,
};

const NODE_TYPES: [Option<&str>; 6] = [
    Some("cours"),
    Some("ue"),
    Some("category"),
    Some("semestre"),
    Some(""),
    None,
];

fn random_title(rng: &mut rand::rngs::ThreadRng) -> Option<String> {
    match rng.gen_range(0..=100) {
        0..=9 => None,
        10..=19 => Some(" \t ".to_string()),
        // A small alphabet so that titles collide, sometimes differing only in case
        20..=69 => Some(
            ["Algo", "algo", "ALGO", "Droit", "droit", "Chimie"]
                .choose(rng)
                .map(|title| title.to_string())
                .unwrap_or_default(),
        ),
        70..=100 => {
            let length = rng.gen_range(1..=CONFIGURATION.maximum_string_length);
            Some(rand_utf8::rand_utf8(rng, length).to_string())
        }
        _ => unreachable!(),
    }
}

fn random_node(rng: &mut rand::rngs::ThreadRng, depth: usize) -> Node {
    let mut node = Node {
        id: rng.gen_bool(0.5).then(|| rng.gen_range(0..1000).to_string()),
        title: random_title(rng),
        node_type: NODE_TYPES.choose(rng).copied().flatten().map(String::from),
        is_folder: rng.gen_bool(0.3),
        ..Node::default()
    };
    if depth < CONFIGURATION.maximum_depth {
        node.children = (0..rng.gen_range(CONFIGURATION.children_range.clone()))
            .map(|_| random_node(rng, depth + 1))
            .collect();
    }

    node
}

fn random_faculties() -> Vec<Node> {
    let mut rng = rand::thread_rng();
    (0..CONFIGURATION.faculties_to_generate)
        .map(|_| random_node(&mut rng, 0))
        .collect()
}

const POLICIES: [ClassificationPolicy; 2] = [
    ClassificationPolicy::TypeBased,
    ClassificationPolicy::FolderAware,
];

#[test]
fn titles_are_never_blank() {
    for faculty in random_faculties() {
        for node in faculty.depth_first() {
            assert!(!title_of(node).trim().is_empty(), "{:?}", node);
        }
    }
}

#[test]
fn courses_are_sorted_and_unique() {
    for faculty in random_faculties() {
        for policy in POLICIES {
            for subject in extract(&faculty, policy).subjects {
                let lowercased: Vec<String> = subject
                    .courses
                    .iter()
                    .map(|course| course.to_lowercase())
                    .collect();
                assert!(lowercased.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", subject);
                assert_eq!(
                    lowercased.iter().collect::<HashSet<_>>().len(),
                    lowercased.len()
                );
            }
        }
    }
}

#[test]
fn type_based_subjects_follow_the_direct_children() {
    for faculty in random_faculties() {
        let subject_titles: Vec<String> = extract(&faculty, ClassificationPolicy::TypeBased)
            .subjects
            .into_iter()
            .map(|subject| subject.title)
            .collect();
        let children_titles: Vec<String> = children_of(&faculty).iter().map(title_of).collect();
        assert_eq!(subject_titles, children_titles);
    }
}

#[test]
fn folder_aware_subjects_are_never_empty() {
    for faculty in random_faculties() {
        let summary = extract(&faculty, ClassificationPolicy::FolderAware);
        assert!(summary
            .subjects
            .iter()
            .all(|subject| !subject.courses.is_empty()));
    }
}

#[test]
fn extraction_is_idempotent() {
    for faculty in random_faculties() {
        let snapshot = faculty.clone();
        for policy in POLICIES {
            assert_eq!(extract(&faculty, policy), extract(&faculty, policy));
        }
        assert_eq!(faculty, snapshot);
    }
}

#[test]
fn filter_counts_every_faculty_without_courses() {
    let faculties = random_faculties();
    let without_courses = faculties
        .iter()
        .filter(|faculty| {
            !faculty
                .depth_first()
                .skip(1)
                .any(|node| node.node_type.as_deref() == Some("cours"))
        })
        .count();
    let retained_titles: Vec<String> = faculties
        .iter()
        .filter(|faculty| has_course(faculty))
        .map(title_of)
        .collect();

    let filtered = filter_faculties(faculties);
    assert_eq!(filtered.skipped_count, without_courses);
    assert_eq!(
        filtered.retained.iter().map(title_of).collect::<Vec<_>>(),
        retained_titles
    );
}

#[test]
fn retained_faculties_list_at_least_one_course() {
    for faculty in filter_faculties(random_faculties()).retained {
        for policy in POLICIES {
            let summary = extract(&faculty, policy);
            assert!(summary.course_count() > 0, "{:?}", faculty);
        }
    }
}

#[test]
fn generated_trees_survive_a_trip_through_json() {
    let faculties = random_faculties();
    let mut content_buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut content_buffer, formatter);
    serde_json::json!({"data": {"hierarchicalTreeData": faculties}})
        .serialize(&mut serializer)
        .unwrap();

    let loaded_trees = load_faculties(&[SourceDocument::new("random.json", content_buffer)]);
    assert!(loaded_trees.warnings.is_empty());
    assert_eq!(loaded_trees.faculties, faculties);
}
