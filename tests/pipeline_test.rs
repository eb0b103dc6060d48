use arborescence::{
    classifier::ClassificationPolicy,
    configuration::Configuration,
    extractor::{extract, FacultySummary, SubjectSummary, FALLBACK_SUBJECT_TITLE},
    filter::filter_faculties,
    loader::{load_faculties, SourceDocument},
    pipeline,
    render_model::RenderBlock,
    renderer::{DocumentRenderer as _, PdfRenderer},
};
use serde_json::json;
use similar_asserts::assert_eq;
use time::{Date, Month, OffsetDateTime};

fn document(name: &str, value: serde_json::Value) -> SourceDocument {
    SourceDocument::new(name, serde_json::to_vec(&value).unwrap())
}

fn configuration(classification_policy: ClassificationPolicy) -> Configuration {
    Configuration {
        classification_policy,
        ..Configuration::default()
    }
}

fn generated_on() -> Date {
    Date::from_calendar_date(2025, Month::March, 5).unwrap()
}

fn summaries(outcome: &pipeline::PipelineOutcome) -> Vec<FacultySummary> {
    outcome
        .model
        .faculty_sections()
        .map(|section| section.summary.clone())
        .collect()
}

#[test]
fn folder_aware_end_to_end() {
    let documents = [document(
        "facultes.json",
        json!({"data": {"hierarchicalTreeData": [{
            "title": "FacA",
            "children": [{
                "title": "Algo",
                "type": "ue",
                "isFolder": false,
                "children": [
                    {"title": "Cours1", "type": "cours"},
                    {"title": "cours1", "type": "cours"},
                ],
            }],
        }]}}),
    )];
    let outcome = pipeline::run(
        &documents,
        &configuration(ClassificationPolicy::FolderAware),
        generated_on(),
    );

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.faculty_titles(), vec!["FacA"]);
    assert_eq!(
        summaries(&outcome),
        vec![FacultySummary {
            title: "FacA".into(),
            subjects: vec![SubjectSummary {
                title: "Algo".into(),
                courses: vec!["Cours1".into()],
            }],
        }]
    );
}

#[test]
fn faculties_without_courses_never_reach_the_extractor() {
    let documents = [document(
        "facultes.json",
        json!({"data": {"hierarchicalTreeData": [
            {"title": "FacB", "children": []},
            {"title": "FacC", "children": [{"title": "x", "type": "cours"}]},
            {"title": "FacD", "children": [{"title": "UE", "type": "ue"}]},
        ]}}),
    )];
    let outcome = pipeline::run(
        &documents,
        &configuration(ClassificationPolicy::TypeBased),
        generated_on(),
    );

    assert_eq!(outcome.detected_faculties, 3);
    assert_eq!(outcome.skipped_faculties, 2);
    assert_eq!(outcome.faculty_titles(), vec!["FacC"]);
}

#[test]
fn one_bad_document_does_not_affect_the_others() {
    let good = |title: &str| {
        json!({"data": {"hierarchicalTreeData": [
            {"title": title, "children": [{"title": "S", "children": [{"title": "c", "type": "cours"}]}]},
            {"title": format!("{} bis", title), "children": [{"title": "c", "type": "cours"}]},
        ]}})
    };
    let documents = [
        document("first.json", good("Un")),
        SourceDocument::new("second.json", b"{ not json".to_vec()),
        document("third.json", good("Trois")),
    ];
    let loaded_trees = load_faculties(&documents);

    assert_eq!(loaded_trees.faculties.len(), 4);
    assert_eq!(loaded_trees.warnings.len(), 1);
    assert_eq!(loaded_trees.warnings[0].document_name.as_str(), "second.json");

    let outcome = pipeline::run(
        &documents,
        &configuration(ClassificationPolicy::FolderAware),
        generated_on(),
    );
    assert_eq!(
        outcome.faculty_titles(),
        vec!["Un", "Un bis", "Trois", "Trois bis"]
    );
}

#[test]
fn identical_faculties_from_different_documents_are_kept() {
    let tree = json!({"data": {"hierarchicalTreeData": [
        {"title": "Sciences", "children": [{"title": "c", "type": "cours"}]},
    ]}});
    let documents = [document("a.json", tree.clone()), document("b.json", tree)];
    let outcome = pipeline::run(&documents, &Configuration::default(), generated_on());
    assert_eq!(outcome.faculty_titles(), vec!["Sciences", "Sciences"]);
}

#[test]
fn courses_outside_subjects_fall_back_to_a_single_bucket() {
    let faculties = load_faculties(&[document(
        "lettres.json",
        json!({"data": {"hierarchicalTreeData": [{
            "title": "Lettres",
            "children": [{"title": "Semestre", "type": "semestre", "children": [
                {"title": "Poésie", "type": "cours"},
            ]}],
        }]}}),
    )])
    .faculties;
    let filtered = filter_faculties(faculties);
    assert_eq!(filtered.skipped_count, 0);

    let summary = extract(&filtered.retained[0], ClassificationPolicy::FolderAware);
    assert_eq!(
        summary.subjects,
        vec![SubjectSummary {
            title: FALLBACK_SUBJECT_TITLE.into(),
            courses: vec!["Poésie".into()],
        }]
    );

    // Under the type-based policy the direct child is the subject
    let summary = extract(&filtered.retained[0], ClassificationPolicy::TypeBased);
    assert_eq!(summary.subjects[0].title.as_str(), "Semestre");
}

#[test]
fn empty_input_has_nothing_to_render() {
    let outcome = pipeline::run(&[], &Configuration::default(), generated_on());
    assert!(outcome.is_empty());
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.detected_faculties, 0);
    // Only the cover is left
    assert!(matches!(
        outcome.model.blocks.as_slice(),
        [RenderBlock::Cover(_)]
    ));
}

#[test]
fn rendered_catalogue_has_a_page_per_faculty() {
    let documents = [document(
        "facultes.json",
        json!({"data": {"hierarchicalTreeData": [
            {"title": "Droit", "children": [{"title": "UE", "type": "ue", "children": [
                {"title": "Contrats", "type": "cours"},
            ]}]},
            {"title": "Médecine", "children": [{"title": "UE", "type": "category", "children": [
                {"title": "Anatomie", "type": "cours"},
            ]}]},
        ]}}),
    )];
    let configuration = configuration(ClassificationPolicy::FolderAware);
    let outcome = pipeline::run(&documents, &configuration, generated_on());

    let mut renderer = PdfRenderer::new(
        "QU2KK7yivMeRDnU8DodEQxnfqJAe4wZ2".into(),
        "DLjCAhuTD3cvaoQCJnMvkC0iNWEGEfyD".into(),
        OffsetDateTime::UNIX_EPOCH,
    );
    let bytes = renderer.render_document(&outcome.model, None).unwrap();
    let pdf_document = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(pdf_document.get_pages().len(), 3);

    // Rendering is deterministic for fixed identifiers and date
    let again = renderer.render_document(&outcome.model, None).unwrap();
    assert!(bytes == again);
}
