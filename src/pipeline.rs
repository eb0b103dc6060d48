use time::Date;

use crate::{
    configuration::Configuration,
    error::DocumentDecodeError,
    extractor::extract,
    filter::filter_faculties,
    loader::{load_faculties, SourceDocument},
    render_model::{build_render_model, RenderModel},
};

/// The result of a run: the model to render and what was left out along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub model: RenderModel,
    /// One entry per document which contributed no faculty.
    pub warnings: Vec<DocumentDecodeError>,
    /// Number of faculties found across all the documents, before filtering.
    pub detected_faculties: usize,
    /// Number of faculties dropped because they had no course.
    pub skipped_faculties: usize,
}

impl PipelineOutcome {
    /// Whether there is nothing to render, which the caller has to handle itself.
    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    /// Titles of the rendered faculties, in order.
    pub fn faculty_titles(&self) -> Vec<&str> {
        self.model
            .faculty_sections()
            .map(|section| section.summary.title.as_str())
            .collect()
    }
}

/// Loads the documents in the given order, drops the faculties without courses, summarizes
/// the others with the configured policy and assembles the render model.
pub fn run(
    documents: &[SourceDocument],
    configuration: &Configuration,
    generated_on: Date,
) -> PipelineOutcome {
    let loaded_trees = load_faculties(documents);
    let detected_faculties = loaded_trees.faculties.len();
    log::info!(
        "Detected {} faculties in {} documents",
        detected_faculties,
        documents.len()
    );

    let filtered_faculties = filter_faculties(loaded_trees.faculties);
    let summaries = filtered_faculties
        .retained
        .iter()
        .map(|faculty| extract(faculty, configuration.classification_policy))
        .collect();

    PipelineOutcome {
        model: build_render_model(summaries, configuration, generated_on),
        warnings: loaded_trees.warnings,
        detected_faculties,
        skipped_faculties: filtered_faculties.skipped_count,
    }
}
