#![warn(clippy::unwrap_used)]

use std::{io::Write as _, path::PathBuf};

use arborescence::{
    classifier::ClassificationPolicy,
    configuration::Configuration,
    error::ContextError,
    loader::read_documents,
    pipeline,
    render_model::Rgb,
    renderer::{DocumentRenderer as _, PdfRenderer},
};
use clap::Parser;
use rand::{distributions::Alphanumeric, Rng as _};
use time::OffsetDateTime;

/// Generates a paginated PDF catalogue, one faculty per page, from exported JSON trees.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct CliArguments {
    /// The JSON documents to read, in order.
    #[arg(short = 'i', long = "input", value_name = "json_file")]
    input_paths: Vec<PathBuf>,
    /// Where to write the PDF document.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "pdf_file",
        default_value = "hermione_arborescence.pdf"
    )]
    output_file_path: PathBuf,
    /// A JSON configuration file, the other flags take precedence over it.
    #[arg(short = 'c', long = "configuration", value_name = "json_file")]
    configuration_path: Option<PathBuf>,
    /// The rule deciding which nodes are subjects.
    #[arg(long = "policy", value_enum)]
    classification_policy: Option<ClassificationPolicy>,
    #[arg(long, value_name = "hex_color")]
    primary_color: Option<Rgb>,
    #[arg(long, value_name = "hex_color")]
    text_color: Option<Rgb>,
    #[arg(long)]
    cover_title: Option<String>,
    /// Do not add a cover page.
    #[arg(long)]
    no_cover: bool,
    /// A PNG or JPEG image drawn inside the header bands.
    #[arg(long, value_name = "image_file")]
    brand_image: Option<PathBuf>,
    /// Log the details of the processing.
    #[arg(short, long)]
    verbose: bool,
}

impl CliArguments {
    fn configuration(&self) -> Result<Configuration, ContextError> {
        let mut configuration = match &self.configuration_path {
            Some(configuration_path) => Configuration::from_path(configuration_path)?,
            None => Configuration::default(),
        };
        if let Some(classification_policy) = self.classification_policy {
            configuration.classification_policy = classification_policy;
        }
        if let Some(primary_color) = self.primary_color {
            configuration.primary_color = primary_color;
        }
        if let Some(text_color) = self.text_color {
            configuration.text_color = text_color;
        }
        if let Some(cover_title) = &self.cover_title {
            configuration.cover_title = cover_title.clone();
        }
        if self.no_cover {
            configuration.show_cover = false;
        }
        if let Some(brand_image) = &self.brand_image {
            configuration.brand_image_path = Some(brand_image.clone());
        }
        configuration.load_brand_image()?;

        Ok(configuration)
    }
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ContextError> {
    let arguments = CliArguments::parse();
    env_logger::builder()
        .filter_level(if arguments.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();
    log::debug!("{:?}", arguments);

    let configuration = arguments.configuration()?;
    let (documents, read_warnings) = read_documents(&arguments.input_paths);
    let generated_on = OffsetDateTime::now_utc().date();
    let outcome = pipeline::run(&documents, &configuration, generated_on);

    let warning_count = read_warnings.len() + outcome.warnings.len();
    if warning_count > 0 {
        log::warn!("{} documents could not be used", warning_count);
    }
    for (index, title) in outcome.faculty_titles().iter().enumerate() {
        log::info!("{}. {}", index + 1, title);
    }
    if outcome.is_empty() {
        log::warn!("There is no faculty with courses to render, nothing was written");
        return Ok(());
    }

    let mut renderer = PdfRenderer::new(
        random_identifier(),
        random_identifier(),
        generated_on.midnight().assume_utc(),
    );
    let pdf_document_bytes =
        renderer.render_document(&outcome.model, configuration.brand_image.as_deref())?;

    let mut pdf_file = std::fs::File::create(&arguments.output_file_path)
        .map_err(|error| ContextError::with_error("Failed to create the output file", &error))?;
    pdf_file
        .write_all(&pdf_document_bytes)
        .map_err(|error| ContextError::with_error("Failed to save the output file", &error))?;
    log::info!(
        "Saved the output file to the path: {:?}",
        arguments.output_file_path
    );

    Ok(())
}

/// A 32 characters-long alphanumeric identifier, as the PDF `ID` tag expects.
fn random_identifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(32)
        .collect()
}
