use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{classifier::ClassificationPolicy, error::ContextError, render_model::Rgb};

/// The parameters of a run. It is built once by the caller and only read afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub primary_color: Rgb,
    pub text_color: Rgb,
    pub cover_title: String,
    pub show_cover: bool,
    pub classification_policy: ClassificationPolicy,
    /// Where the caller should load the brand image from, relative paths being resolved
    /// against the directory of the configuration file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_image_path: Option<PathBuf>,
    /// The encoded brand image (PNG or JPEG) drawn inside the header bands.
    #[serde(skip)]
    pub brand_image: Option<Vec<u8>>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            primary_color: Rgb::new(0x8c, 0x91, 0xea),
            text_color: Rgb::new(0x22, 0x22, 0x22),
            cover_title: "hermione Arborescence".to_string(),
            show_cover: true,
            classification_policy: ClassificationPolicy::default(),
            brand_image_path: None,
            brand_image: None,
        }
    }
}

impl Configuration {
    /// Reads a configuration file. Missing fields take their default value; the brand image,
    /// if any is named, is not loaded here but through `load_brand_image`.
    pub fn from_path(configuration_file_path: &Path) -> Result<Self, ContextError> {
        let configuration_file_contents = std::fs::read_to_string(configuration_file_path)
            .map_err(|error| {
                ContextError::with_error(
                    format!(
                        "Failed to read the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;
        let mut configuration: Configuration = serde_json::from_str(&configuration_file_contents)
            .map_err(|error| {
                ContextError::with_error(
                    format!(
                        "Failed to parse the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;

        if let (Some(brand_image_path), Some(parent)) = (
            configuration.brand_image_path.as_ref(),
            configuration_file_path.parent(),
        ) {
            if brand_image_path.is_relative() {
                configuration.brand_image_path = Some(parent.join(brand_image_path));
            }
        }

        Ok(configuration)
    }

    /// Loads the bytes of the brand image named by `brand_image_path`, if any.
    pub fn load_brand_image(&mut self) -> Result<(), ContextError> {
        if let Some(brand_image_path) = &self.brand_image_path {
            let brand_image = std::fs::read(brand_image_path).map_err(|error| {
                ContextError::with_error(
                    format!("Failed to read the brand image {:?}", brand_image_path),
                    &error,
                )
            })?;
            self.brand_image = Some(brand_image);
        }

        Ok(())
    }
}
