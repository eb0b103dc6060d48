use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{configuration::Configuration, error::ContextError, extractor::FacultySummary};

/// Height of the colored band at the top of the cover page.
pub const COVER_BAND_HEIGHT: f32 = 28.0;
/// Height of the colored band at the top of each faculty page.
pub const FACULTY_BAND_HEIGHT: f32 = 16.0;

/// A color given as `#rrggbb`, `rrggbb` or `#rgb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Rgb { red, green, blue }
    }

    /// The components scaled to `0.0..=1.0`, as the PDF color operators expect them.
    pub fn to_unit_components(self) -> [f32; 3] {
        [self.red, self.green, self.blue].map(|component| f32::from(component) / 255.0)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl FromStr for Rgb {
    type Err = ContextError;

    fn from_str(hex_color: &str) -> Result<Self, Self::Err> {
        let digits = hex_color.trim().trim_start_matches('#');
        let invalid = || ContextError::with_context(format!("Invalid hex color {:?}", hex_color));
        if !digits.chars().all(|digit| digit.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let component = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match digits.len() {
            6 => Ok(Rgb::new(
                component(&digits[0..2])?,
                component(&digits[2..4])?,
                component(&digits[4..6])?,
            )),
            // Shorthand form, each digit is doubled
            3 => Ok(Rgb::new(
                component(&digits[0..1])? * 17,
                component(&digits[1..2])? * 17,
                component(&digits[2..3])? * 17,
            )),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ContextError;

    fn try_from(hex_color: String) -> Result<Self, Self::Error> {
        hex_color.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.to_hex())
    }
}

/// The colors of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Fill of the header bands.
    pub primary: Rgb,
    /// Every piece of text.
    pub text: Rgb,
}

/// Named reference to an image asset handed to the renderer alongside the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    /// Creates a new reference for an image from a number.
    pub fn new(index: usize) -> Self {
        Self(format!("X{index}"))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A full-width band in the primary color, optionally showing the brand image.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBand {
    /// Height in millimeters.
    pub height: f32,
    pub image: Option<ImageReference>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverBlock {
    pub band: HeaderBand,
    pub title: String,
    pub generated_on: Date,
}

impl CoverBlock {
    /// The line printed below the cover title, e.g. `Généré le 05 March 2025`.
    pub fn generation_line(&self) -> String {
        format!(
            "Généré le {:02} {} {}",
            self.generated_on.day(),
            self.generated_on.month(),
            self.generated_on.year()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacultySection {
    pub band: HeaderBand,
    pub summary: FacultySummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderBlock {
    Cover(CoverBlock),
    Faculty(FacultySection),
    /// The next block starts on a new page.
    PageBreak,
}

/// Everything the renderer needs, in reading order. Consecutive content blocks are always
/// separated by a page break and the last block is never one.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub palette: Palette,
    pub blocks: Vec<RenderBlock>,
}

impl RenderModel {
    pub fn cover(&self) -> Option<&CoverBlock> {
        self.blocks.iter().find_map(|block| match block {
            RenderBlock::Cover(cover) => Some(cover),
            _ => None,
        })
    }

    pub fn faculty_sections(&self) -> impl Iterator<Item = &FacultySection> {
        self.blocks.iter().filter_map(|block| match block {
            RenderBlock::Faculty(section) => Some(section),
            _ => None,
        })
    }

    /// Whether there is no faculty to render, a cover alone is not worth a document.
    pub fn is_empty(&self) -> bool {
        self.faculty_sections().next().is_none()
    }
}

/// Assembles the model from the summaries of the retained faculties, in their order.
pub fn build_render_model(
    summaries: Vec<FacultySummary>,
    configuration: &Configuration,
    generated_on: Date,
) -> RenderModel {
    let brand_image = configuration
        .brand_image
        .as_ref()
        .map(|_| ImageReference::new(0));
    let band = |height| HeaderBand {
        height,
        image: brand_image.clone(),
    };

    let cover = configuration.show_cover.then(|| {
        RenderBlock::Cover(CoverBlock {
            band: band(COVER_BAND_HEIGHT),
            title: configuration.cover_title.clone(),
            generated_on,
        })
    });
    let sections = summaries.into_iter().map(|summary| {
        RenderBlock::Faculty(FacultySection {
            band: band(FACULTY_BAND_HEIGHT),
            summary,
        })
    });

    let mut blocks = Vec::new();
    for block in cover.into_iter().chain(sections) {
        if !blocks.is_empty() {
            blocks.push(RenderBlock::PageBreak);
        }
        blocks.push(block);
    }

    RenderModel {
        palette: Palette {
            primary: configuration.primary_color,
            text: configuration.text_color,
        },
        blocks,
    }
}
