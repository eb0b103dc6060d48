use time::OffsetDateTime;

use crate::{
    error::ContextError,
    extractor::{FacultySummary, SubjectSummary},
    pdf::{millimeters_to_points, BuiltinFont, ImageXObject, PdfDocument},
    render_model::{CoverBlock, HeaderBand, ImageReference, Palette, RenderBlock, RenderModel},
};

/// Turns a render model, and the image asset it references, into a final document.
pub trait DocumentRenderer {
    type RenderedDocument;

    fn render_document(
        &mut self,
        model: &RenderModel,
        brand_image: Option<&[u8]>,
    ) -> Result<Self::RenderedDocument, ContextError>;
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT_MARGIN: f32 = 18.0;
const RIGHT_MARGIN: f32 = 18.0;
const TOP_MARGIN: f32 = 20.0;
const BOTTOM_MARGIN: f32 = 18.0;

const COVER_TITLE_SPACING: f32 = 22.0;
const COVER_META_SPACING: f32 = 8.0;
const FACULTY_TITLE_SPACING: f32 = 10.0;
const SUBJECT_SPACING: f32 = 3.0;
/// Horizontal margin kept on each side of the brand image inside a band.
const BAND_IMAGE_MARGIN: f32 = 8.0;
/// How much shorter than its band the brand image is.
const BAND_IMAGE_INSET: f32 = 6.0;

/// Sizes are in points.
#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: BuiltinFont,
    font_size: f32,
    leading: f32,
    left_indent: f32,
    space_before: f32,
    space_after: f32,
}

const COVER_TITLE_STYLE: TextStyle = TextStyle {
    font: BuiltinFont::HelveticaBold,
    font_size: 28.0,
    leading: 32.0,
    left_indent: 0.0,
    space_before: 0.0,
    space_after: 0.0,
};

const COVER_META_STYLE: TextStyle = TextStyle {
    font: BuiltinFont::Helvetica,
    font_size: 10.0,
    leading: 12.0,
    ..COVER_TITLE_STYLE
};

const FACULTY_TITLE_STYLE: TextStyle = TextStyle {
    font: BuiltinFont::HelveticaBold,
    font_size: 22.0,
    leading: 26.0,
    left_indent: 0.0,
    space_before: 0.0,
    space_after: 6.0,
};

const SUBJECT_TITLE_STYLE: TextStyle = TextStyle {
    font: BuiltinFont::HelveticaBold,
    font_size: 15.0,
    leading: 18.0,
    left_indent: 0.0,
    space_before: 6.0,
    space_after: 2.0,
};

const BULLET_STYLE: TextStyle = TextStyle {
    font: BuiltinFont::Helvetica,
    font_size: 11.5,
    leading: 15.0,
    left_indent: 10.0,
    space_before: 0.0,
    space_after: 0.0,
};

const NO_SUBJECT_TEXT: &str = "Aucune matière/cours trouvé(e) pour cette faculté.";
const NO_COURSE_TEXT: &str = "• (aucun cours listé)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    Center,
}

/// Renders the model as an A4 PDF document, one faculty per page.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    /// The identifier of the document, set as the first element of the PDF `ID` tag.
    pub document_identifier: String,
    /// The identifier of this rendition, set as the second element of the PDF `ID` tag.
    pub instance_identifier: String,
    /// Recorded as both the creation and modification date of the document.
    pub creation_date: OffsetDateTime,
}

impl PdfRenderer {
    pub fn new(
        document_identifier: String,
        instance_identifier: String,
        creation_date: OffsetDateTime,
    ) -> Self {
        PdfRenderer {
            document_identifier,
            instance_identifier,
            creation_date,
        }
    }

    /// Lays the model out into a PDF document without finalizing it.
    pub fn compose(
        &self,
        model: &RenderModel,
        brand_image: Option<&[u8]>,
    ) -> Result<PdfDocument, ContextError> {
        let mut pdf_document = PdfDocument::new(self.document_identifier.clone());

        // A brand image that cannot be decoded is left out rather than failing the whole document
        let brand_image = match brand_image.map(ImageXObject::from_encoded_bytes) {
            Some(Ok(image)) => Some(image),
            Some(Err(error)) => {
                log::warn!("Rendering without the brand image: {}", error);
                None
            }
            None => None,
        };
        let brand_aspect_ratio = brand_image.as_ref().map(ImageXObject::aspect_ratio);
        if let Some(image) = brand_image {
            // Only one image is ever referenced by the model
            pdf_document.add_image(ImageReference::new(0).name(), image);
        }

        let mut composer = PageComposer {
            pdf_document: &mut pdf_document,
            palette: model.palette,
            brand_aspect_ratio,
            page_index: 0,
            layer_index: 0,
            cursor: 0.0,
        };
        composer.new_page();
        for block in &model.blocks {
            match block {
                RenderBlock::Cover(cover) => composer.cover(cover)?,
                RenderBlock::Faculty(section) => {
                    composer.band(&section.band)?;
                    composer.faculty(&section.summary)?;
                }
                RenderBlock::PageBreak => composer.new_page(),
            }
        }

        Ok(pdf_document)
    }
}

impl DocumentRenderer for PdfRenderer {
    type RenderedDocument = Vec<u8>;

    fn render_document(
        &mut self,
        model: &RenderModel,
        brand_image: Option<&[u8]>,
    ) -> Result<Self::RenderedDocument, ContextError> {
        let mut pdf_document = self.compose(model, brand_image)?;
        let title = model
            .cover()
            .map(|cover| cover.title.as_str())
            .unwrap_or_default();
        log::debug!("Composed {} pages", pdf_document.page_count());

        pdf_document.write_all(self.instance_identifier.clone(), title, self.creation_date)?;
        pdf_document.optimize();
        pdf_document.save_to_bytes()
    }
}

/// Keeps track of the current page and of the vertical position at which the next line goes.
struct PageComposer<'a> {
    pdf_document: &'a mut PdfDocument,
    palette: Palette,
    brand_aspect_ratio: Option<f32>,
    page_index: usize,
    layer_index: usize,
    /// Distance in points from the bottom of the page to the top of the next line.
    cursor: f32,
}

impl PageComposer<'_> {
    fn new_page(&mut self) {
        let (page_index, layer_index) = self
            .pdf_document
            .add_page_with_layer(PAGE_WIDTH, PAGE_HEIGHT);
        self.page_index = page_index;
        self.layer_index = layer_index;
        self.cursor = millimeters_to_points(PAGE_HEIGHT - TOP_MARGIN);
    }

    fn bottom(&self) -> f32 {
        millimeters_to_points(BOTTOM_MARGIN)
    }

    fn frame_width(&self) -> f32 {
        millimeters_to_points(PAGE_WIDTH - LEFT_MARGIN - RIGHT_MARGIN)
    }

    fn frame_height(&self) -> f32 {
        millimeters_to_points(PAGE_HEIGHT - TOP_MARGIN - BOTTOM_MARGIN)
    }

    fn remaining_height(&self) -> f32 {
        self.cursor - self.bottom()
    }

    /// Moves the cursor down, never below the bottom margin.
    fn space(&mut self, height: f32) {
        self.cursor = (self.cursor - height).max(self.bottom());
    }

    /// Draws the band across the top of the current page and reserves its height in the frame.
    fn band(&mut self, band: &HeaderBand) -> Result<(), ContextError> {
        let page_width = millimeters_to_points(PAGE_WIDTH);
        let page_height = millimeters_to_points(PAGE_HEIGHT);
        let band_height = millimeters_to_points(band.height);
        self.pdf_document.fill_rectangle_in_layer_in_page(
            self.page_index,
            self.layer_index,
            self.palette.primary.to_unit_components(),
            [0.0, page_height - band_height, page_width, band_height],
        )?;

        if let (Some(image), Some(aspect_ratio)) = (&band.image, self.brand_aspect_ratio) {
            let maximum_width = page_width - 2.0 * millimeters_to_points(BAND_IMAGE_MARGIN);
            let maximum_height = band_height - millimeters_to_points(BAND_IMAGE_INSET);
            let (width, height) = fit_in_box(aspect_ratio, maximum_width, maximum_height);
            self.pdf_document.draw_image_in_layer_in_page(
                self.page_index,
                self.layer_index,
                image.name(),
                [
                    (page_width - width) / 2.0,
                    page_height - band_height + (band_height - height) / 2.0,
                    width,
                    height,
                ],
            )?;
        }

        self.space(band_height);
        Ok(())
    }

    fn cover(&mut self, cover: &CoverBlock) -> Result<(), ContextError> {
        self.band(&cover.band)?;
        self.space(millimeters_to_points(COVER_TITLE_SPACING));
        self.paragraph(&cover.title, COVER_TITLE_STYLE, Alignment::Center)?;
        self.space(millimeters_to_points(COVER_META_SPACING));
        self.paragraph(&cover.generation_line(), COVER_META_STYLE, Alignment::Center)
    }

    fn faculty(&mut self, summary: &FacultySummary) -> Result<(), ContextError> {
        self.space(millimeters_to_points(FACULTY_TITLE_SPACING));
        self.paragraph(&summary.title, FACULTY_TITLE_STYLE, Alignment::Left)?;

        if summary.subjects.is_empty() {
            return self.paragraph(NO_SUBJECT_TEXT, BULLET_STYLE, Alignment::Left);
        }
        for subject in &summary.subjects {
            self.subject(subject)?;
        }

        Ok(())
    }

    /// Writes a subject and its courses, starting a new page first when the whole block
    /// does not fit on the current one but would fit on an empty one.
    fn subject(&mut self, subject: &SubjectSummary) -> Result<(), ContextError> {
        let course_lines = subject
            .courses
            .iter()
            .map(|course| (format!("• {}", course), BULLET_STYLE));
        let lines: Vec<(String, TextStyle)> =
            std::iter::once((subject.title.clone(), SUBJECT_TITLE_STYLE))
                .chain(course_lines)
                .chain(
                    subject
                        .courses
                        .is_empty()
                        .then(|| (NO_COURSE_TEXT.to_string(), BULLET_STYLE)),
                )
                .collect();

        let block_height: f32 = lines
            .iter()
            .map(|(text, style)| self.paragraph_height(text, *style))
            .sum::<f32>()
            + millimeters_to_points(SUBJECT_SPACING);
        if block_height > self.remaining_height() && block_height <= self.frame_height() {
            self.new_page();
        }

        for (text, style) in &lines {
            self.paragraph(text, *style, Alignment::Left)?;
        }
        self.space(millimeters_to_points(SUBJECT_SPACING));

        Ok(())
    }

    fn available_width(&self, style: TextStyle) -> f32 {
        self.frame_width() - style.left_indent
    }

    fn paragraph_height(&self, text: &str, style: TextStyle) -> f32 {
        let lines = wrap_text(text, style.font, style.font_size, self.available_width(style));
        style.space_before + lines.len() as f32 * style.leading + style.space_after
    }

    /// Writes a wrapped paragraph, continuing on a new page whenever a line does not fit.
    fn paragraph(
        &mut self,
        text: &str,
        style: TextStyle,
        alignment: Alignment,
    ) -> Result<(), ContextError> {
        self.space(style.space_before);
        let left = millimeters_to_points(LEFT_MARGIN) + style.left_indent;

        for line in wrap_text(text, style.font, style.font_size, self.available_width(style)) {
            if self.remaining_height() < style.leading {
                self.new_page();
            }
            let x = match alignment {
                Alignment::Left => left,
                Alignment::Center => {
                    let line_width = style.font.text_width(&line, style.font_size);
                    left + (self.available_width(style) - line_width).max(0.0) / 2.0
                }
            };
            // The baseline sits one font size below the top of the line
            let baseline = self.cursor - style.font_size;
            self.pdf_document.write_text_to_layer_in_page(
                self.page_index,
                self.layer_index,
                self.palette.text.to_unit_components(),
                &line,
                style.font,
                style.font_size,
                [x, baseline],
            )?;
            self.cursor -= style.leading;
        }

        self.space(style.space_after);
        Ok(())
    }
}

/// The largest size with the given aspect ratio which fits in the box.
fn fit_in_box(aspect_ratio: f32, maximum_width: f32, maximum_height: f32) -> (f32, f32) {
    let width = maximum_width.min(maximum_height * aspect_ratio);
    (width, width / aspect_ratio)
}

/// Splits the text into lines no wider than `maximum_width` at word boundaries. A word wider
/// than a whole line gets a line of its own. There is always at least one line.
fn wrap_text(text: &str, font: BuiltinFont, font_size: f32, maximum_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current_line, word);
        if font.text_width(&candidate, font_size) <= maximum_width {
            current_line = candidate;
        } else {
            lines.push(std::mem::replace(&mut current_line, word.to_string()));
        }
    }
    if !current_line.is_empty() || lines.is_empty() {
        lines.push(current_line);
    }

    lines
}
