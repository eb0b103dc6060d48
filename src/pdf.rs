use std::{collections::BTreeMap, io::BufWriter, mem};

use lopdf::{Object, StringFormat};
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use crate::error::ContextError;

/// Advance widths of the printable ASCII characters (from the space to the tilde) of Helvetica,
/// in thousandths of an em, as listed in the Adobe font metrics.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

/// Same as `HELVETICA_WIDTHS`, for Helvetica-Bold.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// The character printed in place of the ones the WinAnsi encoding cannot represent.
const REPLACEMENT_CHARACTER: char = '?';

/// One of the standard fonts every PDF reader provides, so that nothing has to be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    const ALL: [BuiltinFont; 2] = [BuiltinFont::Helvetica, BuiltinFont::HelveticaBold];

    /// The PostScript name of the font.
    pub fn base_font(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// The name under which the font is registered in the page resources.
    fn resource_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F0",
            BuiltinFont::HelveticaBold => "F1",
        }
    }

    /// The advance width of a character in thousandths of an em. Accented letters are measured
    /// by their base letter and unknown characters by an average width.
    pub fn character_width(self, character: char) -> u16 {
        let widths = match self {
            BuiltinFont::Helvetica => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        match character {
            ' '..='~' => widths[character as usize - ' ' as usize],
            '•' => 350,
            '…' | '—' | '‰' => 1000,
            '‘' | '’' | '‚' => match self {
                BuiltinFont::Helvetica => 222,
                BuiltinFont::HelveticaBold => 278,
            },
            'Œ' | 'œ' | 'Æ' | 'æ' => 944,
            _ => std::iter::once(character)
                .nfd()
                .next()
                .filter(|base| *base != character && base.is_ascii_graphic())
                .map(|base| self.character_width(base))
                .unwrap_or(556),
        }
    }

    /// The width in points of the text once written at the given size.
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        let total: u32 = text
            .nfc()
            .map(|character| match win_ansi_code(character) {
                Some(_) => u32::from(self.character_width(character)),
                None => u32::from(self.character_width(REPLACEMENT_CHARACTER)),
            })
            .sum();
        total as f32 * font_size / 1000.0
    }

    fn to_dictionary(self) -> lopdf::Dictionary {
        lopdf::Dictionary::from_iter(vec![
            ("Type", Object::Name("Font".into())),
            ("Subtype", Object::Name("Type1".into())),
            ("BaseFont", Object::Name(self.base_font().into())),
            ("Encoding", Object::Name("WinAnsiEncoding".into())),
        ])
    }
}

/// The code of a character in the WinAnsi encoding (Windows-1252), if it has one.
fn win_ansi_code(character: char) -> Option<u8> {
    let code = match character {
        ' '..='~' | '\u{a0}'..='\u{ff}' => character as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    };
    Some(code)
}

/// Encodes the NFC form of the text in WinAnsi, logging and replacing what cannot be encoded.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.nfc()
        .map(|character| {
            win_ansi_code(character).unwrap_or_else(|| {
                log::warn!(
                    "Unable to encode the character {:?}, replacing it with {:?}",
                    character,
                    REPLACEMENT_CHARACTER
                );
                REPLACEMENT_CHARACTER as u8
            })
        })
        .collect()
}

/// Encodes a string for the document information dictionary, as UTF-16BE with a byte order mark.
fn encode_text_string(text: &str) -> Object {
    let mut bytes = vec![0xfe, 0xff];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// One layer of PDF data. It can be converted into a `lopdf::Stream` by calling `TryFrom::try_from`.
#[derive(Debug, Clone)]
pub struct PdfLayer {
    /// Name of the layer.
    pub(crate) name: String,
    /// Stream objects in this layer. Usually, one layer equals to one stream.
    pub(super) operations: Vec<lopdf::content::Operation>,
}

impl TryFrom<PdfLayer> for lopdf::Stream {
    type Error = ContextError;

    fn try_from(value: PdfLayer) -> Result<Self, Self::Error> {
        use lopdf::{Dictionary, Stream};
        // Construct the stream content from the actual underlying operations of the layer,
        // wrapped in an isolated graphics state block
        let mut operations = Vec::with_capacity(value.operations.len() + 2);
        operations.push(lopdf::content::Operation::new("q", vec![]));
        operations.extend(value.operations);
        operations.push(lopdf::content::Operation::new("Q", vec![]));
        let stream_content = lopdf::content::Content { operations };

        let content = stream_content.encode().map_err(|error| {
            ContextError::with_error(
                format!("Failed to encode the content of the layer {:?}", value.name),
                &error,
            )
        })?;
        Ok(Stream::new(Dictionary::new(), content))
    }
}

/// The low-level image representation for a PDF document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageXObject {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// The 8-bit RGB samples of the image.
    pub image_data: Vec<u8>,
    /// The 8-bit alpha samples, only when the image is not fully opaque.
    pub soft_mask_data: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Decodes a PNG or JPEG image into raw samples.
    pub fn from_encoded_bytes(bytes: &[u8]) -> Result<Self, ContextError> {
        let decoded_image = image::load_from_memory(bytes)
            .map_err(|error| ContextError::with_error("Failed to decode the image", &error))?
            .to_rgba8();
        let (width, height) = decoded_image.dimensions();

        let mut image_data = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha_data = Vec::with_capacity((width * height) as usize);
        for pixel in decoded_image.pixels() {
            let [red, green, blue, alpha] = pixel.0;
            image_data.extend([red, green, blue]);
            alpha_data.push(alpha);
        }
        let is_opaque = alpha_data.iter().all(|alpha| *alpha == u8::MAX);

        Ok(ImageXObject {
            width,
            height,
            image_data,
            soft_mask_data: (!is_opaque).then_some(alpha_data),
        })
    }

    /// The ratio between the width and the height of the image.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Inserts the image (and its soft mask) into the document, returning the reference to it.
    fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::ObjectId {
        use lopdf::Object::*;

        let image_dictionary = |color_space: &str| {
            lopdf::Dictionary::from_iter(vec![
                ("Type", Name("XObject".into())),
                ("Subtype", Name("Image".into())),
                ("Width", Integer(i64::from(self.width))),
                ("Height", Integer(i64::from(self.height))),
                ("ColorSpace", Name(color_space.into())),
                ("BitsPerComponent", Integer(8)),
            ])
        };

        let mut dictionary = image_dictionary("DeviceRGB");
        if let Some(soft_mask_data) = &self.soft_mask_data {
            let soft_mask_stream =
                lopdf::Stream::new(image_dictionary("DeviceGray"), soft_mask_data.clone());
            let soft_mask_id = inner_document.add_object(soft_mask_stream);
            dictionary.set("SMask", Reference(soft_mask_id));
        }

        inner_document.add_object(lopdf::Stream::new(dictionary, self.image_data.clone()))
    }
}

/// The representation of a PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// The index of the page in the document, starting from one.
    pub(crate) number: usize,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// Page layers.
    pub layers: Vec<PdfLayer>,
}

/// Converts millimeters to points. This function is used in order to present the data
/// in the format required by the PDF specification, while the end user might want to work in
/// millimeters which are easier to reason about.
pub fn millimeters_to_points(millimeters: f32) -> f32 {
    millimeters * 2.834646
}

/// This struct represents the actual PDF document on a high-level. It is an interface to the actual underlying
/// `lopdf::document` with the addition of the PDF pages, the document ID and the images used in the document.
///
/// Positions and sizes given to the drawing functions are in points, measured from the
/// bottom-left corner of the page; page sizes are given in millimeters.
pub struct PdfDocument {
    /// The images of the document by the name they are drawn with.
    images: BTreeMap<String, ImageXObject>,
    /// The underlying PDF document: this is a low-level interface and shouldn't be directly interacted with
    /// unless strictly necessary, anyway this is why it is exposed to the user.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used to in order to set the PDF `ID` tag.
    pub identifier: String,
    /// The pages of the PDF document.
    pub(crate) pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Create a new `PdfDocument` by defaulting the underlying PDF document to version 1.5
    /// of the PDF specification and customly specifying the PDF identifier.
    pub fn new(pdf_document_identifier: String) -> Self {
        PdfDocument {
            images: BTreeMap::default(),
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: pdf_document_identifier,
            pages: Vec::new(),
        }
    }

    /// Adds a page of given width and height in millimeters with an empty layer for contents to be added to.
    /// The function returns the index of the page and of the layer in the page, these are to be passed
    /// to the drawing functions.
    pub fn add_page_with_layer(&mut self, page_width: f32, page_height: f32) -> (usize, usize) {
        let pdf_page = PdfPage {
            number: self.pages.len() + 1,
            width: millimeters_to_points(page_width),
            height: millimeters_to_points(page_height),
            layers: vec![PdfLayer {
                name: "Layer0".into(),
                operations: Vec::new(),
            }],
        };
        self.pages.push(pdf_page);

        (self.pages.len() - 1, 0)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Registers an image under the given name, so that it can be drawn on any page.
    pub fn add_image<S: Into<String>>(&mut self, name: S, image: ImageXObject) {
        self.images.insert(name.into(), image);
    }

    /// Writes a single line of text in the given font, size and color with its baseline
    /// starting at the given position.
    #[allow(clippy::too_many_arguments)]
    pub fn write_text_to_layer_in_page(
        &mut self,
        page_index: usize,
        layer_index: usize,
        color: [f32; 3],
        text: &str,
        font: BuiltinFont,
        font_size: f32,
        position: [f32; 2],
    ) -> Result<(), ContextError> {
        use lopdf::content::Operation;

        let [x, y] = position;
        let [red, green, blue] = color;
        self.add_operations_to_layer_in_page(
            layer_index,
            page_index,
            vec![
                Operation::new("BT", vec![]), // Begin text section
                Operation::new(
                    "Tf",
                    vec![Object::Name(font.resource_name().into()), font_size.into()],
                ), // Set the font and the font size
                Operation::new("Td", vec![x.into(), y.into()]), // Set the position where the text begins to be written
                Operation::new(
                    "rg",
                    vec![Object::Real(red), Object::Real(green), Object::Real(blue)],
                ), // Set the filling color of the text
                Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        )
    }

    /// Fills the rectangle `[x, y, width, height]` with the given color.
    pub fn fill_rectangle_in_layer_in_page(
        &mut self,
        page_index: usize,
        layer_index: usize,
        color: [f32; 3],
        rectangle: [f32; 4],
    ) -> Result<(), ContextError> {
        use lopdf::content::Operation;

        let [red, green, blue] = color;
        let [x, y, width, height] = rectangle;
        self.add_operations_to_layer_in_page(
            layer_index,
            page_index,
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "rg",
                    vec![Object::Real(red), Object::Real(green), Object::Real(blue)],
                ),
                Operation::new(
                    "re",
                    vec![x.into(), y.into(), width.into(), height.into()],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Draws a previously added image stretched over the rectangle `[x, y, width, height]`.
    pub fn draw_image_in_layer_in_page(
        &mut self,
        page_index: usize,
        layer_index: usize,
        image_name: &str,
        rectangle: [f32; 4],
    ) -> Result<(), ContextError> {
        use lopdf::content::Operation;

        if !self.images.contains_key(image_name) {
            return Err(ContextError::with_context(format!(
                "Failed to find the image {:?} into the images map",
                image_name
            )));
        }
        let [x, y, width, height] = rectangle;
        self.add_operations_to_layer_in_page(
            layer_index,
            page_index,
            vec![
                Operation::new("q", vec![]),
                // The image space is the unit square, stretched to the rectangle
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        x.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(image_name.into())]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Write the operations so far specified to the PDF file and finalize it.
    ///
    /// One mandatory argument needed by the PDF specification is the instance ID, which needs to be a
    /// 32 characters-long string.
    pub fn write_all(
        &mut self,
        instance_id: String,
        title: &str,
        creation_date: OffsetDateTime,
    ) -> Result<(), ContextError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        let timestamp = to_pdf_timestamp_format(&creation_date);
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", Name("False".into())),
            ("CreationDate", String(timestamp.clone().into_bytes(), Literal)),
            ("ModDate", String(timestamp.into_bytes(), Literal)),
            ("Title", encode_text_string(title)),
            ("Creator", String(b"arborescence".to_vec(), Literal)),
            ("Producer", String(b"arborescence".to_vec(), Literal)),
            (
                "Identifier",
                String(self.identifier.clone().into_bytes(), Literal),
            ),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        // Construct the catalog, required by the PDF specification
        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Catalog".into())),
            ("PageLayout", Name("OneColumn".into())),
            ("PageMode", Name("UseNone".into())),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(instance_id.into_bytes(), Literal),
            ]),
        );

        // The fonts and the images are shared by all the pages through a single resource dictionary
        let fonts_dictionary = lopdf::Dictionary::from_iter(BuiltinFont::ALL.map(|font| {
            let font_id = self.inner_document.add_object(font.to_dictionary());
            (font.resource_name(), Reference(font_id))
        }));
        let mut resource_dictionary =
            lopdf::Dictionary::from_iter(vec![("Font", Dictionary(fonts_dictionary))]);
        if !self.images.is_empty() {
            let mut xobjects_dictionary = lopdf::Dictionary::new();
            for (name, image) in self.images.iter() {
                let image_id = image.insert_into_document(&mut self.inner_document);
                xobjects_dictionary.set(name.clone(), Reference(image_id));
            }
            resource_dictionary.set("XObject", Dictionary(xobjects_dictionary));
        }
        let resources_id = self
            .inner_document
            .add_object(Dictionary(resource_dictionary));

        let mut page_ids = Vec::<lopdf::Object>::new();
        for page in mem::take(&mut self.pages) {
            let media_box: Vec<Object> =
                vec![0.into(), 0.into(), page.width.into(), page.height.into()];
            let mut page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", Name("Page".into())),
                ("Rotate", Integer(0)),
                ("MediaBox", media_box.clone().into()),
                ("TrimBox", media_box.clone().into()),
                ("CropBox", media_box.into()),
                ("Parent", Reference(pages_id)),
                ("Resources", Reference(resources_id)),
            ]);

            // Merge all streams of the individual layers into one unified stream, then
            // insert it into the PDF document as a whole by setting the "Contents" field
            let mut merged_layer_streams = Vec::<u8>::new();
            for layer in page.layers {
                let mut stream = lopdf::Stream::try_from(layer)?;
                merged_layer_streams.append(&mut stream.content);
            }
            let merged_layer_stream =
                lopdf::Stream::new(lopdf::Dictionary::new(), merged_layer_streams);
            let page_content_id = self.inner_document.add_object(merged_layer_stream);
            page_dictionary.set("Contents", Reference(page_content_id));

            log::debug!("Writing the page {}", page.number);
            let page_id = self.inner_document.add_object(page_dictionary);
            page_ids.push(Reference(page_id))
        }

        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Pages".into())),
            ("Count", Integer(page_ids.len() as i64)),
            ("Kids", Array(page_ids)),
        ]);
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages));

        Ok(())
    }

    /// Optimize the PDF document (only superficially).
    pub fn optimize(&mut self) {
        self.inner_document.prune_objects();
        self.inner_document.delete_zero_length_streams();
        self.inner_document.renumber_objects();
        self.inner_document.compress();
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or further processed.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    /// This function is responsible for adding the given operations to the specified layer and page.
    fn add_operations_to_layer_in_page(
        &mut self,
        layer_index: usize,
        page_index: usize,
        operations: Vec<lopdf::content::Operation>,
    ) -> Result<(), ContextError> {
        let pdf_layer_reference = self.get_mut_layer_in_page(layer_index, page_index)?;
        pdf_layer_reference.operations.extend(operations);

        Ok(())
    }

    // Retrieve the specified layer in the given page via the respective indices.
    fn get_mut_layer_in_page(
        &mut self,
        layer_index: usize,
        page_index: usize,
    ) -> Result<&mut PdfLayer, ContextError> {
        let pdf_page = self
            .pages
            .get_mut(page_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the page with index {}",
                page_index
            )))?;
        let pdf_layer = pdf_page
            .layers
            .get_mut(layer_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the layer with index {}",
                layer_index
            )))?;

        Ok(pdf_layer)
    }
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}
