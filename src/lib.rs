//! Arborescence turns the hierarchical trees exported by a course platform (faculties containing
//! subjects containing courses, with any number of intermediate nodes) into a paginated PDF
//! catalogue: an optional cover page followed by one page per faculty listing its subjects and courses.
//!
//! The work is split in two. The core (`loader`, `filter`, `classifier`, `extractor` and
//! `render_model`, tied together by `pipeline::run`) decides what to print and produces a
//! `RenderModel`; it never fails, documents it cannot read are reported as warnings. The
//! `renderer` module then lays that model out into pages through the `DocumentRenderer` trait,
//! whose PDF implementation sits on top of the low-level `pdf` module.

/// The module where the tree nodes are modelled.
///
/// Exported trees are loosely typed, so the `Node` struct accepts any shape of input and the
/// accessors `title_of` and `children_of` are total: a node always has a non-empty title and a
/// (possibly empty) list of children.
pub mod node;

/// Decoding of the raw documents into faculties, one warning per document that cannot be used.
pub mod loader;

/// The rules deciding which nodes are courses and which are subjects.
pub mod classifier;

/// The walk of a faculty collecting its subjects and their sorted, deduplicated courses.
pub mod extractor;

/// Removal of the faculties without any course.
pub mod filter;

/// The presentation-ready structure handed to the renderer.
pub mod render_model;

/// The immutable parameters of a run.
pub mod configuration;

/// The entry point of the core, from raw documents to a `RenderModel`.
pub mod pipeline;

/// The `DocumentRenderer` trait and its PDF implementation, which lays out A4 pages.
pub mod renderer;

/// This module contains the `ContextError` type which is the error type used throughout this library,
/// and the `DocumentDecodeError` warning reported for each unusable input document.
///
/// A `ContextError` always explains what was being attempted, followed by the message of the
/// underlying error when there is one, so a failure deep inside `lopdf` or `image` still reads
/// as a sentence about the catalogue.
pub mod error;

/// The module where the `PdfDocument` interface for working with PDF documents is presented.
///
/// # Introduction
///
/// The main component of this module is the struct `PdfDocument`. For it, I have implemented different convenience functions
/// such as `add_page_with_layer`, `add_image`, `write_text_to_layer_in_page`, `fill_rectangle_in_layer_in_page`,
/// `write_all` and `save_to_bytes` which allow the end user to interact with a PDF document in a meaningful way,
/// while keeping all the complexity hidden below a curtain of private methods.
///
/// Text is written with the standard Helvetica fonts in the WinAnsi encoding, so no font file
/// is needed and the output stays small. `BuiltinFont` exposes their metrics for measuring text.
pub mod pdf;
