use std::path::{Path, PathBuf};

use serde::Deserialize as _;
use serde_json::Value;

use crate::{error::DocumentDecodeError, node::Node};

/// A raw input document together with the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        SourceDocument {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a document from disk. A failure to read it is reported in the same way as a
    /// failure to decode it, so that it can be folded into the warnings of a batch.
    pub fn from_path(document_path: &Path) -> Result<Self, DocumentDecodeError> {
        let name = document_path
            .file_name()
            .map(|file_name| file_name.to_string_lossy().into_owned())
            .unwrap_or_else(|| document_path.display().to_string());
        let bytes = std::fs::read(document_path)
            .map_err(|error| DocumentDecodeError::new(name.clone(), error.to_string()))?;

        Ok(SourceDocument { name, bytes })
    }
}

/// The faculties found across a batch of documents, and the documents which contributed none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedTrees {
    pub faculties: Vec<Node>,
    pub warnings: Vec<DocumentDecodeError>,
}

/// Reads every path in order, keeping the readable documents and a warning for each of the others.
pub fn read_documents(
    document_paths: &[PathBuf],
) -> (Vec<SourceDocument>, Vec<DocumentDecodeError>) {
    let mut documents = Vec::with_capacity(document_paths.len());
    let mut warnings = Vec::new();
    for document_path in document_paths {
        match SourceDocument::from_path(document_path) {
            Ok(document) => documents.push(document),
            Err(warning) => {
                log::warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    (documents, warnings)
}

/// Decodes every document in the given order and collects the root entries of their
/// `data.hierarchicalTreeData` arrays as faculties. A document which cannot be decoded, or
/// which lacks the array, contributes no faculty and one warning; the batch always completes.
pub fn load_faculties(documents: &[SourceDocument]) -> LoadedTrees {
    let mut loaded_trees = LoadedTrees::default();

    for document in documents {
        match decode_tree(document) {
            Ok(faculties) => {
                log::debug!(
                    "Found {} root entries in the document {:?}",
                    faculties.len(),
                    document.name
                );
                loaded_trees.faculties.extend(faculties);
            }
            Err(warning) => {
                log::warn!("{}", warning);
                loaded_trees.warnings.push(warning);
            }
        }
    }

    loaded_trees
}

fn decode_tree(document: &SourceDocument) -> Result<Vec<Node>, DocumentDecodeError> {
    let text = std::str::from_utf8(&document.bytes).map_err(|error| {
        DocumentDecodeError::new(document.name.clone(), format!("Invalid UTF-8: {}", error))
    })?;
    let mut value = parse_unbounded(text).map_err(|error| {
        DocumentDecodeError::new(document.name.clone(), format!("Invalid JSON: {}", error))
    })?;

    let tree = match value
        .get_mut("data")
        .and_then(|data| data.get_mut("hierarchicalTreeData"))
    {
        Some(tree) => tree.take(),
        None => {
            return Err(DocumentDecodeError::new(
                document.name.clone(),
                "Missing the `data.hierarchicalTreeData` field",
            ))
        }
    };
    let Value::Array(entries) = tree else {
        return Err(DocumentDecodeError::new(
            document.name.clone(),
            "The `data.hierarchicalTreeData` field is not an array",
        ));
    };

    let mut faculties = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            log::warn!(
                "Skipping the root entry {} of the document {:?} because it is not an object",
                index,
                document.name
            );
            continue;
        }
        match Node::deserialize(serde_stacker::Deserializer::new(entry)) {
            Ok(faculty) => faculties.push(faculty),
            Err(error) => log::warn!(
                "Skipping the root entry {} of the document {:?}: {}",
                index,
                document.name,
                error
            ),
        }
    }

    Ok(faculties)
}

/// Parses a JSON text of any nesting depth, the stack being grown on demand instead of
/// stopping at the default recursion limit of `serde_json`.
fn parse_unbounded(text: &str) -> Result<Value, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;

    Ok(value)
}
