use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization as _;

/// A single entry of a hierarchical tree, as exported under `data.hierarchicalTreeData`.
///
/// Every field is optional in the exported documents and their types are not always the
/// expected ones, so each of them is deserialized leniently: a value of the wrong shape is
/// treated as absent instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<NodeData>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_folder: bool,
    #[serde(
        default,
        deserialize_with = "lenient_children",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Node>,
}

/// The nested `data` object of a node, only its `name` is of any use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
}

impl Node {
    /// Creates a node with only a title, mostly useful for building trees from code.
    pub fn titled<S: Into<String>>(title: S) -> Self {
        Node {
            title: Some(title.into()),
            ..Node::default()
        }
    }

    pub fn with_type<S: Into<String>>(mut self, node_type: S) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_folder_flag(mut self, is_folder: bool) -> Self {
        self.is_folder = is_folder;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Whether the declared `type` of the node is exactly the given tag.
    pub fn has_type(&self, node_type: &str) -> bool {
        self.node_type.as_deref() == Some(node_type)
    }

    /// Iterates over the node and all of its descendants in depth-first pre-order,
    /// following the document order of the children.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst { stack: vec![self] }
    }
}

/// Resolves the display title of a node: its `title`, else `data.name`, else a placeholder
/// built from its identifier. The result is NFC-normalized, trimmed and never empty.
pub fn title_of(node: &Node) -> String {
    let candidates = [
        node.title.as_deref(),
        node.data.as_ref().and_then(|data| data.name.as_deref()),
    ];
    for candidate in candidates.into_iter().flatten() {
        let normalized = candidate.nfc().collect::<String>();
        let trimmed = normalized.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let identifier = node
        .id
        .as_deref()
        .map(str::trim)
        .filter(|identifier| !identifier.is_empty())
        .unwrap_or("?");
    format!("Élément {}", identifier).nfc().collect()
}

/// The ordered children of a node, empty when the document had none.
pub fn children_of(node: &Node) -> &[Node] {
    &node.children
}

/// Depth-first pre-order iterator over a subtree, see `Node::depth_first`.
#[derive(Debug)]
pub struct DepthFirst<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reversed so that the first child is the next one to be popped
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_data<'de, D>(deserializer: D) -> Result<Option<NodeData>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Accepts a list of nodes, a single node standing for a one-element list, or anything
/// else standing for no children at all. Entries which are not objects are dropped.
fn lenient_children<'de, D>(deserializer: D) -> Result<Vec<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values,
        value @ Value::Object(_) => vec![value],
        _ => Vec::new(),
    };

    Ok(values
        .into_iter()
        .filter(Value::is_object)
        // Each level goes through the stacker too, the nesting depth being unbounded
        .filter_map(|value| {
            let deserializer = serde_stacker::Deserializer::new(value);
            Node::deserialize(deserializer).ok()
        })
        .collect())
}
