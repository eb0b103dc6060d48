use serde::{Deserialize, Serialize};

use crate::node::Node;

/// The `type` of the nodes which are listed as courses.
pub const COURSE_TYPE: &str = "cours";
/// The `type` of the teaching units, which group courses unless they are folders.
pub const TEACHING_UNIT_TYPE: &str = "ue";
/// The `type` of the categories, which always group courses.
pub const CATEGORY_TYPE: &str = "category";

/// The rule deciding which nodes of a faculty are subjects. Only one is in force per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationPolicy {
    /// Every direct child of a faculty is a subject, whatever its type, and lists every
    /// course beneath it. Subjects without courses are kept.
    #[serde(alias = "A")]
    #[value(alias = "a")]
    TypeBased,
    /// Non-folder teaching units and categories are subjects, found breadth-first anywhere
    /// in the faculty. Subjects without courses are dropped.
    #[default]
    #[serde(alias = "B")]
    #[value(alias = "b")]
    FolderAware,
}

/// The role a node plays in the extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Course,
    Subject,
    /// Neither a course nor a subject: traversal goes on through its children.
    Pass,
}

/// Classifies a node under the given policy.
pub fn classify(node: &Node, policy: ClassificationPolicy) -> Classification {
    if node.has_type(COURSE_TYPE) {
        return Classification::Course;
    }

    match policy {
        ClassificationPolicy::TypeBased => Classification::Pass,
        ClassificationPolicy::FolderAware => {
            let is_teaching_unit = node.has_type(TEACHING_UNIT_TYPE) && !node.is_folder;
            if is_teaching_unit || node.has_type(CATEGORY_TYPE) {
                Classification::Subject
            } else {
                Classification::Pass
            }
        }
    }
}
