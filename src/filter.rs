use crate::{classifier::COURSE_TYPE, node::Node};

/// The faculties worth rendering and the number of those that were left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredFaculties {
    pub retained: Vec<Node>,
    pub skipped_count: usize,
}

/// Whether a course is declared anywhere below the faculty. The faculty node itself is not
/// a course of its own, extraction only looks at its descendants.
/// Subjects play no part here: a faculty whose courses sit outside any subject still has courses.
pub fn has_course(faculty: &Node) -> bool {
    faculty
        .depth_first()
        .skip(1)
        .any(|node| node.has_type(COURSE_TYPE))
}

/// Keeps, in their original order, the faculties which have at least one course.
pub fn filter_faculties(faculties: Vec<Node>) -> FilteredFaculties {
    let total = faculties.len();
    let retained: Vec<Node> = faculties.into_iter().filter(has_course).collect();
    let skipped_count = total - retained.len();
    if skipped_count > 0 {
        log::info!(
            "Skipped {} of {} faculties without any course",
            skipped_count,
            total
        );
    }

    FilteredFaculties {
        retained,
        skipped_count,
    }
}
