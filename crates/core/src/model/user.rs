use serde::{Deserialize, Serialize};

use crate::model::ids::CourseId;

/// The signed-in user's profile as returned by `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub selected_courses: Vec<CourseId>,
}

impl User {
    #[must_use]
    pub fn has_course(&self, course_id: &CourseId) -> bool {
        self.selected_courses.contains(course_id)
    }

    /// Adds a course to the selection. Returns false if it was already selected.
    pub fn select_course(&mut self, course_id: CourseId) -> bool {
        if self.has_course(&course_id) {
            return false;
        }
        self.selected_courses.push(course_id);
        true
    }

    /// Removes a course from the selection. Returns false if it was not selected.
    pub fn deselect_course(&mut self, course_id: &CourseId) -> bool {
        let before = self.selected_courses.len();
        self.selected_courses.retain(|id| id != course_id);
        self.selected_courses.len() != before
    }
}
