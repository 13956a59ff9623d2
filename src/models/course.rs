use serde::{Deserialize, Serialize};

use super::{EntityId, Instructor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: EntityId,
    pub course_name: String,
    pub credits: u32,
    #[serde(default)]
    pub instructor: Option<Instructor>,
}

impl Course {
    pub fn instructor_name(&self) -> Option<String> {
        self.instructor.as_ref().map(Instructor::full_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePayload {
    pub course_name: String,
    pub credits: u32,
    pub instructor_id: EntityId,
}
