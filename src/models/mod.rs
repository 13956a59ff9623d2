pub mod course;
pub mod instructor;
pub mod student;

pub use course::{Course, CoursePayload};
pub use instructor::{Instructor, InstructorPayload};
pub use student::{Student, StudentPayload};

/// Server-assigned identifier shared by every entity.
pub type EntityId = i64;
