pub mod enrollment;

pub use enrollment::{
    Candidate, ChangeOutcome, CourseRoster, EnrollmentManager, EnrollmentPhase, EnrollmentSide,
    PendingChange, StudentCourses,
};
