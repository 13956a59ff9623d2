use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{Course, EntityId, Instructor, Student};
use crate::request::RequestTracker;
use crate::routes::Route;
use crate::services::{CourseRoster, EnrollmentManager, StudentCourses};
use crate::state::AppState;

use super::Lifecycle;

/// Credit totals over a set of courses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseLoad {
    pub courses: usize,
    pub total_credits: u64,
    pub average_credits: f64,
}

impl CourseLoad {
    pub fn of(courses: &[Course]) -> Self {
        let total_credits: u64 = courses.iter().map(|c| u64::from(c.credits)).sum();
        let average_credits = if courses.is_empty() {
            0.0
        } else {
            total_credits as f64 / courses.len() as f64
        };
        Self {
            courses: courses.len(),
            total_credits,
            average_credits,
        }
    }

    pub fn average_display(&self) -> String {
        if self.courses == 0 {
            "0".to_string()
        } else {
            format!("{:.1}", self.average_credits)
        }
    }
}

/// Instructor record plus the courses they teach.
pub struct InstructorDetail {
    state: AppState,
    id: EntityId,
    instructor: Option<Instructor>,
    courses: Vec<Course>,
    tracker: RequestTracker,
    lifecycle: Lifecycle,
}

impl InstructorDetail {
    pub fn new(state: AppState, id: EntityId) -> Self {
        Self {
            state,
            id,
            instructor: None,
            courses: Vec::new(),
            tracker: RequestTracker::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn instructor(&self) -> Option<&Instructor> {
        self.instructor.as_ref()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course_load(&self) -> CourseLoad {
        CourseLoad::of(&self.courses)
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Loads the record and its courses together. Returns a redirect to the
    /// list when the record is unavailable.
    pub async fn load(&mut self) -> Option<Route> {
        let api = self.state.api.as_ref();
        let id = self.id;
        let tracker = &self.tracker;
        let (instructor, courses) = tokio::join!(
            tracker.execute(|| async move { api.get_instructor(id).await?.into_data() }),
            tracker.execute(|| async move {
                Ok::<_, AppError>(api.instructor_courses(id).await?.data_or_default())
            }),
        );

        if !self.lifecycle.is_mounted() {
            debug!("discarding instructor {} for an unmounted screen", id);
            return None;
        }

        match instructor {
            Ok(instructor) => self.instructor = Some(instructor),
            Err(e) => {
                warn!("loading instructor {} failed: {}", id, e);
                self.state
                    .notifier
                    .error("Failed to load instructor details");
                return Some(Route::Instructors);
            }
        }
        match courses {
            Ok(courses) => self.courses = courses,
            Err(e) => {
                warn!("loading courses of instructor {} failed: {}", id, e);
                self.state.notifier.error("Could not load assigned courses");
            }
        }
        None
    }
}

/// Course record, its roster and instructor assignment.
pub struct CourseDetail {
    state: AppState,
    id: EntityId,
    course: Option<Course>,
    roster: EnrollmentManager<CourseRoster>,
    tracker: RequestTracker,
    lifecycle: Lifecycle,
}

impl CourseDetail {
    pub fn new(state: AppState, id: EntityId) -> Self {
        let lifecycle = Lifecycle::new();
        Self {
            roster: EnrollmentManager::new(
                CourseRoster { course_id: id },
                state.clone(),
                lifecycle.clone(),
            ),
            state,
            id,
            course: None,
            tracker: RequestTracker::new(),
            lifecycle,
        }
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn roster(&self) -> &EnrollmentManager<CourseRoster> {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut EnrollmentManager<CourseRoster> {
        &mut self.roster
    }

    pub fn student_count(&self) -> usize {
        self.roster.enrolled().len()
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub async fn load(&mut self) -> Option<Route> {
        let api = self.state.api.as_ref();
        let id = self.id;
        let tracker = &self.tracker;
        let (course, roster) = tokio::join!(
            tracker.execute(|| async move { api.get_course(id).await?.into_data() }),
            self.roster.load(),
        );

        if !self.lifecycle.is_mounted() {
            debug!("discarding course {} for an unmounted screen", id);
            return None;
        }

        match course {
            Ok(course) => self.course = Some(course),
            Err(e) => {
                warn!("loading course {} failed: {}", id, e);
                self.state.notifier.error("Failed to load course details");
                return Some(Route::Courses);
            }
        }
        if let Err(e) = roster {
            debug!("course {} roster unavailable: {}", id, e);
        }
        None
    }

    /// Puts an instructor on this course, then re-reads the course.
    pub async fn assign_instructor(&mut self, instructor_id: EntityId) -> Result<(), AppError> {
        let api = self.state.api.as_ref();
        let id = self.id;
        let assigned = self
            .tracker
            .execute(|| async move { api.assign_instructor(id, instructor_id).await.map(|_| ()) })
            .await;

        if !self.lifecycle.is_mounted() {
            return Ok(());
        }

        if let Err(e) = assigned {
            warn!("assigning instructor {} to course {} failed: {}", instructor_id, id, e);
            self.state.notifier.error(&format!(
                "Could not assign instructor: {}",
                e.user_message()
            ));
            return Err(e);
        }

        info!("instructor {} assigned to course {}", instructor_id, id);
        self.state.notifier.success("Instructor assigned");

        let refreshed = self
            .tracker
            .execute(|| async move { api.get_course(id).await?.into_data() })
            .await;
        if !self.lifecycle.is_mounted() {
            return Ok(());
        }
        match refreshed {
            Ok(course) => self.course = Some(course),
            Err(e) => warn!("course {} re-fetch after assignment failed: {}", id, e),
        }
        Ok(())
    }
}

/// Student record with their enrollments.
pub struct StudentDetail {
    state: AppState,
    id: EntityId,
    student: Option<Student>,
    courses: EnrollmentManager<StudentCourses>,
    tracker: RequestTracker,
    lifecycle: Lifecycle,
}

impl StudentDetail {
    pub fn new(state: AppState, id: EntityId) -> Self {
        let lifecycle = Lifecycle::new();
        Self {
            courses: EnrollmentManager::new(
                StudentCourses { student_id: id },
                state.clone(),
                lifecycle.clone(),
            ),
            state,
            id,
            student: None,
            tracker: RequestTracker::new(),
            lifecycle,
        }
    }

    pub fn student(&self) -> Option<&Student> {
        self.student.as_ref()
    }

    pub fn courses(&self) -> &EnrollmentManager<StudentCourses> {
        &self.courses
    }

    pub fn courses_mut(&mut self) -> &mut EnrollmentManager<StudentCourses> {
        &mut self.courses
    }

    pub fn course_load(&self) -> CourseLoad {
        CourseLoad::of(self.courses.enrolled())
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub async fn load(&mut self) -> Option<Route> {
        let api = self.state.api.as_ref();
        let id = self.id;
        let tracker = &self.tracker;
        let (student, courses) = tokio::join!(
            tracker.execute(|| async move { api.get_student(id).await?.into_data() }),
            self.courses.load(),
        );

        if !self.lifecycle.is_mounted() {
            debug!("discarding student {} for an unmounted screen", id);
            return None;
        }

        match student {
            Ok(student) => self.student = Some(student),
            Err(e) => {
                warn!("loading student {} failed: {}", id, e);
                self.state.notifier.error("Failed to load student details");
                return Some(Route::Students);
            }
        }
        if let Err(e) = courses {
            debug!("student {} enrollments unavailable: {}", id, e);
        }
        None
    }
}
