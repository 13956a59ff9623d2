//! Editing the student <-> course relationship from either side.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::gateway::SchoolApi;
use crate::models::{Course, EntityId, Student};
use crate::request::RequestTracker;
use crate::state::AppState;
use crate::views::Lifecycle;

pub trait Candidate: Clone + Send + Sync + 'static {
    fn id(&self) -> EntityId;
    fn label(&self) -> String;
}

impl Candidate for Course {
    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> String {
        self.course_name.clone()
    }
}

impl Candidate for Student {
    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

/// Which collection a screen edits and how edges are written for it.
#[async_trait]
pub trait EnrollmentSide: Send + Sync + 'static {
    type Candidate: Candidate;

    const CANDIDATE: &'static str;
    const CANDIDATES: &'static str;

    async fn fetch_enrolled(&self, api: &dyn SchoolApi) -> Result<Vec<Self::Candidate>, AppError>;
    async fn fetch_catalog(&self, api: &dyn SchoolApi) -> Result<Vec<Self::Candidate>, AppError>;
    async fn enroll(&self, api: &dyn SchoolApi, candidate: EntityId) -> Result<(), AppError>;
    async fn withdraw(&self, api: &dyn SchoolApi, candidate: EntityId) -> Result<(), AppError>;

    fn enrolled_message(&self, label: &str) -> String;
    fn drop_prompt(&self, label: &str) -> String;
    fn dropped_message(&self, label: &str) -> String;
}

/// Courses of one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentCourses {
    pub student_id: EntityId,
}

#[async_trait]
impl EnrollmentSide for StudentCourses {
    type Candidate = Course;

    const CANDIDATE: &'static str = "course";
    const CANDIDATES: &'static str = "courses";

    async fn fetch_enrolled(&self, api: &dyn SchoolApi) -> Result<Vec<Course>, AppError> {
        Ok(api.student_courses(self.student_id).await?.data_or_default())
    }

    async fn fetch_catalog(&self, api: &dyn SchoolApi) -> Result<Vec<Course>, AppError> {
        Ok(api.list_courses().await?.data_or_default())
    }

    async fn enroll(&self, api: &dyn SchoolApi, candidate: EntityId) -> Result<(), AppError> {
        api.enroll(self.student_id, candidate).await.map(|_| ())
    }

    async fn withdraw(&self, api: &dyn SchoolApi, candidate: EntityId) -> Result<(), AppError> {
        api.drop_course(self.student_id, candidate).await.map(|_| ())
    }

    fn enrolled_message(&self, label: &str) -> String {
        format!("Enrolled in {}", label)
    }

    fn drop_prompt(&self, label: &str) -> String {
        format!("Are you sure you want to drop {}?", label)
    }

    fn dropped_message(&self, label: &str) -> String {
        format!("Dropped {}", label)
    }
}

/// Students of one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseRoster {
    pub course_id: EntityId,
}

#[async_trait]
impl EnrollmentSide for CourseRoster {
    type Candidate = Student;

    const CANDIDATE: &'static str = "student";
    const CANDIDATES: &'static str = "students";

    async fn fetch_enrolled(&self, api: &dyn SchoolApi) -> Result<Vec<Student>, AppError> {
        Ok(api.course_students(self.course_id).await?.data_or_default())
    }

    async fn fetch_catalog(&self, api: &dyn SchoolApi) -> Result<Vec<Student>, AppError> {
        Ok(api.list_students().await?.data_or_default())
    }

    async fn enroll(&self, api: &dyn SchoolApi, candidate: EntityId) -> Result<(), AppError> {
        api.enroll(candidate, self.course_id).await.map(|_| ())
    }

    async fn withdraw(&self, api: &dyn SchoolApi, candidate: EntityId) -> Result<(), AppError> {
        api.drop_course(candidate, self.course_id).await.map(|_| ())
    }

    fn enrolled_message(&self, label: &str) -> String {
        format!("Added {} to the course", label)
    }

    fn drop_prompt(&self, label: &str) -> String {
        format!("Are you sure you want to remove {} from this course?", label)
    }

    fn dropped_message(&self, label: &str) -> String {
        format!("Removed {} from the course", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingChange {
    Enroll(EntityId),
    Drop(EntityId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnrollmentPhase {
    #[default]
    Idle,
    PickerOpen {
        selected: Option<EntityId>,
        error: Option<String>,
    },
    Submitting(PendingChange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Applied,
    /// Operator declined, or submitted an empty picker.
    Cancelled,
    /// The screen went away before the server answered.
    Discarded,
}

pub struct EnrollmentManager<S: EnrollmentSide> {
    side: S,
    state: AppState,
    enrolled: Vec<S::Candidate>,
    catalog: Vec<S::Candidate>,
    phase: EnrollmentPhase,
    tracker: RequestTracker,
    lifecycle: Lifecycle,
}

impl<S: EnrollmentSide> EnrollmentManager<S> {
    pub fn new(side: S, state: AppState, lifecycle: Lifecycle) -> Self {
        Self {
            side,
            state,
            enrolled: Vec::new(),
            catalog: Vec::new(),
            phase: EnrollmentPhase::Idle,
            tracker: RequestTracker::new(),
            lifecycle,
        }
    }

    pub fn enrolled(&self) -> &[S::Candidate] {
        &self.enrolled
    }

    pub fn catalog(&self) -> &[S::Candidate] {
        &self.catalog
    }

    pub fn phase(&self) -> &EnrollmentPhase {
        &self.phase
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn is_enrolled(&self, id: EntityId) -> bool {
        self.enrolled.iter().any(|c| c.id() == id)
    }

    /// Catalog minus everything already enrolled, in catalog order.
    pub fn available(&self) -> Vec<&S::Candidate> {
        let enrolled: HashSet<EntityId> = self.enrolled.iter().map(Candidate::id).collect();
        self.catalog
            .iter()
            .filter(|c| !enrolled.contains(&c.id()))
            .collect()
    }

    pub fn is_available(&self, id: EntityId) -> bool {
        !self.is_enrolled(id) && self.catalog.iter().any(|c| c.id() == id)
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        let api = self.state.api.as_ref();
        let side = &self.side;
        let tracker = &self.tracker;
        let (enrolled, catalog) = tokio::join!(
            tracker.execute(|| side.fetch_enrolled(api)),
            tracker.execute(|| side.fetch_catalog(api)),
        );

        if !self.lifecycle.is_mounted() {
            debug!("discarding {} load for an unmounted screen", S::CANDIDATES);
            return Ok(());
        }

        let mut first_error = None;
        match enrolled {
            Ok(items) => self.enrolled = items,
            Err(e) => {
                warn!("loading enrolled {} failed: {}", S::CANDIDATES, e);
                self.state
                    .notifier
                    .error(&format!("Could not load enrolled {}", S::CANDIDATES));
                first_error = Some(e);
            }
        }
        match catalog {
            Ok(items) => self.catalog = items,
            Err(e) => {
                warn!("loading {} catalog failed: {}", S::CANDIDATE, e);
                self.state
                    .notifier
                    .error(&format!("Could not load available {}", S::CANDIDATES));
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        self.reconcile_picker();

        first_error.map_or(Ok(()), Err)
    }

    pub async fn refresh_enrolled(&mut self) -> Result<(), AppError> {
        let api = self.state.api.as_ref();
        let side = &self.side;
        let result = self.tracker.execute(|| side.fetch_enrolled(api)).await;

        if !self.lifecycle.is_mounted() {
            debug!("discarding enrolled {} for an unmounted screen", S::CANDIDATES);
            return Ok(());
        }

        match result {
            Ok(items) => {
                self.enrolled = items;
                self.reconcile_picker();
                Ok(())
            }
            Err(e) => {
                warn!("re-fetching enrolled {} failed: {}", S::CANDIDATES, e);
                self.state
                    .notifier
                    .error(&format!("Could not load enrolled {}", S::CANDIDATES));
                Err(e)
            }
        }
    }

    pub fn open_picker(&mut self) -> Result<(), AppError> {
        if self.phase != EnrollmentPhase::Idle {
            return Err(AppError::Rejected(
                "Another enrollment change is in progress".to_string(),
            ));
        }
        if self.available().is_empty() {
            return Err(AppError::Rejected(format!(
                "No {} available to enroll",
                S::CANDIDATES
            )));
        }
        self.phase = EnrollmentPhase::PickerOpen {
            selected: None,
            error: None,
        };
        debug!("{} picker opened", S::CANDIDATE);
        Ok(())
    }

    pub fn select(&mut self, id: EntityId) -> Result<(), AppError> {
        if !matches!(self.phase, EnrollmentPhase::PickerOpen { .. }) {
            return Err(AppError::Rejected(format!(
                "Open the {} picker before selecting",
                S::CANDIDATE
            )));
        }
        if !self.is_available(id) {
            return Err(AppError::Rejected(format!(
                "{} {} is not available to enroll",
                capitalize(S::CANDIDATE),
                id
            )));
        }
        self.phase = EnrollmentPhase::PickerOpen {
            selected: Some(id),
            error: None,
        };
        Ok(())
    }

    pub fn cancel_picker(&mut self) {
        if matches!(self.phase, EnrollmentPhase::PickerOpen { .. }) {
            self.phase = EnrollmentPhase::Idle;
        }
    }

    pub async fn submit(&mut self) -> Result<ChangeOutcome, AppError> {
        let selected = match &self.phase {
            EnrollmentPhase::PickerOpen { selected, .. } => *selected,
            _ => {
                return Err(AppError::Rejected(format!(
                    "The {} picker is not open",
                    S::CANDIDATE
                )));
            }
        };
        let Some(id) = selected else {
            debug!("submit without a selection");
            return Ok(ChangeOutcome::Cancelled);
        };

        let label = self
            .available()
            .into_iter()
            .find(|c| c.id() == id)
            .map(Candidate::label);
        let Some(label) = label else {
            let message = format!("{} {} is already enrolled", capitalize(S::CANDIDATE), id);
            warn!("{}", message);
            self.phase = EnrollmentPhase::PickerOpen {
                selected: None,
                error: Some(message.clone()),
            };
            self.state.notifier.error(&message);
            return Err(AppError::Rejected(message));
        };

        self.phase = EnrollmentPhase::Submitting(PendingChange::Enroll(id));
        let api = self.state.api.as_ref();
        let side = &self.side;
        let result = self.tracker.execute(|| side.enroll(api, id)).await;

        if !self.lifecycle.is_mounted() {
            debug!("discarding enroll result for an unmounted screen");
            return Ok(ChangeOutcome::Discarded);
        }

        match result {
            Ok(()) => {
                info!("enrolled {} {}", S::CANDIDATE, id);
                self.phase = EnrollmentPhase::Idle;
                self.state.notifier.success(&self.side.enrolled_message(&label));
                if let Err(e) = self.refresh_enrolled().await {
                    warn!("enrollment saved but the re-fetch failed: {}", e);
                }
                Ok(ChangeOutcome::Applied)
            }
            Err(e) => {
                let message = e.user_message();
                warn!("enrolling {} {} failed: {}", S::CANDIDATE, id, e);
                self.phase = EnrollmentPhase::PickerOpen {
                    selected: Some(id),
                    error: Some(message.clone()),
                };
                self.state
                    .notifier
                    .error(&format!("Enrollment failed: {}", message));
                Err(e)
            }
        }
    }

    /// Removes an enrolled candidate after the operator confirms.
    pub async fn drop_enrollment(&mut self, id: EntityId) -> Result<ChangeOutcome, AppError> {
        if self.phase != EnrollmentPhase::Idle {
            return Err(AppError::Rejected(
                "Another enrollment change is in progress".to_string(),
            ));
        }

        let Some(label) = self.enrolled.iter().find(|c| c.id() == id).map(Candidate::label) else {
            let message = format!("No enrolled {} with id {}", S::CANDIDATE, id);
            warn!("{}", message);
            self.state.notifier.error(&message);
            return Err(AppError::Rejected(message));
        };

        if !self.state.confirmer.confirm(&self.side.drop_prompt(&label)).await {
            debug!("drop of {} {} declined", S::CANDIDATE, id);
            return Ok(ChangeOutcome::Cancelled);
        }

        self.phase = EnrollmentPhase::Submitting(PendingChange::Drop(id));
        let api = self.state.api.as_ref();
        let side = &self.side;
        let result = self.tracker.execute(|| side.withdraw(api, id)).await;

        if !self.lifecycle.is_mounted() {
            debug!("discarding drop result for an unmounted screen");
            return Ok(ChangeOutcome::Discarded);
        }

        self.phase = EnrollmentPhase::Idle;
        match result {
            Ok(()) => {
                info!("dropped {} {}", S::CANDIDATE, id);
                self.state.notifier.success(&self.side.dropped_message(&label));
                if let Err(e) = self.refresh_enrolled().await {
                    warn!("drop saved but the re-fetch failed: {}", e);
                }
                Ok(ChangeOutcome::Applied)
            }
            Err(e) => {
                warn!("dropping {} {} failed: {}", S::CANDIDATE, id, e);
                self.state
                    .notifier
                    .error(&format!("Could not drop enrollment: {}", e.user_message()));
                Err(e)
            }
        }
    }

    /// A selection that became enrolled behind the picker's back is cleared.
    fn reconcile_picker(&mut self) {
        let stale = match &self.phase {
            EnrollmentPhase::PickerOpen { selected: Some(id), .. } => !self.is_available(*id),
            _ => false,
        };
        if stale {
            if let EnrollmentPhase::PickerOpen { selected, .. } = &mut self.phase {
                *selected = None;
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
