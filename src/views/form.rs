use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{AppError, FieldErrors};
use crate::gateway::SchoolApi;
use crate::models::{
    Course, CoursePayload, EntityId, Instructor, InstructorPayload, Student, StudentPayload,
};
use crate::request::RequestTracker;
use crate::routes::Route;
use crate::state::AppState;

use super::Lifecycle;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").ok());

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(EntityId),
}

/// Editable record behind a create/edit screen.
#[async_trait]
pub trait Draft: Clone + Default + Send + Sync + 'static {
    type Entity: Send;
    /// Extra data the form needs to render, such as selector options.
    type Options: Default + Send;

    const SINGULAR: &'static str;

    fn list_route() -> Route;
    /// Seed for edit mode; write-only fields stay empty.
    fn from_entity(entity: &Self::Entity) -> Self;
    /// Sets a field from its form text and returns the field's canonical name.
    fn set_field(&mut self, field: &str, value: &str) -> Result<&'static str, AppError>;
    fn validate(&self, mode: FormMode) -> FieldErrors;

    async fn fetch(api: &dyn SchoolApi, id: EntityId) -> Result<Self::Entity, AppError>;
    async fn fetch_options(api: &dyn SchoolApi) -> Result<Self::Options, AppError>;
    async fn create(&self, api: &dyn SchoolApi) -> Result<Self::Entity, AppError>;
    async fn update(&self, api: &dyn SchoolApi, id: EntityId) -> Result<Self::Entity, AppError>;
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field, message.to_string());
        false
    } else {
        true
    }
}

fn check_email(errors: &mut FieldErrors, value: &str) {
    if require(errors, "email", value, "Email is required") && !is_valid_email(value) {
        errors.insert("email", "Enter a valid email address".to_string());
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(value.trim()))
}

fn unknown_field(form: &str, field: &str) -> AppError {
    AppError::Rejected(format!("{} form has no field {:?}", form, field))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructorDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
}

impl InstructorDraft {
    pub fn payload(&self) -> InstructorPayload {
        InstructorPayload {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: self.department.trim().to_string(),
        }
    }
}

#[async_trait]
impl Draft for InstructorDraft {
    type Entity = Instructor;
    type Options = ();

    const SINGULAR: &'static str = "Instructor";

    fn list_route() -> Route {
        Route::Instructors
    }

    fn from_entity(entity: &Instructor) -> Self {
        Self {
            first_name: entity.first_name.clone(),
            last_name: entity.last_name.clone(),
            email: entity.email.clone(),
            department: entity.department.clone(),
        }
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<&'static str, AppError> {
        let (name, slot) = match field {
            "firstName" => ("firstName", &mut self.first_name),
            "lastName" => ("lastName", &mut self.last_name),
            "email" => ("email", &mut self.email),
            "department" => ("department", &mut self.department),
            _ => return Err(unknown_field(Self::SINGULAR, field)),
        };
        *slot = value.to_string();
        Ok(name)
    }

    fn validate(&self, _mode: FormMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "firstName", &self.first_name, "First name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        check_email(&mut errors, &self.email);
        require(&mut errors, "department", &self.department, "Department is required");
        errors
    }

    async fn fetch(api: &dyn SchoolApi, id: EntityId) -> Result<Instructor, AppError> {
        api.get_instructor(id).await?.into_data()
    }

    async fn fetch_options(_api: &dyn SchoolApi) -> Result<(), AppError> {
        Ok(())
    }

    async fn create(&self, api: &dyn SchoolApi) -> Result<Instructor, AppError> {
        api.create_instructor(&self.payload()).await?.into_data()
    }

    async fn update(&self, api: &dyn SchoolApi, id: EntityId) -> Result<Instructor, AppError> {
        api.update_instructor(id, &self.payload()).await?.into_data()
    }
}

/// Course form text; `credits` stays raw until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDraft {
    pub course_name: String,
    pub credits: String,
    pub instructor_id: Option<EntityId>,
}

impl CourseDraft {
    fn parsed_credits(&self) -> Option<u32> {
        self.credits.trim().parse::<u32>().ok().filter(|c| *c >= 1)
    }

    pub fn payload(&self) -> Result<CoursePayload, AppError> {
        let errors = self.validate(FormMode::Create);
        match (self.parsed_credits(), self.instructor_id) {
            (Some(credits), Some(instructor_id)) if errors.is_empty() => Ok(CoursePayload {
                course_name: self.course_name.trim().to_string(),
                credits,
                instructor_id,
            }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

#[async_trait]
impl Draft for CourseDraft {
    type Entity = Course;
    type Options = Vec<Instructor>;

    const SINGULAR: &'static str = "Course";

    fn list_route() -> Route {
        Route::Courses
    }

    fn from_entity(entity: &Course) -> Self {
        Self {
            course_name: entity.course_name.clone(),
            credits: entity.credits.to_string(),
            instructor_id: entity.instructor.as_ref().map(|i| i.id),
        }
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<&'static str, AppError> {
        match field {
            "courseName" => {
                self.course_name = value.to_string();
                Ok("courseName")
            }
            "credits" => {
                self.credits = value.to_string();
                Ok("credits")
            }
            "instructorId" => {
                let value = value.trim();
                self.instructor_id = if value.is_empty() {
                    None
                } else {
                    Some(value.parse::<EntityId>().map_err(|_| {
                        AppError::Rejected(format!("instructorId must be a number, got {:?}", value))
                    })?)
                };
                Ok("instructorId")
            }
            _ => Err(unknown_field(Self::SINGULAR, field)),
        }
    }

    fn validate(&self, _mode: FormMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "courseName", &self.course_name, "Course name is required");
        if require(&mut errors, "credits", &self.credits, "Credits are required")
            && self.parsed_credits().is_none()
        {
            errors.insert("credits", "Credits must be a whole number of at least 1".to_string());
        }
        if self.instructor_id.is_none() {
            errors.insert("instructorId", "Select an instructor".to_string());
        }
        errors
    }

    async fn fetch(api: &dyn SchoolApi, id: EntityId) -> Result<Course, AppError> {
        api.get_course(id).await?.into_data()
    }

    async fn fetch_options(api: &dyn SchoolApi) -> Result<Vec<Instructor>, AppError> {
        Ok(api.list_instructors().await?.data_or_default())
    }

    async fn create(&self, api: &dyn SchoolApi) -> Result<Course, AppError> {
        api.create_course(&self.payload()?).await?.into_data()
    }

    async fn update(&self, api: &dyn SchoolApi, id: EntityId) -> Result<Course, AppError> {
        api.update_course(id, &self.payload()?).await?.into_data()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub major: String,
}

impl StudentDraft {
    /// The password only travels on create.
    pub fn payload(&self, mode: FormMode) -> StudentPayload {
        StudentPayload {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: match mode {
                FormMode::Create => Some(self.password.clone()),
                FormMode::Edit(_) => None,
            },
            major: self.major.trim().to_string(),
        }
    }
}

#[async_trait]
impl Draft for StudentDraft {
    type Entity = Student;
    type Options = ();

    const SINGULAR: &'static str = "Student";

    fn list_route() -> Route {
        Route::Students
    }

    fn from_entity(entity: &Student) -> Self {
        Self {
            first_name: entity.first_name.clone(),
            last_name: entity.last_name.clone(),
            email: entity.email.clone(),
            password: String::new(),
            major: entity.major.clone(),
        }
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<&'static str, AppError> {
        let (name, slot) = match field {
            "firstName" => ("firstName", &mut self.first_name),
            "lastName" => ("lastName", &mut self.last_name),
            "email" => ("email", &mut self.email),
            "password" => ("password", &mut self.password),
            "major" => ("major", &mut self.major),
            _ => return Err(unknown_field(Self::SINGULAR, field)),
        };
        *slot = value.to_string();
        Ok(name)
    }

    fn validate(&self, mode: FormMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "firstName", &self.first_name, "First name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        check_email(&mut errors, &self.email);
        if mode == FormMode::Create {
            if self.password.is_empty() {
                errors.insert("password", "Password is required".to_string());
            } else if self.password.chars().count() < MIN_PASSWORD_LEN {
                errors.insert(
                    "password",
                    format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
                );
            }
        }
        require(&mut errors, "major", &self.major, "Major is required");
        errors
    }

    async fn fetch(api: &dyn SchoolApi, id: EntityId) -> Result<Student, AppError> {
        api.get_student(id).await?.into_data()
    }

    async fn fetch_options(_api: &dyn SchoolApi) -> Result<(), AppError> {
        Ok(())
    }

    async fn create(&self, api: &dyn SchoolApi) -> Result<Student, AppError> {
        api.create_student(&self.payload(FormMode::Create))
            .await?
            .into_data()
    }

    async fn update(&self, api: &dyn SchoolApi, id: EntityId) -> Result<Student, AppError> {
        api.update_student(id, &self.payload(FormMode::Edit(id)))
            .await?
            .into_data()
    }
}

pub struct FormView<D: Draft> {
    state: AppState,
    mode: FormMode,
    draft: D,
    errors: FieldErrors,
    options: D::Options,
    tracker: RequestTracker,
    lifecycle: Lifecycle,
}

impl<D: Draft> FormView<D> {
    pub fn create(state: AppState) -> Self {
        Self::with_mode(state, FormMode::Create)
    }

    pub fn edit(state: AppState, id: EntityId) -> Self {
        Self::with_mode(state, FormMode::Edit(id))
    }

    fn with_mode(state: AppState, mode: FormMode) -> Self {
        Self {
            state,
            mode,
            draft: D::default(),
            errors: FieldErrors::new(),
            options: D::Options::default(),
            tracker: RequestTracker::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn options(&self) -> &D::Options {
        &self.options
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Loads selector options and, when editing, seeds the draft.
    pub async fn mount(&mut self) -> Option<Route> {
        let api = self.state.api.as_ref();
        let tracker = &self.tracker;
        let mode = self.mode;
        let seed = async move {
            match mode {
                FormMode::Create => None,
                FormMode::Edit(id) => Some(tracker.execute(|| D::fetch(api, id)).await),
            }
        };
        let (options, seed) = tokio::join!(tracker.execute(|| D::fetch_options(api)), seed);

        if !self.lifecycle.is_mounted() {
            debug!("discarding {} form data for an unmounted screen", D::SINGULAR);
            return None;
        }

        match options {
            Ok(options) => self.options = options,
            Err(e) => {
                warn!("loading {} form options failed: {}", D::SINGULAR, e);
                self.state.notifier.error("Could not load the selection lists");
            }
        }

        match seed {
            None => None,
            Some(Ok(entity)) => {
                self.draft = D::from_entity(&entity);
                None
            }
            Some(Err(e)) => {
                warn!("loading {} to edit failed: {}", D::SINGULAR, e);
                self.state.notifier.error(&format!(
                    "Could not load {} details",
                    D::SINGULAR.to_lowercase()
                ));
                Some(D::list_route())
            }
        }
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), AppError> {
        let name = self.draft.set_field(field, value)?;
        self.errors.remove(name);
        Ok(())
    }

    /// Validates locally, then creates or updates. Returns where to go next.
    pub async fn submit(&mut self) -> Result<Route, AppError> {
        let errors = self.draft.validate(self.mode);
        if !errors.is_empty() {
            debug!("{} form blocked by {} field error(s)", D::SINGULAR, errors.len());
            self.errors = errors.clone();
            self.state
                .notifier
                .warning("Please fill in all required fields.");
            return Err(AppError::Validation(errors));
        }
        self.errors.clear();

        let api = self.state.api.as_ref();
        let draft = &self.draft;
        let result = match self.mode {
            FormMode::Create => self.tracker.execute(|| draft.create(api)).await,
            FormMode::Edit(id) => self.tracker.execute(|| draft.update(api, id)).await,
        };

        if !self.lifecycle.is_mounted() {
            debug!("discarding {} save result for an unmounted screen", D::SINGULAR);
            return result.map(|_| D::list_route());
        }

        match result {
            Ok(_) => {
                let verb = match self.mode {
                    FormMode::Create => "created",
                    FormMode::Edit(_) => "updated",
                };
                info!("{} {}", D::SINGULAR, verb);
                self.state
                    .notifier
                    .success(&format!("{} {} successfully", D::SINGULAR, verb));
                Ok(D::list_route())
            }
            Err(e) => {
                warn!("saving {} failed: {}", D::SINGULAR, e);
                self.state
                    .notifier
                    .error(&format!("Could not save the {}: {}", D::SINGULAR.to_lowercase(), e.user_message()));
                Err(e)
            }
        }
    }
}
