use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::gateway::SchoolApi;
use crate::models::{Course, EntityId, Instructor, Student};
use crate::notify::Severity;
use crate::request::RequestTracker;
use crate::routes::Route;
use crate::state::AppState;

use super::{Lifecycle, ViewStatus};

/// An entity with its own list screen.
#[async_trait]
pub trait Resource: Clone + Send + Sync + 'static {
    const SINGULAR: &'static str;
    const PLURAL: &'static str;

    fn key(&self) -> EntityId;
    fn display_name(&self) -> String;
    /// Fields the free-text filter looks at.
    fn search_fields(&self) -> Vec<String>;
    /// Value for the exact-match categorical filter, if the entity has one.
    fn category(&self) -> Option<&str> {
        None
    }
    fn list_route() -> Route;

    async fn fetch_all(api: &dyn SchoolApi) -> Result<Vec<Self>, AppError>;
    async fn remove(api: &dyn SchoolApi, id: EntityId) -> Result<(), AppError>;

    /// Notification for a failed delete.
    fn delete_failure(_err: &AppError) -> (String, Severity, Option<Duration>) {
        (
            format!("Could not delete the {}", Self::SINGULAR),
            Severity::Error,
            None,
        )
    }
}

#[async_trait]
impl Resource for Instructor {
    const SINGULAR: &'static str = "instructor";
    const PLURAL: &'static str = "instructors";

    fn key(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.full_name()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.full_name(), self.department.clone(), self.email.clone()]
    }

    fn list_route() -> Route {
        Route::Instructors
    }

    async fn fetch_all(api: &dyn SchoolApi) -> Result<Vec<Self>, AppError> {
        Ok(api.list_instructors().await?.data_or_default())
    }

    async fn remove(api: &dyn SchoolApi, id: EntityId) -> Result<(), AppError> {
        api.delete_instructor(id).await.map(|_| ())
    }

    fn delete_failure(err: &AppError) -> (String, Severity, Option<Duration>) {
        if err.status() == Some(400) {
            (
                "This instructor still teaches courses. Assign those courses to another instructor before deleting."
                    .to_string(),
                Severity::Warning,
                Some(Duration::from_secs(6)),
            )
        } else {
            (
                "An error occurred while deleting the instructor".to_string(),
                Severity::Error,
                Some(Duration::from_secs(4)),
            )
        }
    }
}

#[async_trait]
impl Resource for Course {
    const SINGULAR: &'static str = "course";
    const PLURAL: &'static str = "courses";

    fn key(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.course_name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.course_name.clone()];
        fields.extend(self.instructor_name());
        fields
    }

    fn list_route() -> Route {
        Route::Courses
    }

    async fn fetch_all(api: &dyn SchoolApi) -> Result<Vec<Self>, AppError> {
        Ok(api.list_courses().await?.data_or_default())
    }

    async fn remove(api: &dyn SchoolApi, id: EntityId) -> Result<(), AppError> {
        api.delete_course(id).await.map(|_| ())
    }
}

#[async_trait]
impl Resource for Student {
    const SINGULAR: &'static str = "student";
    const PLURAL: &'static str = "students";

    fn key(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.full_name()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.full_name(), self.email.clone()]
    }

    fn category(&self) -> Option<&str> {
        Some(&self.major)
    }

    fn list_route() -> Route {
        Route::Students
    }

    async fn fetch_all(api: &dyn SchoolApi) -> Result<Vec<Self>, AppError> {
        Ok(api.list_students().await?.data_or_default())
    }

    async fn remove(api: &dyn SchoolApi, id: EntityId) -> Result<(), AppError> {
        api.delete_student(id).await.map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub text: String,
    pub category: Option<String>,
}

impl ListFilter {
    pub fn matches<R: Resource>(&self, item: &R) -> bool {
        let needle = self.text.trim().to_lowercase();
        let text_ok = needle.is_empty()
            || item
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));

        let category_ok = match self.category.as_deref() {
            None | Some("") => true,
            Some(wanted) => item.category() == Some(wanted),
        };

        text_ok && category_ok
    }

    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty() || self.category.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

pub struct ListView<R: Resource> {
    state: AppState,
    items: Vec<R>,
    filter: ListFilter,
    tracker: RequestTracker,
    /// Deletes; kept apart so a failed delete does not mask the loaded list.
    mutations: RequestTracker,
    lifecycle: Lifecycle,
}

impl<R: Resource> ListView<R> {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            items: Vec::new(),
            filter: ListFilter::default(),
            tracker: RequestTracker::new(),
            mutations: RequestTracker::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn mutations(&self) -> &RequestTracker {
        &self.mutations
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn set_search(&mut self, text: &str) {
        self.filter.text = text.to_string();
    }

    pub fn set_category(&mut self, category: Option<&str>) {
        self.filter.category = category.map(str::to_string);
    }

    /// Items passing the current filter, in server order.
    pub fn visible(&self) -> Vec<&R> {
        self.items.iter().filter(|item| self.filter.matches(*item)).collect()
    }

    /// Distinct categories in first-seen order, for the filter picker.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for category in self.items.iter().filter_map(R::category) {
            if !seen.iter().any(|c| c == category) {
                seen.push(category.to_string());
            }
        }
        seen
    }

    pub fn status(&self) -> ViewStatus {
        ViewStatus::derive(&self.tracker, self.visible().is_empty())
    }

    pub fn empty_message(&self) -> String {
        if self.filter.is_active() {
            format!("No {} match the current filter.", R::PLURAL)
        } else {
            format!("There are no {} yet.", R::PLURAL)
        }
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        let api = self.state.api.as_ref();
        let result = self.tracker.execute(|| R::fetch_all(api)).await;

        if !self.lifecycle.is_mounted() {
            debug!("discarding {} list for an unmounted screen", R::PLURAL);
            return Ok(());
        }

        match result {
            Ok(items) => {
                debug!("loaded {} {}", items.len(), R::PLURAL);
                self.items = items;
                Ok(())
            }
            Err(e) => {
                warn!("loading {} failed: {}", R::PLURAL, e);
                self.state
                    .notifier
                    .error(&format!("Could not load {}", R::PLURAL));
                Err(e)
            }
        }
    }

    /// Confirms, deletes, then reloads the whole collection.
    pub async fn delete(&mut self, id: EntityId) -> Result<DeleteOutcome, AppError> {
        let Some(name) = self.items.iter().find(|i| i.key() == id).map(R::display_name) else {
            let message = format!("No {} with id {} in the current list", R::SINGULAR, id);
            warn!("{}", message);
            self.state.notifier.error(&message);
            return Err(AppError::Rejected(message));
        };

        let prompt = format!("Are you sure you want to delete {}?", name);
        if !self.state.confirmer.confirm(&prompt).await {
            debug!("delete of {} {} declined", R::SINGULAR, id);
            return Ok(DeleteOutcome::Cancelled);
        }

        let api = self.state.api.as_ref();
        let result = self.mutations.execute(|| R::remove(api, id)).await;

        if !self.lifecycle.is_mounted() {
            debug!("discarding delete result for an unmounted screen");
            return result.map(|_| DeleteOutcome::Deleted);
        }

        match result {
            Ok(()) => {
                info!("deleted {} {}", R::SINGULAR, id);
                self.state
                    .notifier
                    .success(&format!("{} was deleted", name));
                if let Err(e) = self.load().await {
                    warn!("delete succeeded but reloading {} failed: {}", R::PLURAL, e);
                }
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!("deleting {} {} failed: {}", R::SINGULAR, id, e);
                let (message, severity, duration) = R::delete_failure(&e);
                self.state.notifier.show(message, severity, duration);
                Err(e)
            }
        }
    }
}

impl ListView<Student> {
    /// Distinct majors in first-seen order, for the major filter.
    pub fn majors(&self) -> Vec<String> {
        self.categories()
    }
}
