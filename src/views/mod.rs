pub mod detail;
pub mod form;
pub mod list;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::request::RequestTracker;

pub use detail::{CourseDetail, CourseLoad, InstructorDetail, StudentDetail};
pub use form::{CourseDraft, Draft, FormMode, FormView, InstructorDraft, StudentDraft};
pub use list::{DeleteOutcome, ListFilter, ListView, Resource};

/// Mount flag shared between a view and whoever may tear it down.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    mounted: Arc<AtomicBool>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }
}

/// What a screen should render; exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Failed(String),
    Empty,
    Ready,
}

impl ViewStatus {
    pub fn derive(tracker: &RequestTracker, is_empty: bool) -> Self {
        let state = tracker.snapshot();
        if state.in_flight > 0 {
            ViewStatus::Loading
        } else if let Some(message) = state.error {
            ViewStatus::Failed(message)
        } else if is_empty {
            ViewStatus::Empty
        } else {
            ViewStatus::Ready
        }
    }
}
