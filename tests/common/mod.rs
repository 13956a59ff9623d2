#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::Notify;

use eduportal::confirm::Confirmer;
use eduportal::error::AppError;
use eduportal::gateway::{ApiResponse, SchoolApi};
use eduportal::models::{
    Course, CoursePayload, EntityId, Instructor, InstructorPayload, Student, StudentPayload,
};
use eduportal::notify::{Notifier, Severity};
use eduportal::state::AppState;

fn server_error(status: u16, message: impl Into<String>) -> AppError {
    AppError::Server {
        status,
        message: message.into(),
    }
}

fn not_found(kind: &str, id: EntityId) -> AppError {
    server_error(404, format!("{} not found with id: {}", kind, id))
}

#[derive(Debug, Clone)]
struct StoredCourse {
    id: EntityId,
    course_name: String,
    credits: u32,
    instructor_id: Option<EntityId>,
}

/// In-memory records behaving like the real backend.
#[derive(Debug, Default)]
pub struct SchoolStore {
    next_id: EntityId,
    instructors: BTreeMap<EntityId, Instructor>,
    courses: BTreeMap<EntityId, StoredCourse>,
    students: BTreeMap<EntityId, Student>,
    passwords: HashMap<EntityId, String>,
    /// (student, course)
    enrollments: BTreeSet<(EntityId, EntityId)>,
    pub last_student_write: Option<StudentPayload>,
}

impl SchoolStore {
    /// Instructors 1-2, courses 3-5, students 6-8; Ada (6) takes Logic (4).
    pub fn seeded() -> Self {
        let mut store = Self::default();
        let hopper = store.add_instructor("Grace", "Hopper", "cs");
        let turing = store.add_instructor("Alan", "Turing", "math");
        store.add_course("Compilers", 4, Some(hopper));
        let logic = store.add_course("Logic", 3, Some(turing));
        store.add_course("Algebra", 3, Some(turing));
        let ada = store.add_student("Ada", "Lovelace", "math");
        store.add_student("Edsger", "Dijkstra", "cs");
        store.add_student("Barbara", "Liskov", "cs");
        store.enrollments.insert((ada, logic));
        store.last_student_write = None;
        store
    }

    fn allocate(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_instructor(&mut self, first: &str, last: &str, department: &str) -> EntityId {
        let payload = InstructorPayload {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@school.test", first.to_lowercase()),
            department: department.to_string(),
        };
        self.create_instructor(&payload).map(|i| i.id).unwrap_or_default()
    }

    pub fn add_course(&mut self, name: &str, credits: u32, instructor_id: Option<EntityId>) -> EntityId {
        let id = self.allocate();
        self.courses.insert(
            id,
            StoredCourse {
                id,
                course_name: name.to_string(),
                credits,
                instructor_id,
            },
        );
        id
    }

    pub fn add_student(&mut self, first: &str, last: &str, major: &str) -> EntityId {
        let payload = StudentPayload {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@school.test", first.to_lowercase()),
            password: Some("secret1".to_string()),
            major: major.to_string(),
        };
        self.create_student(&payload).map(|s| s.id).unwrap_or_default()
    }

    pub fn is_enrolled(&self, student_id: EntityId, course_id: EntityId) -> bool {
        self.enrollments.contains(&(student_id, course_id))
    }

    pub fn list_instructors(&self) -> Vec<Instructor> {
        self.instructors.values().cloned().collect()
    }

    pub fn instructor(&self, id: EntityId) -> Result<Instructor, AppError> {
        self.instructors
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Instructor", id))
    }

    pub fn create_instructor(&mut self, payload: &InstructorPayload) -> Result<Instructor, AppError> {
        let id = self.allocate();
        let instructor = Instructor {
            id,
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
            email: payload.email.clone(),
            department: payload.department.clone(),
        };
        self.instructors.insert(id, instructor.clone());
        Ok(instructor)
    }

    pub fn update_instructor(
        &mut self,
        id: EntityId,
        payload: &InstructorPayload,
    ) -> Result<Instructor, AppError> {
        let instructor = self
            .instructors
            .get_mut(&id)
            .ok_or_else(|| not_found("Instructor", id))?;
        instructor.first_name = payload.first_name.clone();
        instructor.last_name = payload.last_name.clone();
        instructor.email = payload.email.clone();
        instructor.department = payload.department.clone();
        Ok(instructor.clone())
    }

    pub fn delete_instructor(&mut self, id: EntityId) -> Result<(), AppError> {
        self.instructor(id)?;
        if self.courses.values().any(|c| c.instructor_id == Some(id)) {
            return Err(server_error(
                400,
                "Cannot delete instructor with assigned courses",
            ));
        }
        self.instructors.remove(&id);
        Ok(())
    }

    pub fn instructor_courses(&self, id: EntityId) -> Result<Vec<Course>, AppError> {
        self.instructor(id)?;
        Ok(self
            .courses
            .values()
            .filter(|c| c.instructor_id == Some(id))
            .map(|c| self.render_course(c))
            .collect())
    }

    fn render_course(&self, course: &StoredCourse) -> Course {
        Course {
            id: course.id,
            course_name: course.course_name.clone(),
            credits: course.credits,
            instructor: course
                .instructor_id
                .and_then(|id| self.instructors.get(&id).cloned()),
        }
    }

    pub fn list_courses(&self) -> Vec<Course> {
        self.courses.values().map(|c| self.render_course(c)).collect()
    }

    pub fn course(&self, id: EntityId) -> Result<Course, AppError> {
        self.courses
            .get(&id)
            .map(|c| self.render_course(c))
            .ok_or_else(|| not_found("Course", id))
    }

    pub fn create_course(&mut self, payload: &CoursePayload) -> Result<Course, AppError> {
        self.instructor(payload.instructor_id)?;
        let id = self.add_course(&payload.course_name, payload.credits, Some(payload.instructor_id));
        self.course(id)
    }

    pub fn update_course(&mut self, id: EntityId, payload: &CoursePayload) -> Result<Course, AppError> {
        self.instructor(payload.instructor_id)?;
        let course = self.courses.get_mut(&id).ok_or_else(|| not_found("Course", id))?;
        course.course_name = payload.course_name.clone();
        course.credits = payload.credits;
        course.instructor_id = Some(payload.instructor_id);
        self.course(id)
    }

    pub fn delete_course(&mut self, id: EntityId) -> Result<(), AppError> {
        self.courses.remove(&id).ok_or_else(|| not_found("Course", id))?;
        self.enrollments.retain(|(_, course)| *course != id);
        Ok(())
    }

    pub fn course_students(&self, id: EntityId) -> Result<Vec<Student>, AppError> {
        self.course(id)?;
        Ok(self
            .enrollments
            .iter()
            .filter(|(_, course)| *course == id)
            .filter_map(|(student, _)| self.students.get(student).cloned())
            .collect())
    }

    pub fn assign_instructor(&mut self, id: EntityId, instructor_id: EntityId) -> Result<Course, AppError> {
        self.instructor(instructor_id)?;
        let course = self.courses.get_mut(&id).ok_or_else(|| not_found("Course", id))?;
        course.instructor_id = Some(instructor_id);
        self.course(id)
    }

    pub fn list_students(&self) -> Vec<Student> {
        self.students.values().cloned().collect()
    }

    pub fn student(&self, id: EntityId) -> Result<Student, AppError> {
        self.students
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Student", id))
    }

    pub fn create_student(&mut self, payload: &StudentPayload) -> Result<Student, AppError> {
        self.last_student_write = Some(payload.clone());
        let Some(password) = payload.password.clone() else {
            return Err(server_error(400, "Password is required"));
        };
        let id = self.allocate();
        let student = Student {
            id,
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
            email: payload.email.clone(),
            major: payload.major.clone(),
        };
        self.students.insert(id, student.clone());
        self.passwords.insert(id, password);
        Ok(student)
    }

    pub fn update_student(&mut self, id: EntityId, payload: &StudentPayload) -> Result<Student, AppError> {
        self.last_student_write = Some(payload.clone());
        let student = self.students.get_mut(&id).ok_or_else(|| not_found("Student", id))?;
        student.first_name = payload.first_name.clone();
        student.last_name = payload.last_name.clone();
        student.email = payload.email.clone();
        student.major = payload.major.clone();
        let student = student.clone();
        if let Some(password) = &payload.password {
            self.passwords.insert(id, password.clone());
        }
        Ok(student)
    }

    pub fn delete_student(&mut self, id: EntityId) -> Result<(), AppError> {
        self.students.remove(&id).ok_or_else(|| not_found("Student", id))?;
        self.passwords.remove(&id);
        self.enrollments.retain(|(student, _)| *student != id);
        Ok(())
    }

    pub fn student_courses(&self, id: EntityId) -> Result<Vec<Course>, AppError> {
        self.student(id)?;
        Ok(self
            .enrollments
            .iter()
            .filter(|(student, _)| *student == id)
            .filter_map(|(_, course)| self.courses.get(course).map(|c| self.render_course(c)))
            .collect())
    }

    pub fn enroll(&mut self, student_id: EntityId, course_id: EntityId) -> Result<(), AppError> {
        self.student(student_id)?;
        self.course(course_id)?;
        if !self.enrollments.insert((student_id, course_id)) {
            return Err(server_error(400, "Student is already enrolled in this course"));
        }
        Ok(())
    }

    pub fn drop_course(&mut self, student_id: EntityId, course_id: EntityId) -> Result<(), AppError> {
        self.student(student_id)?;
        self.course(course_id)?;
        if !self.enrollments.remove(&(student_id, course_id)) {
            return Err(server_error(400, "Student is not enrolled in this course"));
        }
        Ok(())
    }
}

pub type SharedStore = Arc<Mutex<SchoolStore>>;

/// Lets a test stop one call mid-flight.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// `SchoolApi` over a `SchoolStore`, with call recording, injected failures and gates.
#[derive(Default)]
pub struct FakeSchoolApi {
    pub store: SharedStore,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, (u16, String)>>,
    gates: Mutex<HashMap<&'static str, Gate>>,
}

impl FakeSchoolApi {
    pub fn seeded() -> Self {
        Self {
            store: Arc::new(Mutex::new(SchoolStore::seeded())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn fail(&self, name: &'static str, status: u16, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(name, (status, message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn hold(&self, name: &'static str) -> Gate {
        let gate = Gate::default();
        self.gates.lock().unwrap().insert(name, gate.clone());
        gate
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut SchoolStore) -> Result<T, AppError>) -> Result<T, AppError> {
        f(&mut self.store.lock().unwrap())
    }

    async fn enter(&self, name: &'static str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(name);
        let gate = self.gates.lock().unwrap().remove(name);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        let failure = self.failures.lock().unwrap().get(name).cloned();
        match failure {
            Some((status, message)) => Err(server_error(status, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SchoolApi for FakeSchoolApi {
    async fn list_instructors(&self) -> Result<ApiResponse<Vec<Instructor>>, AppError> {
        self.enter("list_instructors").await?;
        self.with_store(|s| Ok(ApiResponse::with_data(s.list_instructors())))
    }

    async fn get_instructor(&self, id: EntityId) -> Result<ApiResponse<Instructor>, AppError> {
        self.enter("get_instructor").await?;
        self.with_store(|s| s.instructor(id).map(ApiResponse::with_data))
    }

    async fn create_instructor(&self, payload: &InstructorPayload) -> Result<ApiResponse<Instructor>, AppError> {
        self.enter("create_instructor").await?;
        self.with_store(|s| s.create_instructor(payload).map(ApiResponse::with_data))
    }

    async fn update_instructor(
        &self,
        id: EntityId,
        payload: &InstructorPayload,
    ) -> Result<ApiResponse<Instructor>, AppError> {
        self.enter("update_instructor").await?;
        self.with_store(|s| s.update_instructor(id, payload).map(ApiResponse::with_data))
    }

    async fn delete_instructor(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.enter("delete_instructor").await?;
        self.with_store(|s| s.delete_instructor(id).map(|_| ApiResponse::empty()))
    }

    async fn instructor_courses(&self, id: EntityId) -> Result<ApiResponse<Vec<Course>>, AppError> {
        self.enter("instructor_courses").await?;
        self.with_store(|s| s.instructor_courses(id).map(ApiResponse::with_data))
    }

    async fn list_courses(&self) -> Result<ApiResponse<Vec<Course>>, AppError> {
        self.enter("list_courses").await?;
        self.with_store(|s| Ok(ApiResponse::with_data(s.list_courses())))
    }

    async fn get_course(&self, id: EntityId) -> Result<ApiResponse<Course>, AppError> {
        self.enter("get_course").await?;
        self.with_store(|s| s.course(id).map(ApiResponse::with_data))
    }

    async fn create_course(&self, payload: &CoursePayload) -> Result<ApiResponse<Course>, AppError> {
        self.enter("create_course").await?;
        self.with_store(|s| s.create_course(payload).map(ApiResponse::with_data))
    }

    async fn update_course(&self, id: EntityId, payload: &CoursePayload) -> Result<ApiResponse<Course>, AppError> {
        self.enter("update_course").await?;
        self.with_store(|s| s.update_course(id, payload).map(ApiResponse::with_data))
    }

    async fn delete_course(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.enter("delete_course").await?;
        self.with_store(|s| s.delete_course(id).map(|_| ApiResponse::empty()))
    }

    async fn course_students(&self, id: EntityId) -> Result<ApiResponse<Vec<Student>>, AppError> {
        self.enter("course_students").await?;
        self.with_store(|s| s.course_students(id).map(ApiResponse::with_data))
    }

    async fn assign_instructor(
        &self,
        course_id: EntityId,
        instructor_id: EntityId,
    ) -> Result<ApiResponse<Course>, AppError> {
        self.enter("assign_instructor").await?;
        self.with_store(|s| s.assign_instructor(course_id, instructor_id).map(ApiResponse::with_data))
    }

    async fn list_students(&self) -> Result<ApiResponse<Vec<Student>>, AppError> {
        self.enter("list_students").await?;
        self.with_store(|s| Ok(ApiResponse::with_data(s.list_students())))
    }

    async fn get_student(&self, id: EntityId) -> Result<ApiResponse<Student>, AppError> {
        self.enter("get_student").await?;
        self.with_store(|s| s.student(id).map(ApiResponse::with_data))
    }

    async fn create_student(&self, payload: &StudentPayload) -> Result<ApiResponse<Student>, AppError> {
        self.enter("create_student").await?;
        self.with_store(|s| s.create_student(payload).map(ApiResponse::with_data))
    }

    async fn update_student(&self, id: EntityId, payload: &StudentPayload) -> Result<ApiResponse<Student>, AppError> {
        self.enter("update_student").await?;
        self.with_store(|s| s.update_student(id, payload).map(ApiResponse::with_data))
    }

    async fn delete_student(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.enter("delete_student").await?;
        self.with_store(|s| s.delete_student(id).map(|_| ApiResponse::empty()))
    }

    async fn student_courses(&self, id: EntityId) -> Result<ApiResponse<Vec<Course>>, AppError> {
        self.enter("student_courses").await?;
        self.with_store(|s| s.student_courses(id).map(ApiResponse::with_data))
    }

    async fn enroll(&self, student_id: EntityId, course_id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.enter("enroll").await?;
        self.with_store(|s| s.enroll(student_id, course_id).map(|_| ApiResponse::empty()))
    }

    async fn drop_course(&self, student_id: EntityId, course_id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.enter("drop_course").await?;
        self.with_store(|s| s.drop_course(student_id, course_id).map(|_| ApiResponse::empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    pub message: String,
    pub severity: Severity,
    pub duration: Option<Duration>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Shown>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Shown> {
        self.shown.lock().unwrap().last().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.lock().unwrap().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, message: String, severity: Severity, duration: Option<Duration>) {
        self.shown.lock().unwrap().push(Shown {
            message,
            severity,
            duration,
        });
    }
}

/// Answers prompts from a queue; declines once it runs dry.
#[derive(Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            prompts: Mutex::default(),
        }
    }

    pub fn push(&self, answer: bool) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

pub struct Harness {
    pub api: Arc<FakeSchoolApi>,
    pub notifier: Arc<RecordingNotifier>,
    pub confirmer: Arc<ScriptedConfirmer>,
    pub state: AppState,
}

impl Harness {
    pub fn seeded() -> Self {
        let api = Arc::new(FakeSchoolApi::seeded());
        let notifier = Arc::new(RecordingNotifier::default());
        let confirmer = Arc::new(ScriptedConfirmer::default());
        let state = AppState::new(api.clone(), notifier.clone(), confirmer.clone());
        Self {
            api,
            notifier,
            confirmer,
            state,
        }
    }

    pub fn store(&self) -> std::sync::MutexGuard<'_, SchoolStore> {
        self.api.store.lock().unwrap()
    }
}

fn reply<T: Serialize>(result: Result<T, AppError>) -> Response {
    match result {
        Ok(data) => Json(json!({ "data": data, "success": true })).into_response(),
        Err(e) => failure(e),
    }
}

fn no_content(result: Result<(), AppError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => failure(e),
    }
}

fn failure(e: AppError) -> Response {
    let status = e
        .status()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "message": e.message() }))).into_response()
}

fn router(store: SharedStore) -> Router {
    let api = Router::new()
        .route(
            "/instructors",
            get(|State(s): State<SharedStore>| async move {
                reply(Ok::<_, AppError>(s.lock().unwrap().list_instructors()))
            })
            .post(
                |State(s): State<SharedStore>, Json(p): Json<InstructorPayload>| async move {
                    reply(s.lock().unwrap().create_instructor(&p))
                },
            ),
        )
        .route(
            "/instructors/{id}",
            get(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                reply(s.lock().unwrap().instructor(id))
            })
            .put(
                |State(s): State<SharedStore>,
                 Path(id): Path<EntityId>,
                 Json(p): Json<InstructorPayload>| async move {
                    reply(s.lock().unwrap().update_instructor(id, &p))
                },
            )
            .delete(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                no_content(s.lock().unwrap().delete_instructor(id))
            }),
        )
        .route(
            "/instructors/{id}/courses",
            get(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                reply(s.lock().unwrap().instructor_courses(id))
            }),
        )
        .route(
            "/courses",
            get(|State(s): State<SharedStore>| async move {
                reply(Ok::<_, AppError>(s.lock().unwrap().list_courses()))
            })
            .post(
                |State(s): State<SharedStore>, Json(p): Json<CoursePayload>| async move {
                    reply(s.lock().unwrap().create_course(&p))
                },
            ),
        )
        .route(
            "/courses/{id}",
            get(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                reply(s.lock().unwrap().course(id))
            })
            .put(
                |State(s): State<SharedStore>,
                 Path(id): Path<EntityId>,
                 Json(p): Json<CoursePayload>| async move {
                    reply(s.lock().unwrap().update_course(id, &p))
                },
            )
            .delete(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                no_content(s.lock().unwrap().delete_course(id))
            }),
        )
        .route(
            "/courses/{id}/students",
            get(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                reply(s.lock().unwrap().course_students(id))
            }),
        )
        .route(
            "/courses/{id}/instructor/{instructor_id}",
            post(
                |State(s): State<SharedStore>, Path((id, instructor_id)): Path<(EntityId, EntityId)>| async move {
                    reply(s.lock().unwrap().assign_instructor(id, instructor_id))
                },
            ),
        )
        .route(
            "/students",
            get(|State(s): State<SharedStore>| async move {
                reply(Ok::<_, AppError>(s.lock().unwrap().list_students()))
            })
            .post(
                |State(s): State<SharedStore>, Json(p): Json<StudentPayload>| async move {
                    reply(s.lock().unwrap().create_student(&p))
                },
            ),
        )
        .route(
            "/students/{id}",
            get(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                reply(s.lock().unwrap().student(id))
            })
            .put(
                |State(s): State<SharedStore>,
                 Path(id): Path<EntityId>,
                 Json(p): Json<StudentPayload>| async move {
                    reply(s.lock().unwrap().update_student(id, &p))
                },
            )
            .delete(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                no_content(s.lock().unwrap().delete_student(id))
            }),
        )
        .route(
            "/students/{id}/courses",
            get(|State(s): State<SharedStore>, Path(id): Path<EntityId>| async move {
                reply(s.lock().unwrap().student_courses(id))
            }),
        )
        .route(
            "/students/{id}/courses/{course_id}",
            post(
                |State(s): State<SharedStore>, Path((id, course_id)): Path<(EntityId, EntityId)>| async move {
                    reply(s.lock().unwrap().enroll(id, course_id).map(|_| json!({})))
                },
            )
            .delete(
                |State(s): State<SharedStore>, Path((id, course_id)): Path<(EntityId, EntityId)>| async move {
                    no_content(s.lock().unwrap().drop_course(id, course_id))
                },
            ),
        )
        .with_state(store);

    Router::new().nest("/api", api)
}

/// Serves `store` on an ephemeral port; returns the API base URL.
pub async fn spawn_server(store: SharedStore) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(store)).await.unwrap();
    });
    format!("http://{}/api", addr)
}
