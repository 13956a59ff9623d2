pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{
    Course, CoursePayload, EntityId, Instructor, InstructorPayload, Student, StudentPayload,
};

pub use dto::ApiResponse;

/// One method per (resource, operation); every call is exactly one HTTP request.
#[async_trait]
pub trait SchoolApi: Send + Sync {
    async fn list_instructors(&self) -> Result<ApiResponse<Vec<Instructor>>, AppError>;
    async fn get_instructor(&self, id: EntityId) -> Result<ApiResponse<Instructor>, AppError>;
    async fn create_instructor(&self, payload: &InstructorPayload) -> Result<ApiResponse<Instructor>, AppError>;
    async fn update_instructor(
        &self,
        id: EntityId,
        payload: &InstructorPayload,
    ) -> Result<ApiResponse<Instructor>, AppError>;
    async fn delete_instructor(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError>;
    async fn instructor_courses(&self, id: EntityId) -> Result<ApiResponse<Vec<Course>>, AppError>;

    async fn list_courses(&self) -> Result<ApiResponse<Vec<Course>>, AppError>;
    async fn get_course(&self, id: EntityId) -> Result<ApiResponse<Course>, AppError>;
    async fn create_course(&self, payload: &CoursePayload) -> Result<ApiResponse<Course>, AppError>;
    async fn update_course(&self, id: EntityId, payload: &CoursePayload) -> Result<ApiResponse<Course>, AppError>;
    async fn delete_course(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError>;
    async fn course_students(&self, id: EntityId) -> Result<ApiResponse<Vec<Student>>, AppError>;
    async fn assign_instructor(
        &self,
        course_id: EntityId,
        instructor_id: EntityId,
    ) -> Result<ApiResponse<Course>, AppError>;

    async fn list_students(&self) -> Result<ApiResponse<Vec<Student>>, AppError>;
    async fn get_student(&self, id: EntityId) -> Result<ApiResponse<Student>, AppError>;
    async fn create_student(&self, payload: &StudentPayload) -> Result<ApiResponse<Student>, AppError>;
    async fn update_student(&self, id: EntityId, payload: &StudentPayload) -> Result<ApiResponse<Student>, AppError>;
    async fn delete_student(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError>;
    async fn student_courses(&self, id: EntityId) -> Result<ApiResponse<Vec<Course>>, AppError>;
    async fn enroll(&self, student_id: EntityId, course_id: EntityId) -> Result<ApiResponse<Value>, AppError>;
    async fn drop_course(&self, student_id: EntityId, course_id: EntityId) -> Result<ApiResponse<Value>, AppError>;
}

pub struct HttpSchoolApi {
    client: Client,
    base_url: String,
}

impl HttpSchoolApi {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<ApiResponse<T>, AppError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("{} {} got no response: {}", method, url, e);
            AppError::NoResponse(e)
        })?;

        let status = response.status();
        let body_text = response.text().await.map_err(AppError::NoResponse)?;

        if !status.is_success() {
            let message = dto::error_message(&body_text);
            warn!("{} {} failed with {}: {}", method, url, status, message);
            return Err(AppError::Server {
                status: status.as_u16(),
                message,
            });
        }

        dto::decode_envelope(status.as_u16(), &body_text).inspect_err(|e| {
            warn!("{} {} returned an unusable body: {}", method, url, e);
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, AppError> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    async fn post<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, AppError> {
        self.send(Method::POST, path, body).await
    }

    async fn put<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, AppError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse<Value>, AppError> {
        self.send::<(), Value>(Method::DELETE, path, None).await
    }
}

#[async_trait]
impl SchoolApi for HttpSchoolApi {
    async fn list_instructors(&self) -> Result<ApiResponse<Vec<Instructor>>, AppError> {
        self.get("/instructors").await
    }

    async fn get_instructor(&self, id: EntityId) -> Result<ApiResponse<Instructor>, AppError> {
        self.get(&format!("/instructors/{}", id)).await
    }

    async fn create_instructor(&self, payload: &InstructorPayload) -> Result<ApiResponse<Instructor>, AppError> {
        self.post("/instructors", Some(payload)).await
    }

    async fn update_instructor(
        &self,
        id: EntityId,
        payload: &InstructorPayload,
    ) -> Result<ApiResponse<Instructor>, AppError> {
        self.put(&format!("/instructors/{}", id), payload).await
    }

    async fn delete_instructor(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.delete(&format!("/instructors/{}", id)).await
    }

    async fn instructor_courses(&self, id: EntityId) -> Result<ApiResponse<Vec<Course>>, AppError> {
        self.get(&format!("/instructors/{}/courses", id)).await
    }

    async fn list_courses(&self) -> Result<ApiResponse<Vec<Course>>, AppError> {
        self.get("/courses").await
    }

    async fn get_course(&self, id: EntityId) -> Result<ApiResponse<Course>, AppError> {
        self.get(&format!("/courses/{}", id)).await
    }

    async fn create_course(&self, payload: &CoursePayload) -> Result<ApiResponse<Course>, AppError> {
        self.post("/courses", Some(payload)).await
    }

    async fn update_course(&self, id: EntityId, payload: &CoursePayload) -> Result<ApiResponse<Course>, AppError> {
        self.put(&format!("/courses/{}", id), payload).await
    }

    async fn delete_course(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.delete(&format!("/courses/{}", id)).await
    }

    async fn course_students(&self, id: EntityId) -> Result<ApiResponse<Vec<Student>>, AppError> {
        self.get(&format!("/courses/{}/students", id)).await
    }

    async fn assign_instructor(
        &self,
        course_id: EntityId,
        instructor_id: EntityId,
    ) -> Result<ApiResponse<Course>, AppError> {
        self.post::<(), Course>(&format!("/courses/{}/instructor/{}", course_id, instructor_id), None)
            .await
    }

    async fn list_students(&self) -> Result<ApiResponse<Vec<Student>>, AppError> {
        self.get("/students").await
    }

    async fn get_student(&self, id: EntityId) -> Result<ApiResponse<Student>, AppError> {
        self.get(&format!("/students/{}", id)).await
    }

    async fn create_student(&self, payload: &StudentPayload) -> Result<ApiResponse<Student>, AppError> {
        self.post("/students", Some(payload)).await
    }

    async fn update_student(&self, id: EntityId, payload: &StudentPayload) -> Result<ApiResponse<Student>, AppError> {
        self.put(&format!("/students/{}", id), payload).await
    }

    async fn delete_student(&self, id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.delete(&format!("/students/{}", id)).await
    }

    async fn student_courses(&self, id: EntityId) -> Result<ApiResponse<Vec<Course>>, AppError> {
        self.get(&format!("/students/{}/courses", id)).await
    }

    async fn enroll(&self, student_id: EntityId, course_id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.post::<(), Value>(&format!("/students/{}/courses/{}", student_id, course_id), None)
            .await
    }

    async fn drop_course(&self, student_id: EntityId, course_id: EntityId) -> Result<ApiResponse<Value>, AppError> {
        self.delete(&format!("/students/{}/courses/{}", student_id, course_id))
            .await
    }
}
