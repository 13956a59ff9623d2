use std::fmt;

use crate::models::EntityId;

/// Screens of the console. Views hand one back when they want to navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Instructors,
    InstructorCreate,
    InstructorEdit(EntityId),
    InstructorDetail(EntityId),
    Courses,
    CourseCreate,
    CourseEdit(EntityId),
    CourseDetail(EntityId),
    Students,
    StudentCreate,
    StudentEdit(EntityId),
    StudentDetail(EntityId),
    NotFound,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Instructors => "/instructors".to_string(),
            Route::InstructorCreate => "/instructors/create".to_string(),
            Route::InstructorEdit(id) => format!("/instructors/edit/{}", id),
            Route::InstructorDetail(id) => format!("/instructors/{}", id),
            Route::Courses => "/courses".to_string(),
            Route::CourseCreate => "/courses/create".to_string(),
            Route::CourseEdit(id) => format!("/courses/edit/{}", id),
            Route::CourseDetail(id) => format!("/courses/{}", id),
            Route::Students => "/students".to_string(),
            Route::StudentCreate => "/students/create".to_string(),
            Route::StudentEdit(id) => format!("/students/edit/{}", id),
            Route::StudentDetail(id) => format!("/students/{}", id),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Unknown paths resolve to `NotFound` rather than failing.
    pub fn parse(path: &str) -> Route {
        let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();

        let collection = |name: &str| match name {
            "instructors" => Some((Route::Instructors, Route::InstructorCreate)),
            "courses" => Some((Route::Courses, Route::CourseCreate)),
            "students" => Some((Route::Students, Route::StudentCreate)),
            _ => None,
        };

        match segments.as_slice() {
            [] => Route::Home,
            [name] => collection(*name).map(|(list, _)| list).unwrap_or(Route::NotFound),
            [name, "create"] => collection(*name).map(|(_, create)| create).unwrap_or(Route::NotFound),
            [name, "edit", id] => match (*name, id.parse::<EntityId>()) {
                ("instructors", Ok(id)) => Route::InstructorEdit(id),
                ("courses", Ok(id)) => Route::CourseEdit(id),
                ("students", Ok(id)) => Route::StudentEdit(id),
                _ => Route::NotFound,
            },
            [name, id] => match (*name, id.parse::<EntityId>()) {
                ("instructors", Ok(id)) => Route::InstructorDetail(id),
                ("courses", Ok(id)) => Route::CourseDetail(id),
                ("students", Ok(id)) => Route::StudentDetail(id),
                _ => Route::NotFound,
            },
            _ => Route::NotFound,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
