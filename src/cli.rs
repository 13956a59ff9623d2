use std::fmt::Write as _;

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use eduportal::confirm::Confirmer;
use eduportal::error::AppError;
use eduportal::models::{Course, EntityId, Instructor, Student};
use eduportal::notify::{Notification, Notifier};
use eduportal::routes::Route;
use eduportal::services::{Candidate, ChangeOutcome, EnrollmentManager, EnrollmentSide};
use eduportal::state::AppState;
use eduportal::views::{
    CourseDetail, CourseDraft, CourseLoad, DeleteOutcome, Draft, FormView, InstructorDetail,
    InstructorDraft, ListView, Resource, StudentDetail, StudentDraft, ViewStatus,
};

#[derive(Parser, Debug)]
#[command(name = "eduportal", version, about = "School records admin console", long_about = None)]
pub struct Cli {
    /// Base URL of the records API (overrides EDUPORTAL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the available sections
    Home,
    Instructors {
        #[command(subcommand)]
        action: InstructorAction,
    },
    Courses {
        #[command(subcommand)]
        action: CourseAction,
    },
    Students {
        #[command(subcommand)]
        action: StudentAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum InstructorAction {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: EntityId,
    },
    Create(InstructorFields),
    Edit {
        id: EntityId,
        #[command(flatten)]
        fields: InstructorFields,
    },
    Delete {
        id: EntityId,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseAction {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: EntityId,
    },
    Create(CourseFields),
    Edit {
        id: EntityId,
        #[command(flatten)]
        fields: CourseFields,
    },
    Delete {
        id: EntityId,
    },
    AssignInstructor {
        id: EntityId,
        instructor: EntityId,
    },
    /// Students not yet enrolled in the course
    Available {
        id: EntityId,
    },
    Enroll {
        id: EntityId,
        student: EntityId,
    },
    RemoveStudent {
        id: EntityId,
        student: EntityId,
    },
}

#[derive(Subcommand, Debug)]
pub enum StudentAction {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        major: Option<String>,
    },
    Show {
        id: EntityId,
    },
    Create(StudentFields),
    Edit {
        id: EntityId,
        #[command(flatten)]
        fields: StudentFields,
    },
    Delete {
        id: EntityId,
    },
    /// Courses the student is not enrolled in
    Available {
        id: EntityId,
    },
    Enroll {
        id: EntityId,
        course: EntityId,
    },
    Drop {
        id: EntityId,
        course: EntityId,
    },
}

/// Only the flags given on the command line touch the draft.
trait FormFields {
    fn entries(&self) -> Vec<(&'static str, &str)>;
}

#[derive(Args, Debug, Default)]
pub struct InstructorFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
}

impl FormFields for InstructorFields {
    fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("department", &self.department),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[derive(Args, Debug, Default)]
pub struct CourseFields {
    #[arg(long)]
    pub course_name: Option<String>,
    #[arg(long)]
    pub credits: Option<String>,
    #[arg(long)]
    pub instructor_id: Option<String>,
}

impl FormFields for CourseFields {
    fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("courseName", &self.course_name),
            ("credits", &self.credits),
            ("instructorId", &self.instructor_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[derive(Args, Debug, Default)]
pub struct StudentFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Only used when creating
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub major: Option<String>,
}

impl FormFields for StudentFields {
    fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("password", &self.password),
            ("major", &self.major),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// Prompts on the terminal; anything but `y`/`yes` declines.
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        if stdout
            .write_all(format!("{} [y/N] ", prompt).as_bytes())
            .await
            .is_err()
        {
            return false;
        }
        let _ = stdout.flush().await;

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                tracing::warn!("reading confirmation failed: {}", e);
                false
            }
        }
    }
}

/// Views turn their own failures into a notification; only the error is left here.
fn reported<T>(result: Result<T, AppError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("already reported: {}", e);
            None
        }
    }
}

pub async fn run(command: Command, state: AppState) {
    match command {
        Command::Home => print!("{}", render_home()),
        Command::Instructors { action } => instructors(action, state).await,
        Command::Courses { action } => courses(action, state).await,
        Command::Students { action } => students(action, state).await,
    }
}

async fn instructors(action: InstructorAction, state: AppState) {
    match action {
        InstructorAction::List { search } => {
            let mut view = ListView::<Instructor>::new(state);
            view.set_search(search.as_deref().unwrap_or_default());
            reported(view.load().await);
            print!("{}", render_list(&view, |i| {
                format!("{:>4}  {:<28} {:<20} {}", i.id, i.full_name(), i.department, i.email)
            }));
        }
        InstructorAction::Show { id } => {
            let mut view = InstructorDetail::new(state, id);
            if let Some(route) = view.load().await {
                println!("-> {}", route);
                return;
            }
            if let Some(instructor) = view.instructor() {
                print!("{}", render_instructor(instructor, view.courses()));
            }
        }
        InstructorAction::Create(fields) => save(FormView::<InstructorDraft>::create(state), &fields).await,
        InstructorAction::Edit { id, fields } => {
            save(FormView::<InstructorDraft>::edit(state, id), &fields).await
        }
        InstructorAction::Delete { id } => delete::<Instructor>(state, id).await,
    }
}

async fn courses(action: CourseAction, state: AppState) {
    match action {
        CourseAction::List { search } => {
            let mut view = ListView::<Course>::new(state);
            view.set_search(search.as_deref().unwrap_or_default());
            reported(view.load().await);
            print!("{}", render_list(&view, |c| {
                format!(
                    "{:>4}  {:<32} {:>2} cr  {}",
                    c.id,
                    c.course_name,
                    c.credits,
                    c.instructor_name().unwrap_or_else(|| "Not assigned".to_string())
                )
            }));
        }
        CourseAction::Show { id } => {
            let Some(view) = course_detail(state, id).await else {
                return;
            };
            if let Some(course) = view.course() {
                print!("{}", render_course(course, view.roster().enrolled()));
            }
        }
        CourseAction::Create(fields) => save(FormView::<CourseDraft>::create(state), &fields).await,
        CourseAction::Edit { id, fields } => save(FormView::<CourseDraft>::edit(state, id), &fields).await,
        CourseAction::Delete { id } => delete::<Course>(state, id).await,
        CourseAction::AssignInstructor { id, instructor } => {
            let Some(mut view) = course_detail(state, id).await else {
                return;
            };
            if reported(view.assign_instructor(instructor).await).is_none() {
                return;
            }
            if let Some(course) = view.course() {
                println!(
                    "{}: {}",
                    course.course_name,
                    course.instructor_name().unwrap_or_else(|| "Not assigned".to_string())
                );
            }
        }
        CourseAction::Available { id } => {
            if let Some(view) = course_detail(state, id).await {
                print!("{}", render_available(view.roster()));
            }
        }
        CourseAction::Enroll { id, student } => {
            let notifier = state.notifier.clone();
            if let Some(mut view) = course_detail(state, id).await {
                enroll(view.roster_mut(), student, notifier.as_ref()).await;
            }
        }
        CourseAction::RemoveStudent { id, student } => {
            if let Some(mut view) = course_detail(state, id).await {
                withdraw(view.roster_mut(), student).await;
            }
        }
    }
}

async fn students(action: StudentAction, state: AppState) {
    match action {
        StudentAction::List { search, major } => {
            let mut view = ListView::<Student>::new(state);
            view.set_search(search.as_deref().unwrap_or_default());
            view.set_category(major.as_deref());
            reported(view.load().await);
            print!("{}", render_list(&view, |s| {
                format!("{:>4}  {:<28} {:<20} {}", s.id, s.full_name(), s.major, s.email)
            }));
            let majors = view.majors();
            if !majors.is_empty() {
                println!("majors: {}", majors.join(", "));
            }
        }
        StudentAction::Show { id } => {
            let Some(view) = student_detail(state, id).await else {
                return;
            };
            if let Some(student) = view.student() {
                print!(
                    "{}",
                    render_student(student, view.courses().enrolled(), view.course_load())
                );
            }
        }
        StudentAction::Create(fields) => save(FormView::<StudentDraft>::create(state), &fields).await,
        StudentAction::Edit { id, fields } => save(FormView::<StudentDraft>::edit(state, id), &fields).await,
        StudentAction::Delete { id } => delete::<Student>(state, id).await,
        StudentAction::Available { id } => {
            if let Some(view) = student_detail(state, id).await {
                print!("{}", render_available(view.courses()));
            }
        }
        StudentAction::Enroll { id, course } => {
            let notifier = state.notifier.clone();
            if let Some(mut view) = student_detail(state, id).await {
                enroll(view.courses_mut(), course, notifier.as_ref()).await;
            }
        }
        StudentAction::Drop { id, course } => {
            if let Some(mut view) = student_detail(state, id).await {
                withdraw(view.courses_mut(), course).await;
            }
        }
    }
}

async fn course_detail(state: AppState, id: EntityId) -> Option<CourseDetail> {
    let mut view = CourseDetail::new(state, id);
    match view.load().await {
        Some(route) => {
            println!("-> {}", route);
            None
        }
        None => Some(view),
    }
}

async fn student_detail(state: AppState, id: EntityId) -> Option<StudentDetail> {
    let mut view = StudentDetail::new(state, id);
    match view.load().await {
        Some(route) => {
            println!("-> {}", route);
            None
        }
        None => Some(view),
    }
}

async fn save<D: Draft, F: FormFields>(mut form: FormView<D>, fields: &F) {
    if let Some(route) = form.mount().await {
        println!("-> {}", route);
        return;
    }
    for (name, value) in fields.entries() {
        if let Err(e) = form.set_field(name, value) {
            println!("  {}: {}", name, e.message());
            return;
        }
    }
    match form.submit().await {
        Ok(route) => println!("-> {}", route),
        Err(AppError::Validation(errors)) => {
            for (field, message) in &errors {
                println!("  {}: {}", field, message);
            }
        }
        Err(e) => tracing::debug!("already reported: {}", e),
    }
}

async fn delete<R: Resource>(state: AppState, id: EntityId) {
    let mut view = ListView::<R>::new(state);
    if reported(view.load().await).is_none() {
        return;
    }
    match reported(view.delete(id).await) {
        Some(DeleteOutcome::Deleted) => println!("-> {}", R::list_route()),
        Some(DeleteOutcome::Cancelled) => println!("Nothing deleted."),
        None => {}
    }
}

async fn enroll<S: EnrollmentSide>(
    manager: &mut EnrollmentManager<S>,
    candidate: EntityId,
    notifier: &dyn Notifier,
) {
    // picker guards reject locally without notifying
    if let Err(e) = manager.open_picker().and_then(|_| manager.select(candidate)) {
        notifier.error(&e.message());
        return;
    }
    if let Some(outcome) = reported(manager.submit().await) {
        report(outcome);
    }
}

async fn withdraw<S: EnrollmentSide>(manager: &mut EnrollmentManager<S>, candidate: EntityId) {
    if let Some(outcome) = reported(manager.drop_enrollment(candidate).await) {
        report(outcome);
    }
}

fn report(outcome: ChangeOutcome) {
    match outcome {
        ChangeOutcome::Applied => {}
        ChangeOutcome::Cancelled => println!("Nothing changed."),
        ChangeOutcome::Discarded => println!("The change finished after the screen closed."),
    }
}

pub fn render_home() -> String {
    let mut out = String::from("Eduportal\n");
    for (label, route) in [
        ("Instructors", Route::Instructors),
        ("Courses", Route::Courses),
        ("Students", Route::Students),
    ] {
        let _ = writeln!(out, "  {:<12} {}", label, route);
    }
    out
}

fn render_list<R: Resource>(view: &ListView<R>, row: impl Fn(&R) -> String) -> String {
    match view.status() {
        ViewStatus::Loading => "Loading...\n".to_string(),
        ViewStatus::Failed(message) => format!("{}\n", message),
        ViewStatus::Empty => format!("{}\n", view.empty_message()),
        ViewStatus::Ready => {
            let visible = view.visible();
            if visible.is_empty() {
                return format!("{}\n", view.empty_message());
            }
            let mut out = String::new();
            for item in visible {
                let _ = writeln!(out, "{}", row(item));
            }
            out
        }
    }
}

pub fn render_instructor(instructor: &Instructor, courses: &[Course]) -> String {
    let load = CourseLoad::of(courses);
    let mut out = String::new();
    let _ = writeln!(out, "{}", instructor.full_name());
    let _ = writeln!(out, "  email:      {}", instructor.email);
    let _ = writeln!(out, "  department: {}", instructor.department);
    let _ = writeln!(out, "  courses:    {} ({} credits)", load.courses, load.total_credits);
    for course in courses {
        let _ = writeln!(out, "    {:>4}  {} ({} cr)", course.id, course.course_name, course.credits);
    }
    out
}

pub fn render_course(course: &Course, students: &[Student]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", course.course_name);
    let _ = writeln!(out, "  credits:    {}", course.credits);
    let _ = writeln!(
        out,
        "  instructor: {}",
        course.instructor_name().unwrap_or_else(|| "Not assigned".to_string())
    );
    let _ = writeln!(out, "  students:   {}", students.len());
    for student in students {
        let _ = writeln!(out, "    {:>4}  {} <{}>", student.id, student.full_name(), student.email);
    }
    out
}

pub fn render_student(student: &Student, courses: &[Course], load: CourseLoad) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", student.full_name());
    let _ = writeln!(out, "  email:   {}", student.email);
    let _ = writeln!(out, "  major:   {}", student.major);
    let _ = writeln!(
        out,
        "  courses: {}  total credits: {}  average: {}",
        load.courses,
        load.total_credits,
        load.average_display()
    );
    for course in courses {
        let _ = writeln!(out, "    {:>4}  {} ({} cr)", course.id, course.course_name, course.credits);
    }
    out
}

fn render_available<S: EnrollmentSide>(manager: &EnrollmentManager<S>) -> String {
    let available = manager.available();
    if available.is_empty() {
        return format!("No {} available.\n", S::CANDIDATES);
    }
    let mut out = String::new();
    for candidate in available {
        let _ = writeln!(out, "{:>4}  {}", candidate.id(), candidate.label());
    }
    out
}

pub fn render_notification(notification: &Notification) -> String {
    format!("[{}] {}", notification.severity, notification.message)
}
