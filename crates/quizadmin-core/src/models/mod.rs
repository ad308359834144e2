//! Data models for quiz platform entities.
//!
//! This module contains the structures exchanged with the platform API:
//!
//! - `Quiz`, `Question`, `AnswerOption`: quiz content
//! - `User`, `Role`, `ProfileUpdate`: accounts and access control
//! - `DashboardMetrics`: pre-aggregated analytics for the admin dashboard
//! - `Page`: the paged listing envelope returned by `/paged` endpoints

pub mod analytics;
pub mod page;
pub mod quiz;
pub mod user;

pub use analytics::{DailyAttempts, DashboardMetrics, QuizStat};
pub use page::Page;
pub use quiz::{AnswerOption, Difficulty, Question, QuestionInput, QuestionType, Quiz, QuizInput};
pub use user::{ProfileUpdate, Role, RoleInput, User, UserInput};
