//! Plain-text rendering of API data for the console.

use chrono::{DateTime, Utc};
use quizadmin_core::models::{DashboardMetrics, Page, Question, Quiz, Role, User};
use quizadmin_core::CurrentUser;

/// Widest a title or name column may get before truncation
const MAX_TEXT_WIDTH: usize = 40;

/// Width of the bars in the attempts-per-day chart
const BAR_WIDTH: usize = 30;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp as "Mar 01, 2024", or "-" when absent
pub fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn page_footer<T>(page: &Page<T>) -> String {
    let mut footer = page.position_display();
    if !page.is_last() {
        footer.push_str(" - next page available");
    }
    footer
}

pub fn quiz_rows(page: &Page<Quiz>) -> String {
    let mut out = format!(
        "{:>5}  {:<40}  {:<8}  {:>9}  {:>9}  {}\n",
        "ID", "TITLE", "LEVEL", "QUESTIONS", "LIMIT", "PUBLISHED"
    );
    for quiz in &page.content {
        out.push_str(&format!(
            "{:>5}  {:<40}  {:<8}  {:>9}  {:>9}  {}\n",
            quiz.id,
            truncate_string(&quiz.title, MAX_TEXT_WIDTH),
            quiz.difficulty_display(),
            quiz.question_count,
            quiz.time_limit_display(),
            yes_no(quiz.published)
        ));
    }
    out.push_str(&page_footer(page));
    out
}

pub fn question_rows(page: &Page<Question>) -> String {
    let mut out = format!(
        "{:>5}  {:>5}  {:<16}  {:>6}  {}\n",
        "ID", "QUIZ", "TYPE", "POINTS", "TEXT"
    );
    for question in &page.content {
        out.push_str(&format!(
            "{:>5}  {:>5}  {:<16}  {:>6}  {}\n",
            question.id,
            question
                .quiz_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            question.question_type.to_string(),
            question.points,
            truncate_string(&question.text, MAX_TEXT_WIDTH)
        ));
    }
    out.push_str(&page_footer(page));
    out
}

pub fn user_rows(page: &Page<User>) -> String {
    let mut out = format!(
        "{:>5}  {:<24}  {:<32}  {:<6}  {}\n",
        "ID", "NAME", "EMAIL", "ACTIVE", "ROLES"
    );
    for user in &page.content {
        out.push_str(&format!(
            "{:>5}  {:<24}  {:<32}  {:<6}  {}\n",
            user.id,
            truncate_string(&user.full_name(), 24),
            truncate_string(&user.email, 32),
            yes_no(user.active),
            user.roles_display()
        ));
    }
    out.push_str(&page_footer(page));
    out
}

pub fn role_rows(page: &Page<Role>) -> String {
    let mut out = format!("{:>5}  {:<20}  {}\n", "ID", "NAME", "DESCRIPTION");
    for role in &page.content {
        out.push_str(&format!(
            "{:>5}  {:<20}  {}\n",
            role.id,
            role.name,
            role.description.as_deref().unwrap_or("-")
        ));
    }
    out.push_str(&page_footer(page));
    out
}

pub fn quiz_detail(quiz: &Quiz) -> String {
    format!(
        "Quiz #{}: {}\n  {}\n  Category: {}  Level: {}  Limit: {}\n  Questions: {}  Published: {}\n  Created: {}  Updated: {}",
        quiz.id,
        quiz.title,
        quiz.description.as_deref().unwrap_or("(no description)"),
        quiz.category.as_deref().unwrap_or("-"),
        quiz.difficulty_display(),
        quiz.time_limit_display(),
        quiz.question_count,
        yes_no(quiz.published),
        format_date(quiz.created_at.as_ref()),
        format_date(quiz.updated_at.as_ref()),
    )
}

pub fn question_detail(question: &Question) -> String {
    let mut out = format!(
        "Question #{} ({}, {} pt)\n  {}",
        question.id, question.question_type, question.points, question.text
    );
    for option in &question.options {
        let marker = if option.correct { "*" } else { " " };
        out.push_str(&format!("\n   {} {}", marker, option.text));
    }
    out
}

pub fn user_detail(user: &User) -> String {
    format!(
        "User #{}: {} <{}>\n  Active: {}  Roles: {}\n  Joined: {}",
        user.id,
        user.full_name(),
        user.email,
        yes_no(user.active),
        user.roles_display(),
        format_date(user.created_at.as_ref()),
    )
}

pub fn role_detail(role: &Role) -> String {
    format!(
        "Role #{}: {}\n  {}",
        role.id,
        role.name,
        role.description.as_deref().unwrap_or("(no description)")
    )
}

pub fn current_user(user: &CurrentUser) -> String {
    format!(
        "{} <{}> id={} roles=[{}]{}",
        user.full_name(),
        user.email,
        user.id,
        user.roles.join(", "),
        if user.active { "" } else { " (inactive)" }
    )
}

pub fn dashboard(metrics: &DashboardMetrics) -> String {
    let mut out = format!(
        "Users:     {} ({} active, {}%)\nQuizzes:   {} ({} published)\nQuestions: {}\nAttempts:  {}  Average score: {:.1}%",
        metrics.total_users,
        metrics.active_users,
        metrics.active_user_percent(),
        metrics.total_quizzes,
        metrics.published_quizzes,
        metrics.total_questions,
        metrics.total_attempts,
        metrics.average_score,
    );

    if let Some(busiest) = metrics.busiest_day() {
        out.push_str("\n\nAttempts by day:");
        for day in &metrics.attempts_by_day {
            let bar = if busiest.count == 0 {
                0
            } else {
                (day.count as usize * BAR_WIDTH) / busiest.count as usize
            };
            out.push_str(&format!(
                "\n  {}  {:>5}  {}",
                day.date.format("%b %d"),
                day.count,
                "#".repeat(bar)
            ));
        }
    }

    if !metrics.top_quizzes.is_empty() {
        out.push_str("\n\nTop quizzes:");
        for stat in &metrics.top_quizzes {
            out.push_str(&format!(
                "\n  #{:<4} {:<40} {:>5} attempts  {:>5.1}%",
                stat.quiz_id,
                truncate_string(&stat.title, MAX_TEXT_WIDTH),
                stat.attempts,
                stat.average_score
            ));
        }
    }
    out
}
