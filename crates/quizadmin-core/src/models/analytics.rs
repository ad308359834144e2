use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pre-aggregated metrics behind the admin analytics dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMetrics {
    pub total_users: u64,
    pub active_users: u64,
    pub total_quizzes: u64,
    pub published_quizzes: u64,
    pub total_questions: u64,
    pub total_attempts: u64,
    /// Mean score across all attempts, 0-100
    pub average_score: f64,
    pub attempts_by_day: Vec<DailyAttempts>,
    pub top_quizzes: Vec<QuizStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttempts {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStat {
    pub quiz_id: i64,
    pub title: String,
    #[serde(default)]
    pub attempts: u64,
    #[serde(default)]
    pub average_score: f64,
}

impl DashboardMetrics {
    /// Share of users that are active, as a whole percentage.
    pub fn active_user_percent(&self) -> u64 {
        if self.total_users == 0 {
            0
        } else {
            (self.active_users * 100 + self.total_users / 2) / self.total_users
        }
    }

    pub fn busiest_day(&self) -> Option<&DailyAttempts> {
        self.attempts_by_day.iter().max_by_key(|d| d.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dashboard() {
        let json = r#"{
            "totalUsers": 3, "activeUsers": 2, "totalQuizzes": 10,
            "publishedQuizzes": 7, "totalQuestions": 120, "totalAttempts": 58,
            "averageScore": 71.5,
            "attemptsByDay": [{"date": "2024-05-01", "count": 4}, {"date": "2024-05-02", "count": 9}],
            "topQuizzes": [{"quizId": 3, "title": "Ownership", "attempts": 20, "averageScore": 64.0}]
        }"#;
        let metrics: DashboardMetrics = serde_json::from_str(json).expect("parse dashboard");
        assert_eq!(metrics.active_user_percent(), 67);
        assert_eq!(metrics.busiest_day().map(|d| d.count), Some(9));
        assert_eq!(metrics.top_quizzes[0].title, "Ownership");
    }

    #[test]
    fn test_empty_dashboard() {
        let metrics: DashboardMetrics = serde_json::from_str("{}").expect("parse empty");
        assert_eq!(metrics.active_user_percent(), 0);
        assert!(metrics.busiest_day().is_none());
    }
}
