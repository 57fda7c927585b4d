//! crates/study_assistant_core/src/progress.rs
//!
//! Per-user progress and statistics, computed from recorded activity.

use crate::domain::{AnswerRecord, Feedback, FlashcardActivity, QuizOverview};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const PERFORMANCE_WINDOW_DAYS: i64 = 30;
pub const TOP_LECTURES: usize = 10;
pub const RECENT_FEEDBACK: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizStats {
    pub generated: usize,
    pub attempted: usize,
    pub completed: usize,
    pub questions_answered: usize,
    pub correct_answers: usize,
    /// Fraction of answered questions that were correct, `0.0` when none.
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureCount {
    pub lecture_title: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardStats {
    pub created: usize,
    pub created_last_7_days: usize,
    pub lecture_breakdown: Vec<LectureCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub quizzes_generated: usize,
    pub flashcards_created: usize,
    pub questions_answered: usize,
}

/// Accuracy for one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPerformance {
    pub date: NaiveDate,
    pub accuracy_percent: u32,
    pub questions_answered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    NotEnoughData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub trend: Trend,
    pub active_days: usize,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub quiz_stats: QuizStats,
    pub flashcard_stats: FlashcardStats,
    pub recent_activity: RecentActivity,
    pub performance: Vec<DailyPerformance>,
    pub lecture_breakdown: Vec<LectureCount>,
    pub insights: Insights,
}

/// Builds the full report for one user. `now` anchors the rolling windows.
pub fn build_progress(
    quizzes: &[QuizOverview],
    answers: &[AnswerRecord],
    flashcards: &[FlashcardActivity],
    now: DateTime<Utc>,
) -> ProgressReport {
    let quiz_stats = quiz_stats(quizzes, answers);
    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

    let flashcard_stats = FlashcardStats {
        created: flashcards.len(),
        created_last_7_days: flashcards
            .iter()
            .filter(|f| f.created_at >= recent_cutoff)
            .count(),
        lecture_breakdown: top_lectures(flashcards.iter().map(|f| f.lecture_title.as_str())),
    };

    let recent_activity = RecentActivity {
        quizzes_generated: quizzes.iter().filter(|q| q.created_at >= recent_cutoff).count(),
        flashcards_created: flashcard_stats.created_last_7_days,
        questions_answered: answers.iter().filter(|a| a.answered_at >= recent_cutoff).count(),
    };

    let performance = daily_performance(answers, now);
    let insights = insights(&performance, quizzes.len(), flashcards.len());

    ProgressReport {
        lecture_breakdown: top_lectures(quizzes.iter().map(|q| q.lecture_title.as_str())),
        quiz_stats,
        flashcard_stats,
        recent_activity,
        performance,
        insights,
    }
}

fn quiz_stats(quizzes: &[QuizOverview], answers: &[AnswerRecord]) -> QuizStats {
    let questions_answered = answers.len();
    let correct_answers = answers.iter().filter(|a| a.is_correct).count();
    let average_score = if questions_answered == 0 {
        0.0
    } else {
        correct_answers as f64 / questions_answered as f64
    };
    QuizStats {
        generated: quizzes.len(),
        attempted: quizzes.iter().filter(|q| q.answered_count > 0).count(),
        completed: quizzes.iter().filter(|q| q.completed_at.is_some()).count(),
        questions_answered,
        correct_answers,
        average_score,
    }
}

/// Most frequent lecture titles, ties broken alphabetically.
fn top_lectures<'a>(titles: impl Iterator<Item = &'a str>) -> Vec<LectureCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for title in titles {
        *counts.entry(title).or_insert(0) += 1;
    }
    let mut ranked: Vec<LectureCount> = counts
        .into_iter()
        .map(|(title, count)| LectureCount {
            lecture_title: title.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.lecture_title.cmp(&b.lecture_title)));
    ranked.truncate(TOP_LECTURES);
    ranked
}

/// Days with at least one answer inside the window, oldest first.
fn daily_performance(answers: &[AnswerRecord], now: DateTime<Utc>) -> Vec<DailyPerformance> {
    let cutoff = now - Duration::days(PERFORMANCE_WINDOW_DAYS);
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for answer in answers.iter().filter(|a| a.answered_at >= cutoff) {
        let entry = days.entry(answer.answered_at.date_naive()).or_insert((0, 0));
        entry.0 += 1;
        if answer.is_correct {
            entry.1 += 1;
        }
    }
    days.into_iter()
        .map(|(date, (total, correct))| DailyPerformance {
            date,
            accuracy_percent: (100.0 * correct as f64 / total as f64).round() as u32,
            questions_answered: total,
        })
        .collect()
}

fn insights(performance: &[DailyPerformance], quiz_count: usize, flashcard_count: usize) -> Insights {
    let mut insights = Vec::new();
    let mut recommendations = Vec::new();

    let trend = if performance.len() >= 3 {
        let early: u32 = performance[..3].iter().map(|d| d.accuracy_percent).sum();
        let recent: u32 = performance[performance.len() - 3..]
            .iter()
            .map(|d| d.accuracy_percent)
            .sum();
        if recent > early {
            insights.push("Your performance has improved over time!".to_string());
            recommendations.push("Keep up the consistent practice.".to_string());
            Trend::Improving
        } else {
            insights.push("Consider reviewing areas where you struggled.".to_string());
            recommendations.push("Try focusing on weaker topics.".to_string());
            Trend::Declining
        }
    } else {
        Trend::NotEnoughData
    };

    let active_days = performance.len();
    if active_days >= 7 {
        insights.push("Great consistency! You've been studying regularly.".to_string());
    } else if active_days >= 3 {
        insights.push("Good start! Try to study more consistently.".to_string());
        recommendations.push("Aim for daily study sessions.".to_string());
    } else {
        recommendations.push("Try to establish a regular study routine.".to_string());
    }

    if flashcard_count > quiz_count * 2 {
        recommendations.push("Consider taking more quizzes to test your knowledge.".to_string());
    } else if quiz_count > flashcard_count * 2 {
        recommendations.push("Create more flashcards for better retention.".to_string());
    }

    Insights {
        trend,
        active_days,
        insights,
        recommendations,
    }
}

/// Totals shown on the stats page.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub total_quizzes: usize,
    pub total_flashcards: usize,
    pub average_rating: f64,
    pub recent_feedback: Vec<FeedbackEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackEntry {
    pub category: String,
    pub item_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Feedback> for FeedbackEntry {
    fn from(f: &Feedback) -> Self {
        Self {
            category: f.category.clone(),
            item_id: f.item_id.clone(),
            rating: f.rating,
            comment: f.comment.clone(),
            created_at: f.created_at,
        }
    }
}

/// Mean rating rounded to one decimal, `0.0` for no feedback.
pub fn average_rating(feedback: &[Feedback]) -> f64 {
    if feedback.is_empty() {
        return 0.0;
    }
    let sum: u32 = feedback.iter().map(|f| u32::from(f.rating)).sum();
    (sum as f64 / feedback.len() as f64 * 10.0).round() / 10.0
}

pub fn stats_summary(total_quizzes: usize, total_flashcards: usize, feedback: &[Feedback]) -> StatsSummary {
    let mut recent: Vec<&Feedback> = feedback.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    StatsSummary {
        total_quizzes,
        total_flashcards,
        average_rating: average_rating(feedback),
        recent_feedback: recent
            .into_iter()
            .take(RECENT_FEEDBACK)
            .map(FeedbackEntry::from)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 20, 12, 0, 0).unwrap()
    }

    fn overview(title: &str, answered: usize, completed: bool, days_ago: i64) -> QuizOverview {
        QuizOverview {
            id: Uuid::new_v4(),
            file_id: None,
            lecture_title: title.into(),
            difficulty: Difficulty::Medium,
            topic_tags: vec![],
            question_count: 3,
            answered_count: answered,
            correct_count: 0,
            created_at: now() - Duration::days(days_ago),
            completed_at: completed.then(now),
        }
    }

    fn answer(correct: bool, days_ago: i64) -> AnswerRecord {
        AnswerRecord {
            quiz_id: Uuid::new_v4(),
            lecture_title: "Biology".into(),
            is_correct: correct,
            answered_at: now() - Duration::days(days_ago),
        }
    }

    fn feedback(rating: u8, minutes_ago: i64) -> Feedback {
        Feedback {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: "quiz".into(),
            item_id: "q1".into(),
            rating,
            comment: String::new(),
            created_at: now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_empty_history() {
        let report = build_progress(&[], &[], &[], now());
        assert_eq!(report.quiz_stats.average_score, 0.0);
        assert!(report.performance.is_empty());
        assert_eq!(report.insights.trend, Trend::NotEnoughData);
        assert_eq!(
            report.insights.recommendations,
            vec!["Try to establish a regular study routine.".to_string()]
        );
    }

    #[test]
    fn test_quiz_counters() {
        let quizzes = vec![
            overview("Biology", 3, true, 1),
            overview("Biology", 1, false, 2),
            overview("Chemistry", 0, false, 20),
        ];
        let answers = vec![answer(true, 1), answer(true, 1), answer(false, 2), answer(false, 1)];
        let report = build_progress(&quizzes, &answers, &[], now());
        let stats = &report.quiz_stats;
        assert_eq!(stats.generated, 3);
        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.questions_answered, 4);
        assert_eq!(stats.correct_answers, 2);
        assert!((stats.average_score - 0.5).abs() < 1e-9);
        assert_eq!(report.recent_activity.quizzes_generated, 2);
        assert_eq!(report.lecture_breakdown[0].lecture_title, "Biology");
        assert_eq!(report.lecture_breakdown[0].count, 2);
        assert_eq!(report.insights.recommendations.last().unwrap(), "Create more flashcards for better retention.");
    }

    #[test]
    fn test_daily_performance_is_oldest_first_and_windowed() {
        let answers = vec![
            answer(true, 1),
            answer(false, 1),
            answer(true, 3),
            answer(true, 45),
        ];
        let perf = build_progress(&[], &answers, &[], now()).performance;
        assert_eq!(perf.len(), 2);
        assert!(perf[0].date < perf[1].date);
        assert_eq!(perf[0].accuracy_percent, 100);
        assert_eq!(perf[1].accuracy_percent, 50);
        assert_eq!(perf[1].questions_answered, 2);
    }

    #[test]
    fn test_trend_compares_first_and_last_days() {
        let mut answers = Vec::new();
        for day in (1..=6).rev() {
            answers.push(answer(day <= 3, day));
        }
        let report = build_progress(&[], &answers, &[], now());
        assert_eq!(report.insights.trend, Trend::Improving);
        assert_eq!(report.insights.active_days, 6);
        assert!(report
            .insights
            .insights
            .contains(&"Good start! Try to study more consistently.".to_string()));
    }

    #[test]
    fn test_flashcard_stats() {
        let cards: Vec<FlashcardActivity> = (0..5)
            .map(|i| FlashcardActivity {
                lecture_title: (if i < 3 { "Physics" } else { "History" }).into(),
                created_at: now() - Duration::days(i * 3),
            })
            .collect();
        let report = build_progress(&[], &[], &cards, now());
        assert_eq!(report.flashcard_stats.created, 5);
        assert_eq!(report.flashcard_stats.created_last_7_days, 3);
        assert_eq!(report.flashcard_stats.lecture_breakdown[0].lecture_title, "Physics");
        assert!(report
            .insights
            .recommendations
            .contains(&"Consider taking more quizzes to test your knowledge.".to_string()));
    }

    #[test]
    fn test_stats_summary_rounds_and_keeps_five_most_recent() {
        let entries: Vec<Feedback> = vec![5, 4, 4, 3, 5, 2]
            .into_iter()
            .enumerate()
            .map(|(i, r)| feedback(r, i as i64))
            .collect();
        let summary = stats_summary(2, 7, &entries);
        assert_eq!(summary.average_rating, 3.8);
        assert_eq!(summary.recent_feedback.len(), 5);
        assert_eq!(summary.recent_feedback[0].rating, 5);
        assert_eq!(average_rating(&[]), 0.0);
    }
}
