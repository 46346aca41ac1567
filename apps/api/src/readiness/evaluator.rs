//! Readiness evaluation: a pluggable, trait-based scorer for each assessment stage.
//!
//! `LlmEvaluator` asks the completion API. `ResilientEvaluator` wraps any backend and
//! never fails: an evaluation error degrades to a default score in 75..=85 with canned
//! feedback, so a provider outage cannot block an applicant's workflow.
//!
//! `AppState` holds a `ResilientEvaluator` over an `Arc<dyn ReadinessEvaluator>`.

use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM, SCORE_SCALE_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::opportunity::{Opportunity, OpportunityType};
use crate::readiness::prompts::{
    ELIGIBILITY_PROMPT, INTERVIEW_QUESTIONS_PROMPT, MOCK_APPLICATION_PROMPT,
    MOCK_INTERVIEW_PROMPT, TRAINING_PROMPT,
};

pub const FALLBACK_SCORE_RANGE: RangeInclusive<i32> = 75..=85;
pub const INTERVIEW_QUESTION_COUNT: usize = 3;
const MAX_RECOMMENDATIONS: usize = 5;

pub const DEFAULT_INTERVIEW_QUESTIONS: [&str; INTERVIEW_QUESTION_COUNT] = [
    "Tell us about yourself and why this opportunity interests you.",
    "Describe a challenge you faced and how you overcame it.",
    "Where do you see yourself in five years, and how does this opportunity help you get there?",
];

const DEFAULT_TRAINING: [&str; 3] = [
    "Practice answering common interview questions with the STAR method",
    "Tailor your personal statement to the opportunity's stated requirements",
    "Gather concrete examples and numbers that show the impact of your experience",
];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A stage score (0–100) with feedback for the applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: i32,
    pub feedback: String,
}

/// The parts of an opportunity an evaluator needs.
#[derive(Debug, Clone)]
pub struct OpportunityBrief {
    pub title: String,
    pub provider: String,
    pub kind: OpportunityType,
    pub description: String,
    pub eligibility: Option<String>,
}

impl From<&Opportunity> for OpportunityBrief {
    fn from(o: &Opportunity) -> Self {
        Self {
            title: o.title.clone(),
            provider: o.provider.clone(),
            kind: o.opportunity_type,
            description: o.description.clone(),
            eligibility: o.eligibility.clone(),
        }
    }
}

impl OpportunityBrief {
    fn render(&self) -> String {
        let mut out = format!(
            "Title: {}\nProvider: {}\nType: {}\nDescription: {}",
            self.title,
            self.provider,
            self.kind.as_str(),
            self.description
        );
        if let Some(eligibility) = &self.eligibility {
            out.push_str(&format!("\nEligibility: {eligibility}"));
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockApplicationAnswers {
    pub personal_statement: String,
    pub experience: String,
    pub motivation: String,
    pub goals: String,
}

/// One interview question with the applicant's answer.
#[derive(Debug, Clone)]
pub struct InterviewExchange {
    pub question: String,
    pub answer: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ReadinessEvaluator: Send + Sync {
    async fn eligibility(&self, brief: &OpportunityBrief, profile: &str) -> Result<Evaluation, LlmError>;

    async fn mock_application(
        &self,
        brief: &OpportunityBrief,
        answers: &MockApplicationAnswers,
    ) -> Result<Evaluation, LlmError>;

    async fn mock_interview(
        &self,
        brief: &OpportunityBrief,
        exchanges: &[InterviewExchange],
    ) -> Result<Evaluation, LlmError>;

    async fn interview_questions(&self, brief: &OpportunityBrief) -> Result<Vec<String>, LlmError>;

    async fn training(
        &self,
        brief: &OpportunityBrief,
        application: &Evaluation,
        interview: &Evaluation,
    ) -> Result<Vec<String>, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmEvaluator
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmEvaluator(pub LlmClient);

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    score: f64,
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct RawQuestions {
    questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawRecommendations {
    recommendations: Vec<String>,
}

impl LlmEvaluator {
    async fn score(&self, prompt: String) -> Result<Evaluation, LlmError> {
        let raw: RawEvaluation = self.0.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        into_evaluation(raw)
    }
}

fn into_evaluation(raw: RawEvaluation) -> Result<Evaluation, LlmError> {
    if !raw.score.is_finite() {
        return Err(LlmError::Malformed("score is not a number".to_string()));
    }
    let feedback = raw.feedback.trim();
    if feedback.is_empty() {
        return Err(LlmError::Malformed("feedback is empty".to_string()));
    }
    Ok(Evaluation {
        score: raw.score.round().clamp(0.0, 100.0) as i32,
        feedback: feedback.to_string(),
    })
}

fn non_empty(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl ReadinessEvaluator for LlmEvaluator {
    async fn eligibility(&self, brief: &OpportunityBrief, profile: &str) -> Result<Evaluation, LlmError> {
        let prompt = fill_template(
            ELIGIBILITY_PROMPT,
            &[
                ("scale", SCORE_SCALE_INSTRUCTION),
                ("opportunity", &brief.render()),
                ("profile", profile),
            ],
        );
        self.score(prompt).await
    }

    async fn mock_application(
        &self,
        brief: &OpportunityBrief,
        answers: &MockApplicationAnswers,
    ) -> Result<Evaluation, LlmError> {
        let prompt = fill_template(
            MOCK_APPLICATION_PROMPT,
            &[
                ("scale", SCORE_SCALE_INSTRUCTION),
                ("opportunity", &brief.render()),
                ("personal_statement", &answers.personal_statement),
                ("experience", &answers.experience),
                ("motivation", &answers.motivation),
                ("goals", &answers.goals),
            ],
        );
        self.score(prompt).await
    }

    async fn mock_interview(
        &self,
        brief: &OpportunityBrief,
        exchanges: &[InterviewExchange],
    ) -> Result<Evaluation, LlmError> {
        let transcript = exchanges
            .iter()
            .enumerate()
            .map(|(i, e)| format!("Q{}: {}\nA{}: {}", i + 1, e.question, i + 1, e.answer))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = fill_template(
            MOCK_INTERVIEW_PROMPT,
            &[
                ("scale", SCORE_SCALE_INSTRUCTION),
                ("opportunity", &brief.render()),
                ("transcript", &transcript),
            ],
        );
        self.score(prompt).await
    }

    async fn interview_questions(&self, brief: &OpportunityBrief) -> Result<Vec<String>, LlmError> {
        let prompt =
            fill_template(INTERVIEW_QUESTIONS_PROMPT, &[("opportunity", &brief.render())]);
        let raw: RawQuestions = self.0.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        let questions = non_empty(raw.questions);
        if questions.len() != INTERVIEW_QUESTION_COUNT {
            return Err(LlmError::Malformed(format!(
                "expected {INTERVIEW_QUESTION_COUNT} questions, got {}",
                questions.len()
            )));
        }
        Ok(questions)
    }

    async fn training(
        &self,
        brief: &OpportunityBrief,
        application: &Evaluation,
        interview: &Evaluation,
    ) -> Result<Vec<String>, LlmError> {
        let prompt = fill_template(
            TRAINING_PROMPT,
            &[
                ("opportunity", &brief.render()),
                ("application_score", &application.score.to_string()),
                ("application_feedback", &application.feedback),
                ("interview_score", &interview.score.to_string()),
                ("interview_feedback", &interview.feedback),
            ],
        );
        let raw: RawRecommendations = self.0.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        let mut recommendations = non_empty(raw.recommendations);
        if recommendations.is_empty() {
            return Err(LlmError::Malformed("no recommendations".to_string()));
        }
        recommendations.truncate(MAX_RECOMMENDATIONS);
        Ok(recommendations)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ResilientEvaluator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Scored {
    Eligibility,
    MockApplication,
    MockInterview,
}

/// Default evaluation used whenever the backend fails.
fn fallback_evaluation(kind: Scored) -> Evaluation {
    let score = rand::thread_rng().gen_range(FALLBACK_SCORE_RANGE);
    let feedback = match kind {
        Scored::Eligibility => {
            "You appear to meet the core requirements for this opportunity. \
             Review the eligibility criteria carefully before applying."
        }
        Scored::MockApplication => {
            "Your application covers the key areas. Strengthen it with specific, \
             measurable examples that connect your experience to this opportunity."
        }
        Scored::MockInterview => {
            "Your answers show good preparation. Add concrete examples and keep each \
             answer focused on the question asked."
        }
    };
    Evaluation {
        score,
        feedback: feedback.to_string(),
    }
}

/// Infallible facade over a `ReadinessEvaluator`.
#[derive(Clone)]
pub struct ResilientEvaluator {
    inner: Arc<dyn ReadinessEvaluator>,
    /// Upper bound on each backend call; past it the fallback is used.
    deadline: Duration,
}

impl ResilientEvaluator {
    pub fn new(inner: Arc<dyn ReadinessEvaluator>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, LlmError>>,
    ) -> Result<T, LlmError> {
        tokio::time::timeout(self.deadline, call)
            .await
            .unwrap_or(Err(LlmError::DeadlineExceeded(self.deadline)))
    }

    pub async fn eligibility(&self, brief: &OpportunityBrief, profile: &str) -> Evaluation {
        self.bounded(self.inner.eligibility(brief, profile))
            .await
            .unwrap_or_else(|e| {
                warn!("Eligibility evaluation failed, using default score: {e}");
                fallback_evaluation(Scored::Eligibility)
            })
    }

    pub async fn mock_application(
        &self,
        brief: &OpportunityBrief,
        answers: &MockApplicationAnswers,
    ) -> Evaluation {
        self.bounded(self.inner.mock_application(brief, answers))
            .await
            .unwrap_or_else(|e| {
                warn!("Mock application evaluation failed, using default score: {e}");
                fallback_evaluation(Scored::MockApplication)
            })
    }

    pub async fn mock_interview(
        &self,
        brief: &OpportunityBrief,
        exchanges: &[InterviewExchange],
    ) -> Evaluation {
        self.bounded(self.inner.mock_interview(brief, exchanges))
            .await
            .unwrap_or_else(|e| {
                warn!("Mock interview evaluation failed, using default score: {e}");
                fallback_evaluation(Scored::MockInterview)
            })
    }

    pub async fn interview_questions(&self, brief: &OpportunityBrief) -> Vec<String> {
        self.bounded(self.inner.interview_questions(brief))
            .await
            .unwrap_or_else(|e| {
                warn!("Interview question generation failed, using defaults: {e}");
                DEFAULT_INTERVIEW_QUESTIONS.iter().map(|q| q.to_string()).collect()
            })
    }

    pub async fn training(
        &self,
        brief: &OpportunityBrief,
        application: &Evaluation,
        interview: &Evaluation,
    ) -> Vec<String> {
        self.bounded(self.inner.training(brief, application, interview))
            .await
            .unwrap_or_else(|e| {
                warn!("Training recommendation failed, using defaults: {e}");
                DEFAULT_TRAINING.iter().map(|t| t.to_string()).collect()
            })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::assessment::{AssessmentStatus, ReadinessAssessment};
    use crate::readiness::stage::{
        current_stage, record_eligibility, record_mock_application, record_mock_interview, Stage,
        PASSING_SCORE,
    };

    const DEADLINE: Duration = Duration::from_secs(5);

    /// Backend that fails every call, as during a provider outage.
    struct Outage;

    #[async_trait]
    impl ReadinessEvaluator for Outage {
        async fn eligibility(&self, _: &OpportunityBrief, _: &str) -> Result<Evaluation, LlmError> {
            Err(LlmError::RateLimited { retries: 3 })
        }
        async fn mock_application(
            &self,
            _: &OpportunityBrief,
            _: &MockApplicationAnswers,
        ) -> Result<Evaluation, LlmError> {
            Err(LlmError::EmptyContent)
        }
        async fn mock_interview(
            &self,
            _: &OpportunityBrief,
            _: &[InterviewExchange],
        ) -> Result<Evaluation, LlmError> {
            Err(LlmError::Api {
                status: 504,
                message: "upstream timeout".into(),
            })
        }
        async fn interview_questions(&self, _: &OpportunityBrief) -> Result<Vec<String>, LlmError> {
            Err(LlmError::NotConfigured)
        }
        async fn training(
            &self,
            _: &OpportunityBrief,
            _: &Evaluation,
            _: &Evaluation,
        ) -> Result<Vec<String>, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    /// Backend returning fixed scores.
    struct Fixed(i32);

    #[async_trait]
    impl ReadinessEvaluator for Fixed {
        async fn eligibility(&self, _: &OpportunityBrief, _: &str) -> Result<Evaluation, LlmError> {
            Ok(Evaluation { score: self.0, feedback: "eligible".into() })
        }
        async fn mock_application(
            &self,
            _: &OpportunityBrief,
            _: &MockApplicationAnswers,
        ) -> Result<Evaluation, LlmError> {
            Ok(Evaluation { score: self.0, feedback: "application".into() })
        }
        async fn mock_interview(
            &self,
            _: &OpportunityBrief,
            _: &[InterviewExchange],
        ) -> Result<Evaluation, LlmError> {
            Ok(Evaluation { score: self.0, feedback: "interview".into() })
        }
        async fn interview_questions(&self, _: &OpportunityBrief) -> Result<Vec<String>, LlmError> {
            Ok(vec!["Q1".into(), "Q2".into(), "Q3".into()])
        }
        async fn training(
            &self,
            _: &OpportunityBrief,
            _: &Evaluation,
            _: &Evaluation,
        ) -> Result<Vec<String>, LlmError> {
            Ok(vec!["Mock interviews".into()])
        }
    }

    /// Backend that never answers.
    struct Stall;

    #[async_trait]
    impl ReadinessEvaluator for Stall {
        async fn eligibility(&self, _: &OpportunityBrief, _: &str) -> Result<Evaluation, LlmError> {
            std::future::pending().await
        }
        async fn mock_application(
            &self,
            _: &OpportunityBrief,
            _: &MockApplicationAnswers,
        ) -> Result<Evaluation, LlmError> {
            std::future::pending().await
        }
        async fn mock_interview(
            &self,
            _: &OpportunityBrief,
            _: &[InterviewExchange],
        ) -> Result<Evaluation, LlmError> {
            std::future::pending().await
        }
        async fn interview_questions(&self, _: &OpportunityBrief) -> Result<Vec<String>, LlmError> {
            std::future::pending().await
        }
        async fn training(
            &self,
            _: &OpportunityBrief,
            _: &Evaluation,
            _: &Evaluation,
        ) -> Result<Vec<String>, LlmError> {
            std::future::pending().await
        }
    }

    fn brief() -> OpportunityBrief {
        OpportunityBrief {
            title: "Community Health Fellowship".into(),
            provider: "Astra Foundation".into(),
            kind: OpportunityType::Scholarship,
            description: "One-year funded fellowship".into(),
            eligibility: Some("Undergraduates in health sciences".into()),
        }
    }

    fn answers() -> MockApplicationAnswers {
        MockApplicationAnswers {
            personal_statement: "I care about public health".into(),
            experience: "Volunteer at a clinic".into(),
            motivation: "Reduce health inequity".into(),
            goals: "Become an epidemiologist".into(),
        }
    }

    #[tokio::test]
    async fn test_outage_degrades_to_default_scores() {
        let evaluator = ResilientEvaluator::new(Arc::new(Outage), DEADLINE);
        for _ in 0..20 {
            let e = evaluator.mock_interview(&brief(), &[]).await;
            assert!(FALLBACK_SCORE_RANGE.contains(&e.score), "score {}", e.score);
            assert!(!e.feedback.is_empty());
        }
        let e = evaluator.eligibility(&brief(), "").await;
        assert!(FALLBACK_SCORE_RANGE.contains(&e.score));
        let e = evaluator.mock_application(&brief(), &answers()).await;
        assert!(FALLBACK_SCORE_RANGE.contains(&e.score));
    }

    #[tokio::test]
    async fn test_outage_defaults_for_questions_and_training() {
        let evaluator = ResilientEvaluator::new(Arc::new(Outage), DEADLINE);
        let questions = evaluator.interview_questions(&brief()).await;
        assert_eq!(questions.len(), INTERVIEW_QUESTION_COUNT);
        let a = Evaluation { score: 60, feedback: "ok".into() };
        let training = evaluator.training(&brief(), &a, &a).await;
        assert!(!training.is_empty());
    }

    #[tokio::test]
    async fn test_healthy_backend_passes_through() {
        let evaluator = ResilientEvaluator::new(Arc::new(Fixed(42)), DEADLINE);
        let e = evaluator.mock_application(&brief(), &answers()).await;
        assert_eq!(e, Evaluation { score: 42, feedback: "application".into() });
    }

    #[test]
    fn test_raw_score_clamped_and_rounded() {
        let e = into_evaluation(RawEvaluation { score: 112.4, feedback: " Great ".into() }).unwrap();
        assert_eq!(e, Evaluation { score: 100, feedback: "Great".into() });
        let e = into_evaluation(RawEvaluation { score: 79.6, feedback: "ok".into() }).unwrap();
        assert_eq!(e.score, 80);
    }

    #[test]
    fn test_raw_blank_feedback_rejected() {
        assert!(matches!(
            into_evaluation(RawEvaluation { score: 80.0, feedback: "  ".into() }),
            Err(LlmError::Malformed(_))
        ));
    }

    #[test]
    fn test_brief_render_includes_eligibility() {
        let text = brief().render();
        assert!(text.contains("Type: scholarship"));
        assert!(text.contains("Eligibility: Undergraduates in health sciences"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_backend_falls_back_at_deadline() {
        let evaluator = ResilientEvaluator::new(Arc::new(Stall), DEADLINE);
        let started = tokio::time::Instant::now();

        let interview = evaluator.mock_interview(&brief(), &[]).await;
        assert!(FALLBACK_SCORE_RANGE.contains(&interview.score));
        let elapsed = started.elapsed();
        assert!(elapsed >= DEADLINE && elapsed < DEADLINE * 2, "took {elapsed:?}");

        // Evaluation plus training, as one mock interview submission makes.
        let training = evaluator.training(&brief(), &interview, &interview).await;
        assert_eq!(training.len(), DEFAULT_TRAINING.len());
        assert!(started.elapsed() < DEADLINE * 3);
    }

    #[tokio::test]
    async fn test_outage_still_completes_assessment() {
        let evaluator = ResilientEvaluator::new(Arc::new(Outage), DEADLINE);
        let mut assessment = ReadinessAssessment::fresh("applicant-a", Uuid::new_v4());

        let eligibility = evaluator.eligibility(&brief(), "nursing student").await;
        record_eligibility(&mut assessment, eligibility).unwrap();
        let application = evaluator.mock_application(&brief(), &answers()).await;
        record_mock_application(&mut assessment, application).unwrap();

        let exchanges: Vec<InterviewExchange> = DEFAULT_INTERVIEW_QUESTIONS
            .iter()
            .map(|q| InterviewExchange {
                question: q.to_string(),
                answer: "A considered answer".into(),
            })
            .collect();
        let interview = evaluator.mock_interview(&brief(), &exchanges).await;
        let application = Evaluation {
            score: assessment.mock_application_score.unwrap(),
            feedback: assessment.mock_application_feedback.clone().unwrap(),
        };
        let training = evaluator.training(&brief(), &application, &interview).await;
        record_mock_interview(&mut assessment, interview, training).unwrap();

        let interview_score = assessment.mock_interview_score.unwrap();
        assert!(FALLBACK_SCORE_RANGE.contains(&interview_score));
        let final_score = assessment.final_readiness_score.unwrap();
        let expected_status = if final_score >= PASSING_SCORE {
            AssessmentStatus::Completed
        } else {
            AssessmentStatus::Failed
        };
        assert_eq!(assessment.status, expected_status);
        assert_eq!(current_stage(&assessment), Stage::Results);
        assert!(!assessment.recommended_training.is_empty());
    }
}
