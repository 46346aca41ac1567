// Prompt templates for readiness evaluation. Placeholders are `{name}` and are
// filled by `readiness::evaluator`.

pub const ELIGIBILITY_PROMPT: &str = r#"You are screening an applicant for the opportunity below.

OPPORTUNITY
{opportunity}

APPLICANT BACKGROUND
{profile}

Judge how well the applicant meets the stated eligibility requirements. If the background
is empty, score on how accessible the opportunity is to a typical applicant.
{scale}

Return JSON: {"score": <integer 0-100>, "feedback": "<string>"}"#;

pub const MOCK_APPLICATION_PROMPT: &str = r#"You are reviewing a practice application for the opportunity below.

OPPORTUNITY
{opportunity}

PERSONAL STATEMENT
{personal_statement}

RELEVANT EXPERIENCE
{experience}

MOTIVATION
{motivation}

GOALS
{goals}

Assess clarity, relevance to the opportunity and evidence of fit.
{scale}

Return JSON: {"score": <integer 0-100>, "feedback": "<string>"}"#;

pub const MOCK_INTERVIEW_PROMPT: &str = r#"You are an interviewer evaluating practice interview answers for the opportunity below.

OPPORTUNITY
{opportunity}

QUESTIONS AND ANSWERS
{transcript}

Assess specificity, structure and how convincingly each answer addresses its question.
{scale}

Return JSON: {"score": <integer 0-100>, "feedback": "<string>"}"#;

pub const INTERVIEW_QUESTIONS_PROMPT: &str = r#"Write exactly 3 interview questions an interviewer would ask an applicant for this opportunity.

OPPORTUNITY
{opportunity}

Return JSON: {"questions": ["<string>", "<string>", "<string>"]}"#;

pub const TRAINING_PROMPT: &str = r#"An applicant completed a readiness assessment for the opportunity below.

OPPORTUNITY
{opportunity}

MOCK APPLICATION: {application_score}/100. {application_feedback}
MOCK INTERVIEW: {interview_score}/100. {interview_feedback}

Recommend 3 to 5 short, concrete training activities that address the weakest areas.

Return JSON: {"recommendations": ["<string>", ...]}"#;
