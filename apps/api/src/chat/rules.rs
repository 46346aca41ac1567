//! Keyword rule table used when the completion API is unavailable.
//!
//! Rules are checked in order; the first rule with a keyword contained in the
//! lower-cased message wins. No match yields the general-help reply.

use crate::models::opportunity::OpportunityType;

pub const GENERAL_INTENT: &str = "general";

const MATCHED_CONFIDENCE: f32 = 0.6;
const GENERAL_CONFIDENCE: f32 = 0.2;

const GENERAL_RESPONSE: &str = "I can help you find jobs, grants and scholarships, prepare \
    an application, or check your readiness for an opportunity. Tell me what you are looking for.";

#[derive(Debug)]
pub struct Rule {
    pub intent: &'static str,
    pub keywords: &'static [&'static str],
    pub response: &'static str,
    /// Opportunity type whose listings this rule should surface first.
    pub opportunity_type: Option<OpportunityType>,
}

pub const RULES: &[Rule] = &[
    Rule {
        intent: "education",
        keywords: &["scholarship", "education", "study", "university", "college", "degree", "tuition"],
        response: "Looking to study? Here are scholarships that might fit. Open one to check its \
            eligibility and deadline.",
        opportunity_type: Some(OpportunityType::Scholarship),
    },
    Rule {
        intent: "job",
        keywords: &["job", "career", "employment", "hiring", "position", "internship", "work"],
        response: "Here are some openings that match what you described. You can apply directly \
            or take a readiness assessment first.",
        opportunity_type: Some(OpportunityType::Job),
    },
    Rule {
        intent: "funding",
        keywords: &["funding", "grant", "finance", "money", "startup", "capital"],
        response: "These grants may help fund your project. Read each provider's eligibility \
            criteria before applying.",
        opportunity_type: Some(OpportunityType::Grant),
    },
    Rule {
        intent: "readiness",
        keywords: &["readiness", "assessment", "mock interview", "prepare", "practice"],
        response: "The readiness assessment scores your eligibility, a mock application and a \
            mock interview. A final score of 70 or more means you are ready to apply.",
        opportunity_type: None,
    },
    Rule {
        intent: "application_help",
        keywords: &["apply", "application", "resume", "cover letter", "deadline"],
        response: "Open an opportunity and press Apply. Answer every required question; you can \
            track the status of your applications from your dashboard.",
        opportunity_type: None,
    },
    Rule {
        intent: "greeting",
        keywords: &["hello", "good morning", "good afternoon", "good evening", "hey there"],
        response: "Hello! What kind of opportunity are you looking for today?",
        opportunity_type: None,
    },
];

/// What the rule table says about a message.
#[derive(Debug, Clone)]
pub struct RuleReply {
    pub intent: &'static str,
    pub response: &'static str,
    pub confidence: f32,
    pub opportunity_type: Option<OpportunityType>,
    /// Keywords of the matched rule, used for suggestion ranking.
    pub keywords: &'static [&'static str],
}

pub fn match_rule(message: &str) -> Option<&'static Rule> {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
}

pub fn respond(message: &str) -> RuleReply {
    match match_rule(message) {
        Some(rule) => RuleReply {
            intent: rule.intent,
            response: rule.response,
            confidence: MATCHED_CONFIDENCE,
            opportunity_type: rule.opportunity_type,
            keywords: rule.keywords,
        },
        None => RuleReply {
            intent: GENERAL_INTENT,
            response: GENERAL_RESPONSE,
            confidence: GENERAL_CONFIDENCE,
            opportunity_type: None,
            keywords: &[],
        },
    }
}

/// Every intent the classifier may return.
pub fn known_intents() -> impl Iterator<Item = &'static str> {
    RULES
        .iter()
        .map(|r| r.intent)
        .chain(std::iter::once(GENERAL_INTENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_substring_match() {
        let reply = respond("Any SCHOLARSHIPS for nursing?");
        assert_eq!(reply.intent, "education");
        assert_eq!(reply.opportunity_type, Some(OpportunityType::Scholarship));
    }

    #[test]
    fn test_first_rule_wins() {
        // "study" (education) and "job" both match; education comes first.
        let reply = respond("I want a job where I can study part time");
        assert_eq!(reply.intent, "education");
    }

    #[test]
    fn test_funding_rule() {
        let reply = respond("where can I find a grant for my startup");
        assert_eq!(reply.intent, "funding");
        assert_eq!(reply.opportunity_type, Some(OpportunityType::Grant));
    }

    #[test]
    fn test_no_match_is_general_help() {
        let reply = respond("what is the weather");
        assert_eq!(reply.intent, GENERAL_INTENT);
        assert_eq!(reply.response, GENERAL_RESPONSE);
        assert!(reply.keywords.is_empty());
        assert!(reply.confidence < MATCHED_CONFIDENCE);
    }

    #[test]
    fn test_intents_unique() {
        let intents: Vec<_> = known_intents().collect();
        let mut deduped = intents.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(intents.len(), deduped.len());
        assert!(intents.contains(&GENERAL_INTENT));
    }

    #[test]
    fn test_every_rule_matches_its_own_keywords() {
        for rule in RULES {
            for keyword in rule.keywords {
                let matched = match_rule(keyword).map(|r| r.intent);
                assert!(matched.is_some(), "keyword {keyword} matched nothing");
            }
        }
    }
}
