//! Opportunity suggestions for a chat message: plain keyword hit counting over
//! title, description and tags.

use serde::Serialize;
use uuid::Uuid;

use crate::models::opportunity::{Opportunity, OpportunityType};

pub const MAX_SUGGESTIONS: usize = 3;
const MIN_TERM_LEN: usize = 4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: Uuid,
    pub title: String,
    pub provider: String,
    #[serde(rename = "type")]
    pub opportunity_type: OpportunityType,
    pub score: usize,
}

/// Search terms: the matched rule's keywords plus the longer words of the message.
pub fn search_terms(message: &str, rule_keywords: &[&str]) -> Vec<String> {
    let mut terms: Vec<String> = rule_keywords.iter().map(|k| k.to_lowercase()).collect();
    for word in message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
    {
        let word = word.to_lowercase();
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

fn hits(opportunity: &Opportunity, terms: &[String]) -> usize {
    let haystack = format!(
        "{} {} {}",
        opportunity.title,
        opportunity.description,
        opportunity.tags.join(" ")
    )
    .to_lowercase();
    terms.iter().filter(|t| haystack.contains(t.as_str())).count()
}

/// Ranks by hit count, keeping the input order on ties, and returns at most
/// `MAX_SUGGESTIONS` entries with a non-zero score. Listings of the `preferred`
/// type get one extra point once they have at least one hit.
pub fn rank(
    opportunities: &[Opportunity],
    terms: &[String],
    preferred: Option<OpportunityType>,
) -> Vec<Suggestion> {
    let mut scored: Vec<(usize, &Opportunity)> = opportunities
        .iter()
        .map(|o| (hits(o, terms), o))
        .filter(|(score, _)| *score > 0)
        .map(|(score, o)| {
            let boost = usize::from(preferred == Some(o.opportunity_type));
            (score + boost, o)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(score, o)| Suggestion {
            id: o.id,
            title: o.title.clone(),
            provider: o.provider.clone(),
            opportunity_type: o.opportunity_type,
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;
    use crate::models::user::Role;

    fn opportunity(title: &str, description: &str, tags: &[&str]) -> Opportunity {
        typed(OpportunityType::Job, title, description, tags)
    }

    fn typed(kind: OpportunityType, title: &str, description: &str, tags: &[&str]) -> Opportunity {
        Opportunity {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            provider: "Provider".to_string(),
            creator_type: Role::Organization,
            opportunity_type: kind,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            deadline: None,
            location: None,
            eligibility: None,
            funding: None,
            url: None,
            custom_fields: Json(Vec::new()),
            user_id: "owner".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_search_terms_skip_short_words() {
        let terms = search_terms("Any nursing job in Lagos?", &["job"]);
        assert_eq!(terms, vec!["job", "nursing", "lagos"]);
    }

    #[test]
    fn test_rank_orders_by_hits_and_drops_zero() {
        let list = vec![
            opportunity("Baker", "Bread shift", &[]),
            opportunity("Nurse", "Hospital shift", &["health"]),
            opportunity("Nursing job", "Nursing role at a clinic", &["health", "job"]),
        ];
        let terms = vec!["nurs".to_string(), "job".to_string(), "health".to_string()];
        let ranked = rank(&list, &terms, None);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].title, "Nursing job");
        assert_eq!(ranked[0].score, 3);
        assert_eq!(ranked[1].title, "Nurse");
    }

    #[test]
    fn test_rank_caps_at_three_and_keeps_order_on_ties() {
        let list: Vec<_> = (0..5)
            .map(|i| opportunity(&format!("Design role {i}"), "design", &[]))
            .collect();
        let ranked = rank(&list, &["design".to_string()], None);
        assert_eq!(ranked.len(), MAX_SUGGESTIONS);
        assert_eq!(ranked[0].title, "Design role 0");
        assert_eq!(ranked[2].title, "Design role 2");
    }

    #[test]
    fn test_rank_no_terms_no_suggestions() {
        let list = vec![opportunity("Baker", "Bread", &[])];
        assert!(rank(&list, &[], Some(OpportunityType::Job)).is_empty());
    }

    #[test]
    fn test_preferred_type_breaks_ties() {
        let list = vec![
            typed(OpportunityType::Job, "Nursing assistant", "Clinic shifts", &[]),
            typed(OpportunityType::Scholarship, "Nursing scholarship", "Tuition support", &[]),
            typed(OpportunityType::Grant, "Bakery grant", "Ovens", &[]),
        ];
        let terms = vec!["nursing".to_string()];

        let plain = rank(&list, &terms, None);
        assert_eq!(plain[0].title, "Nursing assistant");

        let preferred = rank(&list, &terms, Some(OpportunityType::Scholarship));
        assert_eq!(preferred.len(), 2);
        assert_eq!(preferred[0].title, "Nursing scholarship");
        assert_eq!(preferred[0].score, 2);
        // The grant has no hits, so the type alone does not surface it.
        assert!(preferred.iter().all(|s| s.title != "Bakery grant"));
    }
}
