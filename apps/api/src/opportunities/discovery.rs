//! Opportunity listing. Filters run in SQL; randomised discovery fetches every
//! match and shuffles in memory, then applies the limit.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::models::opportunity::{Opportunity, OpportunityType};
use crate::models::user::Role;

/// Largest accepted `limit`.
const MAX_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub opportunity_type: Option<OpportunityType>,
    pub tag: Option<String>,
    pub user_id: Option<String>,
    pub creator_type: Option<Role>,
    #[serde(default)]
    pub random: bool,
    pub limit: Option<usize>,
}

/// Orders rows (already newest-first from the store) for the response.
pub fn arrange<R: Rng + ?Sized>(
    mut rows: Vec<Opportunity>,
    query: &ListQuery,
    rng: &mut R,
) -> Vec<Opportunity> {
    if query.random {
        rows.shuffle(rng);
    }
    // No limit means every match; an explicit one is capped.
    if let Some(limit) = query.limit {
        rows.truncate(limit.min(MAX_LIMIT));
    }
    rows
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sqlx::types::Json;
    use uuid::Uuid;

    use super::*;

    fn rows(n: usize) -> Vec<Opportunity> {
        (0..n)
            .map(|i| Opportunity {
                id: Uuid::new_v4(),
                title: format!("Opportunity {i}"),
                description: String::new(),
                provider: "Astra".into(),
                creator_type: Role::Individual,
                opportunity_type: OpportunityType::Job,
                tags: vec![],
                deadline: None,
                location: None,
                eligibility: None,
                funding: None,
                url: None,
                custom_fields: Json(vec![]),
                user_id: "owner".into(),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_default_keeps_store_order() {
        let input = rows(5);
        let ids: Vec<_> = input.iter().map(|o| o.id).collect();
        let out = arrange(input, &ListQuery::default(), &mut StdRng::seed_from_u64(7));
        assert_eq!(out.iter().map(|o| o.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_random_is_a_permutation_then_limited() {
        let input = rows(20);
        let mut ids: Vec<_> = input.iter().map(|o| o.id).collect();
        let query = ListQuery {
            random: true,
            ..Default::default()
        };
        let out = arrange(input, &query, &mut StdRng::seed_from_u64(42));
        let mut out_ids: Vec<_> = out.iter().map(|o| o.id).collect();
        ids.sort();
        out_ids.sort();
        assert_eq!(ids, out_ids);

        let limited = ListQuery {
            random: true,
            limit: Some(3),
            ..Default::default()
        };
        assert_eq!(arrange(rows(20), &limited, &mut StdRng::seed_from_u64(1)).len(), 3);
    }

    #[test]
    fn test_limit_is_capped() {
        let query = ListQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(
            arrange(rows(150), &query, &mut StdRng::seed_from_u64(3)).len(),
            MAX_LIMIT
        );
    }

    #[test]
    fn test_no_limit_returns_every_match() {
        let out = arrange(rows(150), &ListQuery::default(), &mut StdRng::seed_from_u64(5));
        assert_eq!(out.len(), 150);

        let random = ListQuery {
            random: true,
            ..Default::default()
        };
        assert_eq!(arrange(rows(150), &random, &mut StdRng::seed_from_u64(5)).len(), 150);
    }
}
