use serde::Deserialize;

use crate::errors::AppError;
use crate::models::opportunity::{CustomField, Opportunity, OpportunityType};
use crate::models::user::{Role, User};
use crate::opportunities::fields::{is_http_url, validate_field_definitions};

/// Request body for create (required fields enforced) and update (partial).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "type")]
    pub opportunity_type: Option<OpportunityType>,
    pub creator_type: Option<Role>,
    pub tags: Option<Vec<String>>,
    pub deadline: Option<String>,
    pub location: Option<String>,
    pub eligibility: Option<String>,
    pub funding: Option<String>,
    pub url: Option<String>,
    pub custom_fields: Option<Vec<CustomField>>,
    /// Accepted only so that a changed owner can be rejected explicitly.
    pub user_id: Option<String>,
}

/// A fully validated set of opportunity columns, ready to write.
#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityFields {
    pub title: String,
    pub description: String,
    pub provider: String,
    pub opportunity_type: OpportunityType,
    pub creator_type: Role,
    pub tags: Vec<String>,
    pub deadline: Option<String>,
    pub location: Option<String>,
    pub eligibility: Option<String>,
    pub funding: Option<String>,
    pub url: Option<String>,
    pub custom_fields: Vec<CustomField>,
}

/// Only the owner may mutate a record.
pub fn ensure_owner(owner_id: &str, caller_id: &str) -> Result<(), AppError> {
    if owner_id == caller_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the owner can modify this opportunity".to_string(),
        ))
    }
}

/// Organization listings require a verified KYC.
pub fn ensure_may_publish_as(user: &User, creator_type: Role) -> Result<(), AppError> {
    if creator_type == Role::Organization && !user.kyc_verified {
        return Err(AppError::Forbidden(
            "KYC verification is required to post as an organization".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_new(input: OpportunityInput, creator: &User) -> Result<OpportunityFields, AppError> {
    let fields = OpportunityFields {
        title: required(input.title, "title")?,
        description: required(input.description, "description")?,
        provider: required(input.provider, "provider")?,
        opportunity_type: input
            .opportunity_type
            .ok_or_else(|| AppError::Validation("type is required".to_string()))?,
        creator_type: input.creator_type.unwrap_or(creator.active_role),
        tags: normalize_tags(input.tags.unwrap_or_default()),
        deadline: optional(input.deadline),
        location: optional(input.location),
        eligibility: optional(input.eligibility),
        funding: optional(input.funding),
        url: optional(input.url),
        custom_fields: input.custom_fields.unwrap_or_default(),
    };
    check(&fields)?;
    ensure_may_publish_as(creator, fields.creator_type)?;
    Ok(fields)
}

/// Merges a partial update onto the stored record. Absent keys keep their value;
/// an empty string clears an optional field.
pub fn apply_update(
    existing: &Opportunity,
    input: OpportunityInput,
    caller: &User,
) -> Result<OpportunityFields, AppError> {
    if input
        .user_id
        .as_deref()
        .is_some_and(|uid| uid != existing.user_id)
    {
        return Err(AppError::Validation("userId cannot be changed".to_string()));
    }

    let fields = OpportunityFields {
        title: replace_required(input.title, &existing.title, "title")?,
        description: replace_required(input.description, &existing.description, "description")?,
        provider: replace_required(input.provider, &existing.provider, "provider")?,
        opportunity_type: input.opportunity_type.unwrap_or(existing.opportunity_type),
        creator_type: input.creator_type.unwrap_or(existing.creator_type),
        tags: input
            .tags
            .map(normalize_tags)
            .unwrap_or_else(|| existing.tags.clone()),
        deadline: replace_optional(input.deadline, &existing.deadline),
        location: replace_optional(input.location, &existing.location),
        eligibility: replace_optional(input.eligibility, &existing.eligibility),
        funding: replace_optional(input.funding, &existing.funding),
        url: replace_optional(input.url, &existing.url),
        custom_fields: input
            .custom_fields
            .unwrap_or_else(|| existing.custom_fields.0.clone()),
    };
    check(&fields)?;
    if fields.creator_type != existing.creator_type {
        ensure_may_publish_as(caller, fields.creator_type)?;
    }
    Ok(fields)
}

fn check(fields: &OpportunityFields) -> Result<(), AppError> {
    if let Some(url) = &fields.url {
        if !is_http_url(url) {
            return Err(AppError::Validation(
                "url must start with http:// or https://".to_string(),
            ));
        }
    }
    validate_field_definitions(&fields.custom_fields)
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    optional(value).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn replace_required(value: Option<String>, current: &str, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) => required(Some(v), name),
        None => Ok(current.to_string()),
    }
}

fn replace_optional(value: Option<String>, current: &Option<String>) -> Option<String> {
    match value {
        Some(v) => optional(Some(v)),
        None => current.clone(),
    }
}

/// Trims tags, drops blanks and removes case-insensitive duplicates, keeping order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    use super::*;

    fn user(id: &str, kyc_verified: bool, active_role: Role) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            role: active_role,
            active_role,
            kyc_verified,
            kyc_submitted: kyc_verified,
            organization_name: None,
            organization_type: None,
            created_at: Utc::now(),
        }
    }

    fn input() -> OpportunityInput {
        OpportunityInput {
            title: Some("Graduate Research Grant".into()),
            description: Some("Funding for early-career researchers".into()),
            provider: Some("Astra Foundation".into()),
            opportunity_type: Some(OpportunityType::Grant),
            ..Default::default()
        }
    }

    fn stored(owner: &str) -> Opportunity {
        Opportunity {
            id: Uuid::new_v4(),
            title: "Junior Developer".into(),
            description: "Build things".into(),
            provider: "Acme".into(),
            creator_type: Role::Individual,
            opportunity_type: OpportunityType::Job,
            tags: vec!["rust".into()],
            deadline: Some("2026-12-01".into()),
            location: None,
            eligibility: None,
            funding: None,
            url: None,
            custom_fields: Json(vec![]),
            user_id: owner.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_check() {
        assert!(ensure_owner("alice", "alice").is_ok());
        assert!(matches!(
            ensure_owner("alice", "mallory"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_missing_title_is_validation_error() {
        let mut req = input();
        req.title = Some("   ".into());
        let err = validate_new(req, &user("u1", false, Role::Individual)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_creator_type_defaults_to_active_role() {
        let fields = validate_new(input(), &user("u1", false, Role::Individual)).unwrap();
        assert_eq!(fields.creator_type, Role::Individual);
    }

    #[test]
    fn test_organization_listing_requires_kyc() {
        let unverified = user("org", false, Role::Organization);
        assert!(matches!(
            validate_new(input(), &unverified),
            Err(AppError::Forbidden(_))
        ));

        let verified = user("org", true, Role::Organization);
        let fields = validate_new(input(), &verified).unwrap();
        assert_eq!(fields.creator_type, Role::Organization);
    }

    #[test]
    fn test_update_keeps_absent_fields_and_clears_empty() {
        let existing = stored("alice");
        let update = OpportunityInput {
            title: Some("Senior Developer".into()),
            deadline: Some("".into()),
            ..Default::default()
        };
        let fields = apply_update(&existing, update, &user("alice", false, Role::Individual))
            .unwrap();
        assert_eq!(fields.title, "Senior Developer");
        assert_eq!(fields.provider, "Acme");
        assert_eq!(fields.tags, vec!["rust".to_string()]);
        assert_eq!(fields.deadline, None);
    }

    #[test]
    fn test_update_rejects_owner_change() {
        let existing = stored("alice");
        let update = OpportunityInput {
            user_id: Some("mallory".into()),
            ..Default::default()
        };
        assert!(matches!(
            apply_update(&existing, update, &user("alice", false, Role::Individual)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(vec![
            " Rust ".into(),
            "rust".into(),
            "".into(),
            "Remote".into(),
        ]);
        assert_eq!(tags, vec!["Rust".to_string(), "Remote".to_string()]);
    }
}
