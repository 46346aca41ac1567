use serde::Deserialize;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationStatus};

/// Who is touching an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Applicant,
    /// Owner of the opportunity the application targets.
    Reviewer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUpdate {
    pub status: Option<ApplicationStatus>,
    pub current_stage: Option<String>,
    pub feedback: Option<String>,
    pub is_qualified: Option<bool>,
    pub in_interview_queue: Option<bool>,
    pub notes: Option<String>,
}

impl ApplicationUpdate {
    fn touches_review_fields(&self) -> bool {
        self.status.is_some()
            || self.current_stage.is_some()
            || self.feedback.is_some()
            || self.is_qualified.is_some()
            || self.in_interview_queue.is_some()
    }

    fn is_empty(&self) -> bool {
        !self.touches_review_fields() && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueChange {
    Enter,
    Leave,
    Keep,
}

pub fn ensure_not_own_opportunity(owner_id: &str, applicant_id: &str) -> Result<(), AppError> {
    if owner_id == applicant_id {
        return Err(AppError::Forbidden(
            "You cannot apply to your own opportunity".to_string(),
        ));
    }
    Ok(())
}

/// Resolves the caller's relationship to an application; strangers get 403.
pub fn party_for(application: &Application, owner_id: &str, caller_id: &str) -> Result<Party, AppError> {
    if application.applicant_id == caller_id {
        Ok(Party::Applicant)
    } else if owner_id == caller_id {
        Ok(Party::Reviewer)
    } else {
        Err(AppError::Forbidden(
            "You do not have access to this application".to_string(),
        ))
    }
}

/// Reviewers set review fields; applicants may only edit their notes.
pub fn authorize_update(party: Party, update: &ApplicationUpdate) -> Result<(), AppError> {
    if update.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }
    match party {
        Party::Reviewer if update.notes.is_some() => Err(AppError::Forbidden(
            "Notes belong to the applicant".to_string(),
        )),
        Party::Applicant if update.touches_review_fields() => Err(AppError::Forbidden(
            "Only the opportunity owner can review applications".to_string(),
        )),
        _ => Ok(()),
    }
}

/// `currently_queued` must come from the row as locked by the writing transaction.
pub fn queue_change(currently_queued: bool, requested: Option<bool>) -> QueueChange {
    match (currently_queued, requested) {
        (false, Some(true)) => QueueChange::Enter,
        (true, Some(false)) => QueueChange::Leave,
        _ => QueueChange::Keep,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    use super::*;

    fn application(applicant: &str) -> Application {
        Application {
            id: Uuid::new_v4(),
            opportunity_id: Uuid::new_v4(),
            applicant_id: applicant.to_string(),
            status: ApplicationStatus::Pending,
            current_stage: None,
            notes: None,
            feedback: None,
            responses: Json(BTreeMap::new()),
            is_qualified: false,
            in_interview_queue: false,
            queue_position: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_cannot_apply_to_own_opportunity() {
        assert!(matches!(
            ensure_not_own_opportunity("alice", "alice"),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_not_own_opportunity("alice", "bob").is_ok());
    }

    #[test]
    fn test_party_resolution() {
        let app = application("bob");
        assert_eq!(party_for(&app, "alice", "bob").unwrap(), Party::Applicant);
        assert_eq!(party_for(&app, "alice", "alice").unwrap(), Party::Reviewer);
        assert!(party_for(&app, "alice", "carol").is_err());
    }

    #[test]
    fn test_applicant_cannot_review_self() {
        let update = ApplicationUpdate {
            status: Some(ApplicationStatus::Accepted),
            ..Default::default()
        };
        assert!(matches!(
            authorize_update(Party::Applicant, &update),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize_update(Party::Reviewer, &update).is_ok());
    }

    #[test]
    fn test_applicant_may_edit_notes() {
        let update = ApplicationUpdate {
            notes: Some("Available from June".into()),
            ..Default::default()
        };
        assert!(authorize_update(Party::Applicant, &update).is_ok());
        assert!(authorize_update(Party::Reviewer, &update).is_err());
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(matches!(
            authorize_update(Party::Reviewer, &ApplicationUpdate::default()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_queue_change() {
        assert_eq!(queue_change(false, Some(true)), QueueChange::Enter);
        assert_eq!(queue_change(true, Some(false)), QueueChange::Leave);
        assert_eq!(queue_change(true, Some(true)), QueueChange::Keep);
        assert_eq!(queue_change(false, None), QueueChange::Keep);
    }

    #[test]
    fn test_serialized_enters_assign_one_position() {
        // Two reviewers both saw the row out of the queue; the second runs after the first commits.
        let mut queued = false;
        let mut positions = 0;
        for _ in 0..2 {
            if queue_change(queued, Some(true)) == QueueChange::Enter {
                positions += 1;
                queued = true;
            }
        }
        assert_eq!(positions, 1);
    }
}
