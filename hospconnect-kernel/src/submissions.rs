/**
 * PLAINTES & AVIS - Soumission et suivi
 *
 * RÔLE :
 * Formulaires publics (session facultative) écrits dans les collections
 * "complaints" et "feedback", puis consultation par le soumetteur.
 *
 * PLAINTES :
 * - Ticket CMP-AAAAMMJJ-NNNNN (date UTC + 5 derniers chiffres des ms epoch)
 * - Statut initial "pending", révisable par admin plateforme ou officiel
 *   de santé sans règle de transition
 * - Sans hôpital reconnu : "N/A (General Complaint)" et hospitalId null
 * - Soumetteur connecté : seul patientId est enregistré
 *
 * AVIS :
 * - Hôpital obligatoire, note 1-5, commentaire 10-1000 caractères
 * - Soumetteur connecté : nom/email du profil prioritaires
 */

use crate::error::{ApiError, Violations};
use crate::hospitals::get_hospital;
use crate::models::{Complaint, ComplaintStatus, Feedback};
use crate::session::Session;
use crate::store::{encode, to_fields, Collection, Direction, DocumentStore, StoreError, StoreQuery};
use serde::Deserialize;
use serde_json::json;
use time::{OffsetDateTime, UtcOffset};

pub const GENERAL_COMPLAINT_HOSPITAL: &str = "N/A (General Complaint)";
pub const UNKNOWN_HOSPITAL: &str = "N/A";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintForm {
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub hospital_id: Option<String>,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub contact_permission: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackForm {
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub hospital_id: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: ComplaintStatus,
}

/// Champ facultatif : une chaîne vide vaut absence
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Identifiant lisible d'une plainte
pub fn generate_ticket_id(now: OffsetDateTime) -> String {
    let utc = now.to_offset(UtcOffset::UTC);
    let millis = utc.unix_timestamp_nanos() / 1_000_000;
    format!(
        "CMP-{:04}{:02}{:02}-{:05}",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        millis.rem_euclid(100_000)
    )
}

impl ComplaintForm {
    fn validate(&self, logged_in: bool) -> Result<(), ApiError> {
        let mut v = Violations::new();
        if let Some(name) = present(&self.submitter_name) {
            v.length("submitterName", name, 2, None, "Your name must be at least 2 characters.", "");
        }
        if let Some(email) = present(&self.submitter_email) {
            v.email("submitterEmail", email, "Please enter a valid email address for follow-up.");
            if !logged_in && !self.contact_permission {
                v.push(
                    "contactPermission",
                    "You must agree to be contacted for follow-up if you provide contact details.",
                );
            }
        }
        v.length(
            "issue",
            self.issue.trim(),
            20,
            Some(2000),
            "Please provide a detailed description (min 20 characters).",
            "Issue description cannot exceed 2000 characters.",
        );
        v.finish()
    }
}

pub fn submit_complaint(
    store: &dyn DocumentStore,
    session: Option<&Session>,
    form: &ComplaintForm,
    now: OffsetDateTime,
) -> Result<Complaint, ApiError> {
    form.validate(session.is_some())?;

    let hospital = match present(&form.hospital_id) {
        Some(id) => get_hospital(store, id).map_err(ApiError::backend("submission failed"))?,
        None => None,
    };
    let (name, email) = match session {
        Some(_) => (None, None),
        None => (
            present(&form.submitter_name).map(String::from),
            present(&form.submitter_email).map(String::from),
        ),
    };

    let complaint = Complaint {
        id: String::new(),
        ticket_id: generate_ticket_id(now),
        hospital_name: hospital
            .as_ref()
            .map_or_else(|| GENERAL_COMPLAINT_HOSPITAL.to_string(), |h| h.name.clone()),
        hospital_id: hospital.map(|h| h.id),
        patient_id: session.map(|s| s.uid().to_string()),
        name,
        email,
        issue: form.issue.trim().to_string(),
        status: ComplaintStatus::Pending,
        escalation_level: None,
        created_at: now,
    };

    let doc = encode(&complaint)
        .and_then(|data| store.add(Collection::Complaints, data))
        .map_err(ApiError::backend("submission failed"))?;
    tracing::info!(ticket = %complaint.ticket_id, hospital = %complaint.hospital_name, "complaint submitted");
    doc.decode().map_err(ApiError::backend("submission failed"))
}

/// Plaintes du soumetteur, plus récentes d'abord
pub fn list_my_complaints(store: &dyn DocumentStore, session: &Session) -> Result<Vec<Complaint>, StoreError> {
    let query = StoreQuery::new()
        .where_eq("patientId", session.uid())
        .order_by("createdAt", Direction::Desc);
    store
        .query(Collection::Complaints, &query)?
        .iter()
        .map(|doc| doc.decode())
        .collect()
}

/// Réécrit le statut d'une plainte ; tout libellé est accepté
pub fn set_complaint_status(
    store: &dyn DocumentStore,
    session: &Session,
    complaint_id: &str,
    status: ComplaintStatus,
) -> Result<Complaint, ApiError> {
    session.require(session.can_review_complaints())?;

    let mut fields = serde_json::Map::new();
    fields.insert("status".into(), json!(status));
    let doc = store
        .update(Collection::Complaints, complaint_id, fields)
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::NotFound(format!("complaint {complaint_id}")),
            other => ApiError::backend("update failed")(other),
        })?;

    tracing::info!(complaint = complaint_id, ?status, by = %session.uid(), "complaint status changed");
    doc.decode().map_err(ApiError::backend("update failed"))
}

impl FeedbackForm {
    fn validate(&self) -> Result<u8, ApiError> {
        let mut v = Violations::new();
        if present(&self.hospital_id).is_none() {
            v.push("hospitalId", "Please select a hospital.");
        }
        if let Some(name) = present(&self.submitter_name) {
            v.length("submitterName", name, 2, None, "Name must be at least 2 characters.", "");
        }
        if let Some(email) = present(&self.submitter_email) {
            v.email("submitterEmail", email, "Invalid email address.");
        }

        let rating = self.rating;
        if !rating.is_finite() || rating < 1.0 {
            v.push("rating", "Rating is required (1-5 stars)");
        } else if rating > 5.0 {
            v.push("rating", "Rating cannot exceed 5");
        } else if rating.fract() != 0.0 {
            v.push("rating", "Must be an integer");
        }

        v.length(
            "comment",
            self.comment.trim(),
            10,
            Some(1000),
            "Comment must be at least 10 characters.",
            "Comment cannot exceed 1000 characters.",
        );
        v.finish()?;
        Ok(rating as u8)
    }
}

pub fn submit_feedback(
    store: &dyn DocumentStore,
    session: Option<&Session>,
    form: &FeedbackForm,
    now: OffsetDateTime,
) -> Result<Feedback, ApiError> {
    let rating = form.validate()?;
    let hospital_id = present(&form.hospital_id).unwrap_or_default().to_string();
    let hospital = get_hospital(store, &hospital_id).map_err(ApiError::backend("submission failed"))?;

    let form_name = present(&form.submitter_name).map(String::from);
    let form_email = present(&form.submitter_email).map(String::from);
    let (patient_id, name, email) = match session {
        Some(s) => (
            Some(s.uid().to_string()),
            Some(s.profile.name.clone()).filter(|n| !n.is_empty()).or(form_name),
            s.profile.email.clone().or(form_email),
        ),
        None => (None, form_name, form_email),
    };

    let feedback = Feedback {
        id: String::new(),
        hospital_name: hospital.map_or_else(|| UNKNOWN_HOSPITAL.to_string(), |h| h.name),
        hospital_id,
        patient_id,
        name,
        email,
        rating,
        comment: form.comment.trim().to_string(),
        submitted_at: now,
    };

    let doc = encode(&feedback)
        .and_then(|data| store.add(Collection::Feedback, data))
        .map_err(ApiError::backend("submission failed"))?;
    tracing::info!(hospital = %feedback.hospital_id, rating, "feedback submitted");
    doc.decode().map_err(ApiError::backend("submission failed"))
}

pub fn list_my_feedback(store: &dyn DocumentStore, session: &Session) -> Result<Vec<Feedback>, StoreError> {
    let query = StoreQuery::new()
        .where_eq("patientId", session.uid())
        .order_by("submittedAt", Direction::Desc);
    store
        .query(Collection::Feedback, &query)?
        .iter()
        .map(|doc| doc.decode())
        .collect()
}
