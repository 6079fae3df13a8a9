//! Annonces diffusées par l'administration de la plateforme.

use crate::error::{ApiError, Violations};
use crate::models::{Announcement, Role, TargetAudience};
use crate::session::Session;
use crate::store::{encode, Collection, Direction, DocumentStore, StoreQuery};
use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub hospital_ids: Vec<String>,
}

impl AnnouncementForm {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Violations::new();
        v.length("title", self.title.trim(), 5, None, "Title must be at least 5 characters.", "");
        v.length("content", self.content.trim(), 20, None, "Content must be at least 20 characters.", "");
        if self.target_audience == TargetAudience::SpecificHospitals
            && self.hospital_ids.iter().all(|id| id.trim().is_empty())
        {
            v.push("hospitalIds", "Select at least one hospital.");
        }
        v.finish()
    }
}

pub fn create_announcement(
    store: &dyn DocumentStore,
    session: &Session,
    form: &AnnouncementForm,
    now: OffsetDateTime,
) -> Result<Announcement, ApiError> {
    session.require(session.role() == Role::PlatformAdmin)?;
    form.validate()?;

    let hospital_ids = match form.target_audience {
        TargetAudience::AllHospitals => Vec::new(),
        TargetAudience::SpecificHospitals => form
            .hospital_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect(),
    };
    let announcement = Announcement {
        id: String::new(),
        title: form.title.trim().to_string(),
        content: form.content.trim().to_string(),
        issued_at: now,
        target_audience: form.target_audience,
        hospital_ids,
    };

    let doc = encode(&announcement)
        .and_then(|data| store.add(Collection::Announcements, data))
        .map_err(ApiError::backend("announcement failed"))?;
    tracing::info!(id = %doc.id, audience = ?announcement.target_audience, "announcement issued");
    doc.decode().map_err(ApiError::backend("announcement failed"))
}

fn visible_to(announcement: &Announcement, session: &Session) -> bool {
    match announcement.target_audience {
        TargetAudience::AllHospitals => true,
        TargetAudience::SpecificHospitals => match session.role() {
            Role::PlatformAdmin | Role::HealthDepartmentOfficial => true,
            Role::HospitalAdmin => session
                .hospital_id()
                .is_some_and(|own| announcement.hospital_ids.iter().any(|id| id == own)),
            Role::Patient => false,
        },
    }
}

/// Annonces visibles par l'appelant, plus récentes d'abord
pub fn list_announcements(store: &dyn DocumentStore, session: &Session) -> Result<Vec<Announcement>, ApiError> {
    let query = StoreQuery::new().order_by("issuedAt", Direction::Desc);
    let all: Vec<Announcement> = store
        .query(Collection::Announcements, &query)
        .and_then(|docs| docs.iter().map(|doc| doc.decode()).collect())
        .map_err(ApiError::backend("announcement lookup failed"))?;
    Ok(all.into_iter().filter(|a| visible_to(a, session)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::store::JsonStore;
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2024-05-01 10:00 UTC);

    fn session(role: Role, hospital_id: Option<&str>) -> Session {
        Session {
            profile: UserProfile {
                uid: "u".into(),
                name: "User".into(),
                email: None,
                role,
                hospital_id: hospital_id.map(Into::into),
                profile_picture_url: None,
                created_at: NOW,
            },
        }
    }

    fn form(title: &str, audience: TargetAudience, hospital_ids: &[&str]) -> AnnouncementForm {
        AnnouncementForm {
            title: title.into(),
            content: "Flu vaccination drive starts next Monday.".into(),
            target_audience: audience,
            hospital_ids: hospital_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_only_platform_admin_can_issue() {
        let store = JsonStore::in_memory();
        let f = form("Vaccines", TargetAudience::AllHospitals, &[]);
        assert!(matches!(
            create_announcement(&store, &session(Role::HospitalAdmin, Some("hospital1")), &f, NOW),
            Err(ApiError::Forbidden)
        ));
        assert!(create_announcement(&store, &session(Role::PlatformAdmin, None), &f, NOW).is_ok());
    }

    #[test]
    fn test_validation_rules() {
        let store = JsonStore::in_memory();
        let mut f = form("Hi", TargetAudience::SpecificHospitals, &[]);
        f.content = "too short".into();
        let Err(ApiError::Validation(fields)) =
            create_announcement(&store, &session(Role::PlatformAdmin, None), &f, NOW)
        else {
            panic!("expected validation error");
        };
        let names: Vec<&str> = fields.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(names, vec!["title", "content", "hospitalIds"]);
    }

    #[test]
    fn test_visibility_by_role_newest_first() {
        let store = JsonStore::in_memory();
        let admin = session(Role::PlatformAdmin, None);
        let general = create_announcement(&store, &admin, &form("Holiday hours", TargetAudience::AllHospitals, &[]), NOW).unwrap();
        let targeted = create_announcement(
            &store,
            &admin,
            &form("Oxygen audit", TargetAudience::SpecificHospitals, &["hospital2"]),
            NOW + Duration::hours(1),
        )
        .unwrap();

        assert_eq!(list_announcements(&store, &admin).unwrap(), vec![targeted.clone(), general.clone()]);
        assert_eq!(
            list_announcements(&store, &session(Role::HospitalAdmin, Some("hospital2"))).unwrap(),
            vec![targeted, general.clone()]
        );
        assert_eq!(
            list_announcements(&store, &session(Role::HospitalAdmin, Some("hospital1"))).unwrap(),
            vec![general.clone()]
        );
        assert_eq!(list_announcements(&store, &session(Role::Patient, None)).unwrap(), vec![general]);
    }
}
