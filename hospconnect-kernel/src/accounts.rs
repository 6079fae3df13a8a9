/**
 * COMPTES - Inscription et vue de session
 *
 * RÔLE :
 * Enregistre le profil d'un nouvel utilisateur dans "users". Le mot de
 * passe reste chez le fournisseur d'authentification ; seul l'identifiant
 * qu'il délivre (uid) sert de clé.
 *
 * INSCRIPTION :
 * - Rôles ouverts : patient, hospital_admin
 * - hospital_admin : crée l'hôpital (lits à 0/0) et lie hospitalId
 * - Email unique parmi les profils
 *
 * ATOMICITÉ :
 * Pas de transaction multi-documents. L'hôpital est écrit avant le
 * profil ; si le profil échoue, l'hôpital reste orphelin et son id est
 * journalisé en warn.
 */

use crate::error::{ApiError, Violations};
use crate::hospitals::register_hospital;
use crate::models::{Role, UserProfile};
use crate::session::Session;
use crate::store::{encode, Collection, DocumentStore, StoreQuery};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_HOSPITAL_ADDRESS: &str = "N/A";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Option<Role>,
    pub hospital_name: Option<String>,
    pub hospital_address: Option<String>,
    pub profile_picture_url: Option<String>,
}

/// Réponse de GET /session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub profile: UserProfile,
    pub dashboard_path: &'static str,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        let dashboard_path = session.role().dashboard_path();
        Self {
            profile: session.profile,
            dashboard_path,
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RegistrationForm {
    fn validate(&self) -> Result<Role, ApiError> {
        let mut v = Violations::new();
        v.length("name", self.name.trim(), 2, None, "Name must be at least 2 characters.", "");
        v.email("email", self.email.trim(), "Invalid email address.");

        let role = match self.role {
            Some(role @ (Role::Patient | Role::HospitalAdmin)) => Some(role),
            Some(Role::PlatformAdmin | Role::HealthDepartmentOfficial) | None => {
                v.push("role", "Please select a role.");
                None
            }
        };
        if role == Some(Role::HospitalAdmin) {
            match trimmed(&self.hospital_name) {
                None => v.push("hospitalName", "Hospital name is required for hospital admin registration."),
                Some(name) => v.length(
                    "hospitalName",
                    name,
                    3,
                    None,
                    "Hospital name must be at least 3 characters.",
                    "",
                ),
            }
        }
        v.finish()?;
        role.ok_or_else(|| ApiError::BadRequest("role".into()))
    }
}

/// Crée le profil ; `uid` est l'identifiant délivré par le fournisseur d'authentification
pub fn register_user(
    store: &dyn DocumentStore,
    uid: Option<&str>,
    form: &RegistrationForm,
    now: OffsetDateTime,
) -> Result<UserProfile, ApiError> {
    let role = form.validate()?;
    let email = form.email.trim().to_string();

    let uid = match uid.map(str::trim).filter(|u| !u.is_empty()) {
        Some(uid) => uid.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    if store
        .get(Collection::Users, &uid)
        .map_err(ApiError::backend("registration failed"))?
        .is_some()
    {
        return Err(ApiError::Conflict("user already registered".into()));
    }
    let taken = store
        .query(Collection::Users, &StoreQuery::new().where_eq("email", email.as_str()).limit(1))
        .map_err(ApiError::backend("registration failed"))?;
    if !taken.is_empty() {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hospital_id = match role {
        Role::HospitalAdmin => {
            let name = trimmed(&form.hospital_name).unwrap_or_default();
            let address = trimmed(&form.hospital_address).unwrap_or(DEFAULT_HOSPITAL_ADDRESS);
            let hospital = register_hospital(store, name, address, now)
                .map_err(ApiError::backend("registration failed"))?;
            Some(hospital.id)
        }
        Role::Patient | Role::PlatformAdmin | Role::HealthDepartmentOfficial => None,
    };

    let profile = UserProfile {
        uid: uid.clone(),
        name: form.name.trim().to_string(),
        email: Some(email),
        role,
        hospital_id,
        profile_picture_url: trimmed(&form.profile_picture_url).map(String::from),
        created_at: now,
    };
    let doc = encode(&profile)
        .and_then(|data| store.set(Collection::Users, &uid, data))
        .map_err(|e| {
            if let Some(hospital_id) = &profile.hospital_id {
                tracing::warn!(uid = %uid, hospital = %hospital_id, "profile write failed, hospital left without admin");
            }
            ApiError::backend("registration failed")(e)
        })?;

    tracing::info!(uid = %uid, ?role, "user registered");
    doc.decode().map_err(ApiError::backend("registration failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hospitals::get_hospital;
    use crate::models::BedAvailability;
    use crate::store::{Document, JsonStore, StoreError};
    use serde_json::{Map, Value};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-05-01 10:00 UTC);

    fn form(role: Role) -> RegistrationForm {
        RegistrationForm {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            role: Some(role),
            ..Default::default()
        }
    }

    #[test]
    fn test_patient_registration() {
        let store = JsonStore::in_memory();
        let profile = register_user(&store, Some("auth-123"), &form(Role::Patient), NOW).unwrap();
        assert_eq!(profile.uid, "auth-123");
        assert_eq!(profile.hospital_id, None);

        let session = Session::resolve(&store, "auth-123").unwrap().unwrap();
        let view = SessionView::from(session);
        assert_eq!(view.dashboard_path, "/patient/dashboard");
    }

    #[test]
    fn test_hospital_admin_registration_creates_hospital() {
        let store = JsonStore::in_memory();
        let mut f = form(Role::HospitalAdmin);
        f.hospital_name = Some("Riverside Clinic".into());
        let profile = register_user(&store, None, &f, NOW).unwrap();

        let hospital_id = profile.hospital_id.clone().unwrap();
        let hospital = get_hospital(&store, &hospital_id).unwrap().unwrap();
        assert_eq!(hospital.name, "Riverside Clinic");
        assert_eq!(hospital.location.address, DEFAULT_HOSPITAL_ADDRESS);
        assert_eq!(hospital.beds, BedAvailability::default());
        assert_eq!(profile.role.dashboard_path(), "/hospital/dashboard");
    }

    #[test]
    fn test_hospital_admin_needs_hospital_name() {
        let store = JsonStore::in_memory();
        let Err(ApiError::Validation(fields)) = register_user(&store, None, &form(Role::HospitalAdmin), NOW) else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].field, "hospitalName");
        assert_eq!(store.count(Collection::Hospitals).unwrap(), 0);
    }

    #[test]
    fn test_privileged_roles_cannot_self_register() {
        let store = JsonStore::in_memory();
        let Err(ApiError::Validation(fields)) = register_user(&store, None, &form(Role::PlatformAdmin), NOW) else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].field, "role");
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let store = JsonStore::in_memory();
        register_user(&store, Some("a"), &form(Role::Patient), NOW).unwrap();
        assert!(matches!(
            register_user(&store, Some("b"), &form(Role::Patient), NOW),
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            register_user(&store, Some("a"), &form(Role::Patient), NOW),
            Err(ApiError::Conflict(_))
        ));
    }

    /// Store qui refuse l'écriture des profils
    struct UsersRefused(JsonStore);

    impl DocumentStore for UsersRefused {
        fn get(&self, c: Collection, id: &str) -> Result<Option<Document>, StoreError> {
            self.0.get(c, id)
        }
        fn add(&self, c: Collection, data: Value) -> Result<Document, StoreError> {
            self.0.add(c, data)
        }
        fn set(&self, c: Collection, id: &str, data: Value) -> Result<Document, StoreError> {
            match c {
                Collection::Users => Err(StoreError::Unavailable("users offline".into())),
                _ => self.0.set(c, id, data),
            }
        }
        fn update(&self, c: Collection, id: &str, fields: Map<String, Value>) -> Result<Document, StoreError> {
            self.0.update(c, id, fields)
        }
        fn query(&self, c: Collection, q: &StoreQuery) -> Result<Vec<Document>, StoreError> {
            self.0.query(c, q)
        }
    }

    #[test]
    fn test_failed_profile_write_leaves_hospital_without_admin() {
        let store = UsersRefused(JsonStore::in_memory());
        let mut f = form(Role::HospitalAdmin);
        f.hospital_name = Some("Riverside Clinic".into());

        let err = register_user(&store, Some("auth-9"), &f, NOW).unwrap_err();
        assert_eq!(err.to_string(), "registration failed");
        assert_eq!(store.count(Collection::Hospitals).unwrap(), 1);
        assert_eq!(store.count(Collection::Users).unwrap(), 0);
    }
}
