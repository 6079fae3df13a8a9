/**
 * SESSIONS - Identité explicite de l'appelant par requête
 *
 * RÔLE :
 * Résout l'identifiant opaque fourni par le fournisseur d'authentification
 * (en-tête x-user-id) en profil utilisateur lu dans la collection "users".
 * La session est passée aux handlers comme un extracteur Axum : aucun
 * "utilisateur courant" global.
 *
 * ACCÈS :
 * - Session       : obligatoire, 401 si absente ou inconnue
 * - MaybeSession  : formulaires publics (plaintes, avis)
 */

use crate::error::ApiError;
use crate::http::AppState;
use crate::models::{Role, UserProfile};
use crate::store::{Collection, DocumentStore};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub profile: UserProfile,
}

impl Session {
    /// Lit le profil correspondant à un identifiant ; None si inconnu
    pub fn resolve(store: &dyn DocumentStore, uid: &str) -> Result<Option<Session>, ApiError> {
        let doc = store
            .get(Collection::Users, uid)
            .map_err(ApiError::backend("session lookup failed"))?;
        match doc {
            Some(doc) => {
                let profile = doc
                    .decode::<UserProfile>()
                    .map_err(ApiError::backend("session lookup failed"))?;
                Ok(Some(Session { profile }))
            }
            None => Ok(None),
        }
    }

    pub fn uid(&self) -> &str {
        &self.profile.uid
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn hospital_id(&self) -> Option<&str> {
        self.profile.hospital_id.as_deref()
    }

    /// Droit de modifier les données d'un hôpital (lits)
    pub fn can_manage_hospital(&self, hospital_id: &str) -> bool {
        match self.role() {
            Role::HospitalAdmin => self.hospital_id() == Some(hospital_id),
            Role::PlatformAdmin => true,
            Role::Patient | Role::HealthDepartmentOfficial => false,
        }
    }

    /// Hôpital rattaché pour les opérations du personnel hospitalier
    pub fn staff_hospital(&self) -> Result<&str, ApiError> {
        match self.role() {
            Role::HospitalAdmin => self.hospital_id().ok_or(ApiError::Forbidden),
            Role::Patient | Role::PlatformAdmin | Role::HealthDepartmentOfficial => {
                Err(ApiError::Forbidden)
            }
        }
    }

    /// Droit de réviser le statut d'une plainte
    pub fn can_review_complaints(&self) -> bool {
        match self.role() {
            Role::PlatformAdmin | Role::HealthDepartmentOfficial => true,
            Role::Patient | Role::HospitalAdmin => false,
        }
    }

    pub fn require(&self, allowed: bool) -> Result<(), ApiError> {
        if allowed {
            Ok(())
        } else {
            tracing::warn!(uid = %self.uid(), role = ?self.role(), "access denied");
            Err(ApiError::Forbidden)
        }
    }
}

/// Session facultative pour les routes publiques
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_HEADER) else {
            return Ok(MaybeSession(None));
        };
        let uid = raw.to_str().map_err(|_| ApiError::Unauthenticated)?.trim();
        if uid.is_empty() {
            return Ok(MaybeSession(None));
        }

        match Session::resolve(state.store.as_ref(), uid)? {
            Some(session) => Ok(MaybeSession(Some(session))),
            None => {
                tracing::warn!(uid, "unknown user identifier");
                Err(ApiError::Unauthenticated)
            }
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        MaybeSession::from_request_parts(parts, state)
            .await?
            .0
            .ok_or(ApiError::Unauthenticated)
    }
}
