/**
 * HÔPITAUX - Lecture, enregistrement et mise à jour des lits
 *
 * RÔLE :
 * Opérations sur la collection "hospitals" : lecture de la liste (ordre
 * d'insertion), création à l'inscription, remplacement complet de la
 * structure des lits, marqueurs de carte.
 *
 * MISE À JOUR DES LITS :
 * - Réservée à l'administrateur de l'hôpital ciblé (ou admin plateforme)
 * - Une seule écriture remplace "beds" et "lastUpdated" ensemble
 * - Pas de patch partiel : le dernier écrivain gagne
 * - En cas d'échec du store : "update failed", document inchangé
 */

use crate::error::ApiError;
use crate::models::{BedAvailability, Hospital, HospitalLocation};
use crate::session::Session;
use crate::store::{encode, to_fields, Collection, DocumentStore, StoreError, StoreQuery};
use serde::Serialize;
use time::{Duration, OffsetDateTime};

/// Payload de mise à jour : toujours la structure complète + horodatage
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BedUpdatePayload<'a> {
    beds: &'a BedAvailability,
    #[serde(with = "time::serde::rfc3339")]
    last_updated: OffsetDateTime,
}

/// Vue liste : hôpital + total des lits disponibles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalSummary {
    #[serde(flatten)]
    pub hospital: Hospital,
    pub total_available_beds: u64,
}

impl From<Hospital> for HospitalSummary {
    fn from(hospital: Hospital) -> Self {
        let total_available_beds = hospital.beds.total_available();
        Self { hospital, total_available_beds }
    }
}

/// Marqueur consommé par le service de carte
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Liste complète, dans l'ordre d'insertion du store
pub fn list_hospitals(store: &dyn DocumentStore) -> Result<Vec<Hospital>, StoreError> {
    store
        .query(Collection::Hospitals, &StoreQuery::new())?
        .iter()
        .map(|doc| doc.decode())
        .collect()
}

pub fn get_hospital(store: &dyn DocumentStore, id: &str) -> Result<Option<Hospital>, StoreError> {
    store
        .get(Collection::Hospitals, id)?
        .map(|doc| doc.decode())
        .transpose()
}

/// Crée un hôpital vierge (tous les lits à 0/0) lors de l'inscription d'un admin
pub fn register_hospital(
    store: &dyn DocumentStore,
    name: &str,
    address: &str,
    now: OffsetDateTime,
) -> Result<Hospital, StoreError> {
    let hospital = Hospital {
        id: String::new(),
        name: name.to_string(),
        location: HospitalLocation {
            address: address.to_string(),
            coordinates: None,
        },
        contact: None,
        specialties: Vec::new(),
        beds: BedAvailability::default(),
        emergency_available: None,
        last_updated: now,
        image_url: None,
        rating: None,
    };
    let doc = store.add(Collection::Hospitals, encode(&hospital)?)?;
    tracing::info!(id = %doc.id, name, "hospital registered");
    doc.decode()
}

/// Horodatage strictement postérieur au précédent, même si l'horloge n'a pas avancé
fn next_stamp(previous: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// Remplace la structure des lits d'un hôpital
pub fn update_bed_availability(
    store: &dyn DocumentStore,
    session: &Session,
    hospital_id: &str,
    beds: &BedAvailability,
    now: OffsetDateTime,
) -> Result<Hospital, ApiError> {
    session.require(session.can_manage_hospital(hospital_id))?;

    let current = get_hospital(store, hospital_id)
        .map_err(ApiError::backend("update failed"))?
        .ok_or_else(|| ApiError::NotFound(format!("hospital {hospital_id}")))?;

    let payload = BedUpdatePayload {
        beds,
        last_updated: next_stamp(current.last_updated, now),
    };
    let fields = to_fields(&payload).map_err(ApiError::backend("update failed"))?;

    let doc = store
        .update(Collection::Hospitals, hospital_id, fields)
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::NotFound(format!("hospital {hospital_id}")),
            other => ApiError::backend("update failed")(other),
        })?;

    tracing::info!(
        hospital = hospital_id,
        by = %session.uid(),
        available = beds.total_available(),
        "bed availability updated"
    );
    doc.decode().map_err(ApiError::backend("update failed"))
}

/// Marqueurs pour les hôpitaux géolocalisés
pub fn map_markers(hospitals: &[Hospital]) -> Vec<MapMarker> {
    hospitals
        .iter()
        .filter_map(|h| {
            let coords = h.location.coordinates?;
            Some(MapMarker {
                id: h.id.clone(),
                name: h.name.clone(),
                lat: coords.latitude,
                lng: coords.longitude,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beds::{validate_beds, BedAvailabilityInput, BedPairInput};
    use crate::models::{BedCount, Role, UserProfile};
    use crate::seed::seed_demo_data;
    use crate::store::{Document, JsonStore};
    use serde_json::{Map, Value};
    use time::macros::datetime;

    fn session(role: Role, hospital_id: Option<&str>) -> Session {
        Session {
            profile: UserProfile {
                uid: "operator".into(),
                name: "Operator".into(),
                email: None,
                role,
                hospital_id: hospital_id.map(Into::into),
                profile_picture_url: None,
                created_at: datetime!(2024-05-01 10:00 UTC),
            },
        }
    }

    fn seeded() -> JsonStore {
        let store = JsonStore::in_memory();
        seed_demo_data(&store, datetime!(2024-05-01 10:00 UTC)).unwrap();
        store
    }

    /// Store dont les écritures échouent toujours
    struct ReadOnlyBackend(JsonStore);

    impl DocumentStore for ReadOnlyBackend {
        fn get(&self, c: Collection, id: &str) -> Result<Option<Document>, StoreError> {
            self.0.get(c, id)
        }
        fn add(&self, _: Collection, _: Value) -> Result<Document, StoreError> {
            Err(StoreError::Unavailable("write refused".into()))
        }
        fn set(&self, _: Collection, _: &str, _: Value) -> Result<Document, StoreError> {
            Err(StoreError::Unavailable("write refused".into()))
        }
        fn update(&self, _: Collection, _: &str, _: Map<String, Value>) -> Result<Document, StoreError> {
            Err(StoreError::Unavailable("write refused".into()))
        }
        fn query(&self, c: Collection, q: &StoreQuery) -> Result<Vec<Document>, StoreError> {
            self.0.query(c, q)
        }
    }

    #[test]
    fn test_update_replaces_beds_and_advances_timestamp() {
        let store = seeded();
        let before = get_hospital(&store, "hospital1").unwrap().unwrap();
        assert_eq!(before.beds.icu, BedCount::new(5, 20));

        let mut beds = before.beds;
        beds.icu = BedCount::new(7, 20);
        let admin = session(Role::HospitalAdmin, Some("hospital1"));
        let updated = update_bed_availability(&store, &admin, "hospital1", &beds, datetime!(2024-05-01 12:00 UTC)).unwrap();

        assert_eq!(updated.beds, beds);
        assert!(updated.last_updated > before.last_updated);
        assert_eq!(get_hospital(&store, "hospital1").unwrap().unwrap(), updated);
        assert_eq!(updated.name, before.name);
    }

    #[test]
    fn test_timestamp_advances_even_with_stale_clock() {
        let store = seeded();
        let before = get_hospital(&store, "hospital2").unwrap().unwrap();
        let admin = session(Role::PlatformAdmin, None);
        let updated = update_bed_availability(&store, &admin, "hospital2", &before.beds, before.last_updated).unwrap();
        assert_eq!(updated.last_updated, before.last_updated + Duration::milliseconds(1));
    }

    #[test]
    fn test_update_requires_owning_operator() {
        let store = seeded();
        let beds = BedAvailability::default();
        let other = session(Role::HospitalAdmin, Some("hospital2"));
        assert!(matches!(
            update_bed_availability(&store, &other, "hospital1", &beds, datetime!(2024-05-02 00:00 UTC)),
            Err(ApiError::Forbidden)
        ));
        let patient = session(Role::Patient, None);
        assert!(matches!(
            update_bed_availability(&store, &patient, "hospital1", &beds, datetime!(2024-05-02 00:00 UTC)),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_update_unknown_hospital_is_not_found() {
        let store = seeded();
        let admin = session(Role::PlatformAdmin, None);
        let err = update_bed_availability(&store, &admin, "nowhere", &BedAvailability::default(), datetime!(2024-05-02 00:00 UTC))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_backend_failure_leaves_document_unchanged() {
        let backend = ReadOnlyBackend(seeded());
        let before = get_hospital(&backend, "hospital1").unwrap().unwrap();
        let admin = session(Role::HospitalAdmin, Some("hospital1"));
        let mut beds = before.beds;
        beds.icu = BedCount::new(0, 20);

        let err = update_bed_availability(&backend, &admin, "hospital1", &beds, datetime!(2024-05-02 00:00 UTC)).unwrap_err();
        assert_eq!(err.to_string(), "update failed");
        assert_eq!(get_hospital(&backend, "hospital1").unwrap().unwrap(), before);
    }

    #[test]
    fn test_register_hospital_starts_empty() {
        let store = JsonStore::in_memory();
        let h = register_hospital(&store, "Riverside Clinic", "N/A", datetime!(2024-05-01 10:00 UTC)).unwrap();
        assert!(!h.id.is_empty());
        assert_eq!(h.beds, BedAvailability::default());
        assert_eq!(list_hospitals(&store).unwrap(), vec![h]);
    }

    #[test]
    fn test_markers_skip_hospitals_without_coordinates() {
        let store = seeded();
        let mut hospitals = list_hospitals(&store).unwrap();
        hospitals[3].location.coordinates = None;
        let markers = map_markers(&hospitals);
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].id, "hospital1");
        assert_eq!(markers[0].lat, 28.6139);
    }

    #[test]
    fn test_summary_totals_available_beds() {
        let store = seeded();
        let summary = HospitalSummary::from(get_hospital(&store, "hospital1").unwrap().unwrap());
        assert_eq!(summary.total_available_beds, 52);
    }

    #[test]
    fn test_large_valid_counts_survive_update_and_listing() {
        let store = seeded();
        let pair = || BedPairInput::new(2_000_000_000u32, 2_000_000_000u32);
        let input = BedAvailabilityInput { icu: pair(), oxygen: pair(), ventilator: pair(), general: pair() };
        let beds = validate_beds(&input).unwrap();

        let admin = session(Role::PlatformAdmin, None);
        let updated = update_bed_availability(&store, &admin, "hospital1", &beds, datetime!(2024-05-02 00:00 UTC)).unwrap();
        assert_eq!(updated.beds.icu, BedCount::new(2_000_000_000, 2_000_000_000));

        let summaries: Vec<HospitalSummary> = list_hospitals(&store).unwrap().into_iter().map(HospitalSummary::from).collect();
        assert_eq!(summaries[0].total_available_beds, 8_000_000_000);
    }
}
