//! Données de démonstration : quatre hôpitaux et deux administrateurs.
//! Chargées au démarrage uniquement si la collection "hospitals" est vide.

use crate::models::{
    BedAvailability, BedCount, Coordinates, Hospital, HospitalLocation, Role, UserProfile,
};
use crate::store::{encode, Collection, DocumentStore, StoreError};
use time::{Duration, OffsetDateTime};

pub const DEMO_HOSPITAL_ADMIN: &str = "mock_hospital_admin_1";
pub const DEMO_PLATFORM_ADMIN: &str = "mock_platform_admin_1";

fn beds(icu: (u32, u32), oxygen: (u32, u32), ventilator: (u32, u32), general: (u32, u32)) -> BedAvailability {
    BedAvailability {
        icu: BedCount::new(icu.0, icu.1),
        oxygen: BedCount::new(oxygen.0, oxygen.1),
        ventilator: BedCount::new(ventilator.0, ventilator.1),
        general: BedCount::new(general.0, general.1),
    }
}

#[allow(clippy::too_many_arguments)]
fn hospital(
    id: &str,
    name: &str,
    address: &str,
    (latitude, longitude): (f64, f64),
    contact: &str,
    specialties: &[&str],
    beds: BedAvailability,
    emergency: bool,
    last_updated: OffsetDateTime,
    rating: f32,
) -> Hospital {
    Hospital {
        id: id.to_string(),
        name: name.to_string(),
        location: HospitalLocation {
            address: address.to_string(),
            coordinates: Some(Coordinates { latitude, longitude }),
        },
        contact: Some(contact.to_string()),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        beds,
        emergency_available: Some(emergency),
        last_updated,
        image_url: None,
        rating: Some(rating),
    }
}

/// Hôpitaux de démonstration, dans l'ordre d'insertion attendu par la recherche
pub fn demo_hospitals(now: OffsetDateTime) -> Vec<Hospital> {
    vec![
        hospital(
            "hospital1",
            "City General Hospital",
            "123 Main St, Anytown, USA",
            (28.6139, 77.2090),
            "555-1234",
            &["cardiology", "general medicine", "pediatrics"],
            beds((5, 20), (15, 50), (2, 10), (30, 100)),
            true,
            now - Duration::hours(1),
            4.5,
        ),
        hospital(
            "hospital2",
            "Sunshine Medical Center",
            "456 Oak Ave, Anytown, USA",
            (28.6200, 77.2195),
            "555-5678",
            &["oncology", "neurology", "orthopedics"],
            beds((3, 15), (8, 40), (1, 5), (10, 80)),
            true,
            now - Duration::hours(3),
            4.2,
        ),
        hospital(
            "hospital3",
            "Hope Children's Hospital",
            "789 Pine Ln, Anytown, USA",
            (28.5900, 77.1900),
            "555-9012",
            &["pediatrics", "neonatology"],
            beds((12, 25), (10, 30), (4, 8), (25, 60)),
            true,
            now - Duration::minutes(30),
            4.8,
        ),
        hospital(
            "hospital4",
            "Community Health Clinic",
            "101 Blossom Rd, Anytown, USA",
            (28.6350, 77.2000),
            "555-3456",
            &["general medicine", "family practice"],
            beds((0, 0), (5, 5), (0, 0), (18, 20)),
            false,
            now - Duration::hours(5),
            3.9,
        ),
    ]
}

pub fn demo_users(now: OffsetDateTime) -> Vec<UserProfile> {
    vec![
        UserProfile {
            uid: DEMO_HOSPITAL_ADMIN.into(),
            name: "Dr. Hospital Admin".into(),
            email: Some("hospital.admin@example.com".into()),
            role: Role::HospitalAdmin,
            hospital_id: Some("hospital1".into()),
            profile_picture_url: None,
            created_at: now,
        },
        UserProfile {
            uid: DEMO_PLATFORM_ADMIN.into(),
            name: "Platform Super Admin".into(),
            email: Some("platform.admin@example.com".into()),
            role: Role::PlatformAdmin,
            hospital_id: None,
            profile_picture_url: None,
            created_at: now,
        },
    ]
}

/// Insère les données de démo si le store est vide ; renvoie le nombre d'hôpitaux créés
pub fn seed_demo_data(store: &dyn DocumentStore, now: OffsetDateTime) -> Result<usize, StoreError> {
    if store.count(Collection::Hospitals)? > 0 {
        return Ok(0);
    }

    let hospitals = demo_hospitals(now);
    for h in &hospitals {
        store.set(Collection::Hospitals, &h.id, encode(h)?)?;
    }
    for user in demo_users(now) {
        store.set(Collection::Users, &user.uid, encode(&user)?)?;
    }

    tracing::info!(hospitals = hospitals.len(), "demo data seeded");
    Ok(hospitals.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beds::check_invariant;
    use crate::store::JsonStore;
    use time::macros::datetime;

    #[test]
    fn test_seed_is_idempotent() {
        let store = JsonStore::in_memory();
        let now = datetime!(2024-05-01 10:00 UTC);
        assert_eq!(seed_demo_data(&store, now).unwrap(), 4);
        assert_eq!(seed_demo_data(&store, now).unwrap(), 0);
        assert_eq!(store.count(Collection::Hospitals).unwrap(), 4);
        assert_eq!(store.count(Collection::Users).unwrap(), 2);
    }

    #[test]
    fn test_demo_hospitals_respect_bed_invariant() {
        for h in demo_hospitals(datetime!(2024-05-01 10:00 UTC)) {
            assert!(check_invariant(&h.beds).is_ok(), "{}", h.id);
        }
    }
}
