use crate::store::{Collection, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

// ============ LITS ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BedCategory {
    Icu,
    Oxygen,
    Ventilator,
    General,
}

impl BedCategory {
    pub const ALL: [BedCategory; 4] = [
        BedCategory::Icu,
        BedCategory::Oxygen,
        BedCategory::Ventilator,
        BedCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BedCategory::Icu => "icu",
            BedCategory::Oxygen => "oxygen",
            BedCategory::Ventilator => "ventilator",
            BedCategory::General => "general",
        }
    }
}

impl fmt::Display for BedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BedCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "icu" => Ok(BedCategory::Icu),
            "oxygen" => Ok(BedCategory::Oxygen),
            "ventilator" => Ok(BedCategory::Ventilator),
            "general" => Ok(BedCategory::General),
            other => Err(format!("unknown bed type: {other}")),
        }
    }
}

/// Paire (disponibles, total) d'une catégorie de lits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BedCount {
    pub available: u32,
    pub total: u32,
}

impl BedCount {
    pub fn new(available: u32, total: u32) -> Self {
        Self { available, total }
    }
}

/// Structure imbriquée des lits d'un hôpital, toujours remplacée en entier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BedAvailability {
    pub icu: BedCount,
    pub oxygen: BedCount,
    pub ventilator: BedCount,
    pub general: BedCount,
}

impl BedAvailability {
    pub fn get(&self, category: BedCategory) -> BedCount {
        match category {
            BedCategory::Icu => self.icu,
            BedCategory::Oxygen => self.oxygen,
            BedCategory::Ventilator => self.ventilator,
            BedCategory::General => self.general,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (BedCategory, BedCount)> + '_ {
        BedCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Somme des lits disponibles toutes catégories confondues
    ///
    /// En u64 : quatre compteurs u32 valides peuvent dépasser u32::MAX.
    pub fn total_available(&self) -> u64 {
        self.iter().map(|(_, count)| u64::from(count.available)).sum()
    }
}

// ============ HÔPITAUX ============

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalLocation {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub location: HospitalLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub beds: BedAvailability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_available: Option<bool>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

impl Record for Hospital {
    const COLLECTION: Collection = Collection::Hospitals;
}

// ============ PATIENTS ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Admitted,
    Discharged,
    Transferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentLog {
    pub note: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub assigned_hospital: String,
    pub bed_type: BedCategory,
    pub status: PatientStatus,
    #[serde(default)]
    pub treatment_logs: Vec<TreatmentLog>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(with = "time::serde::rfc3339")]
    pub admission_date: OffsetDateTime,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record for PatientRecord {
    const COLLECTION: Collection = Collection::Patients;
}

// ============ AVIS & PLAINTES ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default)]
    pub id: String,
    pub hospital_id: String,
    pub hospital_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub rating: u8,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl Record for Feedback {
    const COLLECTION: Collection = Collection::Feedback;
}

/// Libellés de statut d'une plainte ; aucune transition n'est imposée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
    Escalated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationLevel {
    Local,
    State,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    #[serde(default)]
    pub id: String,
    pub ticket_id: String,
    /// null pour une plainte générale
    #[serde(default)]
    pub hospital_id: Option<String>,
    pub hospital_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub issue: String,
    pub status: ComplaintStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_level: Option<EscalationLevel>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Record for Complaint {
    const COLLECTION: Collection = Collection::Complaints;
}

// ============ ANNONCES ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAudience {
    AllHospitals,
    SpecificHospitals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    pub target_audience: TargetAudience,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hospital_ids: Vec<String>,
}

impl Record for Announcement {
    const COLLECTION: Collection = Collection::Announcements;
}

// ============ UTILISATEURS ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    HospitalAdmin,
    PlatformAdmin,
    HealthDepartmentOfficial,
}

impl Role {
    /// Page d'accueil du tableau de bord pour ce rôle
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Patient => "/patient/dashboard",
            Role::HospitalAdmin => "/hospital/dashboard",
            Role::PlatformAdmin | Role::HealthDepartmentOfficial => "/platform-admin/announcements",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Record for UserProfile {
    const COLLECTION: Collection = Collection::Users;
    const ID_FIELD: &'static str = "uid";
}
