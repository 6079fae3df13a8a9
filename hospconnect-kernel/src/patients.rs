/**
 * DOSSIERS PATIENTS - Admissions gérées par l'hôpital
 *
 * RÔLE :
 * L'administrateur d'un hôpital enregistre les admissions, consulte les
 * patients de son établissement, ajoute des notes de soins (append-only)
 * et change le statut (admis, sorti, transféré).
 *
 * LIMITES :
 * - Aucune transaction avec le compteur de lits de l'hôpital
 * - Ajout de note en lecture-modification-écriture : dernier écrivain gagne
 */

use crate::error::{ApiError, Violations};
use crate::models::{BedCategory, PatientRecord, PatientStatus, TreatmentLog};
use crate::session::Session;
use crate::store::{encode, to_fields, Collection, Direction, DocumentStore, StoreError, StoreQuery};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionForm {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub admission_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub bed_type: String,
    pub notes: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentNote {
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientStatusChange {
    pub status: PatientStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogsPatch<'a> {
    treatment_logs: &'a [TreatmentLog],
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl AdmissionForm {
    fn validate(&self, now: OffsetDateTime) -> Result<(BedCategory, OffsetDateTime), ApiError> {
        let mut v = Violations::new();
        v.length(
            "patientName",
            self.patient_name.trim(),
            2,
            None,
            "Patient name must be at least 2 characters.",
            "",
        );
        v.length(
            "reason",
            self.reason.trim(),
            10,
            None,
            "Reason for admission must be at least 10 characters.",
            "",
        );
        let bed_type = self.bed_type.trim().parse::<BedCategory>().ok();
        if bed_type.is_none() {
            v.push("bedType", "Please select bed type.");
        }
        let admitted_at = self.admission_date.unwrap_or(now);
        if admitted_at > now {
            v.push("admissionDate", "Admission date cannot be in the future.");
        }
        v.finish()?;

        match bed_type {
            Some(bed_type) => Ok((bed_type, admitted_at)),
            None => Err(ApiError::BadRequest("bed type".into())),
        }
    }
}

pub fn admit_patient(
    store: &dyn DocumentStore,
    session: &Session,
    form: &AdmissionForm,
    now: OffsetDateTime,
) -> Result<PatientRecord, ApiError> {
    let hospital_id = session.staff_hospital()?;
    let (bed_type, admission_date) = form.validate(now)?;

    let record = PatientRecord {
        id: String::new(),
        name: form.patient_name.trim().to_string(),
        phone: optional(&form.phone),
        assigned_hospital: hospital_id.to_string(),
        bed_type,
        status: PatientStatus::Admitted,
        treatment_logs: Vec::new(),
        medications: Vec::new(),
        admission_date,
        reason: form.reason.trim().to_string(),
        notes: optional(&form.notes),
    };

    let doc = encode(&record)
        .and_then(|data| store.add(Collection::Patients, data))
        .map_err(ApiError::backend("admission failed"))?;
    tracing::info!(hospital = hospital_id, patient = %doc.id, %bed_type, "patient admitted");
    doc.decode().map_err(ApiError::backend("admission failed"))
}

/// Patients de l'hôpital de l'appelant, admission la plus récente d'abord
pub fn list_patients(store: &dyn DocumentStore, session: &Session) -> Result<Vec<PatientRecord>, ApiError> {
    let hospital_id = session.staff_hospital()?;
    let query = StoreQuery::new()
        .where_eq("assignedHospital", hospital_id)
        .order_by("admissionDate", Direction::Desc);
    store
        .query(Collection::Patients, &query)
        .and_then(|docs| docs.iter().map(|doc| doc.decode()).collect())
        .map_err(ApiError::backend("patient lookup failed"))
}

/// Charge un dossier en vérifiant qu'il appartient à l'hôpital de l'appelant
fn load_for_staff(store: &dyn DocumentStore, session: &Session, patient_id: &str) -> Result<PatientRecord, ApiError> {
    let hospital_id = session.staff_hospital()?;
    let record: PatientRecord = store
        .get(Collection::Patients, patient_id)
        .and_then(|doc| doc.map(|d| d.decode()).transpose())
        .map_err(ApiError::backend("patient lookup failed"))?
        .ok_or_else(|| ApiError::NotFound(format!("patient {patient_id}")))?;

    session.require(record.assigned_hospital == hospital_id)?;
    Ok(record)
}

fn write_fields(
    store: &dyn DocumentStore,
    patient_id: &str,
    fields: serde_json::Map<String, serde_json::Value>,
) -> Result<PatientRecord, ApiError> {
    let doc = store
        .update(Collection::Patients, patient_id, fields)
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::NotFound(format!("patient {patient_id}")),
            other => ApiError::backend("update failed")(other),
        })?;
    doc.decode().map_err(ApiError::backend("update failed"))
}

pub fn append_treatment_log(
    store: &dyn DocumentStore,
    session: &Session,
    patient_id: &str,
    note: &str,
    now: OffsetDateTime,
) -> Result<PatientRecord, ApiError> {
    let note = note.trim();
    if note.is_empty() {
        let mut v = Violations::new();
        v.push("note", "Note cannot be empty.");
        v.finish()?;
    }

    let mut record = load_for_staff(store, session, patient_id)?;
    record.treatment_logs.push(TreatmentLog {
        note: note.to_string(),
        timestamp: now,
    });

    let fields = to_fields(&LogsPatch { treatment_logs: &record.treatment_logs })
        .map_err(ApiError::backend("update failed"))?;
    let updated = write_fields(store, patient_id, fields)?;
    tracing::debug!(patient = patient_id, logs = updated.treatment_logs.len(), "treatment log appended");
    Ok(updated)
}

pub fn set_patient_status(
    store: &dyn DocumentStore,
    session: &Session,
    patient_id: &str,
    status: PatientStatus,
) -> Result<PatientRecord, ApiError> {
    load_for_staff(store, session, patient_id)?;

    let mut fields = serde_json::Map::new();
    fields.insert("status".into(), serde_json::json!(status));
    let updated = write_fields(store, patient_id, fields)?;
    tracing::info!(patient = patient_id, ?status, "patient status changed");
    Ok(updated)
}
