/**
 * API REST HOSPCONNECT - Serveur HTTP du service
 *
 * RÔLE :
 * Expose hôpitaux, lits, plaintes, avis, dossiers patients, annonces et
 * comptes. Chaque handler reçoit la session explicitement (extracteur)
 * et délègue aux modules métier, qui parlent au Record Store.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, réponses JSON, erreurs via ApiError
 * - Session : en-tête x-user-id résolu dans "users" (401 si inconnu)
 * - Créations en 201, validations en 422 avec la liste des champs
 * - Middleware de log : méthode, chemin, statut, durée
 *
 * ROUTES :
 * - /health, /system/health
 * - /hospitals (+ /specialties, /markers, /{id}, /{id}/beds)
 * - /complaints, /feedback, /patients, /announcements
 * - /register, /session
 */

use crate::accounts::{register_user, RegistrationForm, SessionView};
use crate::announcements::{create_announcement, list_announcements, AnnouncementForm};
use crate::beds::{validate_beds, BedAvailabilityInput};
use crate::error::ApiError;
use crate::health::{HealthTracker, KernelHealth};
use crate::hospitals::{
    get_hospital, list_hospitals, map_markers, update_bed_availability, HospitalSummary, MapMarker,
};
use crate::models::{Announcement, Complaint, Feedback, PatientRecord, UserProfile};
use crate::patients::{
    admit_patient, append_treatment_log, list_patients, set_patient_status, AdmissionForm,
    PatientStatusChange, TreatmentNote,
};
use crate::search::{all_specialties, filter_hospitals, HospitalFilter, SearchParams};
use crate::session::{MaybeSession, Session, USER_HEADER};
use crate::store::DocumentStore;
use crate::submissions::{
    list_my_complaints, list_my_feedback, set_complaint_status, submit_complaint, submit_feedback,
    ComplaintForm, FeedbackForm, StatusChange,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub health: HealthTracker,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, persistent: bool) -> Self {
        Self {
            store,
            health: HealthTracker::new(persistent),
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;
type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/hospitals", get(search_hospitals))
        .route("/hospitals/specialties", get(get_specialties))
        .route("/hospitals/markers", get(get_markers))
        .route("/hospitals/{id}", get(get_hospital_detail))
        .route("/hospitals/{id}/beds", put(put_beds))
        .route("/complaints", post(post_complaint))
        .route("/complaints/mine", get(get_my_complaints))
        .route("/complaints/{id}/status", put(put_complaint_status))
        .route("/feedback", post(post_feedback))
        .route("/feedback/mine", get(get_my_feedback))
        .route("/patients", post(post_patient).get(get_patients))
        .route("/patients/{id}/logs", post(post_treatment_log))
        .route("/patients/{id}/status", put(put_patient_status))
        .route("/announcements", post(post_announcement).get(get_announcements))
        .route("/register", post(post_register))
        .route("/session", get(get_session))
        .with_state(app_state)
        .layer(middleware::from_fn(log_requests))
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> ApiResult<KernelHealth> {
    app.health
        .get_health(app.store.as_ref())
        .map(Json)
        .map_err(ApiError::backend("health check failed"))
}

// ============ HÔPITAUX ============

// GET /hospitals?query=&specialty=&bed=&location=&emergency=
async fn search_hospitals(
    State(app): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Vec<HospitalSummary>> {
    let Query(params) = params?;
    let filter = HospitalFilter::try_from(params)?;
    let hospitals = list_hospitals(app.store.as_ref()).map_err(ApiError::backend("hospital lookup failed"))?;
    let list = filter_hospitals(&hospitals, &filter)
        .into_iter()
        .cloned()
        .map(HospitalSummary::from)
        .collect();
    Ok(Json(list))
}

async fn get_specialties(State(app): State<AppState>) -> ApiResult<Vec<String>> {
    let hospitals = list_hospitals(app.store.as_ref()).map_err(ApiError::backend("hospital lookup failed"))?;
    Ok(Json(all_specialties(&hospitals)))
}

async fn get_markers(State(app): State<AppState>) -> ApiResult<Vec<MapMarker>> {
    let hospitals = list_hospitals(app.store.as_ref()).map_err(ApiError::backend("hospital lookup failed"))?;
    Ok(Json(map_markers(&hospitals)))
}

async fn get_hospital_detail(State(app): State<AppState>, Path(id): Path<String>) -> ApiResult<HospitalSummary> {
    get_hospital(app.store.as_ref(), &id)
        .map_err(ApiError::backend("hospital lookup failed"))?
        .map(|h| Json(HospitalSummary::from(h)))
        .ok_or_else(|| ApiError::NotFound(format!("hospital {id}")))
}

// PUT /hospitals/{id}/beds : structure complète, jamais de patch partiel
async fn put_beds(
    State(app): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Result<Json<BedAvailabilityInput>, JsonRejection>,
) -> ApiResult<HospitalSummary> {
    session.require(session.can_manage_hospital(&id))?;
    let Json(input) = payload?;
    let beds = validate_beds(&input)?;
    let hospital = update_bed_availability(app.store.as_ref(), &session, &id, &beds, now())?;
    Ok(Json(HospitalSummary::from(hospital)))
}

// ============ PLAINTES & AVIS ============

async fn post_complaint(
    State(app): State<AppState>,
    MaybeSession(session): MaybeSession,
    payload: Result<Json<ComplaintForm>, JsonRejection>,
) -> Created<Complaint> {
    let Json(form) = payload?;
    let complaint = submit_complaint(app.store.as_ref(), session.as_ref(), &form, now())?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

async fn get_my_complaints(State(app): State<AppState>, session: Session) -> ApiResult<Vec<Complaint>> {
    list_my_complaints(app.store.as_ref(), &session)
        .map(Json)
        .map_err(ApiError::backend("complaint lookup failed"))
}

async fn put_complaint_status(
    State(app): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult<Complaint> {
    let Json(change) = payload?;
    set_complaint_status(app.store.as_ref(), &session, &id, change.status).map(Json)
}

async fn post_feedback(
    State(app): State<AppState>,
    MaybeSession(session): MaybeSession,
    payload: Result<Json<FeedbackForm>, JsonRejection>,
) -> Created<Feedback> {
    let Json(form) = payload?;
    let feedback = submit_feedback(app.store.as_ref(), session.as_ref(), &form, now())?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

async fn get_my_feedback(State(app): State<AppState>, session: Session) -> ApiResult<Vec<Feedback>> {
    list_my_feedback(app.store.as_ref(), &session)
        .map(Json)
        .map_err(ApiError::backend("feedback lookup failed"))
}

// ============ PATIENTS ============

async fn post_patient(
    State(app): State<AppState>,
    session: Session,
    payload: Result<Json<AdmissionForm>, JsonRejection>,
) -> Created<PatientRecord> {
    let Json(form) = payload?;
    let record = admit_patient(app.store.as_ref(), &session, &form, now())?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_patients(State(app): State<AppState>, session: Session) -> ApiResult<Vec<PatientRecord>> {
    list_patients(app.store.as_ref(), &session).map(Json)
}

async fn post_treatment_log(
    State(app): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Result<Json<TreatmentNote>, JsonRejection>,
) -> ApiResult<PatientRecord> {
    let Json(note) = payload?;
    append_treatment_log(app.store.as_ref(), &session, &id, &note.note, now()).map(Json)
}

async fn put_patient_status(
    State(app): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Result<Json<PatientStatusChange>, JsonRejection>,
) -> ApiResult<PatientRecord> {
    let Json(change) = payload?;
    set_patient_status(app.store.as_ref(), &session, &id, change.status).map(Json)
}

// ============ ANNONCES ============

async fn post_announcement(
    State(app): State<AppState>,
    session: Session,
    payload: Result<Json<AnnouncementForm>, JsonRejection>,
) -> Created<Announcement> {
    let Json(form) = payload?;
    let announcement = create_announcement(app.store.as_ref(), &session, &form, now())?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

async fn get_announcements(State(app): State<AppState>, session: Session) -> ApiResult<Vec<Announcement>> {
    list_announcements(app.store.as_ref(), &session).map(Json)
}

// ============ COMPTES ============

// POST /register : l'en-tête x-user-id, s'il est fourni, devient l'uid du profil
async fn post_register(
    State(app): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> Created<UserProfile> {
    let Json(form) = payload?;
    let uid = headers.get(USER_HEADER).and_then(|v| v.to_str().ok());
    let profile = register_user(app.store.as_ref(), uid, &form, now())?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn get_session(session: Session) -> Json<SessionView> {
    Json(SessionView::from(session))
}
