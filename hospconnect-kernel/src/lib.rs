//! HospConnect : disponibilité des lits hospitaliers, recherche d'hôpitaux,
//! plaintes et avis des patients, dossiers d'admission et annonces.
//!
//! Le binaire `hospconnect-kernel` sert l'API REST ; la bibliothèque est
//! réutilisée par le devkit pour les tests de bout en bout.

pub mod accounts;
pub mod announcements;
pub mod beds;
pub mod config;
pub mod error;
pub mod health;
pub mod hospitals;
pub mod http;
pub mod models;
pub mod patients;
pub mod search;
pub mod seed;
pub mod session;
pub mod store;
pub mod submissions;

pub use error::{ApiError, FieldError};
pub use http::{build_router, AppState};
pub use store::{DocumentStore, JsonStore};
