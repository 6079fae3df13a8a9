/*!
# HospConnect DevKit - Outils de test de l'API

Bibliothèque facilitant les tests de bout en bout du service avec:
- Serveur HTTP lancé sur un port éphémère, store en mémoire
- Client reqwest avec identité optionnelle (en-tête x-user-id)
- Constructeurs de payloads (lits, plaintes, avis, admissions)
*/

pub mod fixtures;
pub mod test_utils;

pub use fixtures::{BedPayloadBuilder, PayloadBuilder};
pub use test_utils::{ApiResponse, TestHarness};
