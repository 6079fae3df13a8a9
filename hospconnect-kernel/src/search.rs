/**
 * RECHERCHE - Filtrage de la liste des hôpitaux
 *
 * RÔLE :
 * Fonction pure sur la liste complète : nom, spécialité, type de lit
 * disponible, adresse, urgences. Pas de pagination, ordre d'insertion
 * conservé.
 *
 * PARAMÈTRES :
 * Les valeurs sentinelles du formulaire de recherche (_all_specialties_,
 * _any_bed_type_, _any_emergency_) et les chaînes vides signifient
 * "pas de filtre".
 */

use crate::error::ApiError;
use crate::models::{BedCategory, Hospital};
use serde::Deserialize;
use std::collections::BTreeSet;

pub const ALL_SPECIALTIES: &str = "_all_specialties_";
pub const ANY_BED_TYPE: &str = "_any_bed_type_";
pub const ANY_EMERGENCY: &str = "_any_emergency_";

/// Paramètres bruts de la query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub specialty: Option<String>,
    pub bed: Option<String>,
    pub location: Option<String>,
    pub emergency: Option<String>,
}

/// Filtre typé ; None = critère ignoré
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HospitalFilter {
    /// Sous-chaîne du nom, déjà en minuscules
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub bed: Option<BedCategory>,
    /// Sous-chaîne de l'adresse, déjà en minuscules
    pub location: Option<String>,
    pub emergency: Option<bool>,
}

fn meaningful(value: Option<String>, sentinel: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && Some(v.as_str()) != sentinel)
}

impl TryFrom<SearchParams> for HospitalFilter {
    type Error = ApiError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let bed = meaningful(params.bed, Some(ANY_BED_TYPE))
            .map(|b| b.parse::<BedCategory>())
            .transpose()
            .map_err(ApiError::BadRequest)?;

        let emergency = match meaningful(params.emergency, Some(ANY_EMERGENCY)).as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(ApiError::BadRequest(format!("unknown emergency filter: {other}")))
            }
        };

        Ok(HospitalFilter {
            name: meaningful(params.query, None).map(|q| q.to_lowercase()),
            specialty: meaningful(params.specialty, Some(ALL_SPECIALTIES)),
            bed,
            location: meaningful(params.location, None).map(|l| l.to_lowercase()),
            emergency,
        })
    }
}

impl HospitalFilter {
    pub fn matches(&self, hospital: &Hospital) -> bool {
        if let Some(name) = &self.name {
            if !hospital.name.to_lowercase().contains(name) {
                return false;
            }
        }
        if let Some(specialty) = &self.specialty {
            if !hospital.specialties.iter().any(|s| s == specialty) {
                return false;
            }
        }
        if let Some(bed) = self.bed {
            if hospital.beds.get(bed).available == 0 {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !hospital.location.address.to_lowercase().contains(location) {
                return false;
            }
        }
        if let Some(emergency) = self.emergency {
            // absent = pas de service d'urgence déclaré
            if hospital.emergency_available.unwrap_or(false) != emergency {
                return false;
            }
        }
        true
    }
}

pub fn filter_hospitals<'a>(hospitals: &'a [Hospital], filter: &HospitalFilter) -> Vec<&'a Hospital> {
    hospitals.iter().filter(|h| filter.matches(h)).collect()
}

/// Spécialités distinctes, triées, pour la liste déroulante
pub fn all_specialties(hospitals: &[Hospital]) -> Vec<String> {
    hospitals
        .iter()
        .flat_map(|h| h.specialties.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
