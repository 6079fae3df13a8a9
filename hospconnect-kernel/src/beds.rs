/**
 * VALIDATEUR DE LITS - Contrôle des saisies de disponibilité
 *
 * RÔLE :
 * Transforme les quatre paires (disponibles, total) saisies par l'opérateur
 * en BedAvailability typée, ou renvoie une erreur par champ fautif.
 *
 * RÈGLES :
 * - Valeurs numériques entières et positives (les chaînes numériques des
 *   champs de formulaire sont converties, une chaîne vide vaut 0)
 * - available <= total pour chaque catégorie (erreur portée sur "available")
 * - available == total et 0/0 sont valides
 * - Toutes les violations sont remontées, pas seulement la première
 */

use crate::error::{FieldError, Violations};
use crate::models::{BedAvailability, BedCategory, BedCount};
use serde::Deserialize;
use serde_json::Value;

pub const MSG_NOT_A_NUMBER: &str = "Expected a number";
pub const MSG_NEGATIVE: &str = "Cannot be negative";
pub const MSG_NOT_INTEGER: &str = "Must be an integer";
pub const MSG_TOO_LARGE: &str = "Value is too large";
pub const MSG_EXCEEDS_TOTAL: &str = "Available beds cannot exceed total beds";

/// Saisie brute d'une catégorie, telle que reçue du formulaire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BedPairInput {
    #[serde(default)]
    pub available: Value,
    #[serde(default)]
    pub total: Value,
}

impl BedPairInput {
    pub fn new(available: impl Into<Value>, total: impl Into<Value>) -> Self {
        Self {
            available: available.into(),
            total: total.into(),
        }
    }
}

/// Saisie brute des quatre catégories
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BedAvailabilityInput {
    #[serde(default)]
    pub icu: BedPairInput,
    #[serde(default)]
    pub oxygen: BedPairInput,
    #[serde(default)]
    pub ventilator: BedPairInput,
    #[serde(default)]
    pub general: BedPairInput,
}

impl BedAvailabilityInput {
    fn pair(&self, category: BedCategory) -> &BedPairInput {
        match category {
            BedCategory::Icu => &self.icu,
            BedCategory::Oxygen => &self.oxygen,
            BedCategory::Ventilator => &self.ventilator,
            BedCategory::General => &self.general,
        }
    }
}

impl From<BedAvailability> for BedAvailabilityInput {
    fn from(beds: BedAvailability) -> Self {
        let pair = |c: BedCount| BedPairInput::new(c.available, c.total);
        Self {
            icu: pair(beds.icu),
            oxygen: pair(beds.oxygen),
            ventilator: pair(beds.ventilator),
            general: pair(beds.general),
        }
    }
}

/// Conversion d'une valeur de formulaire en nombre ; null ou absent n'est pas 0
fn coerce(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn check_count(field: &str, value: &Value, violations: &mut Violations) -> Option<u32> {
    let Some(n) = coerce(value) else {
        violations.push(field, MSG_NOT_A_NUMBER);
        return None;
    };
    if n < 0.0 {
        violations.push(field, MSG_NEGATIVE);
        return None;
    }
    if n.fract() != 0.0 {
        violations.push(field, MSG_NOT_INTEGER);
        return None;
    }
    if n > f64::from(u32::MAX) {
        violations.push(field, MSG_TOO_LARGE);
        return None;
    }
    Some(n as u32)
}

fn check_pair(category: BedCategory, input: &BedPairInput, violations: &mut Violations) -> Option<BedCount> {
    let available_field = format!("{category}.available");
    let total_field = format!("{category}.total");

    let available = check_count(&available_field, &input.available, violations);
    let total = check_count(&total_field, &input.total, violations);
    let (available, total) = (available?, total?);

    if available > total {
        violations.push(&available_field, MSG_EXCEEDS_TOTAL);
        return None;
    }
    Some(BedCount::new(available, total))
}

/// Valide une saisie complète ; renvoie la structure typée ou les erreurs par champ
pub fn validate_beds(input: &BedAvailabilityInput) -> Result<BedAvailability, Vec<FieldError>> {
    let mut violations = Violations::new();
    let [icu, oxygen, ventilator, general] =
        BedCategory::ALL.map(|c| check_pair(c, input.pair(c), &mut violations));

    match (icu, oxygen, ventilator, general) {
        (Some(icu), Some(oxygen), Some(ventilator), Some(general)) if violations.is_empty() => {
            Ok(BedAvailability { icu, oxygen, ventilator, general })
        }
        _ => Err(violations.into_inner()),
    }
}

/// Vérifie l'invariant 0 <= available <= total sur une structure déjà typée
pub fn check_invariant(beds: &BedAvailability) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = beds
        .iter()
        .filter(|(_, count)| count.available > count.total)
        .map(|(category, _)| FieldError::new(format!("{category}.available"), MSG_EXCEEDS_TOTAL))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
