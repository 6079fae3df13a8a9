use hospconnect_kernel::models::{BedAvailability, BedCategory};
use serde_json::{json, Value};

/// Construit le corps d'un PUT /hospitals/{id}/beds à partir d'un état connu
#[derive(Debug, Clone)]
pub struct BedPayloadBuilder {
    beds: Value,
}

impl BedPayloadBuilder {
    /// Part de la structure actuelle, à modifier catégorie par catégorie
    pub fn from_current(beds: &BedAvailability) -> Self {
        let mut map = serde_json::Map::new();
        for (category, count) in beds.iter() {
            map.insert(
                category.to_string(),
                json!({ "available": count.available, "total": count.total }),
            );
        }
        Self { beds: Value::Object(map) }
    }

    /// Valeurs brutes : nombres, chaînes numériques ou déchets
    pub fn set(mut self, category: BedCategory, available: impl Into<Value>, total: impl Into<Value>) -> Self {
        self.beds[category.as_str()] = json!({ "available": available.into(), "total": total.into() });
        self
    }

    pub fn build(self) -> Value {
        self.beds
    }
}

/// Helper pour créer des corps de requête conformes aux formulaires
pub struct PayloadBuilder;

impl PayloadBuilder {
    pub fn complaint<S: Into<String>>(issue: S, hospital_id: Option<&str>) -> Value {
        json!({
            "issue": issue.into(),
            "hospitalId": hospital_id,
        })
    }

    pub fn anonymous_complaint<S: Into<String>>(issue: S, name: S, email: S, contact_permission: bool) -> Value {
        json!({
            "issue": issue.into(),
            "submitterName": name.into(),
            "submitterEmail": email.into(),
            "contactPermission": contact_permission,
        })
    }

    pub fn feedback<S: Into<String>>(hospital_id: S, rating: u8, comment: S) -> Value {
        json!({
            "hospitalId": hospital_id.into(),
            "rating": rating,
            "comment": comment.into(),
        })
    }

    pub fn admission<S: Into<String>>(patient_name: S, reason: S, bed_type: BedCategory) -> Value {
        json!({
            "patientName": patient_name.into(),
            "reason": reason.into(),
            "bedType": bed_type.as_str(),
        })
    }

    pub fn announcement<S: Into<String>>(title: S, content: S) -> Value {
        json!({
            "title": title.into(),
            "content": content.into(),
            "targetAudience": "all_hospitals",
        })
    }

    pub fn registration<S: Into<String>>(name: S, email: S, role: &str, hospital_name: Option<&str>) -> Value {
        json!({
            "name": name.into(),
            "email": email.into(),
            "role": role,
            "hospitalName": hospital_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospconnect_kernel::models::BedCount;

    #[test]
    fn test_bed_builder_overrides_one_category() {
        let current = BedAvailability {
            icu: BedCount::new(5, 20),
            ..Default::default()
        };
        let body = BedPayloadBuilder::from_current(&current)
            .set(BedCategory::Icu, 7, 20)
            .build();
        assert_eq!(body["icu"], json!({ "available": 7, "total": 20 }));
        assert_eq!(body["general"], json!({ "available": 0, "total": 0 }));
    }

    #[test]
    fn test_complaint_without_hospital_sends_null() {
        let body = PayloadBuilder::complaint("x".repeat(25), None);
        assert_eq!(body["hospitalId"], Value::Null);
    }
}
