/**
 * RECORD STORE - Base documentaire unifiée de HospConnect
 *
 * RÔLE :
 * Ce module définit l'interface de persistance commune à toutes les
 * opérations métier : hôpitaux, patients, avis, plaintes, utilisateurs,
 * annonces. Chaque collection contient des documents JSON adressés par un
 * identifiant opaque.
 *
 * FONCTIONNEMENT :
 * - DocumentStore trait = interface commune (get/add/set/update/query)
 * - Document = identifiant + horodatage de création + données JSON
 * - StoreQuery = filtres d'égalité + tri + limite (comme where/orderBy)
 * - Record trait = pont entre structs typées et documents schemaless
 *
 * GARANTIES :
 * - Une écriture = un document remplacé ou fusionné en une seule opération
 * - Aucune transaction multi-documents
 * - L'ordre d'insertion est conservé quand aucun tri n'est demandé
 */

pub mod json;

pub use json::JsonStore;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Erreurs possibles lors des opérations sur le Record Store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Collections connues du Record Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Hospitals,
    Patients,
    Feedback,
    Complaints,
    Users,
    Announcements,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Hospitals,
        Collection::Patients,
        Collection::Feedback,
        Collection::Complaints,
        Collection::Users,
        Collection::Announcements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Hospitals => "hospitals",
            Collection::Patients => "patients",
            Collection::Feedback => "feedback",
            Collection::Complaints => "complaints",
            Collection::Users => "users",
            Collection::Announcements => "announcements",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format standardisé des documents stockés dans toutes les collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifiant opaque, unique dans sa collection
    pub id: String,
    /// Horodatage de création attribué par le store
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Contenu du document (toujours un objet JSON)
    pub data: Value,
}

impl Document {
    /// Reconstruit une struct typée en réinjectant l'identifiant du document
    pub fn decode<T: Record>(&self) -> Result<T, StoreError> {
        let mut data = self.data.clone();
        match &mut data {
            Value::Object(map) => {
                map.insert(T::ID_FIELD.to_string(), Value::String(self.id.clone()));
            }
            _ => {
                return Err(StoreError::InvalidDocument(format!(
                    "{} is not a JSON object",
                    self.id
                )))
            }
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Lit un champ par chemin pointé (ex: "beds.icu.available")
    pub fn field(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.data, |current, part| current.as_object()?.get(part))
    }
}

/// Struct métier persistée dans une collection du store
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;
    /// Nom du champ qui porte l'identifiant du document
    const ID_FIELD: &'static str = "id";
}

/// Sérialise une struct typée en données de document (sans son identifiant)
pub fn encode<T: Record>(record: &T) -> Result<Value, StoreError> {
    let mut fields = to_fields(record)?;
    fields.remove(T::ID_FIELD);
    Ok(Value::Object(fields))
}

/// Sérialise une valeur en map de champs de premier niveau
pub fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Sens du tri d'une requête
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Requête standardisée : égalités, tri et limite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    /// Filtres d'égalité sur chemins pointés
    pub filters: Vec<(String, Value)>,
    /// Champ de tri et sens
    pub order_by: Option<(String, Direction)>,
    /// Nombre max de résultats
    pub limit: Option<usize>,
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Vérifie qu'un document satisfait tous les filtres
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| doc.field(field) == Some(expected))
    }

    /// Applique filtres, tri (stable) et limite sur une liste de documents
    pub fn apply<'a, I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut results: Vec<Document> = docs
            .into_iter()
            .filter(|doc| self.matches(doc))
            .cloned()
            .collect();

        if let Some((field, direction)) = &self.order_by {
            results.sort_by(|a, b| {
                let ord = compare_values(a.field(field), b.field(field));
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}

/// Ordre total sur des valeurs JSON hétérogènes ; les champs absents passent en premier
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            // les horodatages RFC 3339 n'ont pas une précision fixe
            match (
                OffsetDateTime::parse(x, &Rfc3339),
                OffsetDateTime::parse(y, &Rfc3339),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => type_rank(x).cmp(&type_rank(y)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Interface commune du Record Store
pub trait DocumentStore: Send + Sync {
    /// Lecture d'un document par identifiant
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Ajout d'un document avec identifiant généré
    fn add(&self, collection: Collection, data: Value) -> Result<Document, StoreError>;

    /// Création ou remplacement complet d'un document à identifiant connu
    fn set(&self, collection: Collection, id: &str, data: Value) -> Result<Document, StoreError>;

    /// Fusion de champs de premier niveau dans un document existant
    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Requête par prédicats sur une collection
    fn query(&self, collection: Collection, query: &StoreQuery) -> Result<Vec<Document>, StoreError>;

    /// Nombre de documents d'une collection
    fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        self.query(collection, &StoreQuery::new()).map(|docs| docs.len())
    }
}
