/**
 * JSON STORE - Implémentation fichier du Record Store
 *
 * RÔLE :
 * Stockage des collections HospConnect en fichiers JSON (un fichier par
 * collection) avec cache mémoire, ou purement en mémoire pour les tests.
 *
 * FONCTIONNEMENT :
 * - Chargement de {data_dir}/{collection}.json au démarrage
 * - Chaque écriture prépare la nouvelle version de la collection, la
 *   persiste, puis seulement ensuite la publie dans le cache
 * - Auto-génération des identifiants (UUID v4)
 */

use super::{Collection, Document, DocumentStore, StoreError, StoreQuery};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Collection partagée entre les requêtes
type Shared<T> = Arc<Mutex<T>>;

pub struct JsonStore {
    /// Dossier de persistance (None = mémoire uniquement)
    data_dir: Option<PathBuf>,
    /// Cache mémoire par collection, dans l'ordre d'insertion
    collections: HashMap<Collection, Shared<Vec<Document>>>,
}

impl JsonStore {
    /// Store volatile, sans fichier
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            collections: Collection::ALL
                .iter()
                .map(|c| (*c, Arc::new(Mutex::new(Vec::new()))))
                .collect(),
        }
    }

    /// Ouvre (ou crée) un store persistant dans le dossier donné
    pub fn open<P: Into<PathBuf>>(data_dir: P) -> Result<Self, StoreError> {
        let dir = data_dir.into();
        fs::create_dir_all(&dir)?;

        let mut store = Self::in_memory();
        store.data_dir = Some(dir.clone());
        for collection in Collection::ALL {
            store.load_from_disk(collection)?;
        }

        tracing::info!(path = %dir.display(), "record store opened");
        Ok(store)
    }

    fn file_for(&self, collection: Collection) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", collection.as_str())))
    }

    /// Charge une collection depuis son fichier JSON vers le cache
    fn load_from_disk(&self, collection: Collection) -> Result<(), StoreError> {
        let Some(path) = self.file_for(collection) else {
            return Ok(());
        };
        if !path.exists() {
            fs::write(&path, "[]")?;
        }

        let content = fs::read_to_string(&path)?;
        let docs: Vec<Document> = serde_json::from_str(&content)?;
        tracing::debug!(%collection, count = docs.len(), "collection loaded");
        *self.cache(collection).lock() = docs;
        Ok(())
    }

    /// Sauvegarde une version complète de la collection
    fn save_to_disk(&self, collection: Collection, docs: &[Document]) -> Result<(), StoreError> {
        if let Some(path) = self.file_for(collection) {
            let json = serde_json::to_string_pretty(docs)?;
            fs::write(path, json)?;
        }
        Ok(())
    }

    fn cache(&self, collection: Collection) -> &Shared<Vec<Document>> {
        // toutes les collections sont créées par in_memory()
        &self.collections[&collection]
    }

    /// Applique une mutation sur une copie, persiste, puis publie
    fn mutate<R>(
        &self,
        collection: Collection,
        apply: impl FnOnce(&mut Vec<Document>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut cache = self.cache(collection).lock();
        let mut next = cache.clone();
        let result = apply(&mut next)?;
        self.save_to_disk(collection, &next)?;
        *cache = next;
        Ok(result)
    }
}

fn ensure_object(data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(
            "document data must be a JSON object".into(),
        ))
    }
}

impl DocumentStore for JsonStore {
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let cache = self.cache(collection).lock();
        Ok(cache.iter().find(|doc| doc.id == id).cloned())
    }

    fn add(&self, collection: Collection, data: Value) -> Result<Document, StoreError> {
        ensure_object(&data)?;
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            created_at: OffsetDateTime::now_utc(),
            data,
        };

        let created = doc.clone();
        self.mutate(collection, move |docs| {
            docs.push(doc);
            Ok(())
        })?;
        tracing::debug!(%collection, id = %created.id, "document added");
        Ok(created)
    }

    fn set(&self, collection: Collection, id: &str, data: Value) -> Result<Document, StoreError> {
        ensure_object(&data)?;
        self.mutate(collection, |docs| {
            if let Some(existing) = docs.iter_mut().find(|doc| doc.id == id) {
                existing.data = data;
                return Ok(existing.clone());
            }
            let doc = Document {
                id: id.to_string(),
                created_at: OffsetDateTime::now_utc(),
                data,
            };
            docs.push(doc.clone());
            Ok(doc)
        })
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        self.mutate(collection, |docs| {
            let doc = docs
                .iter_mut()
                .find(|doc| doc.id == id)
                .ok_or_else(|| StoreError::NotFound {
                    collection,
                    id: id.to_string(),
                })?;
            let Value::Object(map) = &mut doc.data else {
                return Err(StoreError::InvalidDocument(format!("{id} is not a JSON object")));
            };
            map.extend(fields);
            Ok(doc.clone())
        })
    }

    fn query(&self, collection: Collection, query: &StoreQuery) -> Result<Vec<Document>, StoreError> {
        let cache = self.cache(collection).lock();
        Ok(query.apply(cache.iter()))
    }

    fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        Ok(self.cache(collection).lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Direction;
    use serde_json::json;

    #[test]
    fn test_add_get_and_update_merge() {
        let store = JsonStore::in_memory();
        let doc = store
            .add(Collection::Hospitals, json!({"name": "City General", "rating": 4.5}))
            .unwrap();

        let mut fields = Map::new();
        fields.insert("rating".into(), json!(4.8));
        let updated = store.update(Collection::Hospitals, &doc.id, fields).unwrap();

        assert_eq!(updated.data["name"], "City General");
        assert_eq!(updated.data["rating"], 4.8);
        assert_eq!(updated.created_at, doc.created_at);
        assert_eq!(store.get(Collection::Hospitals, &doc.id).unwrap(), Some(updated));
    }

    #[test]
    fn test_update_unknown_document_is_not_found() {
        let store = JsonStore::in_memory();
        let err = store.update(Collection::Hospitals, "nope", Map::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_rejects_non_object_data() {
        let store = JsonStore::in_memory();
        assert!(store.add(Collection::Feedback, json!([1, 2])).is_err());
        assert_eq!(store.count(Collection::Feedback).unwrap(), 0);
    }

    #[test]
    fn test_set_replaces_whole_document() {
        let store = JsonStore::in_memory();
        store.set(Collection::Users, "u1", json!({"name": "A", "role": "patient"})).unwrap();
        let replaced = store.set(Collection::Users, "u1", json!({"name": "B"})).unwrap();
        assert_eq!(replaced.data, json!({"name": "B"}));
        assert_eq!(store.count(Collection::Users).unwrap(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonStore::open(dir.path()).unwrap();
            store.add(Collection::Complaints, json!({"issue": "first", "createdAt": "2024-01-01T00:00:00Z"})).unwrap();
            store.add(Collection::Complaints, json!({"issue": "second", "createdAt": "2024-01-02T00:00:00Z"})).unwrap();
        }

        let reopened = JsonStore::open(dir.path()).unwrap();
        let docs = reopened
            .query(
                Collection::Complaints,
                &StoreQuery::new().order_by("createdAt", Direction::Desc),
            )
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].data["issue"], "second");
        assert!(dir.path().join("hospitals.json").exists());
    }
}
