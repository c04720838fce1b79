use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use super::StoreError;
use crate::models::Validate;

/// A stored record together with its identifier.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Document<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug)]
struct Inner<T> {
    docs: HashMap<String, T>,
    order: Vec<String>,
}

/// In-memory document collection with CRUD semantics.
///
/// Listing returns documents in insertion order.
#[derive(Debug)]
pub struct Collection<T> {
    name: &'static str,
    inner: RwLock<Inner<T>>,
}

impl<T> Collection<T>
where
    T: Validate + Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(Inner {
                docs: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Validate and store `body` under a fresh id.
    pub fn insert(&self, body: T) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        self.insert_with_id(id.clone(), body)?;
        Ok(id)
    }

    pub fn insert_with_id(&self, id: impl Into<String>, body: T) -> Result<(), StoreError> {
        body.validate()?;
        let id = id.into();
        let mut inner = self.write();
        if inner.docs.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                collection: self.name,
                id,
            });
        }
        inner.order.push(id.clone());
        inner.docs.insert(id.clone(), body);
        debug!(collection = self.name, %id, "inserted document");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Document<T>> {
        self.read().docs.get(id).map(|body| Document {
            id: id.to_string(),
            body: body.clone(),
        })
    }

    pub fn list(&self) -> Vec<Document<T>> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| {
                inner.docs.get(id).map(|body| Document {
                    id: id.clone(),
                    body: body.clone(),
                })
            })
            .collect()
    }

    /// Documents whose body satisfies `predicate`, in insertion order.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Vec<Document<T>> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| {
                inner
                    .docs
                    .get(id)
                    .filter(|body| predicate(body))
                    .map(|body| Document {
                        id: id.clone(),
                        body: body.clone(),
                    })
            })
            .collect()
    }

    /// Replace the document stored under `id`.
    pub fn update(&self, id: &str, body: T) -> Result<(), StoreError> {
        body.validate()?;
        let mut inner = self.write();
        match inner.docs.get_mut(id) {
            Some(existing) => {
                *existing = body;
                debug!(collection = self.name, %id, "updated document");
                Ok(())
            }
            None => Err(self.not_found(id)),
        }
    }

    pub fn delete(&self, id: &str) -> Result<T, StoreError> {
        let mut inner = self.write();
        let removed = inner.docs.remove(id).ok_or_else(|| self.not_found(id))?;
        inner.order.retain(|existing| existing != id);
        debug!(collection = self.name, %id, "deleted document");
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn not_found(&self, id: &str) -> StoreError {
        StoreError::NotFound {
            collection: self.name,
            id: id.to_string(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
