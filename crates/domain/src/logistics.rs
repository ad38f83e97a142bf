//! Administratively managed delivery resources (driver + vehicle).

use common::LogisticId;
use serde::{Deserialize, Serialize};
use store::{DocumentStore, StoreError};

use crate::codec::{decode, encode};
use crate::error::{DomainError, Result};
use crate::stock::MAX_CAS_RETRIES;

/// Collection holding logistic documents.
pub const LOGISTICS_COLLECTION: &str = "logistics";

/// The kind of vehicle a logistic operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Truck,
    Van,
    Bike,
}

/// A delivery resource. Referenced by many orders over time; retired
/// administratively rather than deleted so historical references survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logistic {
    pub id: LogisticId,
    pub driver_name: String,
    pub vehicle_type: VehicleType,
    pub vehicle_registration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_photo: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Input for creating a logistic.
#[derive(Debug, Clone)]
pub struct NewLogistic {
    pub driver_name: String,
    pub vehicle_type: VehicleType,
    pub vehicle_registration: String,
    pub driver_photo: Option<String>,
}

/// Typed repository over the logistics collection.
#[derive(Clone)]
pub struct LogisticsRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> LogisticsRepository<S> {
    /// Creates a repository over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new delivery resource.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, new: NewLogistic) -> Result<Logistic> {
        if new.driver_name.trim().is_empty() {
            return Err(DomainError::Validation("driver name is required".to_string()));
        }
        if new.vehicle_registration.trim().is_empty() {
            return Err(DomainError::Validation(
                "vehicle registration is required".to_string(),
            ));
        }

        let logistic = Logistic {
            id: LogisticId::new(),
            driver_name: new.driver_name,
            vehicle_type: new.vehicle_type,
            vehicle_registration: new.vehicle_registration,
            driver_photo: new.driver_photo,
            active: true,
        };

        self.store
            .put_new(
                LOGISTICS_COLLECTION,
                &logistic.id.to_string(),
                encode(&logistic)?,
            )
            .await?;

        Ok(logistic)
    }

    /// Fetches a logistic by id.
    pub async fn get(&self, id: LogisticId) -> Result<Logistic> {
        let doc = self
            .store
            .get(LOGISTICS_COLLECTION, &id.to_string())
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "logistic",
                id: id.to_string(),
            })?;
        decode(&doc)
    }

    /// Lists all logistics, active first, then by driver name.
    pub async fn list(&self) -> Result<Vec<Logistic>> {
        let docs = self.store.list(LOGISTICS_COLLECTION).await?;
        let mut logistics = docs
            .iter()
            .map(decode::<Logistic>)
            .collect::<Result<Vec<_>>>()?;
        logistics.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then_with(|| a.driver_name.cmp(&b.driver_name))
        });
        Ok(logistics)
    }

    /// Takes a logistic out of rotation. Idempotent; past order references
    /// are untouched.
    #[tracing::instrument(skip(self))]
    pub async fn retire(&self, id: LogisticId) -> Result<Logistic> {
        let key = id.to_string();

        for _ in 0..MAX_CAS_RETRIES {
            let doc = self
                .store
                .get(LOGISTICS_COLLECTION, &key)
                .await?
                .ok_or_else(|| DomainError::NotFound {
                    entity: "logistic",
                    id: key.clone(),
                })?;
            let mut logistic: Logistic = decode(&doc)?;

            if !logistic.active {
                return Ok(logistic);
            }
            logistic.active = false;

            match self
                .store
                .update(LOGISTICS_COLLECTION, &key, doc.version, encode(&logistic)?)
                .await
            {
                Ok(_) => return Ok(logistic),
                Err(StoreError::ConcurrencyConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::Conflict(format!("logistics/{key}")))
    }
}
