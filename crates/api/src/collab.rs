//! External collaborator contracts: payment gateway and blob storage.
//!
//! The server talks to both through traits so tests (and the default binary)
//! can run against in-memory implementations.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use common::{Money, OrderId};
use domain::PaymentConfirmation;
use thiserror::Error;

/// Payment gateway failures.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway rejected the charge.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The gateway could not be reached.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Charges and refunds against an external payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the order amount, returning the gateway's confirmation.
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentConfirmation, PaymentError>;

    /// Refunds a previously confirmed transaction.
    async fn refund(&self, transaction_id: &str) -> Result<(), PaymentError>;
}

/// In-memory payment gateway issuing sequential transaction ids.
#[derive(Debug, Default)]
pub struct InMemoryPaymentGateway {
    sequence: AtomicU64,
    fail_on_charge: AtomicBool,
    refunded: Mutex<Vec<String>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent charge fail, for exercising rejection paths.
    pub fn fail_on_charge(&self, fail: bool) {
        self.fail_on_charge.store(fail, Ordering::SeqCst);
    }

    /// Transaction ids refunded so far.
    pub fn refunded(&self) -> Vec<String> {
        self.refunded.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentConfirmation, PaymentError> {
        if self.fail_on_charge.load(Ordering::SeqCst) {
            return Err(PaymentError::Declined(format!(
                "card declined for order {order_id}"
            )));
        }
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(%order_id, %amount, "charged");
        Ok(PaymentConfirmation {
            transaction_id: format!("TXN-{n:04}"),
        })
    }

    async fn refund(&self, transaction_id: &str) -> Result<(), PaymentError> {
        self.refunded
            .lock()
            .unwrap()
            .push(transaction_id.to_string());
        Ok(())
    }
}

/// Blob store failures.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob upload failed: {0}")]
    Upload(String),
}

/// Observer invoked with cumulative bytes written during an upload.
pub type ProgressObserver<'a> = &'a (dyn Fn(usize) + Send + Sync);

/// Stores opaque blobs (driver photos) and returns a stable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `bytes`, optionally reporting progress, and returns the URL
    /// the blob is reachable at.
    async fn put(
        &self,
        bytes: &[u8],
        progress: Option<ProgressObserver<'_>>,
    ) -> Result<String, BlobError>;
}

/// In-memory blob store keeping uploads in a vector.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<Vec<(String, Vec<u8>)>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs stored so far.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        bytes: &[u8],
        progress: Option<ProgressObserver<'_>>,
    ) -> Result<String, BlobError> {
        if let Some(progress) = progress {
            progress(bytes.len());
        }
        let url = format!("blob://{}", uuid::Uuid::new_v4());
        self.blobs
            .lock()
            .unwrap()
            .push((url.clone(), bytes.to_vec()));
        Ok(url)
    }
}
