//! Order lifecycle operations: status transitions, payment recording, and
//! logistics assignment.

use common::{LogisticId, OrderId, Version};
use store::DocumentStore;

use crate::codec::{decode, encode};
use crate::error::{DomainError, Result};
use crate::logistics::LogisticsRepository;

use super::{ORDER_COLLECTION, Order, OrderStatus, PaymentStatus};

/// The opaque "payment confirmed" signal from the payment collaborator.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub transaction_id: String,
}

/// Service owning all mutations of persisted orders.
///
/// Every write is conditional on the version the order was read at; a lost
/// race surfaces [`DomainError::Conflict`] and leaves the order unchanged,
/// so the caller can re-read and retry.
#[derive(Clone)]
pub struct OrderService<S: DocumentStore + Clone> {
    store: S,
    logistics: LogisticsRepository<S>,
}

impl<S: DocumentStore + Clone> OrderService<S> {
    /// Creates an order service over the given store.
    pub fn new(store: S) -> Self {
        let logistics = LogisticsRepository::new(store.clone());
        Self { store, logistics }
    }

    /// Fetches an order by id.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        Ok(self.load(id).await?.0)
    }

    /// Moves an order to `requested` along the legal-edge table.
    ///
    /// Re-requesting the current status is an idempotent no-op. Any edge not
    /// in the table is rejected with [`DomainError::IllegalTransition`] and
    /// the order is left unchanged. No cascading side effects: an existing
    /// logistics assignment is untouched by a status change.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, id: OrderId, requested: OrderStatus) -> Result<Order> {
        let (mut order, version) = self.load(id).await?;

        if order.status == requested {
            return Ok(order);
        }
        if !order.status.can_transition_to(requested) {
            return Err(DomainError::IllegalTransition {
                from: order.status,
                to: requested,
            });
        }

        order.status = requested;
        self.save(&order, version).await?;

        metrics::counter!("order_status_transitions_total").increment(1);
        tracing::info!(order_id = %id, status = %requested, "order status updated");
        Ok(order)
    }

    /// Applies the payment collaborator's confirmation: the `pending -> paid`
    /// edge plus the transaction reference, in one conditional write.
    ///
    /// Redelivery of the same confirmation against an already-paid order is
    /// an idempotent no-op.
    #[tracing::instrument(skip(self, confirmation))]
    pub async fn record_payment(
        &self,
        id: OrderId,
        confirmation: PaymentConfirmation,
    ) -> Result<Order> {
        let (mut order, version) = self.load(id).await?;

        match order.status {
            OrderStatus::Pending => {}
            OrderStatus::Paid
                if order.payment.transaction_id.as_deref()
                    == Some(confirmation.transaction_id.as_str()) =>
            {
                return Ok(order);
            }
            from => {
                return Err(DomainError::IllegalTransition {
                    from,
                    to: OrderStatus::Paid,
                });
            }
        }

        order.status = OrderStatus::Paid;
        order.payment.transaction_id = Some(confirmation.transaction_id);
        order.payment.status = PaymentStatus::Confirmed;
        self.save(&order, version).await?;

        metrics::counter!("order_payments_recorded_total").increment(1);
        Ok(order)
    }

    /// Binds a delivery resource to an order, replacing any prior binding.
    ///
    /// Legal only while the order is paid (or a later pre-terminal status);
    /// not itself a status transition. No capacity limit: one logistic may
    /// serve many concurrently active orders.
    #[tracing::instrument(skip(self))]
    pub async fn assign_logistics(&self, id: OrderId, logistic_id: LogisticId) -> Result<Order> {
        let logistic = self.logistics.get(logistic_id).await?;
        if !logistic.active {
            return Err(DomainError::Precondition(format!(
                "logistic {logistic_id} is retired"
            )));
        }

        let (mut order, version) = self.load(id).await?;
        if !order.status.accepts_logistics() {
            let reason = if order.status == OrderStatus::Pending {
                "order not paid".to_string()
            } else {
                format!("order is {}", order.status)
            };
            return Err(DomainError::Precondition(reason));
        }

        order.logistics_ref = Some(logistic_id);
        self.save(&order, version).await?;

        metrics::counter!("logistics_assignments_total").increment(1);
        tracing::info!(order_id = %id, logistic_id = %logistic_id, "logistics assigned");
        Ok(order)
    }

    pub(crate) async fn load(&self, id: OrderId) -> Result<(Order, Version)> {
        let doc = self
            .store
            .get(ORDER_COLLECTION, &id.to_string())
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "order",
                id: id.to_string(),
            })?;
        Ok((decode(&doc)?, doc.version))
    }

    async fn save(&self, order: &Order, version: Version) -> Result<()> {
        self.store
            .update(
                ORDER_COLLECTION,
                &order.id.to_string(),
                version,
                encode(order)?,
            )
            .await?;
        Ok(())
    }
}
