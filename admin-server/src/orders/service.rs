//! OrderService - orchestration and atomic persistence
//!
//! Drives every order mutation through the same unit of work:
//!
//! ```text
//! execute(op)
//!     ├─ 1. Load current order (with revision)
//!     ├─ 2. Validate (state machine / engine rules)
//!     ├─ 3. Mutate the inventory ledger (timeout-bounded, retry-safe)
//!     ├─ 4. Persist the order, guarded by its revision
//!     └─ 5. On persistence failure: compensate the ledger, surface error
//! ```
//!
//! A concurrent writer makes step 4 fail with a revision conflict; the
//! caller refetches and retries. The bulk orchestrator runs one such unit
//! per order and never batches orders into one transaction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shared::models::{Order, OrderItem, OrderStatus, ProductInfo, StockConflictItem};
use shared::order::{
    ApplyRefundRequest, BulkStatusResponse, CreateOrderRequest, FailedUpdate, ItemUpdateRequest,
    RefundCancellationDetails, RefundDetails, StockCheckResponse, UpdateFlagsRequest,
};
use validator::Validate;

use super::error::OrderError;
use super::status::TransitionEffect;
use super::{items, money, refund, status, stock};
use crate::db::{OrderRepository, RepoError};
use crate::inventory::{InventoryLedger, LedgerError, ReserveOutcome};
use crate::rates::{ExchangeRateProvider, RateError};

pub struct OrderService {
    repo: OrderRepository,
    ledger: Arc<dyn InventoryLedger>,
    rates: Arc<dyn ExchangeRateProvider>,
    ledger_timeout: Duration,
    rate_timeout: Duration,
}

impl OrderService {
    pub fn new(
        repo: OrderRepository,
        ledger: Arc<dyn InventoryLedger>,
        rates: Arc<dyn ExchangeRateProvider>,
        ledger_timeout: Duration,
        rate_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            ledger,
            rates,
            ledger_timeout,
            rate_timeout,
        }
    }

    // ==================== Queries ====================

    pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderError> {
        self.load(order_id).await
    }

    pub async fn list_orders(&self, limit: i64, start: i64) -> Result<Vec<Order>, OrderError> {
        Ok(self.repo.find_all(limit, start).await?)
    }

    /// Pre-flight stock availability check for an order
    pub async fn check_order_stock(
        &self,
        order_id: &str,
    ) -> Result<StockCheckResponse, OrderError> {
        let order = self.load(order_id).await?;
        let check =
            stock::check_items(self.ledger.as_ref(), &order.items, self.ledger_timeout).await?;
        Ok(StockCheckResponse {
            has_conflicts: check.has_conflicts,
            conflicts: check.conflicts,
        })
    }

    // ==================== Creation ====================

    /// Create a new order (initial status PROCESSING, stock reserved)
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        request
            .validate()
            .map_err(|e| OrderError::Validation(e.to_string()))?;

        let mut order_items: Vec<OrderItem> = Vec::with_capacity(request.items.len());
        for input in &request.items {
            money::validate_quantity(input.quantity)?;
            money::validate_amount(input.cost_usd_at_purchase, "costUSDAtPurchase")?;
            money::validate_amount(input.price_usd_at_purchase, "priceUSDAtPurchase")?;
            if order_items
                .iter()
                .any(|i| i.product_variant_id == input.product_variant_id)
            {
                return Err(OrderError::Validation(format!(
                    "duplicate variant {} in item list",
                    input.product_variant_id
                )));
            }
            let mut item = OrderItem {
                product_variant_id: input.product_variant_id.clone(),
                product_name: input.product_name.clone(),
                sku: input.sku.clone(),
                quantity: input.quantity,
                cost_usd_at_purchase: input.cost_usd_at_purchase,
                price_usd_at_purchase: input.price_usd_at_purchase,
                sub_total: 0.0,
                cogs_usd: 0.0,
                contribution_margin_usd: 0.0,
            };
            money::sync_line(&mut item);
            order_items.push(item);
        }

        self.reserve_items(&order_items).await?;

        match self.finish_create(&request, order_items.clone()).await {
            Ok(order) => Ok(order),
            Err(err) => {
                self.rollback_reservation(&order_items).await;
                Err(err)
            }
        }
    }

    async fn finish_create(
        &self,
        request: &CreateOrderRequest,
        order_items: Vec<OrderItem>,
    ) -> Result<Order, OrderError> {
        let rate = self.current_rate().await?;
        let order_number = self.repo.next_order_number().await?;
        let now = Utc::now();

        let mut order = Order {
            id: None,
            order_number,
            revision: 0,
            customer_id: request.customer_id.clone(),
            payment_method: request.payment_method,
            order_status: OrderStatus::Processing,
            items_count: money::items_count(&order_items),
            items: order_items,
            sub_total: 0.0,
            total_amount: 0.0,
            total_amount_ars: 0.0,
            total_cogs_usd: 0.0,
            total_contribution_margin_usd: 0.0,
            contribution_margin_percentage: 0.0,
            bank_transfer_expense: None,
            exchange_rate: rate,
            refund: None,
            pre_cancel: None,
            is_visible: true,
            allow_view_invoice: true,
            created_at: now,
            updated_at: now,
        };
        let snapshot = money::recompute(&order.items, rate, order.payment_method, None);
        order.apply_financials(&snapshot);

        Ok(self.repo.create(&order).await?)
    }

    // ==================== Status transitions ====================

    /// Run a single status transition through the state machine
    pub async fn update_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut order = self.load(order_id).await?;

        // Identical or fully terminal: no-op success, nothing touched
        if order.order_status == new_status || status::is_terminal(order.order_status) {
            return Ok(order);
        }
        if !status::can_transition(order.order_status, new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.order_status,
                to: new_status,
            });
        }

        match status::transition_effect(order.order_status, new_status) {
            TransitionEffect::Reserve => self.reactivate(order, new_status).await,
            TransitionEffect::Release => self.cancel(order, new_status).await,
            TransitionEffect::None => {
                order.order_status = new_status;
                order.updated_at = Utc::now();
                self.persist(&order).await
            }
        }
    }

    /// Entering CANCELLED: release stock, snapshot and zero financials
    async fn cancel(&self, mut order: Order, new_status: OrderStatus) -> Result<Order, OrderError> {
        self.release_items(&order.items).await?;

        order.pre_cancel = Some(order.financials());
        order.zero_financials();
        order.order_status = new_status;
        order.updated_at = Utc::now();

        match self.persist(&order).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                self.restore_reservation(&order.items).await;
                Err(err)
            }
        }
    }

    /// Leaving CANCELLED: re-reserve stock, restore the pre-cancel
    /// snapshot, recompute if items were edited while cancelled
    async fn reactivate(
        &self,
        mut order: Order,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        if order.items.is_empty() {
            return Err(OrderError::OrderEmpty);
        }

        // Fails in full on any conflict: no partial reservation survives
        self.reserve_items(&order.items).await?;

        let recomputed = money::recompute(
            &order.items,
            order.exchange_rate,
            order.payment_method,
            order.refund.as_ref(),
        );
        match order.pre_cancel.take() {
            Some(snapshot) => {
                order.apply_financials(&snapshot);
                if !money::money_eq(recomputed.sub_total, snapshot.sub_total) {
                    // Items were edited while cancelled
                    order.apply_financials(&recomputed);
                }
            }
            None => order.apply_financials(&recomputed),
        }
        order.order_status = new_status;
        order.updated_at = Utc::now();

        match self.persist(&order).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                self.rollback_reservation(&order.items).await;
                Err(err)
            }
        }
    }

    /// Drive a batch of orders through the state machine, one atomic unit
    /// per order; a failing order never affects the others
    pub async fn bulk_update_status(
        &self,
        order_ids: &[String],
        new_status: OrderStatus,
    ) -> BulkStatusResponse {
        let mut successful_updates = Vec::new();
        let mut failed_updates = Vec::new();

        for order_id in order_ids {
            match self.update_status(order_id, new_status).await {
                Ok(_) => successful_updates.push(order_id.clone()),
                Err(err) => {
                    tracing::warn!(
                        order_id = %order_id,
                        target_status = %new_status,
                        error = %err,
                        "Bulk status update entry failed"
                    );
                    failed_updates.push(FailedUpdate {
                        order_id: order_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        BulkStatusResponse {
            total_requested: order_ids.len(),
            total_successful: successful_updates.len(),
            total_failed: failed_updates.len(),
            successful_updates,
            failed_updates,
        }
    }

    // ==================== Refunds ====================

    pub async fn apply_refund(
        &self,
        order_id: &str,
        request: &ApplyRefundRequest,
        processed_by: Option<String>,
    ) -> Result<(Order, RefundDetails), OrderError> {
        let mut order = self.load(order_id).await?;
        let details = refund::apply_refund(&mut order, request, processed_by, Utc::now())?;
        order.updated_at = Utc::now();
        let updated = self.persist(&order).await?;
        Ok((updated, details))
    }

    pub async fn cancel_refund(
        &self,
        order_id: &str,
    ) -> Result<(Order, RefundCancellationDetails), OrderError> {
        let mut order = self.load(order_id).await?;
        let details = refund::cancel_refund(&mut order)?;
        order.updated_at = Utc::now();
        let updated = self.persist(&order).await?;
        Ok((updated, details))
    }

    // ==================== Item mutations ====================

    /// Apply an item-level edit and recompute financials
    ///
    /// While the order holds a stock reservation, a quantity delta is
    /// validated against the ledger and reserved/released before the
    /// order is persisted. Edits on a cancelled order touch only the
    /// item list; financials stay pinned at zero until reactivation.
    pub async fn update_item(
        &self,
        order_id: &str,
        request: &ItemUpdateRequest,
        operator: Option<&str>,
    ) -> Result<Order, OrderError> {
        let action = items::ItemAction::from_request(request)?;
        let mut order = self.load(order_id).await?;

        let mutation = items::apply(&mut order, &request.product_variant_id, action, operator)?;

        if order.order_status != OrderStatus::Cancelled {
            // Item edits refresh the frozen rate
            let rate = self.current_rate().await?;
            order.exchange_rate = rate;
            let snapshot =
                money::recompute(&order.items, rate, order.payment_method, order.refund.as_ref());
            order.apply_financials(&snapshot);
        }

        let delta = mutation.stock_delta;
        let holds = status::holds_stock(order.order_status);
        if holds && delta > 0 {
            let (name, sku) = order
                .item(&request.product_variant_id)
                .map(|i| (i.product_name.clone(), i.sku.clone()))
                .unwrap_or_default();
            if let Some(conflict) = stock::check_one(
                self.ledger.as_ref(),
                &request.product_variant_id,
                &name,
                &sku,
                delta,
                self.ledger_timeout,
            )
            .await?
            {
                return Err(OrderError::StockConflict(vec![conflict]));
            }
            match self.reserve(&request.product_variant_id, delta).await? {
                ReserveOutcome::Reserved => {}
                ReserveOutcome::Insufficient { available } => {
                    return Err(OrderError::StockConflict(vec![StockConflictItem {
                        product_variant_id: request.product_variant_id.clone(),
                        required_quantity: delta,
                        available_stock: available,
                        product_info: ProductInfo { name, sku },
                    }]));
                }
            }
        } else if holds && delta < 0 {
            self.release(&request.product_variant_id, -delta).await?;
        }

        order.updated_at = Utc::now();
        match self.persist(&order).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                // Undo the ledger movement for this edit
                if holds && delta > 0 {
                    self.release_best_effort(&request.product_variant_id, delta).await;
                } else if holds && delta < 0 {
                    self.reserve_best_effort(&request.product_variant_id, -delta).await;
                }
                Err(err)
            }
        }
    }

    /// Toggle display flags (no financial or stock effect)
    pub async fn update_flags(
        &self,
        order_id: &str,
        request: &UpdateFlagsRequest,
    ) -> Result<Order, OrderError> {
        let mut order = self.load(order_id).await?;
        if let Some(is_visible) = request.is_visible {
            order.is_visible = is_visible;
        }
        if let Some(allow_view_invoice) = request.allow_view_invoice {
            order.allow_view_invoice = allow_view_invoice;
        }
        order.updated_at = Utc::now();
        self.persist(&order).await
    }

    // ==================== Internal helpers ====================

    async fn load(&self, order_id: &str) -> Result<Order, OrderError> {
        self.repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    /// Revision-guarded persistence with engine-level error mapping
    async fn persist(&self, order: &Order) -> Result<Order, OrderError> {
        let order_id = order.id.clone().unwrap_or_default();
        self.repo.update(order).await.map_err(|err| match err {
            RepoError::RevisionConflict(_) => OrderError::RevisionConflict(order_id),
            RepoError::NotFound(_) => OrderError::NotFound(order_id),
            other => other.into(),
        })
    }

    async fn current_rate(&self) -> Result<f64, OrderError> {
        match tokio::time::timeout(self.rate_timeout, self.rates.current_rate()).await {
            Err(_) => Err(OrderError::ExternalTimeout("exchange rate provider".into())),
            Ok(Err(RateError::Unavailable(message))) => Err(OrderError::ExternalUnavailable {
                dependency: "exchange rate provider".into(),
                message,
            }),
            Ok(Ok(rate)) => Ok(rate.value),
        }
    }

    async fn reserve(
        &self,
        variant_id: &str,
        quantity: i32,
    ) -> Result<ReserveOutcome, OrderError> {
        match tokio::time::timeout(self.ledger_timeout, self.ledger.reserve(variant_id, quantity))
            .await
        {
            Err(_) => Err(OrderError::ExternalTimeout("inventory ledger".into())),
            Ok(Err(LedgerError::UnknownVariant(v))) => Err(OrderError::UnknownVariant(v)),
            Ok(Err(LedgerError::Backend(message))) => Err(OrderError::ExternalUnavailable {
                dependency: "inventory ledger".into(),
                message,
            }),
            Ok(Ok(outcome)) => Ok(outcome),
        }
    }

    async fn release(&self, variant_id: &str, quantity: i32) -> Result<(), OrderError> {
        match tokio::time::timeout(self.ledger_timeout, self.ledger.release(variant_id, quantity))
            .await
        {
            Err(_) => Err(OrderError::ExternalTimeout("inventory ledger".into())),
            Ok(Err(LedgerError::UnknownVariant(v))) => Err(OrderError::UnknownVariant(v)),
            Ok(Err(LedgerError::Backend(message))) => Err(OrderError::ExternalUnavailable {
                dependency: "inventory ledger".into(),
                message,
            }),
            Ok(Ok(())) => Ok(()),
        }
    }

    /// Reserve stock for every item, all-or-nothing
    ///
    /// Runs the conflict resolver first so the caller gets the complete
    /// conflict list; a shortfall that appears between the check and the
    /// hold (concurrent taker) rolls back the partial reservation.
    async fn reserve_items(&self, order_items: &[OrderItem]) -> Result<(), OrderError> {
        let check =
            stock::check_items(self.ledger.as_ref(), order_items, self.ledger_timeout).await?;
        if check.has_conflicts {
            return Err(OrderError::StockConflict(check.conflicts));
        }

        let mut held: Vec<(&str, i32)> = Vec::new();
        for item in order_items {
            match self.reserve(&item.product_variant_id, item.quantity).await {
                Ok(ReserveOutcome::Reserved) => {
                    held.push((&item.product_variant_id, item.quantity));
                }
                Ok(ReserveOutcome::Insufficient { available }) => {
                    self.release_held(&held).await;
                    return Err(OrderError::StockConflict(vec![StockConflictItem {
                        product_variant_id: item.product_variant_id.clone(),
                        required_quantity: item.quantity,
                        available_stock: available,
                        product_info: ProductInfo {
                            name: item.product_name.clone(),
                            sku: item.sku.clone(),
                        },
                    }]));
                }
                Err(err) => {
                    self.release_held(&held).await;
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Release stock for every item; a mid-way failure re-reserves what
    /// was already released before surfacing the error
    async fn release_items(&self, order_items: &[OrderItem]) -> Result<(), OrderError> {
        let mut released: Vec<(&str, i32)> = Vec::new();
        for item in order_items {
            match self.release(&item.product_variant_id, item.quantity).await {
                Ok(()) => released.push((&item.product_variant_id, item.quantity)),
                Err(err) => {
                    for (variant_id, quantity) in &released {
                        self.reserve_best_effort(variant_id, *quantity).await;
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    async fn release_held(&self, held: &[(&str, i32)]) {
        for (variant_id, quantity) in held {
            self.release_best_effort(variant_id, *quantity).await;
        }
    }

    /// Compensation: release every item quantity, logging failures
    async fn rollback_reservation(&self, order_items: &[OrderItem]) {
        for item in order_items {
            self.release_best_effort(&item.product_variant_id, item.quantity)
                .await;
        }
    }

    /// Compensation: re-reserve every item quantity, logging failures
    async fn restore_reservation(&self, order_items: &[OrderItem]) {
        for item in order_items {
            self.reserve_best_effort(&item.product_variant_id, item.quantity)
                .await;
        }
    }

    async fn release_best_effort(&self, variant_id: &str, quantity: i32) {
        if let Err(err) = self.release(variant_id, quantity).await {
            tracing::error!(
                variant = variant_id,
                quantity,
                error = %err,
                "Failed to release stock during compensation"
            );
        }
    }

    async fn reserve_best_effort(&self, variant_id: &str, quantity: i32) {
        match self.reserve(variant_id, quantity).await {
            Ok(ReserveOutcome::Reserved) => {}
            Ok(ReserveOutcome::Insufficient { available }) => {
                tracing::error!(
                    variant = variant_id,
                    quantity,
                    available,
                    "Failed to re-reserve stock during compensation: insufficient"
                );
            }
            Err(err) => {
                tracing::error!(
                    variant = variant_id,
                    quantity,
                    error = %err,
                    "Failed to re-reserve stock during compensation"
                );
            }
        }
    }
}
