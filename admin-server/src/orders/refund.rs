//! Refund Engine
//!
//! Applies and cancels refunds against an order aggregate. Both
//! operations mutate the order in place and return a full monetary
//! before/after diff for audit and UI. Persistence is the caller's job.
//!
//! A refund never touches the item list or the cost basis; it deducts
//! from `total_amount` and `total_contribution_margin_usd` only. The
//! subtotal captured at application time (`original_sub_total`) makes the
//! operation exactly reversible.

use chrono::{DateTime, Utc};
use shared::models::{Order, OrderStatus, Refund, RefundType};
use shared::order::{ApplyRefundRequest, RefundCancellationDetails, RefundDetails};

use super::error::OrderError;
use super::money;

/// Apply a refund to an order
///
/// Status only changes when the caller explicitly requests completion
/// (`complete: true`), which is the COMPLETED -> REFUNDED terminal path;
/// partial refunds leave the status untouched. Recomputation uses the
/// order's frozen exchange rate so the operation is deterministic.
pub fn apply_refund(
    order: &mut Order,
    request: &ApplyRefundRequest,
    processed_by: Option<String>,
    now: DateTime<Utc>,
) -> Result<RefundDetails, OrderError> {
    if order.refund.is_some() {
        return Err(OrderError::RefundAlreadyApplied);
    }
    if order.order_status == OrderStatus::Cancelled {
        return Err(OrderError::RefundNotEligible(
            "cannot refund a cancelled order".into(),
        ));
    }
    if request.complete && order.order_status != OrderStatus::Completed {
        return Err(OrderError::RefundNotEligible(format!(
            "full refund completion requires a completed order, status is {}",
            order.order_status
        )));
    }

    money::require_finite(request.amount, "refund amount")?;
    if request.amount <= 0.0 {
        return Err(OrderError::RefundAmountInvalid(
            "refund amount must be positive".into(),
        ));
    }

    let applied_amount = match request.refund_type {
        RefundType::Fixed => {
            if money::to_decimal(request.amount)
                > money::to_decimal(order.sub_total) + money::MONEY_TOLERANCE
            {
                return Err(OrderError::RefundAmountInvalid(format!(
                    "fixed refund {} exceeds subtotal {}",
                    request.amount, order.sub_total
                )));
            }
            money::to_f64(money::to_decimal(request.amount))
        }
        RefundType::Percentage => {
            if !(0.0..=100.0).contains(&request.amount) {
                return Err(OrderError::RefundAmountInvalid(format!(
                    "percentage refund must be between 0 and 100, got {}",
                    request.amount
                )));
            }
            money::to_f64(
                money::to_decimal(order.sub_total) * money::to_decimal(request.amount)
                    / rust_decimal::Decimal::ONE_HUNDRED,
            )
        }
    };

    let original_sub_total = order.sub_total;
    let original_total_amount = order.total_amount;
    let original_margin = order.total_contribution_margin_usd;

    order.refund = Some(Refund {
        refund_type: request.refund_type,
        amount: request.amount,
        applied_amount,
        original_sub_total,
        processed_at: now,
        processed_by: processed_by.clone(),
        reason: request.reason.clone(),
    });

    let snapshot = money::recompute_with_subtotal(
        original_sub_total,
        &order.items,
        order.exchange_rate,
        order.payment_method,
        order.refund.as_ref(),
    );
    order.apply_financials(&snapshot);

    if request.complete {
        order.order_status = OrderStatus::Refunded;
    }

    tracing::info!(
        target: "audit",
        order_number = order.order_number,
        operator = processed_by.as_deref().unwrap_or("unknown"),
        refund_amount = applied_amount,
        complete = request.complete,
        "Refund applied"
    );

    Ok(RefundDetails {
        original_sub_total,
        refund_amount: applied_amount,
        new_sub_total: order.sub_total,
        original_total_amount,
        new_total_amount: order.total_amount,
        original_contribution_margin_usd: original_margin,
        new_contribution_margin_usd: order.total_contribution_margin_usd,
    })
}

/// Cancel the live refund of an order
///
/// Restores `sub_total` from the refund's `original_sub_total` and
/// recomputes every derived field from it and the current item list
/// (cost basis is unaffected by refunds). An order that was moved to
/// REFUNDED by a completing refund returns to COMPLETED.
pub fn cancel_refund(order: &mut Order) -> Result<RefundCancellationDetails, OrderError> {
    if order.order_status == OrderStatus::Cancelled {
        return Err(OrderError::RefundNotEligible(
            "cannot cancel a refund on a cancelled order".into(),
        ));
    }

    let refund = order.refund.take().ok_or(OrderError::RefundNotFound)?;

    if order.order_status == OrderStatus::Refunded {
        order.order_status = OrderStatus::Completed;
    }

    let snapshot = money::recompute_with_subtotal(
        refund.original_sub_total,
        &order.items,
        order.exchange_rate,
        order.payment_method,
        None,
    );
    order.apply_financials(&snapshot);

    tracing::info!(
        target: "audit",
        order_number = order.order_number,
        cancelled_refund_amount = refund.applied_amount,
        "Refund cancelled"
    );

    Ok(RefundCancellationDetails {
        cancelled_refund_amount: refund.applied_amount,
        restored_sub_total: order.sub_total,
        restored_total_amount: order.total_amount,
        restored_contribution_margin_usd: order.total_contribution_margin_usd,
        cogs_usd: order.total_cogs_usd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderItem, PaymentMethod};

    fn test_order(payment_method: PaymentMethod) -> Order {
        let mut item = OrderItem {
            product_variant_id: "variant:1".into(),
            product_name: "Aviator Gold".into(),
            sku: "AV-001".into(),
            quantity: 2,
            cost_usd_at_purchase: 4.0,
            price_usd_at_purchase: 10.0,
            sub_total: 0.0,
            cogs_usd: 0.0,
            contribution_margin_usd: 0.0,
        };
        money::sync_line(&mut item);

        let mut order = Order {
            id: Some("order:test".into()),
            order_number: 1,
            revision: 0,
            customer_id: "customer:1".into(),
            payment_method,
            order_status: OrderStatus::Completed,
            items: vec![item],
            items_count: 2,
            sub_total: 0.0,
            total_amount: 0.0,
            total_amount_ars: 0.0,
            total_cogs_usd: 0.0,
            total_contribution_margin_usd: 0.0,
            contribution_margin_percentage: 0.0,
            bank_transfer_expense: None,
            exchange_rate: 1000.0,
            refund: None,
            pre_cancel: None,
            is_visible: true,
            allow_view_invoice: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let snap = money::recompute(
            &order.items,
            order.exchange_rate,
            order.payment_method,
            None,
        );
        order.apply_financials(&snap);
        order
    }

    fn percentage_request(amount: f64) -> ApplyRefundRequest {
        ApplyRefundRequest {
            refund_type: RefundType::Percentage,
            amount,
            reason: Some("damaged frames".into()),
            complete: false,
        }
    }

    #[test]
    fn test_apply_percentage_refund() {
        // 50% of $20 subtotal on a bank transfer order:
        // applied 10, total 20 + 0.80 - 10 = 10.80, margin 12 - 10 = 2
        let mut order = test_order(PaymentMethod::BankTransfer);

        let details = apply_refund(&mut order, &percentage_request(50.0), None, Utc::now()).unwrap();

        assert_eq!(details.refund_amount, 10.0);
        assert_eq!(details.original_total_amount, 20.8);
        assert_eq!(details.new_total_amount, 10.8);
        assert_eq!(details.original_contribution_margin_usd, 12.0);
        assert_eq!(details.new_contribution_margin_usd, 2.0);

        let refund = order.refund.as_ref().unwrap();
        assert_eq!(refund.applied_amount, 10.0);
        assert_eq!(refund.original_sub_total, 20.0);
        // Partial refund leaves status untouched
        assert_eq!(order.order_status, OrderStatus::Completed);
    }

    #[test]
    fn test_apply_fixed_refund() {
        let mut order = test_order(PaymentMethod::Cash);
        let request = ApplyRefundRequest {
            refund_type: RefundType::Fixed,
            amount: 5.0,
            reason: None,
            complete: false,
        };

        let details = apply_refund(&mut order, &request, Some("employee:7".into()), Utc::now())
            .unwrap();

        assert_eq!(details.refund_amount, 5.0);
        assert_eq!(order.total_amount, 15.0);
        assert_eq!(order.total_contribution_margin_usd, 7.0);
        assert_eq!(order.refund.as_ref().unwrap().processed_by.as_deref(), Some("employee:7"));
    }

    #[test]
    fn test_refund_round_trip_restores_exactly() {
        let mut order = test_order(PaymentMethod::BankTransfer);
        let before = order.financials();

        apply_refund(&mut order, &percentage_request(50.0), None, Utc::now()).unwrap();
        let details = cancel_refund(&mut order).unwrap();

        assert_eq!(order.financials(), before);
        assert!(order.refund.is_none());
        assert_eq!(details.cancelled_refund_amount, 10.0);
        assert_eq!(details.restored_sub_total, 20.0);
        assert_eq!(details.restored_total_amount, 20.8);
        assert_eq!(details.restored_contribution_margin_usd, 12.0);
        assert_eq!(details.cogs_usd, 8.0);
    }

    #[test]
    fn test_completing_refund_moves_to_refunded_and_back() {
        let mut order = test_order(PaymentMethod::Cash);
        let request = ApplyRefundRequest {
            refund_type: RefundType::Percentage,
            amount: 100.0,
            reason: None,
            complete: true,
        };

        apply_refund(&mut order, &request, None, Utc::now()).unwrap();
        assert_eq!(order.order_status, OrderStatus::Refunded);
        assert_eq!(order.total_amount, 0.0);

        cancel_refund(&mut order).unwrap();
        assert_eq!(order.order_status, OrderStatus::Completed);
        assert_eq!(order.total_amount, 20.0);
    }

    #[test]
    fn test_complete_requires_completed_status() {
        let mut order = test_order(PaymentMethod::Cash);
        order.order_status = OrderStatus::OnHold;
        let request = ApplyRefundRequest {
            refund_type: RefundType::Fixed,
            amount: 1.0,
            reason: None,
            complete: true,
        };

        assert!(matches!(
            apply_refund(&mut order, &request, None, Utc::now()),
            Err(OrderError::RefundNotEligible(_))
        ));
    }

    #[test]
    fn test_double_refund_rejected() {
        let mut order = test_order(PaymentMethod::Cash);
        apply_refund(&mut order, &percentage_request(10.0), None, Utc::now()).unwrap();

        assert!(matches!(
            apply_refund(&mut order, &percentage_request(10.0), None, Utc::now()),
            Err(OrderError::RefundAlreadyApplied)
        ));
    }

    #[test]
    fn test_refund_on_cancelled_order_rejected() {
        let mut order = test_order(PaymentMethod::Cash);
        order.order_status = OrderStatus::Cancelled;

        assert!(matches!(
            apply_refund(&mut order, &percentage_request(10.0), None, Utc::now()),
            Err(OrderError::RefundNotEligible(_))
        ));
        assert!(matches!(
            cancel_refund(&mut order),
            Err(OrderError::RefundNotEligible(_))
        ));
    }

    #[test]
    fn test_percentage_out_of_range_rejected() {
        let mut order = test_order(PaymentMethod::Cash);
        assert!(matches!(
            apply_refund(&mut order, &percentage_request(101.0), None, Utc::now()),
            Err(OrderError::RefundAmountInvalid(_))
        ));
        assert!(order.refund.is_none());
    }

    #[test]
    fn test_fixed_exceeding_subtotal_rejected() {
        let mut order = test_order(PaymentMethod::Cash);
        let request = ApplyRefundRequest {
            refund_type: RefundType::Fixed,
            amount: 20.5,
            reason: None,
            complete: false,
        };
        assert!(matches!(
            apply_refund(&mut order, &request, None, Utc::now()),
            Err(OrderError::RefundAmountInvalid(_))
        ));
    }

    #[test]
    fn test_cancel_without_refund_rejected() {
        let mut order = test_order(PaymentMethod::Cash);
        assert!(matches!(
            cancel_refund(&mut order),
            Err(OrderError::RefundNotFound)
        ));
    }
}
