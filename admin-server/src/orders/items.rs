//! Item Mutation Engine
//!
//! Item-level edits on the order aggregate, dispatched through a closed
//! [`ItemAction`] enum with one exhaustive handler. Each mutation returns
//! the stock delta (positive = additional units to reserve) so the
//! service can drive the inventory ledger when the order is in a
//! stock-holding status. Financial recomputation is the caller's job.

use shared::models::{Order, OrderItem, OrderStatus};
use shared::order::{ItemActionKind, ItemUpdateRequest};

use super::error::OrderError;
use super::money;

/// A validated item mutation
#[derive(Debug, Clone)]
pub enum ItemAction {
    Increase {
        quantity: i32,
    },
    Decrease {
        quantity: i32,
    },
    Remove,
    Add {
        product_name: String,
        sku: String,
        quantity: i32,
        cost_usd_at_purchase: f64,
        price_usd_at_purchase: f64,
    },
    Set {
        quantity: i32,
    },
    UpdatePrices {
        cost_usd_at_purchase: Option<f64>,
        price_usd_at_purchase: Option<f64>,
    },
    UpdateAll {
        quantity: Option<i32>,
        cost_usd_at_purchase: Option<f64>,
        price_usd_at_purchase: Option<f64>,
        sub_total: Option<f64>,
        contribution_margin_usd: Option<f64>,
    },
}

impl ItemAction {
    /// Validate a wire request into a typed action
    pub fn from_request(request: &ItemUpdateRequest) -> Result<Self, OrderError> {
        match request.action {
            ItemActionKind::Increase => {
                let quantity = request.quantity.unwrap_or(1);
                money::validate_quantity(quantity)?;
                Ok(ItemAction::Increase { quantity })
            }
            ItemActionKind::Decrease => {
                let quantity = request.quantity.unwrap_or(1);
                money::validate_quantity(quantity)?;
                Ok(ItemAction::Decrease { quantity })
            }
            ItemActionKind::Remove => Ok(ItemAction::Remove),
            ItemActionKind::Add => {
                let quantity = request.quantity.unwrap_or(1);
                money::validate_quantity(quantity)?;
                let cost = request.cost_usd_at_purchase.ok_or_else(|| {
                    OrderError::Validation("costUSDAtPurchase is required for add".into())
                })?;
                let price = request.price_usd_at_purchase.ok_or_else(|| {
                    OrderError::Validation("priceUSDAtPurchase is required for add".into())
                })?;
                money::validate_amount(cost, "costUSDAtPurchase")?;
                money::validate_amount(price, "priceUSDAtPurchase")?;
                Ok(ItemAction::Add {
                    product_name: request.product_name.clone().unwrap_or_default(),
                    sku: request.sku.clone().unwrap_or_default(),
                    quantity,
                    cost_usd_at_purchase: cost,
                    price_usd_at_purchase: price,
                })
            }
            ItemActionKind::Set => {
                let quantity = request.quantity.ok_or_else(|| {
                    OrderError::Validation("quantity is required for set".into())
                })?;
                if quantity < 0 {
                    return Err(OrderError::Validation(format!(
                        "quantity must be non-negative, got {}",
                        quantity
                    )));
                }
                Ok(ItemAction::Set { quantity })
            }
            ItemActionKind::UpdatePrices => {
                if request.cost_usd_at_purchase.is_none()
                    && request.price_usd_at_purchase.is_none()
                {
                    return Err(OrderError::Validation(
                        "update_prices requires costUSDAtPurchase or priceUSDAtPurchase".into(),
                    ));
                }
                if let Some(cost) = request.cost_usd_at_purchase {
                    money::validate_amount(cost, "costUSDAtPurchase")?;
                }
                if let Some(price) = request.price_usd_at_purchase {
                    money::validate_amount(price, "priceUSDAtPurchase")?;
                }
                Ok(ItemAction::UpdatePrices {
                    cost_usd_at_purchase: request.cost_usd_at_purchase,
                    price_usd_at_purchase: request.price_usd_at_purchase,
                })
            }
            ItemActionKind::UpdateAll => {
                if let Some(quantity) = request.quantity {
                    money::validate_quantity(quantity)?;
                }
                if let Some(cost) = request.cost_usd_at_purchase {
                    money::validate_amount(cost, "costUSDAtPurchase")?;
                }
                if let Some(price) = request.price_usd_at_purchase {
                    money::validate_amount(price, "priceUSDAtPurchase")?;
                }
                if let Some(sub_total) = request.sub_total {
                    money::validate_amount(sub_total, "subTotal")?;
                }
                if let Some(margin) = request.contribution_margin_usd {
                    money::require_finite(margin, "contributionMarginUSD")?;
                }
                Ok(ItemAction::UpdateAll {
                    quantity: request.quantity,
                    cost_usd_at_purchase: request.cost_usd_at_purchase,
                    price_usd_at_purchase: request.price_usd_at_purchase,
                    sub_total: request.sub_total,
                    contribution_margin_usd: request.contribution_margin_usd,
                })
            }
        }
    }
}

/// Result of an applied item mutation
#[derive(Debug, Clone, Copy)]
pub struct ItemMutation {
    /// Additional units to reserve (negative = units to release)
    pub stock_delta: i32,
}

/// Apply an item action to the order
///
/// Removing the last item is a validation error except while the order
/// is CANCELLED (reactivation-time correction). `items_count` is kept in
/// sync; order-level financials are not touched here.
pub fn apply(
    order: &mut Order,
    product_variant_id: &str,
    action: ItemAction,
    operator: Option<&str>,
) -> Result<ItemMutation, OrderError> {
    let position = order
        .items
        .iter()
        .position(|i| i.product_variant_id == product_variant_id);

    let mutation = match action {
        ItemAction::Add {
            product_name,
            sku,
            quantity,
            cost_usd_at_purchase,
            price_usd_at_purchase,
        } => {
            if position.is_some() {
                return Err(OrderError::Validation(format!(
                    "variant {} is already on the order, use increase or set",
                    product_variant_id
                )));
            }
            let mut item = OrderItem {
                product_variant_id: product_variant_id.to_string(),
                product_name,
                sku,
                quantity,
                cost_usd_at_purchase,
                price_usd_at_purchase,
                sub_total: 0.0,
                cogs_usd: 0.0,
                contribution_margin_usd: 0.0,
            };
            money::sync_line(&mut item);
            order.items.push(item);
            ItemMutation {
                stock_delta: quantity,
            }
        }

        ItemAction::Increase { quantity } => {
            let item = existing(order, position, product_variant_id)?;
            item.quantity += quantity;
            money::validate_quantity(item.quantity)?;
            money::sync_line(item);
            ItemMutation {
                stock_delta: quantity,
            }
        }

        ItemAction::Decrease { quantity } => {
            let item = existing(order, position, product_variant_id)?;
            let new_quantity = item.quantity - quantity;
            if new_quantity < 0 {
                return Err(OrderError::Validation(format!(
                    "cannot decrease {} below zero (current {}, decrease {})",
                    product_variant_id, item.quantity, quantity
                )));
            }
            if new_quantity == 0 {
                remove_line(order, position, product_variant_id)?;
            } else {
                item.quantity = new_quantity;
                money::sync_line(item);
            }
            ItemMutation {
                stock_delta: -quantity,
            }
        }

        ItemAction::Set { quantity } => {
            let item = existing(order, position, product_variant_id)?;
            let delta = quantity - item.quantity;
            if quantity == 0 {
                remove_line(order, position, product_variant_id)?;
            } else {
                item.quantity = quantity;
                money::sync_line(item);
            }
            ItemMutation { stock_delta: delta }
        }

        ItemAction::Remove => {
            let item = existing(order, position, product_variant_id)?;
            let delta = -item.quantity;
            remove_line(order, position, product_variant_id)?;
            ItemMutation { stock_delta: delta }
        }

        ItemAction::UpdatePrices {
            cost_usd_at_purchase,
            price_usd_at_purchase,
        } => {
            let order_number = order.order_number;
            let item = existing(order, position, product_variant_id)?;
            if let Some(cost) = cost_usd_at_purchase {
                item.cost_usd_at_purchase = cost;
            }
            if let Some(price) = price_usd_at_purchase {
                item.price_usd_at_purchase = price;
            }
            money::sync_line(item);

            tracing::info!(
                target: "audit",
                order_number,
                variant = product_variant_id,
                operator = operator.unwrap_or("unknown"),
                cost = item.cost_usd_at_purchase,
                price = item.price_usd_at_purchase,
                "Item prices overridden"
            );
            ItemMutation { stock_delta: 0 }
        }

        ItemAction::UpdateAll {
            quantity,
            cost_usd_at_purchase,
            price_usd_at_purchase,
            sub_total,
            contribution_margin_usd,
        } => {
            let order_number = order.order_number;
            let item = existing(order, position, product_variant_id)?;
            let delta = quantity.map(|q| q - item.quantity).unwrap_or(0);

            if let Some(q) = quantity {
                item.quantity = q;
            }
            if let Some(cost) = cost_usd_at_purchase {
                item.cost_usd_at_purchase = cost;
            }
            if let Some(price) = price_usd_at_purchase {
                item.price_usd_at_purchase = price;
            }
            money::sync_line(item);

            // Manual line overrides bypass the standard derivation; unit
            // values are back-derived so the line stays self-consistent
            // (margin == sub_total - cogs) and rolls up into order totals.
            let qty = rust_decimal::Decimal::from(item.quantity);
            if let Some(st) = sub_total {
                let st = money::round(money::to_decimal(st));
                item.sub_total = money::to_f64(st);
                item.price_usd_at_purchase = money::to_f64(st / qty);
                item.contribution_margin_usd =
                    money::to_f64(st - money::to_decimal(item.cogs_usd));
            }
            if let Some(margin) = contribution_margin_usd {
                let margin = money::round(money::to_decimal(margin));
                let cogs = money::to_decimal(item.sub_total) - margin;
                if cogs < rust_decimal::Decimal::ZERO {
                    return Err(OrderError::Validation(format!(
                        "contributionMarginUSD {} exceeds line subtotal {}",
                        margin, item.sub_total
                    )));
                }
                item.contribution_margin_usd = money::to_f64(margin);
                item.cogs_usd = money::to_f64(cogs);
                item.cost_usd_at_purchase = money::to_f64(cogs / qty);
            }

            tracing::info!(
                target: "audit",
                order_number,
                variant = product_variant_id,
                operator = operator.unwrap_or("unknown"),
                sub_total = item.sub_total,
                contribution_margin_usd = item.contribution_margin_usd,
                "Item financials overridden"
            );
            ItemMutation { stock_delta: delta }
        }
    };

    order.items_count = money::items_count(&order.items);
    Ok(mutation)
}

/// Borrow the targeted line or fail
fn existing<'a>(
    order: &'a mut Order,
    position: Option<usize>,
    product_variant_id: &str,
) -> Result<&'a mut OrderItem, OrderError> {
    position
        .map(|idx| &mut order.items[idx])
        .ok_or_else(|| OrderError::ItemNotFound(product_variant_id.to_string()))
}

/// Remove a line, enforcing the at-least-one-item rule
fn remove_line(
    order: &mut Order,
    position: Option<usize>,
    product_variant_id: &str,
) -> Result<(), OrderError> {
    let idx =
        position.ok_or_else(|| OrderError::ItemNotFound(product_variant_id.to_string()))?;
    if order.items.len() == 1 && order.order_status != OrderStatus::Cancelled {
        return Err(OrderError::OrderEmpty);
    }
    order.items.remove(idx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::PaymentMethod;

    fn line(variant_id: &str, quantity: i32, price: f64, cost: f64) -> OrderItem {
        let mut item = OrderItem {
            product_variant_id: variant_id.to_string(),
            product_name: "Round Tortoise".into(),
            sku: "RT-010".into(),
            quantity,
            cost_usd_at_purchase: cost,
            price_usd_at_purchase: price,
            sub_total: 0.0,
            cogs_usd: 0.0,
            contribution_margin_usd: 0.0,
        };
        money::sync_line(&mut item);
        item
    }

    fn test_order(items: Vec<OrderItem>) -> Order {
        let items_count = money::items_count(&items);
        Order {
            id: Some("order:test".into()),
            order_number: 1,
            revision: 0,
            customer_id: "customer:1".into(),
            payment_method: PaymentMethod::Cash,
            order_status: OrderStatus::Processing,
            items,
            items_count,
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
        }
    }

    #[test]
    fn test_increase_and_decrease() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);

        let m = apply(&mut order, "variant:1", ItemAction::Increase { quantity: 3 }, None)
            .unwrap();
        assert_eq!(m.stock_delta, 3);
        assert_eq!(order.items[0].quantity, 5);
        assert_eq!(order.items[0].sub_total, 50.0);
        assert_eq!(order.items_count, 5);

        let m = apply(&mut order, "variant:1", ItemAction::Decrease { quantity: 2 }, None)
            .unwrap();
        assert_eq!(m.stock_delta, -2);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.items_count, 3);
    }

    #[test]
    fn test_add_new_line() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);

        let m = apply(
            &mut order,
            "variant:2",
            ItemAction::Add {
                product_name: "Cat Eye".into(),
                sku: "CE-002".into(),
                quantity: 4,
                cost_usd_at_purchase: 3.0,
                price_usd_at_purchase: 8.0,
            },
            None,
        )
        .unwrap();

        assert_eq!(m.stock_delta, 4);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].sub_total, 32.0);
        assert_eq!(order.items_count, 6);
    }

    #[test]
    fn test_add_existing_variant_rejected() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);
        let result = apply(
            &mut order,
            "variant:1",
            ItemAction::Add {
                product_name: "dup".into(),
                sku: "dup".into(),
                quantity: 1,
                cost_usd_at_purchase: 1.0,
                price_usd_at_purchase: 2.0,
            },
            None,
        );
        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_set_quantity_and_delta() {
        let mut order = test_order(vec![
            line("variant:1", 2, 10.0, 4.0),
            line("variant:2", 1, 8.0, 3.0),
        ]);

        let m = apply(&mut order, "variant:1", ItemAction::Set { quantity: 6 }, None).unwrap();
        assert_eq!(m.stock_delta, 4);

        let m = apply(&mut order, "variant:1", ItemAction::Set { quantity: 0 }, None).unwrap();
        assert_eq!(m.stock_delta, -6);
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn test_remove_last_item_rejected() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);
        assert!(matches!(
            apply(&mut order, "variant:1", ItemAction::Remove, None),
            Err(OrderError::OrderEmpty)
        ));
        // Line is untouched
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn test_remove_last_item_allowed_when_cancelled() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);
        order.order_status = OrderStatus::Cancelled;

        let m = apply(&mut order, "variant:1", ItemAction::Remove, None).unwrap();
        assert_eq!(m.stock_delta, -2);
        assert!(order.items.is_empty());
        assert_eq!(order.items_count, 0);
    }

    #[test]
    fn test_update_prices_refreshes_line() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);

        let m = apply(
            &mut order,
            "variant:1",
            ItemAction::UpdatePrices {
                cost_usd_at_purchase: Some(5.0),
                price_usd_at_purchase: Some(12.0),
            },
            Some("employee:7"),
        )
        .unwrap();

        assert_eq!(m.stock_delta, 0);
        let item = &order.items[0];
        assert_eq!(item.sub_total, 24.0);
        assert_eq!(item.cogs_usd, 10.0);
        assert_eq!(item.contribution_margin_usd, 14.0);
    }

    #[test]
    fn test_update_all_override_back_derives_units() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);

        apply(
            &mut order,
            "variant:1",
            ItemAction::UpdateAll {
                quantity: None,
                cost_usd_at_purchase: None,
                price_usd_at_purchase: None,
                sub_total: Some(25.0),
                contribution_margin_usd: Some(15.0),
            },
            Some("employee:7"),
        )
        .unwrap();

        let item = &order.items[0];
        assert_eq!(item.sub_total, 25.0);
        assert_eq!(item.contribution_margin_usd, 15.0);
        // Cost basis follows the override
        assert_eq!(item.cogs_usd, 10.0);
        assert_eq!(item.price_usd_at_purchase, 12.5);
        assert_eq!(item.cost_usd_at_purchase, 5.0);
    }

    #[test]
    fn test_update_all_margin_exceeding_subtotal_rejected() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);
        let result = apply(
            &mut order,
            "variant:1",
            ItemAction::UpdateAll {
                quantity: None,
                cost_usd_at_purchase: None,
                price_usd_at_purchase: None,
                sub_total: None,
                contribution_margin_usd: Some(21.0),
            },
            None,
        );
        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let mut order = test_order(vec![line("variant:1", 2, 10.0, 4.0)]);
        assert!(matches!(
            apply(&mut order, "variant:9", ItemAction::Increase { quantity: 1 }, None),
            Err(OrderError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_from_request_validation() {
        let request = ItemUpdateRequest {
            product_variant_id: "variant:1".into(),
            action: ItemActionKind::Set,
            quantity: None,
            cost_usd_at_purchase: None,
            price_usd_at_purchase: None,
            sub_total: None,
            contribution_margin_usd: None,
            product_name: None,
            sku: None,
        };
        assert!(matches!(
            ItemAction::from_request(&request),
            Err(OrderError::Validation(_))
        ));

        let request = ItemUpdateRequest {
            action: ItemActionKind::UpdatePrices,
            ..request
        };
        assert!(matches!(
            ItemAction::from_request(&request),
            Err(OrderError::Validation(_))
        ));
    }
}
