use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::beverage::Beverage;
use crate::domain::Validate;

/// UI bounds for the quantity input
pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 100;
pub const MAX_NOTE_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub beverage_id: i64,
    pub quantity: i64,
    pub order_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Validate for Order {
    fn validate(&self) -> Result<(), String> {
        if self.beverage_id <= 0 {
            return Err(format!(
                "order {} references beverage {}",
                self.id, self.beverage_id
            ));
        }
        if self.quantity < MIN_QUANTITY {
            return Err(format!(
                "order {} has quantity {}",
                self.id, self.quantity
            ));
        }
        Ok(())
    }
}

/// Body of POST /orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub beverage_id: i64,
    pub quantity: i64,
    pub note: String,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    pub message: String,
    pub order: Order,
}

impl Validate for OrderCreated {
    fn validate(&self) -> Result<(), String> {
        self.order.validate()
    }
}

/// Display-only join of an order with its beverage. Never sent back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithBeverage {
    #[serde(flatten)]
    pub order: Order,
    pub beverage: Option<Beverage>,
}

impl OrderWithBeverage {
    /// `price * quantity`, unknown when the beverage is missing
    pub fn line_total(&self) -> Option<f64> {
        self.beverage
            .as_ref()
            .map(|b| b.price * self.order.quantity as f64)
    }

    /// Falls back to the bare id when the beverage is gone
    pub fn display_name(&self) -> String {
        match &self.beverage {
            Some(b) => b.name.clone(),
            None => format!("เครื่องดื่ม ID: {}", self.order.beverage_id),
        }
    }
}

/// Join orders with beverages by `beverage_id`, keeping order sequence.
pub fn join_orders(orders: Vec<Order>, beverages: &[Beverage]) -> Vec<OrderWithBeverage> {
    let by_id: HashMap<i64, &Beverage> = beverages.iter().map(|b| (b.id, b)).collect();

    orders
        .into_iter()
        .map(|order| {
            let beverage = by_id.get(&order.beverage_id).map(|b| (*b).clone());
            OrderWithBeverage { order, beverage }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderSummary {
    pub total_orders: usize,
    pub total_quantity: i64,
    pub grand_total: f64,
}

impl OrderSummary {
    pub fn from_orders(orders: &[OrderWithBeverage]) -> Self {
        Self {
            total_orders: orders.len(),
            total_quantity: orders.iter().map(|o| o.order.quantity).sum(),
            // Unknown beverages count as free
            grand_total: orders.iter().filter_map(|o| o.line_total()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn espresso() -> Beverage {
        Beverage {
            id: 5,
            name: "Espresso".into(),
            price: 45.0,
            description: String::new(),
            image_url: String::new(),
        }
    }

    fn order(id: i64, beverage_id: i64, quantity: i64) -> Order {
        Order {
            id,
            beverage_id,
            quantity,
            order_date: "2024-01-01T00:00:00Z".parse().unwrap(),
            note: None,
        }
    }

    #[test]
    fn test_join_computes_line_total() {
        let joined = join_orders(vec![order(1, 5, 2)], &[espresso()]);

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].display_name(), "Espresso");
        assert_eq!(joined[0].line_total(), Some(90.0));
    }

    #[test]
    fn test_join_keeps_orphan_orders() {
        let joined = join_orders(vec![order(1, 5, 2), order(2, 99, 3)], &[espresso()]);

        assert!(joined[1].beverage.is_none());
        assert_eq!(joined[1].line_total(), None);
        assert_eq!(joined[1].display_name(), "เครื่องดื่ม ID: 99");

        let summary = OrderSummary::from_orders(&joined);
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_quantity, 5);
        assert_eq!(summary.grand_total, 90.0);
    }

    #[test]
    fn test_zero_quantity_order_is_rejected() {
        assert!(order(1, 5, 0).validate().is_err());
        assert!(order(1, 0, 1).validate().is_err());
        assert!(order(1, 5, 1).validate().is_ok());
    }

    #[test]
    fn test_new_order_wire_format() {
        let body = NewOrder {
            beverage_id: 5,
            quantity: 2,
            note: String::new(),
            order_date: "2024-01-01T00:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["beverageId"], 5);
        assert_eq!(json["orderDate"], "2024-01-01T00:00:00Z");
    }
}
