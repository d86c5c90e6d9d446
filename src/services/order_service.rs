//! Order pages: order history (joined with the menu) and the order form

use chrono::Utc;

use super::beverage_service::{BEVERAGES_KEY, MENU_PATH, beverage_key};
use crate::cache::ResourceState;
use crate::domain::{ApiError, ApiErrorKind};
use crate::form::{
    Completed, ErrorNotices, FieldAccess, Form, FormController, FormValues, Mutation, NumberField,
    SubmitOutcome, Validators, max_chars, min_integer,
};
use crate::models::order::{MAX_NOTE_CHARS, MAX_QUANTITY, MIN_QUANTITY};
use crate::models::{
    Beverage, NewOrder, Order, OrderCreated, OrderSummary, OrderWithBeverage, join_orders,
};
use crate::notify::Notification;
use crate::state::AppState;

pub const ORDERS_KEY: &str = "/orders";

const ORDER_SUCCESS_TITLE: &str = "สั่งซื้อสำเร็จ";

fn order_error_notices() -> ErrorNotices {
    const FAILED_TITLE: &str = "เกิดข้อผิดพลาด";
    const FAILED_MESSAGE: &str = "ไม่สามารถสั่งซื้อได้ กรุณาลองใหม่อีกครั้ง";

    ErrorNotices::default()
        .with(
            ApiErrorKind::Validation,
            "ข้อมูลไม่ถูกต้อง",
            "กรุณาตรวจสอบข้อมูลที่กรอกและลองใหม่อีกครั้ง",
        )
        .with(
            ApiErrorKind::Server,
            "เกิดข้อผิดพลาดบนเซิร์ฟเวอร์",
            "กรุณาลองใหม่อีกครั้งในภายหลัง",
        )
        .with(ApiErrorKind::NotFound, FAILED_TITLE, FAILED_MESSAGE)
        .with(ApiErrorKind::Network, FAILED_TITLE, FAILED_MESSAGE)
}

pub struct OrderService {
    state: AppState,
    form: FormController,
}

impl OrderService {
    pub fn new(state: AppState) -> Self {
        let form = state.form_controller();
        Self { state, form }
    }

    pub fn controller(&self) -> &FormController {
        &self.form
    }

    /// Orders joined with the menu. The menu read failing only loses names
    /// and prices; the order read failing is the page error.
    pub async fn list_with_beverages(&self) -> ResourceState<Vec<OrderWithBeverage>> {
        let cache = &self.state.cache;
        let (orders, beverages) = tokio::join!(
            cache.use_resource::<Vec<Order>>(Some(ORDERS_KEY)),
            cache.use_resource::<Vec<Beverage>>(Some(BEVERAGES_KEY)),
        );

        if let Some(e) = &beverages.error {
            tracing::warn!("Menu unavailable for order join: {}", e);
        }

        let menu = beverages.data.unwrap_or_default();
        ResourceState {
            data: orders.data.map(|list| join_orders(list, &menu)),
            error: orders.error,
            is_loading: orders.is_loading,
            is_validating: orders.is_validating || beverages.is_validating,
        }
    }

    pub async fn summary(&self) -> Option<OrderSummary> {
        self.list_with_beverages()
            .await
            .data
            .map(|orders| OrderSummary::from_orders(&orders))
    }

    /// Quantity starts at 1 and is held within 1..=100 on input
    pub fn order_form() -> Form {
        let mut form = Form::new().with_number_field(
            "quantity",
            NumberField {
                min: Some(MIN_QUANTITY as f64),
                max: Some(MAX_QUANTITY as f64),
            },
        );
        form.set("quantity", MIN_QUANTITY).set("note", "");
        form
    }

    pub fn validators() -> Validators {
        Validators::new()
            .field(
                "quantity",
                min_integer(MIN_QUANTITY, "กรุณาระบุจำนวนที่มากกว่า 0"),
            )
            .field(
                "note",
                max_chars(MAX_NOTE_CHARS, "หมายเหตุไม่ควรเกิน 200 ตัวอักษร"),
            )
    }

    /// Place an order for `beverage_id`. `None` (no id in the route) submits
    /// nothing.
    pub async fn create(
        &self,
        beverage_id: Option<i64>,
        values: &FormValues,
    ) -> Option<SubmitOutcome> {
        let beverage_id = beverage_id?;

        // Loaded by the order page already; never fetched from here
        let beverage = self
            .state
            .cache
            .snapshot::<Beverage>(Some(&beverage_key(beverage_id)));
        let name = beverage
            .data
            .map(|b| b.name)
            .unwrap_or_else(|| format!("เครื่องดื่ม ID: {}", beverage_id));

        // Used only after the validators have passed
        let quantity = values.integer("quantity");
        let note = values.text("note");
        let client = self.state.client().clone();

        let mutation = Mutation::new(
            move || async move {
                let quantity = quantity.ok_or_else(|| {
                    ApiError::Validation("quantity is not a whole number".to_string())
                })?;
                let body = NewOrder {
                    beverage_id,
                    quantity,
                    note,
                    order_date: Utc::now(),
                };
                let created: OrderCreated = client.post(ORDERS_KEY, &body).await?;
                tracing::info!(id = created.order.id, beverage_id, quantity, "Order placed");
                Ok::<_, ApiError>(Completed::navigate(MENU_PATH).with_notice(
                    Notification::success(
                        ORDER_SUCCESS_TITLE,
                        format!("สั่งซื้อ {} จำนวน {} รายการเรียบร้อยแล้ว", name, quantity),
                    ),
                ))
            },
            Notification::success(ORDER_SUCCESS_TITLE, "สั่งซื้อเรียบร้อยแล้ว"),
        )
        .invalidates(ORDERS_KEY)
        .errors(order_error_notices());

        Some(
            self.form
                .submit(values, &Self::validators(), mutation)
                .await,
        )
    }
}
