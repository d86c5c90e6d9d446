//! Beverage pages: menu listing and the "add beverage" form

use crate::cache::ResourceState;
use crate::domain::ApiError;
use crate::form::{
    Completed, FieldAccess, Form, FormController, FormValues, Mutation, NumberField,
    SubmitOutcome, Validators, is_not_empty, min_number,
};
use crate::models::{Beverage, BeverageCreated, NewBeverage};
use crate::notify::Notification;
use crate::state::AppState;

pub const BEVERAGES_KEY: &str = "/beverages";
pub const MENU_PATH: &str = "/menu";

pub fn beverage_key(id: i64) -> String {
    format!("/beverages/{}", id)
}

pub struct BeverageService {
    state: AppState,
    form: FormController,
}

impl BeverageService {
    pub fn new(state: AppState) -> Self {
        let form = state.form_controller();
        Self { state, form }
    }

    pub fn controller(&self) -> &FormController {
        &self.form
    }

    pub async fn list(&self) -> ResourceState<Vec<Beverage>> {
        self.state.cache.use_resource(Some(BEVERAGES_KEY)).await
    }

    /// `None` suspends the read (no id in the route)
    pub async fn get(&self, id: Option<i64>) -> ResourceState<Beverage> {
        let key = id.map(beverage_key);
        self.state.cache.use_resource(key.as_deref()).await
    }

    /// Empty create form; price cannot go below zero
    pub fn create_form() -> Form {
        let mut form = Form::new().with_number_field(
            "price",
            NumberField {
                min: Some(0.0),
                max: None,
            },
        );
        form.set("name", "")
            .set("price", 0.0)
            .set("description", "")
            .set("imageUrl", "");
        form
    }

    pub fn validators() -> Validators {
        Validators::new()
            .field("name", is_not_empty("กรุณาระบุชื่อเครื่องดื่ม"))
            .field("price", min_number(0.0, "กรุณาระบุราคา"))
            .field("description", is_not_empty("กรุณาระบุรายละเอียดเครื่องดื่ม"))
            .field("imageUrl", is_not_empty("กรุณาระบุ URL ของรูปภาพ"))
    }

    pub async fn create(&self, values: &FormValues) -> SubmitOutcome {
        let client = self.state.client().clone();
        let name = values.text("name");
        let price = values.number("price");
        let description = values.text("description");
        let image_url = values.text("imageUrl");

        let mutation = Mutation::new(
            move || async move {
                let price = price
                    .ok_or_else(|| ApiError::Validation("price is not a number".to_string()))?;
                let body = NewBeverage {
                    name,
                    price,
                    description,
                    image_url,
                };
                let created: BeverageCreated = client.post(BEVERAGES_KEY, &body).await?;
                tracing::info!(id = created.beverage.id, "Beverage created");
                Ok::<_, ApiError>(Completed::navigate(MENU_PATH))
            },
            Notification::success(
                "เพิ่มข้อมูลเครื่องดื่มสำเร็จ",
                "ข้อมูลเครื่องดื่มได้รับการเพิ่มเรียบร้อยแล้ว",
            ),
        )
        .invalidates(BEVERAGES_KEY);

        self.form
            .submit(values, &Self::validators(), mutation)
            .await
    }
}
