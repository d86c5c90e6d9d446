use serde::{Deserialize, Serialize};

use crate::domain::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beverage {
    pub id: i64,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

impl Validate for Beverage {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("beverage {} has an empty name", self.id));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!(
                "beverage {} has an invalid price {}",
                self.id, self.price
            ));
        }
        Ok(())
    }
}

/// Body of POST /beverages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBeverage {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeverageCreated {
    pub message: String,
    pub beverage: Beverage,
}

impl Validate for BeverageCreated {
    fn validate(&self) -> Result<(), String> {
        self.beverage.validate()
    }
}
