use serde::{Deserialize, Serialize};

use crate::domain::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub title: String,
}

impl Validate for Genre {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("genre {} has an empty title", self.id));
        }
        Ok(())
    }
}
