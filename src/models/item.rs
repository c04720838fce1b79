use serde::{Deserialize, Serialize};

use super::{require_non_empty, require_non_negative, Validate, ValidationError};

/// A grocery store product.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Item {
    pub item_title: String,
    pub sku: u64,
    #[serde(rename = "storeCode", default)]
    pub store_code: Vec<String>,
    pub sales_size: f64,
    #[serde(default)]
    pub sales_uom_description: String,
    pub retail_price: f64,
    #[serde(default)]
    pub fun_tags: Vec<String>,
    #[serde(default)]
    pub item_characteristics: Vec<String>,
    #[serde(default)]
    pub category_1: String,
    #[serde(default)]
    pub category_2: String,
}

impl Validate for Item {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("item_title", &self.item_title)?;
        if self.sku == 0 {
            return Err(ValidationError::new("sku", "must be positive"));
        }
        require_non_negative("sales_size", self.sales_size)?;
        require_non_negative("retail_price", self.retail_price)?;
        Ok(())
    }
}
