use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{listing::Nav, model::FoodEntry};

/// `GET /foods?search=&page=&nav=`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
    pub page: Option<usize>,
    pub nav: Option<Nav>,
}

#[derive(Debug, Serialize)]
pub struct FoodSaved {
    pub message: &'static str,
    pub food: FoodEntry,
    pub redirect_to: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FoodDeleted {
    pub message: &'static str,
    pub id: Uuid,
}
