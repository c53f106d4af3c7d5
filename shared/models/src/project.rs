//! Project domain model. A project owns one BOM snapshot per import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Project {
    pub id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Project name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>, customer_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            customer_name,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
