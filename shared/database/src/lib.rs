pub mod migrations;
pub mod postgres;
pub mod repositories;

pub use postgres::{create_postgres_pool, health_check as postgres_health_check, PostgresPool};
pub use repositories::*;
