pub mod cases;
pub mod health;
pub mod incidents;
pub mod security;
pub mod statuses;
pub mod tracking;
