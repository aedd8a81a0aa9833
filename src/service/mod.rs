pub mod approval_service;
pub mod error;
pub mod fees;
pub mod notification_service;
pub mod payment_provider;
pub mod settlement;
