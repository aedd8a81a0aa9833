pub mod auth;
pub mod clients;
pub mod invoices;
pub mod tasks;
pub mod transactions;
pub mod users;
