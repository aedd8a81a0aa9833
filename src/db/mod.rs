pub mod clientdb;
pub mod db;
pub mod invoicedb;
pub mod taskdb;
pub mod transactiondb;
pub mod userdb;
