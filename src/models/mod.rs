pub mod clientmodel;
pub mod invoicemodel;
pub mod taskmodel;
pub mod transactionmodel;
pub mod usermodel;
