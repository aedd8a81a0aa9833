pub mod clientdtos;
pub mod invoicedtos;
pub mod taskdtos;
pub mod transactiondtos;
pub mod userdtos;
