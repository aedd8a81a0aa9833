pub mod currency;
pub mod invite;
pub mod password;
pub mod token;
