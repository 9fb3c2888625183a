pub mod chatmodels;
pub mod documentmodel;
pub mod paymentmodels;
