pub mod documentdtos;
pub mod paymentdtos;
