pub mod menu;
pub mod payment;
pub mod placement;
pub mod pricing;
pub mod status;
