pub mod data;
pub mod display;
pub mod pagination;
pub mod status;
