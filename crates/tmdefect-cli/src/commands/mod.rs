pub mod extract;
pub mod features;
pub mod ideal;
pub mod predict;
