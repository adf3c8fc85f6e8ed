pub mod history;
pub mod monitor;
pub mod render;
