pub mod daemon;
pub mod item;
pub mod list;
pub mod order;
pub mod scope;
pub mod status;
pub mod term;
