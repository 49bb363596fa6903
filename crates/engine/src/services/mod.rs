//! Collaborator contracts consumed by the engines.

pub mod inventory;
pub mod users;

pub use inventory::{CartLine, InMemoryInventory, Inventory, ProductInfo};
pub use users::{InMemoryUsers, UserInfo, Users};
