pub mod balance;
pub mod claim;
pub mod connection_status;
pub mod layout;
pub mod network_guard;
pub mod notification;
pub mod stake;
