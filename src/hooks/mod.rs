//! Hook implementations

pub mod alert;

pub use alert::{AlertHook, AlertPacket, Alerter};
