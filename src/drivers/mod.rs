//! Device drivers used during boot

pub mod uart;
