pub mod client;
pub mod console;
pub mod host;
pub mod poller;
pub mod store;

pub use client::{DeviceClient, DeviceError};
pub use console::Console;
pub use poller::Poller;
pub use store::LocalStore;
