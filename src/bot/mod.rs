//! Chat command surface.

pub mod command;
pub mod handler;
pub mod poller;
pub mod telegram;
pub mod view;

#[cfg(test)]
mod handler_test;
#[cfg(test)]
mod poller_test;

pub use command::{Callback, Command};
pub use handler::{Dispatcher, Operator};
pub use poller::Poller;
pub use telegram::{ChatApi, TelegramClient};
pub use view::Reply;
