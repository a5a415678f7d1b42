pub mod dispatcher;
pub mod poller;
pub mod telegram;
pub mod updates;
pub mod webhook;
