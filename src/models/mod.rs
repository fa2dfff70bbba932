pub mod history_event;
pub mod instance;
