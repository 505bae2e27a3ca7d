pub mod log;
pub mod todo;
pub mod user;

pub use self::log::{LogEntry, LogLevel};
pub use todo::{Todo, TodoInput};
pub use user::{PublicUser, User};
