pub mod diff;
pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::NotificationDispatcher;
pub use scheduler::Scheduler;
