mod class;
mod session;
mod user;

pub use class::{ClassRecord, Schedule};
pub use session::AttendanceSession;
pub use user::{Role, StudentRecord, UserProfile};
