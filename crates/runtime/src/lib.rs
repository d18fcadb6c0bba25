mod notice;
mod session;

pub use notice::{Notice, NoticeLevel};
pub use session::{Connector, RosterSession};
