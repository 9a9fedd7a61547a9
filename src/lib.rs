mod chart;
mod directory;
mod dto;
mod error;
mod session;
mod store;

pub use directory::{Directory, ADMIN_USER, WITHDRAW_LIMIT};
pub use dto::AccountRecord;
pub use error::Error;
pub use session::run;
pub use store::JsonStore;
