pub mod error;
pub mod event;
pub mod path;
pub mod session;
pub mod staged;
