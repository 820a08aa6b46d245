pub mod session;
pub mod slot;
