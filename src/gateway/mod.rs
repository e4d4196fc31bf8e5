pub mod events;
pub mod pool;
pub mod session;
