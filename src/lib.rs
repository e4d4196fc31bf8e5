pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod validator;
