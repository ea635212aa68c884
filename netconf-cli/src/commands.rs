pub mod builtin;
pub mod edit;
pub mod get;
pub mod get_config;
pub mod notification;
pub mod rpc;
