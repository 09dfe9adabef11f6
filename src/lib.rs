pub mod channels;
pub mod chat;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod credentials;
pub mod gateway;
pub mod persona;
pub mod providers;
pub mod relay;
