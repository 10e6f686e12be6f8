pub mod config;
pub mod history;
pub mod hooks;
pub mod init;
pub mod status;
pub mod version;
