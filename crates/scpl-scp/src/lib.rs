//! # SCP Library – SCP
//!
//! Single-connection Secure Copy (SCP) service providing:
//!   • Session lifecycle for exactly one host (open / close / is-open)
//!   • Port and credential handling with password / key / agent authentication
//!   • Host-key trust policy (auto-add by default)
//!   • Single-file upload & download
//!   • Recursive directory upload & download
//!   • Remote wildcard / environment-variable expansion for downloads

pub mod scp;
