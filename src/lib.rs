#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod multipass;
pub mod provision;
pub mod request;
