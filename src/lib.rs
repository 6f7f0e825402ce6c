// ABOUTME: Library crate for repoterm exposing the workspace, sync, and interpreter API for testing and external use

#![allow(missing_docs)]

pub mod audit;
pub mod config;
pub mod credentials;
pub mod editors;
pub mod git;
pub mod interpreter;
pub mod models;
pub mod remote;
pub mod session;
pub mod sync;
pub mod workspace;
