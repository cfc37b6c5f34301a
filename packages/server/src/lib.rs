// 112 Dispatch - API Core
//
// Backend for a voice emergency assistant: routes incident reports to the
// responsible service by category and city, and answers guideline questions
// from a pre-built semantic index.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
