//! # API Route Modules
//!
//! - `procedures`: list, inspect and execute the procedures of the
//!   discovered router.

pub mod procedures;
