//! typewise-core: Adaptive personality-type assessment engine.
//!
//! This crate defines the data model, the 2PL item response model, EAP
//! estimation, adaptive item selection and scheduling, validity detection,
//! and result scoring that the rest of typewise builds on. Storage and
//! presentation live behind the traits in [`traits`].

pub mod cognitive;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod irt;
pub mod model;
pub mod parser;
pub mod report;
pub mod result;
pub mod selection;
pub mod service;
pub mod session;
pub mod simulation;
pub mod statistics;
pub mod stopping;
pub mod traits;
pub mod validity;
