#![doc = "pressroom-core: core logic library for pressroom."]

//! This crate holds the keyword ledger, the record store, the content
//! formatter and the publishing pipeline. Concrete generation clients live in
//! the `pressroom` binary crate; everything here talks to them through the
//! traits in [`contract`].
//!
//! # Usage
//! Build a [`config::PipelineConfig`], a [`store::CsvRecordStore`] and a
//! [`publisher::HttpPublisher`], then call [`pipeline::run_pass`].

pub mod assets;
pub mod backup;
pub mod categories;
pub mod config;
pub mod contract;
pub mod error;
pub mod formatter;
pub mod ledger;
pub mod pipeline;
pub mod publisher;
pub mod store;
