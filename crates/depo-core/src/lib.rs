//! depo core: spreadsheet metadata validation and chunked deposit.
//!
//! Rows are validated concurrently by [`row::RowTask`]s feeding a
//! [`registry::RowRegistry`]; [`batch::Batch`] joins them and runs the
//! [`aggregate`] checks; [`upload`] then deposits valid rows through a
//! [`repository::RepositoryApi`].

pub mod config;
pub mod logging;

pub mod aggregate;
pub mod batch;
pub mod checks;
pub mod error;
pub mod fields;
pub mod files;
pub mod flow;
pub mod record;
pub mod registry;
pub mod report;
pub mod repository;
pub mod row;
pub mod sheet;
pub mod upload;
