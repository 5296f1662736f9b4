//! Read-only access to the hosted relational database.
//!
//! The [`DatabaseClient`] trait is the seam to the hosted REST interface
//! (PostgREST / Supabase style). On top of it sit the four query helpers the
//! model may call, and [`QueryTools`], which declares them as tools and
//! dispatches model-issued tool calls by name.

pub mod catalog;
pub mod client;
pub mod error;
pub mod queries;
pub mod query;
pub mod tools;

pub use catalog::Catalog;
pub use client::{DatabaseClient, RestDatabase};
pub use error::DbError;
pub use query::{Aggregate, AggregateFn, Filter, FilterOp, OrderBy, SelectQuery};
pub use tools::{QueryTools, ToolOutput};
