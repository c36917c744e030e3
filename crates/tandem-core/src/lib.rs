//! Types shared by every Tandem crate that reaches the HTTP boundary

#![allow(clippy::must_use_candidate)]

mod deadline;
mod error;

pub use deadline::{Deadline, Elapsed};
pub use error::{ErrorBody, HttpError};
