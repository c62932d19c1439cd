//! Async client for the petstore API.
//!
//! # Overview
//! Turns pet CRUD calls into HTTP requests against a configured base
//! endpoint and turns responses into typed values or classified errors.
//!
//! # Design
//! - `Client` owns the immutable transport configuration and is shared by
//!   every resource client built from it.
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`);
//!   the network round-trip sits behind the `HttpSender` trait.
//! - `Pets` validates every input before building a request, so invalid
//!   options or identifiers never cost a network call.
//! - A 504 is retried exactly once; every other failure propagates as-is.

pub mod client;
pub mod error;
pub mod http;
pub mod pets;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

pub use client::{Client, Config};
pub use error::{ApiError, ApiResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpSender, ReqwestSender};
pub use pets::Pets;
pub use types::{Pet, PetCreateOptions, PetUpdateOptions};
pub use validation::ValidationError;
