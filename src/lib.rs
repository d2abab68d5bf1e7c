//! `santa-http` is the resilient HTTP layer of the Secret Santa application.
//!
//! Three utilities compose around every network call:
//! - [`retry()`] runs an async operation with bounded retries and backoff
//! - [`fetch_with_timeout`] / [`with_timeout`] put a request under a deadline
//! - [`normalize_error`] turns any failure into a [`NormalizedError`]
//!
//! [`SantaClient`] composes them for the backend routes (groups, draw,
//! registration, password reset, reveal tracking, elf results).

mod client;
mod error;
mod http;
mod normalize;
mod options;
mod retry;
mod timeout;
mod types;
mod wire;

pub use client::SantaClient;
pub use error::SantaError;
pub use http::{
    build_auth_headers, error_code_for_status, is_connect_error, is_network_error,
    is_retryable_status_code, is_transient,
};
pub use normalize::{
    create_error, normalize_error, ErrorMessages, NormalizedError, AI_API_ERROR, GATEWAY_TIMEOUT,
};
pub use options::ClientOptions;
pub use retry::{calculate_backoff, exponential_backoff, retry, RetryOptions};
pub use timeout::{fetch_with_timeout, with_timeout};
pub use types::{
    AuthUser, CreateGroupCommand, DrawResult, DrawValidation, ElfAssignment, ElfGroup, ElfResult,
    Group, HelpedParticipant, MessageResponse, RegisterCommand, RegisterResponse, RevealTracking,
};
pub use wire::{is_api_error_response, parse_error_envelope, ErrorBody};

pub type Result<T> = std::result::Result<T, SantaError>;
