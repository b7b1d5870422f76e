//! Transport-agnostic domain for the OperRouter client SDK.
//!
//! This crate contains every value type, symbolic enumeration, payload,
//! result, and error shared by the transports, plus the [`OperRouterClient`]
//! trait they implement. Application code depends on this crate and picks a
//! transport at construction time; nothing else changes when switching.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a call carries; transport crates define *how* it travels.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`value`] | [`DomainValue`], [`Row`], [`ConfigMap`] and their JSON conversions |
//! | [`symbols`] | [`DriverKind`], [`LlmProvider`], [`ChatRole`] and the symbol mapper |
//! | [`types`] | Configuration payloads, chat messages, operation results |
//! | [`identifiers`] | [`ResourceName`], [`RequestId`] |
//! | [`config`] | [`ClientConfig`] |
//! | [`errors`] | [`ClientError`] |
//! | [`client`] | [`OperRouterClient`] |

pub mod client;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod symbols;
pub mod types;
pub mod value;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::OperRouterClient;
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use errors::ClientError;
pub use identifiers::{RequestId, ResourceName};
pub use symbols::{map_driver, map_provider, map_role, ChatRole, DriverKind, LlmProvider};
pub use types::{
    ChatMessage, DataSourceConfig, EmbeddingResult, LlmConfig, Metadata, OperationResult,
    QueryResult, TextResult, MISSING_DIAGNOSTIC,
};
pub use value::{json_object, ConfigMap, DomainValue, Row};
