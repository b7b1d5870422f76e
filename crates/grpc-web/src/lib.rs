//! gRPC-Web transport for the OperRouter client contract.
//!
//! Each operation is a unary call `POST {endpoint}/operrouter.v1.OperRouter/{Method}`
//! whose body is one framed protobuf message. The reply body holds one
//! message frame followed by a trailer frame carrying `grpc-status`.
//!
//! | Module | Role |
//! |--------|------|
//! | [`proto`] | Protobuf messages of the service |
//! | [`codec`] | `DomainValue` to and from the protobuf `TypedValue` |
//! | [`framing`] | Data and trailer frames of a gRPC-Web body |
//! | `client` | [`GrpcWebClient`], the `OperRouterClient` implementation |

mod client;
pub mod codec;
pub mod framing;
pub mod proto;

pub use client::GrpcWebClient;
