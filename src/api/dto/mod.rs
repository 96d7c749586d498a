//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod event_dto;
pub mod match_dto;
pub mod stats_dto;
pub mod user_dto;

pub use common_dto::*;
pub use event_dto::*;
pub use match_dto::*;
pub use stats_dto::*;
pub use user_dto::*;
