//! Client-side synchronization layer for the feedback board service.
//!
//! - [`session`]: the signed-in principal and its durable slot
//! - [`gateway`]: authenticated requests with single-flight token refresh
//! - [`board`]: optimistic kanban projection with resync and polling
//! - [`query`]: paginated, filtered, sorted table view

pub mod auth;
pub mod board;
pub mod context;
pub mod error;
pub mod gateway;
pub mod query;
pub mod session;
pub mod tags;

pub use auth::AuthService;
pub use board::{BoardColumns, BoardSnapshot, BoardSummary, BoardSyncEngine, LoadOutcome, Move};
pub use context::FeedbackClient;
pub use error::{AuthError, ClientError, ClientResult};
pub use gateway::{ApiRequest, ApiResponse, HyperTransport, RequestGateway, Transport, TransportError};
pub use query::{Filter, ListQueryEngine, PageView, QueryState, Sort, SortDirection, SortField};
pub use session::{Session, SessionEvent, SessionStore};
pub use tags::TagDirectory;
