pub mod board;
pub mod client_config;
pub mod comment;
pub mod feedback;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod page;
pub mod register;
pub mod tag;

pub use self::board::{AddMemberRequest, Board, NewBoard, Visibility};
pub use self::client_config::{ApiConfig, ClientConfig, ConfigError, SessionConfig, SyncConfig};
pub use self::comment::{Comment, NewComment};
pub use self::feedback::{
    FeedbackItem, FeedbackType, MoveRequest, MoveResponse, NewFeedback, ParseEnumError, Status,
};
pub use self::json_error::{Detail, ErrorResponse};
pub use self::jwt::{AccessClaims, Role};
pub use self::login::{LoginData, RefreshRequest, RefreshResponse, TokenPair};
pub use self::page::{Listing, Page, page_count};
pub use self::register::{RegistrationData, UserSummary};
pub use self::tag::{NewTag, Tag, normalize_name};
