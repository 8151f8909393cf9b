//! Domain models for the user resource
//!
//! The entity, its typed partial update, the search filter and the
//! validation rules. Column/field mapping is explicit; nothing here is
//! derived through reflection.

pub mod filter;
pub mod pagination;
pub mod user;
pub mod validation;

pub use filter::{FilterError, SearchCriteria, SortField, UserFilter};
pub use pagination::{Page, PageToken, Pagination, TokenError};
pub use user::{User, UserPatch};
pub use validation::{ErrorCode, FieldError, UserValidator};
