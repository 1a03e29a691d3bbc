pub mod book_service;
pub mod errors;
pub mod member_service;

pub use book_service::BookInput;
pub use errors::CatalogError;
pub use member_service::MemberInput;
