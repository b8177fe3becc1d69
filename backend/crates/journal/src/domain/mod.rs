//! Domain Layer
//!
//! - Entities (Post)
//! - Value objects (PostTitle, PostBody)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod value_objects;

pub use entities::Post;
pub use repository::PostRepository;
pub use value_objects::{PostBody, PostTitle};
