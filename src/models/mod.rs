pub mod member;
pub mod package;
pub mod project;
pub mod user;
