pub mod add;
pub mod auth;
pub mod check;
pub mod delete;
pub mod export;
pub mod list;
