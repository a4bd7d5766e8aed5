//! User module

mod model;

pub use model::User;
