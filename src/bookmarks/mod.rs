//! Per-user bookmark CRUD.
//!
//! Bookmarks are only ever visible to, and editable by, their owner.

pub mod handlers;
