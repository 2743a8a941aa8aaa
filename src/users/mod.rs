//! Profile endpoints for the authenticated caller.

pub mod handlers;
