//! Wire schemas for the upstream model API

pub mod converse;
