//! Entity <-> model mappers

mod audit_log;
mod code;
mod entitlement;

pub(crate) use code::codes_from_models;
