//! Test infrastructure for the OS10-FE fabric agent.
//!
//! Provides [`FakeSwitch`], an in-memory [`os10fe_restconf::DeviceGateway`]
//! that applies writes to a seeded interface table and records every
//! operation, plus [`fixtures`] builders for interface records.

pub mod fake_switch;
pub mod fixtures;

pub use fake_switch::FakeSwitch;
