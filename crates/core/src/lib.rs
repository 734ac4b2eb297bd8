//! Domain logic for tiered, time-gated course enrollment.
//!
//! - [`schedule`] builds and recalculates per-lesson unlock calendars.
//! - [`access`] decides access from admin overrides, tier purchases and
//!   unlock dates.
//! - [`enrollment`] drives the enrollment lifecycle through the
//!   [`store`] traits.

pub mod access;
pub mod enrollment;
pub mod error;
pub mod roles;
pub mod schedule;
pub mod store;
pub mod tier;
pub mod types;
pub mod weekday;

#[cfg(test)]
pub(crate) mod testing;
