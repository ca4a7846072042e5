//! API Routes
//!
//! Route handlers organized by functionality.

pub mod dashboard;
pub mod health;
pub mod pages;
pub mod property_values;
pub mod scheduling;
pub mod valuations;
pub mod waitlist;
