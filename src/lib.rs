//! Portfolio Billing - payment verification and webhook reconciliation.
//!
//! Activates premium memberships from provider payments. A payment can be
//! reconciled by the client-verify path or by the provider webhook; whichever
//! commits first wins and the other observes the stored verification record.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
