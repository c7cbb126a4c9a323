//! Background loops for continuous processing.

pub mod plan_expiry_loop;
