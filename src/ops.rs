//! Operators, one module per operator family.
//!
//! Every operator is an inherent method on [`Observable`](crate::observable::Observable)
//! that returns a new observable; nothing runs until it is subscribed.

pub mod catch;
pub mod combine_latest;
pub mod concat;
pub mod debounce;
pub mod delay;
pub mod filter;
pub mod finalize;
pub mod map;
pub mod merge;
pub mod observe_on;
pub mod ref_count;
pub mod repeat;
pub mod retry;
pub mod sample;
pub mod scan;
pub mod serialize;
pub mod single;
pub mod skip;
pub mod start_with;
pub mod subscribe_on;
pub mod switch;
pub mod take;
pub mod take_until;
pub mod take_while;
pub mod tap;
pub mod throttle;
pub mod timeout;
pub mod with_latest_from;
