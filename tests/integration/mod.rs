//! Integration tests exercising the compiler and runtime together,
//! end to end from Mycelial source text through a running network.

pub mod compile_and_run;
pub mod consensus;
pub mod determinism;
pub mod fan_out;
pub mod fruiting_body;
pub mod guard_rejection;
pub mod observe;
pub mod queue_overflow;
