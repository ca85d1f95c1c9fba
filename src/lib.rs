//! probe-bench: flash probe firmware and run its Modbus functional test
//!
//! The library holds the frontend-independent bench (`core`), the serial
//! collaborators (`protocol`) and the two frontends. The binary only parses
//! arguments and picks a frontend.

#[doc(hidden)]
pub mod boot;
pub mod core;
#[doc(hidden)]
pub mod gui;
pub mod protocol;
#[doc(hidden)]
pub mod tui;
pub mod utils;

pub use boot::{build_bench, init_common, start_gui, start_tui};
pub use crate::core::{Bench, BenchConfig};
