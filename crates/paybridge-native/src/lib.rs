// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PayBridge: Native platform capability abstractions.
//
// The wallet coordinator only sees the traits defined here. Device builds
// provide implementations from the host app's Kotlin/Swift glue; desktop and
// CI builds use the stub or the scripted simulator.

pub mod main_loop;
pub mod simulator;
pub mod stub;
pub mod traits;

pub use main_loop::{MainLoop, run_on_main};
pub use simulator::{ScriptedOutcome, SimulatedWallet, SimulatorConfig};
pub use stub::StubPlatform;
pub use traits::*;
