// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!              ,---------------------------,
//!              |          config           |
//!              |  TOML --> [[layers]] -->  |
//!              |       BuiltOverlay        |
//!              '-------------+-------------'
//!                            v
//!   +----------------------------------------------+
//!   |  env      EnvReader / EnvWriter / EnvStore   |
//!   |           LocalEnv  ProgramEnv  OverlayEnv   |
//!   +----------------------------------------------+
//!         ^                              ^
//!         |                              |
//!   expand (ExpansionBridge,       params ($1..$n, $#)
//!           ShellExpander)
//!
//!   +----------------------------------------------+
//!   |  foundation   error, logging                 |
//!   +----------------------------------------------+
//! ```
//!
//! Everything is single-threaded: stores are shared with `Rc<RefCell<_>>`
//! and the program environment is global to the process.

pub mod config;
pub mod env;
pub mod error;
pub mod expand;
pub mod logging;
pub mod params;
