// SPDX-License-Identifier: GPL-3.0-only

//! Message handlers, grouped by concern

mod scanner;
mod system;
mod ui;
