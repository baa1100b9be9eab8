// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rj-stub binary entry point.

use rj_stub::{env, logging};

fn main() {
    if let Some(path) = env::log_path() {
        let _ = logging::init(&path, &env::log_level());
    }

    let code = match rj_stub::run() {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(code = e.code, error = %e, "stub failed");
            eprintln!("{e}");
            e.code
        }
    };
    std::process::exit(code);
}
