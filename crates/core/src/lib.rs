// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-core: process identity and environment fingerprinting for the
//! remote jobs stub.

pub mod digest;
pub mod fingerprint;
pub mod identity;

pub use digest::{compute, to_hex, Digest, Md5, DIGEST_LEN};
pub use fingerprint::{fingerprint, CodeUnit, Fingerprint};
pub use identity::{CaptureError, ProcessIdentity};
