// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment fingerprint: MD5 over the sorted, NUL-terminated entries.
//!
//! Entries are compared by raw code unit, not by locale. The controller
//! caches environments by this value, so the ordering and the terminator
//! must not change.

use crate::digest::{Digest, Md5};

/// 16-byte environment fingerprint.
pub type Fingerprint = Digest;

/// A native string code unit: `u8` for narrow platforms, `u16` for wide.
pub trait CodeUnit: Copy + Ord {
    /// Terminator appended after every entry.
    const NUL: Self;

    /// Feed `units` into the digest in native byte layout.
    fn digest_units(units: &[Self], md5: &mut Md5);
}

impl CodeUnit for u8 {
    const NUL: Self = 0;

    fn digest_units(units: &[Self], md5: &mut Md5) {
        md5.update(units);
    }
}

impl CodeUnit for u16 {
    const NUL: Self = 0;

    fn digest_units(units: &[Self], md5: &mut Md5) {
        for unit in units {
            md5.update(&unit.to_le_bytes());
        }
    }
}

/// Fingerprint a set of `KEY=VALUE` entries, independent of their order.
///
/// The input is left untouched; sorting happens on a private copy of the
/// entry references.
pub fn fingerprint<U, E>(entries: &[E]) -> Fingerprint
where
    U: CodeUnit,
    E: AsRef<[U]>,
{
    let mut sorted: Vec<&[U]> = entries.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut md5 = Md5::new();
    for entry in sorted {
        U::digest_units(entry, &mut md5);
        U::digest_units(&[U::NUL], &mut md5);
    }
    md5.finalize()
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
