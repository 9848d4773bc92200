// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;

use crate::constants::{ELLIPSIS, MAX_OUTPUT_LENGTH, TRUNCATED_PREFIX_LENGTH};

/// Bounds `s` to [`MAX_OUTPUT_LENGTH`] characters.
///
/// Longer strings keep their first [`TRUNCATED_PREFIX_LENGTH`] characters and
/// gain an [`ELLIPSIS`]. Length is counted in `char`s so the cut always lands
/// on a character boundary.
///
/// ```
/// use newrelic_log_shipper::truncate;
///
/// assert_eq!(truncate("short"), "short");
///
/// let long = "x".repeat(2000);
/// let cut = truncate(&long);
/// assert_eq!(cut.chars().count(), 1024);
/// assert!(cut.ends_with("..."));
/// ```
#[must_use]
pub fn truncate(s: &str) -> Cow<'_, str> {
    // Byte length is an upper bound on the char count.
    if s.len() <= MAX_OUTPUT_LENGTH {
        return Cow::Borrowed(s);
    }

    let mut indices = s.char_indices();
    let Some((cut, _)) = indices.nth(TRUNCATED_PREFIX_LENGTH) else {
        return Cow::Borrowed(s);
    };
    // Chars remaining after the prefix, including the one at `cut`.
    if indices.nth(MAX_OUTPUT_LENGTH - TRUNCATED_PREFIX_LENGTH - 1).is_none() {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(cut + ELLIPSIS.len());
    out.push_str(&s[..cut]);
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}
