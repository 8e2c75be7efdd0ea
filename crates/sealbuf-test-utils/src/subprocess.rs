// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

/// Runs an ignored test as a subprocess and returns its exit code.
///
/// Used for tests that install seccomp filters, which cannot be undone
/// inside the calling process.
pub fn run_test_as_subprocess(test_name: &str) -> Option<i32> {
    let exe = std::env::current_exe().expect("Failed to current_exe()");

    // Run exactly one ignored test, single-threaded, with its output visible.
    let status = std::process::Command::new(exe)
        .args([
            "--exact",
            test_name,
            "--ignored",
            "--test-threads=1",
            "--nocapture",
        ])
        .status()
        .expect("Failed to run subprocess");

    // None when the child was killed by a signal.
    status.code()
}
