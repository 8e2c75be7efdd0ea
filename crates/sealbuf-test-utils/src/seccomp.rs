// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::os::fd::RawFd;

use libseccomp::{ScmpAction, ScmpArgCompare, ScmpCompareOp, ScmpFilterContext, ScmpSyscall};

/// Check if seccomp is available by forking a child process that attempts to load a filter.
/// Returns true if seccomp works, false if running under QEMU or seccomp is unavailable.
pub fn is_seccomp_available() -> bool {
    match unsafe { libc::fork() } {
        -1 => {
            // Fork failed
            eprintln!("Failed to fork for seccomp check");
            false
        }
        0 => {
            // Child process: try to load a dummy seccomp filter
            let result = ScmpFilterContext::new(ScmpAction::Allow).and_then(|filter| filter.load());

            // Exit with 0 if successful, 1 if failed
            std::process::exit(if result.is_ok() { 0 } else { 1 });
        }
        child_pid => {
            // Parent process: wait for child and check exit status
            let mut status: libc::c_int = 0;
            unsafe {
                libc::waitpid(child_pid, &mut status, 0);
            }

            // Check if child exited successfully (exit code 0)
            libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0
        }
    }
}

fn block_syscall(name: &str, conditions: &[ScmpArgCompare]) {
    let mut filter = ScmpFilterContext::new(ScmpAction::Allow).expect("Failed to create filter");
    let syscall = ScmpSyscall::from_name(name).expect("Failed to from_name(..)");

    // Unconditional rules block every call; conditional ones only matching calls.
    if conditions.is_empty() {
        filter
            .add_rule(ScmpAction::Errno(libc::EPERM), syscall)
            .expect("Failed to add rule");
    } else {
        filter
            .add_rule_conditional(ScmpAction::Errno(libc::EPERM), syscall, conditions)
            .expect("Failed to add conditional rule");
    }

    filter.load().expect("Failed to load seccomp filter");
}

/// Makes every later `mlock` fail with EPERM.
pub fn block_mlock() {
    block_syscall("mlock", &[]);
}

/// Makes every later `mmap` fail with EPERM.
pub fn block_mmap() {
    block_syscall("mmap", &[]);
}

/// Makes later `mmap` calls on `fd` fail with EPERM. Anonymous and other
/// file mappings keep working, so the test harness is unaffected.
pub fn block_mmap_of_fd(fd: RawFd) {
    // mmap(addr, len, prot, flags, fd, offset): fd is argument 4.
    block_syscall(
        "mmap",
        &[ScmpArgCompare::new(4, ScmpCompareOp::Equal, fd as u64)],
    );
}

/// Makes every later `madvise` fail with EPERM.
pub fn block_madvise() {
    block_syscall("madvise", &[]);
}
