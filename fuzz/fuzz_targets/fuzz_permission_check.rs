// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for permission checks.
// Run with: cargo +nightly fuzz run fuzz_permission_check
//
// Splits the input into actor, action, and resource on newlines and checks
// them against the built-in constitution. The engine must never panic, and
// a superuser must be allowed whatever the action looks like.

#![no_main]

use gatehouse_constitution::Constitution;
use gatehouse_core::Resource;
use gatehouse_permission::evaluate;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 4096 {
        return;
    }

    let mut parts = input.splitn(3, '\n');
    let actor = parts.next().unwrap_or_default();
    let action = parts.next().unwrap_or_default();
    let resource = Resource::path(parts.next().unwrap_or_default());

    let constitution = Constitution::default();
    let _ = evaluate(constitution.role(actor), actor, action, &resource);

    let admin = evaluate(constitution.role("admin"), "admin", action, &resource);
    assert!(admin.allowed);
});
