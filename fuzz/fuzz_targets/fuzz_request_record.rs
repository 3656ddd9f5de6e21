// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for inbound request records.
// Run with: cargo +nightly fuzz run fuzz_request_record
//
// Arbitrary JSON is decoded as a request record; anything that decodes must
// survive normalization and resource-type derivation without panicking.

#![no_main]

use gatehouse_core::Request;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    if let Ok(request) = serde_json::from_slice::<Request>(data) {
        let _ = request.malformed_reason();
        let _ = request.normalized_action();
        let _ = request.verb();
        let _ = request.resource_type();
        let _ = request.resource.encodes_actor(&request.actor);
    }
});
