#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera::fuzz::{stream_roundtrip, StreamOp};

fuzz_target!(|ops: Vec<StreamOp>| {
    stream_roundtrip(ops);
});
