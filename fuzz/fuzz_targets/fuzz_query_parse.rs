#![no_main]

use libfuzzer_sys::fuzz_target;
use mcq_harness::{ContainerQuery, Size};

fuzz_target!(|data: (&str, f32, f32)| {
    let (text, width, height) = data;
    if let Ok(query) = ContainerQuery::parse(text) {
        let _ = query.evaluate(Size::new(width, height));
    }
});
