#![no_main]

use arbitrary::Arbitrary;
use corvec::{set_validate_during_creation, CorrelationVector};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    vector: &'a str,
    strict: bool,
    increments: u8,
}

fuzz_target!(|input: Input<'_>| {
    set_validate_during_creation(input.strict);
    let Ok(cv) = CorrelationVector::extend(input.vector) else {
        assert!(input.strict);
        return;
    };

    let max = cv.version().max_length();
    let mut last = cv.extension();
    for _ in 0..input.increments {
        let value = cv.increment();
        assert!(cv.extension() >= last);
        last = cv.extension();
        if !cv.is_immutable() && !cv.base_vector().is_empty() {
            assert!(value.chars().count() <= max);
        }
    }
});
