#![no_main]

use corvec::CorrelationVector;
use corvec_core::{decode, format, is_oversized};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let cv = CorrelationVector::parse(data);

    let Some(d) = decode(data) else {
        assert_eq!(cv.extension(), 0);
        return;
    };

    let frozen = d.immutable || is_oversized(d.base_vector, d.extension, cv.version().max_length());
    assert_eq!(cv.value(), format(d.base_vector, d.extension, frozen));

    if frozen {
        let value = cv.value();
        assert_eq!(cv.increment(), value);
    }
});
