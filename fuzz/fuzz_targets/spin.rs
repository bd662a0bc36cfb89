#![no_main]

use arbitrary::Arbitrary;
use corvec::{
    CorrelationVector, ManualClock, SpinCounterInterval, SpinCounterPeriodicity, SpinEntropy,
    SpinParameters, Ticks,
};
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    vector: &'a str,
    ticks: u64,
    fine: bool,
    periodicity: u8,
    entropy: u8,
    seed: u64,
}

fuzz_target!(|input: Input<'_>| {
    let periodicity = match input.periodicity % 4 {
        0 => SpinCounterPeriodicity::None,
        1 => SpinCounterPeriodicity::Short,
        2 => SpinCounterPeriodicity::Medium,
        _ => SpinCounterPeriodicity::Long,
    };
    let interval = if input.fine {
        SpinCounterInterval::Fine
    } else {
        SpinCounterInterval::Coarse
    };
    let entropy = SpinEntropy::from_bytes(usize::from(input.entropy % 5)).unwrap_or_default();
    let params = SpinParameters::new(interval, periodicity, entropy);

    let clock = ManualClock::new(Ticks::new(input.ticks));
    let mut rng = StdRng::seed_from_u64(input.seed);
    if let Ok(cv) = CorrelationVector::spin_at(input.vector, &params, &clock, &mut rng) {
        let _ = cv.increment();
    }
});
