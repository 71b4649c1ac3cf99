use std::ops::Range;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::codec::BikeSample;

pub trait ValueSource: Send {
    fn heart_rate(&mut self) -> u8;

    fn bike_sample(&mut self) -> BikeSample;
}

#[derive(Debug, Clone)]
pub struct SimulatedRanges {
    pub heart_rate: Range<u8>,
    pub speed: Range<u16>,
    pub cadence: Range<u16>,
    pub power: Range<i16>,
}

impl Default for SimulatedRanges {
    fn default() -> Self {
        SimulatedRanges {
            heart_rate: 60..120,
            speed: 2000..3500,
            cadence: 160..200,
            power: 100..250,
        }
    }
}

pub struct RandomValueSource {
    rng: StdRng,
    ranges: SimulatedRanges,
}

impl RandomValueSource {
    pub fn new(ranges: SimulatedRanges) -> Self {
        RandomValueSource {
            rng: StdRng::from_entropy(),
            ranges,
        }
    }

    pub fn seeded(seed: u64, ranges: SimulatedRanges) -> Self {
        RandomValueSource {
            rng: StdRng::seed_from_u64(seed),
            ranges,
        }
    }
}

impl Default for RandomValueSource {
    fn default() -> Self {
        RandomValueSource::new(SimulatedRanges::default())
    }
}

impl ValueSource for RandomValueSource {
    fn heart_rate(&mut self) -> u8 {
        self.rng.gen_range(self.ranges.heart_rate.clone())
    }

    fn bike_sample(&mut self) -> BikeSample {
        let heart_rate = self.heart_rate();
        BikeSample {
            speed: self.rng.gen_range(self.ranges.speed.clone()),
            cadence: self.rng.gen_range(self.ranges.cadence.clone()),
            power: self.rng.gen_range(self.ranges.power.clone()),
            heart_rate,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedValueSource {
    pub heart_rate: u8,
    pub sample: BikeSample,
}

impl Default for FixedValueSource {
    fn default() -> Self {
        FixedValueSource {
            heart_rate: 75,
            sample: BikeSample {
                speed: 621,
                cadence: 84,
                power: 51,
                heart_rate: 75,
            },
        }
    }
}

impl ValueSource for FixedValueSource {
    fn heart_rate(&mut self) -> u8 {
        self.heart_rate
    }

    fn bike_sample(&mut self) -> BikeSample {
        self.sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_heart_rate_stays_in_range() {
        let mut source = RandomValueSource::seeded(7, SimulatedRanges::default());
        for _ in 0..500 {
            let bpm = source.heart_rate();
            assert!((60..120).contains(&bpm), "{bpm} out of range");
        }
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = RandomValueSource::seeded(42, SimulatedRanges::default());
        let mut b = RandomValueSource::seeded(42, SimulatedRanges::default());
        for _ in 0..10 {
            assert_eq!(a.bike_sample(), b.bike_sample());
        }
    }
}
