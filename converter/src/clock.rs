use chrono::Utc;
use std::fmt::Debug;

/// Source of the current time in seconds since the unix epoch
pub trait Clock: Debug {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock frozen at a given second, used for reproducible output
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Assignment of one timestamp per input file
///
/// For `count` files the first file is stamped `now - count` and every
/// following file one second later, so the last file ends just before `now`
/// and no two files share an instant in the destination series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    base: i64,
    count: usize,
}

impl Timestamps {
    pub fn new(clock: &dyn Clock, count: usize) -> Self {
        let offset = i64::try_from(count).unwrap_or(i64::MAX);

        Self {
            base: clock.now().saturating_sub(offset),
            count,
        }
    }

    pub fn base(&self) -> i64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn for_index(&self, index: usize) -> i64 {
        self.base
            .saturating_add(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, SystemClock, Timestamps};

    #[test]
    fn files_are_spread_before_now() {
        let timestamps = Timestamps::new(&FixedClock(1_700_000_000), 3);

        assert_eq!(timestamps.base(), 1_699_999_997);
        assert_eq!(
            (0..timestamps.len())
                .map(|index| timestamps.for_index(index))
                .collect::<Vec<_>>(),
            vec![1_699_999_997, 1_699_999_998, 1_699_999_999]
        );
    }

    #[test]
    fn strictly_increasing_and_within_window() {
        let clock = SystemClock;
        let before = clock.now();
        let timestamps = Timestamps::new(&clock, 25);
        let after = clock.now();

        for index in 0..24 {
            assert!(timestamps.for_index(index) < timestamps.for_index(index + 1));
        }
        for index in 0..25 {
            let timestamp = timestamps.for_index(index);

            assert!(timestamp >= before - 25);
            assert!(timestamp < after);
        }
    }

    #[test]
    fn empty_listing() {
        let timestamps = Timestamps::new(&FixedClock(10), 0);

        assert!(timestamps.is_empty());
        assert_eq!(timestamps.base(), 10);
    }
}
