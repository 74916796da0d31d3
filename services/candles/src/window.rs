//! Tumbling window assignment, epoch-anchored

/// Window width in milliseconds
pub fn window_width_ms(candle_seconds: u32) -> i64 {
    i64::from(candle_seconds) * 1000
}

/// Start of the window containing `timestamp_ms`
///
/// Windows are anchored at the epoch: the containing window for a trade
/// at `t` is `[floor(t / W) * W, floor(t / W) * W + W)`.
pub fn window_start(timestamp_ms: i64, candle_seconds: u32) -> i64 {
    let width = window_width_ms(candle_seconds);
    timestamp_ms.div_euclid(width) * width
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn aligns_to_epoch_boundaries() {
        assert_eq!(window_start(60_000, 60), 60_000);
        assert_eq!(window_start(119_999, 60), 60_000);
        assert_eq!(window_start(120_000, 60), 120_000);
        assert_eq!(window_start(0, 60), 0);
    }

    proptest! {
        /// Every timestamp lands in exactly [floor(t/W)*W, floor(t/W)*W + W).
        #[test]
        fn window_contains_its_timestamp(
            timestamp_ms in 0i64..=4_102_444_800_000,
            candle_seconds in 1u32..=86_400,
        ) {
            let start = window_start(timestamp_ms, candle_seconds);
            let width = window_width_ms(candle_seconds);
            prop_assert!(start <= timestamp_ms);
            prop_assert!(timestamp_ms < start + width);
            prop_assert_eq!(start % width, 0);
        }
    }
}
