use std::time::Duration;

/// Exponential backoff: `unit * 2^attempt`, saturating on overflow
pub fn backoff(unit: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    unit.saturating_mul(factor)
}

/// Sleep for `duration`, skipping the timer entirely when it is zero
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let unit = Duration::from_secs(1);
        assert_eq!(backoff(unit, 0), Duration::from_secs(1));
        assert_eq!(backoff(unit, 1), Duration::from_secs(2));
        assert_eq!(backoff(unit, 3), Duration::from_secs(8));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let unit = Duration::from_secs(u64::MAX / 2);
        assert_eq!(backoff(unit, 40), Duration::MAX);
        assert_eq!(backoff(Duration::ZERO, 40), Duration::ZERO);
    }
}
