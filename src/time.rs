use embedded_time::{Clock, Instant, clock, rate::Fraction};

/// [`Clock`] running on the embassy time driver at its native tick rate.
///
/// Readings are relative to `origin`, so a freshly created clock starts close
/// to zero regardless of the driver's uptime.
#[derive(Clone, Copy, Debug)]
pub struct EmbassyClock {
    origin: embassy_time::Instant,
}

impl EmbassyClock {
    pub fn new() -> Self {
        Self::since(embassy_time::Instant::now())
    }

    pub fn since(origin: embassy_time::Instant) -> Self {
        Self { origin }
    }
}

impl Default for EmbassyClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for EmbassyClock {
    type T = u64;

    const SCALING_FACTOR: Fraction = Fraction::new(1, embassy_time::TICK_HZ as u32);

    fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
        let ticks = embassy_time::Instant::now()
            .checked_duration_since(self.origin)
            .ok_or(clock::Error::Unspecified)?
            .as_ticks();

        Ok(Instant::new(ticks))
    }
}
