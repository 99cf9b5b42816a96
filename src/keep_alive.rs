use embedded_time::{Instant, duration, rate};

/// Whole seconds as a clock independent duration.
pub(crate) fn seconds<C: embedded_time::Clock>(secs: u16) -> duration::Generic<C::T> {
    duration::Generic::new(C::T::from(secs as u32), rate::Fraction::new(1, 1))
}

pub(crate) fn elapsed<C: embedded_time::Clock>(
    now: Instant<C>,
    since: Instant<C>,
) -> Result<duration::Generic<C::T>, crate::Error> {
    now.checked_duration_since(&since)
        .ok_or(crate::Error::TimeError)
}

/// PINGREQ scheduling while connected.
///
/// A ping goes out once more than half the keep alive interval has passed
/// since the previous one. With the watchdog on, a full interval after an
/// unanswered ping counts as a dead link.
pub(crate) struct KeepAlive<C: embedded_time::Clock> {
    keep_alive: duration::Generic<C::T>,
    half_keep_alive: duration::Generic<C::T>,
    last_ping: Instant<C>,
    ping_outstanding: bool,
    enabled: bool,
    watchdog: bool,
}

impl<C> KeepAlive<C>
where
    C: embedded_time::Clock,
{
    pub(crate) fn try_new(clock: &C, keep_alive_secs: u16, watchdog: bool) -> Result<Self, crate::Error> {
        let keep_alive = seconds::<C>(keep_alive_secs);
        let enabled = keep_alive_secs != 0;
        let half_keep_alive = duration::Generic::new(
            keep_alive.integer(),
            *keep_alive.scaling_factor() / rate::Fraction::from_integer(2),
        );
        let now = clock.try_now().map_err(|_| crate::Error::TimeError)?;

        Ok(Self {
            keep_alive,
            half_keep_alive,
            last_ping: now,
            ping_outstanding: false,
            enabled,
            watchdog,
        })
    }

    /// Restarts the ping timer, used when a new connection attempt begins.
    pub(crate) fn start(&mut self, now: Instant<C>) {
        self.last_ping = now;
        self.ping_outstanding = false;
    }

    /// Any inbound packet answers an outstanding ping.
    pub(crate) fn on_receive(&mut self) {
        self.ping_outstanding = false;
    }

    pub(crate) fn on_ping(&mut self, now: Instant<C>) {
        self.last_ping = now;
        self.ping_outstanding = true;
    }

    /// With the watchdog on, no new ping goes out while one is unanswered.
    pub(crate) fn should_ping(&self, now: Instant<C>) -> Result<bool, crate::Error> {
        if !self.enabled || (self.watchdog && self.ping_outstanding) {
            return Ok(false);
        }

        Ok(elapsed(now, self.last_ping)? > self.half_keep_alive)
    }

    pub(crate) fn timed_out(&self, now: Instant<C>) -> Result<bool, crate::Error> {
        if !self.enabled || !self.watchdog || !self.ping_outstanding {
            return Ok(false);
        }

        Ok(elapsed(now, self.last_ping)? >= self.keep_alive)
    }
}
