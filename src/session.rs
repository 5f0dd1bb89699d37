//! Single-threaded poll loop shared by the consumers.

use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

/// A consumer that does one bounded unit of work per tick.
pub trait Session {
    fn tick(&mut self) -> anyhow::Result<()>;
}

/// Tick `session` every `period` until Ctrl-C is received.
///
/// Returns `Ok(())` on interrupt. An error from a tick ends the loop and is returned, the
/// caller is responsible for closing the session in both cases.
pub async fn run_until_interrupt<S: Session>(
    session: &mut S,
    period: Duration,
) -> anyhow::Result<()> {
    run_until(session, period, tokio::signal::ctrl_c()).await
}

/// Tick `session` every `period` until `stop` resolves.
pub async fn run_until<S, F>(session: &mut S, period: Duration, stop: F) -> anyhow::Result<()>
where
    S: Session,
    F: std::future::Future,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => {
                log::debug!("Interrupted");
                return Ok(());
            }
            _ = ticker.tick() => session.tick()?,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{run_until, Session};
    use std::time::Duration;

    struct Counter {
        ticks: usize,
        fail_at: Option<usize>,
    }

    impl Session for Counter {
        fn tick(&mut self) -> anyhow::Result<()> {
            self.ticks += 1;
            if Some(self.ticks) == self.fail_at {
                anyhow::bail!("tick {} failed", self.ticks);
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_stopped() {
        let mut session = Counter {
            ticks: 0,
            fail_at: None,
        };
        let stop = tokio::time::sleep(Duration::from_millis(45));
        run_until(&mut session, Duration::from_millis(10), stop)
            .await
            .unwrap();
        // First tick fires immediately, then at 10, 20, 30 and 40 ms.
        assert_eq!(session.ticks, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_error_ends_loop() {
        let mut session = Counter {
            ticks: 0,
            fail_at: Some(3),
        };
        let stop = std::future::pending::<()>();
        let err = run_until(&mut session, Duration::from_millis(1), stop)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "tick 3 failed");
        assert_eq!(session.ticks, 3);
    }
}
