use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};

/// Fixed-cadence tick driver. Hands the current local time to `tick`,
/// sleeps `interval`, and repeats until the callback breaks; the break
/// value is returned. Each tick is synchronous and self-contained, so
/// stopping is just breaking the loop.
pub fn run<F, B>(interval: Duration, mut tick: F) -> B
where
    F: FnMut(DateTime<Local>) -> ControlFlow<B>,
{
    loop {
        if let ControlFlow::Break(value) = tick(Local::now()) {
            return value;
        }
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_until_the_callback_breaks() {
        let mut ticks = 0_u32;
        let result: &str = run(Duration::from_millis(1), |_now| {
            ticks += 1;
            if ticks == 3 {
                ControlFlow::Break("done")
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(result, "done");
        assert_eq!(ticks, 3);
    }

    #[test]
    fn tick_times_never_move_backwards() {
        let mut samples: Vec<DateTime<Local>> = Vec::new();
        run(Duration::from_millis(1), |now| {
            samples.push(now);
            if samples.len() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
