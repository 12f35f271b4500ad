/*
 *  pacer.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed rate frame pacing for the render loop
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */
use log::debug;
use std::time::{Duration, Instant};

pub struct FramePacer {
    next_deadline: Instant,
    frame: Duration,
    overruns: u64,
}

// SPI TFT behind fbtft manages ~30fps at 480x800 RGB565
// HDMI/DSI will happily do 60
impl FramePacer {
    pub fn new(target_fps: u32) -> Self {
        let frame = Duration::from_micros((1_000_000u32 / target_fps.max(1)) as u64);
        Self { next_deadline: Instant::now(), frame, overruns: 0 }
    }

    #[inline]
    pub fn frame_budget(&self) -> Duration {
        self.frame
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Schedule the next deadline and return how long to sleep until it.
    /// A frame that ran past its deadline restarts the schedule from `now`
    /// rather than bursting to catch up.
    pub fn next_delay(&mut self, now: Instant) -> Duration {
        self.next_deadline += self.frame;
        if self.next_deadline <= now {
            self.overruns += 1;
            debug!(
                "Frame overrun by {:.1}ms ({} total)",
                (now - self.next_deadline).as_secs_f32() * 1000.0,
                self.overruns
            );
            self.next_deadline = now;
            Duration::ZERO
        } else {
            self.next_deadline - now
        }
    }

    /// Sleep out the rest of the current frame.
    pub async fn wait(&mut self) {
        let delay = self.next_delay(Instant::now());
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_budget() {
        assert_eq!(FramePacer::new(30).frame_budget(), Duration::from_micros(33_333));
        assert_eq!(FramePacer::new(0).frame_budget(), Duration::from_secs(1));
    }

    #[test]
    fn test_sleeps_remainder() {
        let mut pacer = FramePacer::new(10);
        let start = pacer.next_deadline;
        let delay = pacer.next_delay(start + Duration::from_millis(30));
        assert_eq!(delay, Duration::from_millis(70));
        assert_eq!(pacer.overruns(), 0);
    }

    #[test]
    fn test_overrun_resets_schedule() {
        let mut pacer = FramePacer::new(10);
        let start = pacer.next_deadline;
        let late = start + Duration::from_millis(250);
        assert_eq!(pacer.next_delay(late), Duration::ZERO);
        assert_eq!(pacer.overruns(), 1);
        // next frame is a full budget after the late one, no burst
        assert_eq!(pacer.next_delay(late), Duration::from_millis(100));
    }
}
