/*
 *  display/drivers/mock.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display surface for testing without hardware
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

use std::sync::{Arc, Mutex};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplaySurface, PixelFormat};
use crate::vframebuf::Canvas;

/// Mock surface, records every operation for verification in tests.
#[derive(Debug, Clone)]
pub struct MockDriver {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of times present() succeeded
    pub present_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Whether the driver is initialized
    pub is_initialized: bool,

    /// Copy of the most recent presented frame
    pub last_frame: Option<Canvas>,

    /// Simulate failures (for error testing)
    pub simulate_present_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriver {
    /// Create a mock driver with specific dimensions
    pub fn new_with_size(width: u32, height: u32) -> Self {
        Self {
            capabilities: DisplayCapabilities {
                width,
                height,
                pixel_format: PixelFormat::Xrgb8888,
                line_length: width as usize * 4,
                max_fps: 60,
            },
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Shared handle onto the recorded state
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }
}

impl DisplaySurface for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.lock().unwrap();
        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("simulated".into()));
        }
        state.init_count += 1;
        state.is_initialized = true;
        Ok(())
    }

    fn present(&mut self, frame: &Canvas) -> Result<(), DisplayError> {
        let mut state = self.state.lock().unwrap();
        if state.simulate_present_failure {
            return Err(DisplayError::Other("simulated present failure".into()));
        }
        state.present_count += 1;
        state.last_frame = Some(frame.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.lock().unwrap();
        state.clear_count += 1;
        state.last_frame = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;

    #[test]
    fn test_mock_driver_records() {
        let mut driver = MockDriver::new_with_size(4, 2);
        let state = driver.state();
        assert_eq!(driver.dimensions(), (4, 2));

        driver.init().unwrap();
        driver.present(&Canvas::new(4, 2, Rgb888::RED)).unwrap();
        {
            let s = state.lock().unwrap();
            assert!(s.is_initialized);
            assert_eq!(s.present_count, 1);
            assert_eq!(s.last_frame.as_ref().unwrap().pixel(3, 1), Some(Rgb888::RED));
        }

        driver.clear().unwrap();
        assert_eq!(state.lock().unwrap().clear_count, 1);
    }

    #[test]
    fn test_mock_driver_failures() {
        let mut driver = MockDriver::new_with_size(4, 2);
        driver.state().lock().unwrap().simulate_present_failure = true;
        assert!(driver.present(&Canvas::new(4, 2, Rgb888::BLACK)).is_err());
        assert_eq!(driver.state().lock().unwrap().present_count, 0);
    }

    #[test]
    fn test_mock_driver_init_failure() {
        let mut driver = MockDriver::new_with_size(4, 2);
        driver.state().lock().unwrap().simulate_init_failure = true;
        assert!(matches!(driver.init(), Err(DisplayError::InitializationFailed(_))));
        let s = driver.state();
        let s = s.lock().unwrap();
        assert!(!s.is_initialized);
        assert_eq!(s.init_count, 0);
    }
}
