//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the control loop stalls.  The timeout must be
//! longer than the slowest tick cadence (heater-off period) plus one
//! sensor read.
//!
//! The main loop calls `feed()` on every pass.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

/// Default stall timeout.
pub const WATCHDOG_TIMEOUT_MS: u32 = 30_000;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(feature = "espidf")]
    subscribed: bool,
    #[cfg(not(feature = "espidf"))]
    feeds: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(WATCHDOG_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    #[cfg(feature = "espidf")]
    pub fn new(timeout_ms: u32) -> Self {
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            let subscribed = ret == ESP_OK;
            if subscribed {
                info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
            } else {
                log::warn!("Watchdog: failed to subscribe ({})", ret);
            }

            Self {
                timeout_ms,
                subscribed,
            }
        }
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(timeout_ms: u32) -> Self {
        info!("Watchdog(sim): {}ms timeout, not enforced", timeout_ms);
        Self {
            timeout_ms,
            feeds: 0,
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    #[cfg(feature = "espidf")]
    pub fn feed(&mut self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(feature = "espidf"))]
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
    }

    /// Number of feeds since construction (simulation only).
    #[cfg(not(feature = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}
