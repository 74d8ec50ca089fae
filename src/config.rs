//! Host-facing configuration surface.
//!
//! The host process deserialises whatever file format it likes into these
//! structs and hands them to [`crate::control::Control`]; nothing here reads
//! files. Field names follow the configuration keys recognised on the wire
//! format side (`callHang`, `tgHang`, ...).

use serde::Deserialize;

use crate::error::{NxdnError, Result};

/// Timer knobs, in milliseconds.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimersConfig {
    /// How long the identities of a finished call stay visible.
    pub call_hang: u64,
    /// Post-call talk-group affinity window.
    pub tg_hang: u64,
    /// Maximum duration of an RF call.
    pub rf_timeout: u64,
    /// Maximum duration of a network call.
    pub net_timeout: u64,
    /// How long the channel stays in RF mode after RF activity (host loop
    /// concern).
    pub rf_mode_hang: u64,
    /// How long the channel stays in network mode after network activity
    /// (host loop concern).
    pub net_mode_hang: u64,
}

impl Default for TimersConfig {
    fn default() -> TimersConfig {
        TimersConfig {
            call_hang: 5000,
            tg_hang: 2000,
            rf_timeout: 180_000,
            net_timeout: 180_000,
            rf_mode_hang: 10_000,
            net_mode_hang: 10_000,
        }
    }
}

/// Identifier allow and deny lists. An empty allow list permits every
/// identifier not explicitly denied.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessLists {
    pub rid_allow: Vec<u16>,
    pub rid_deny: Vec<u16>,
    pub tg_allow: Vec<u16>,
    pub tg_deny: Vec<u16>,
}

/// Channel configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Radio access number of this site, 6 bits.
    pub ran: u8,
    /// Whether the repeater retransmits over the air.
    pub duplex: bool,
    /// Per-frame FEC detail logging.
    pub verbose: bool,
    /// 24-bit site location identity.
    pub location_id: u32,
    /// 12-bit channel number.
    pub channel_no: u16,
    pub timers: TimersConfig,
    pub access: AccessLists,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            ran: 1,
            duplex: true,
            verbose: false,
            location_id: 1,
            channel_no: 1,
            timers: TimersConfig::default(),
            access: AccessLists::default(),
        }
    }
}

impl Config {
    /// Check field ranges the air interface imposes.
    pub fn validate(&self) -> Result<()> {
        if self.ran >> 6 != 0 {
            return Err(NxdnError::InvalidConfig("ran must fit in 6 bits"));
        }

        if self.location_id >> 24 != 0 {
            return Err(NxdnError::InvalidConfig("locationId must fit in 24 bits"));
        }

        if self.channel_no >> 12 != 0 {
            return Err(NxdnError::InvalidConfig("channelNo must fit in 12 bits"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_range_checks() {
        let mut config = Config::default();
        config.ran = 64;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.location_id = 1 << 24;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.channel_no = 1 << 12;
        assert!(config.validate().is_err());
    }
}
