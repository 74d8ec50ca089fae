//! Channel control: shared call state, frame dispatch, and clocking.
//!
//! The host loop owns the modem and network transports. It feeds inbound
//! frames to [`Control::process_frame`] and [`Control::process_network`],
//! drains outbound frames with [`Control::read_frame`], and calls
//! [`Control::clock`] between frames to run the timers. Each call runs to
//! completion; nothing here suspends.

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::acl::AccessControl;
use crate::channel::lich::{Lich, Usc};
use crate::config::Config;
use crate::consts::FULL_FRAME_BYTES;
use crate::error::Result;
use crate::frame::Tag;
use crate::layer3::Layer3;
use crate::network::PeerLink;
use crate::scramble;
use crate::site::SiteData;
use crate::timers::Timer;
use crate::voice::Voice;

/// RF-side call state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RfState {
    /// No call in progress.
    Listening,
    /// Repeating a voice call.
    Audio,
    /// Repeating a data call.
    Data,
    /// Holding off a denied source until it stops transmitting.
    Rejected,
}

/// Network-side call state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NetState {
    /// No call in progress.
    Idle,
    /// Relaying a network voice call.
    Audio,
    /// Relaying a network data call.
    Data,
}

/// A modem-format frame: the 2-byte tag prefix plus the air frame.
pub type FrameBuf = [u8; FULL_FRAME_BYTES];

/// State shared between the two sides of the channel.
pub(crate) struct ChannelState {
    pub(crate) ran: u8,
    pub(crate) duplex: bool,
    pub(crate) site: SiteData,
    pub(crate) acl: AccessControl,

    pub(crate) rf_state: RfState,
    pub(crate) net_state: NetState,

    pub(crate) rf_layer3: Layer3,
    pub(crate) net_layer3: Layer3,
    pub(crate) rf_mask: u8,
    pub(crate) net_mask: u8,

    pub(crate) rf_last_src_id: u16,
    pub(crate) rf_last_dst_id: u16,
    pub(crate) net_last_dst_id: u16,

    pub(crate) rf_timeout: Timer,
    pub(crate) net_timeout: Timer,
    pub(crate) rf_tg_hang: Timer,
    pub(crate) call_hang: Timer,

    pub(crate) rssi: u8,
    pub(crate) min_rssi: u8,
    pub(crate) max_rssi: u8,
    pub(crate) ave_rssi: u32,
    pub(crate) rssi_count: u32,

    pub(crate) queue: VecDeque<FrameBuf>,
}

impl ChannelState {
    pub(crate) fn new(config: &Config) -> ChannelState {
        ChannelState {
            ran: config.ran,
            duplex: config.duplex,
            site: SiteData::new(config.location_id, config.channel_no, config.ran),
            acl: AccessControl::new(&config.access),

            rf_state: RfState::Listening,
            net_state: NetState::Idle,

            rf_layer3: Layer3::new(),
            net_layer3: Layer3::new(),
            rf_mask: 0,
            net_mask: 0,

            rf_last_src_id: 0,
            rf_last_dst_id: 0,
            net_last_dst_id: 0,

            rf_timeout: Timer::new(config.timers.rf_timeout),
            net_timeout: Timer::new(config.timers.net_timeout),
            rf_tg_hang: Timer::new(config.timers.tg_hang),
            call_hang: Timer::new(config.timers.call_hang),

            rssi: 0,
            min_rssi: 0,
            max_rssi: 0,
            ave_rssi: 0,
            rssi_count: 0,

            queue: VecDeque::new(),
        }
    }

    /// Queue a regenerated frame for over-the-air transmission.
    pub(crate) fn enqueue_frame(&mut self, data: &FrameBuf) {
        self.queue.push_back(*data);
    }

    /// RF end-of-call bookkeeping.
    pub(crate) fn write_end_rf(&mut self) {
        self.rf_state = RfState::Listening;
        self.rf_mask = 0;
        self.rf_layer3.reset();
        self.rf_timeout.stop();
        self.call_hang.start();
    }

    /// Network end-of-call bookkeeping.
    pub(crate) fn write_end_net(&mut self) {
        self.net_state = NetState::Idle;
        self.net_mask = 0;
        self.net_layer3.reset();
        self.net_timeout.stop();
    }

    /// Begin RSSI statistics for a fresh call.
    pub(crate) fn seed_rssi(&mut self) {
        self.min_rssi = self.rssi;
        self.max_rssi = self.rssi;
        self.ave_rssi = self.rssi as u32;
        self.rssi_count = 1;
    }
}

/// NXDN channel control: owns the shared state and the voice handler, and
/// dispatches frames between them.
pub struct Control {
    state: ChannelState,
    voice: Voice,
}

impl Control {
    /// Construct channel control from validated configuration.
    pub fn new(config: &Config) -> Result<Control> {
        config.validate()?;

        let state = ChannelState::new(config);

        info!(
            "NXDN, RAN: {}, location ID: ${:06X}, channel no: {}, duplex: {}",
            state.ran,
            state.site.location_id(),
            state.site.channel_no(),
            state.duplex,
        );

        Ok(Control {
            state,
            voice: Voice::new(config.verbose),
        })
    }

    /// Handle one frame from the modem, mirroring output to the given peer
    /// link. `rssi` is the modem's signal reading for the frame, zero when
    /// unavailable. Returns whether the frame was consumed.
    pub fn process_frame<N: PeerLink>(
        &mut self,
        data: &mut FrameBuf,
        rssi: u8,
        net: &mut N,
    ) -> bool {
        if data[0] == Tag::Lost.bits() {
            if self.state.rf_state == RfState::Audio {
                self.voice.rf_lost(&mut self.state);
            } else {
                self.state.rf_mask = 0;
                self.state.rf_layer3.reset();
                self.state.rf_state = RfState::Listening;
            }

            return false;
        }

        scramble::scramble(&mut data[2..]);

        let lich = match Lich::decode(&data[2..]) {
            Some(lich) => lich,
            None => {
                debug!("undecodable LICH, dropping frame");
                return false;
            }
        };

        self.state.rssi = rssi;

        if rssi != 0 && self.state.rf_state == RfState::Audio {
            self.state.min_rssi = self.state.min_rssi.min(rssi);
            self.state.max_rssi = self.state.max_rssi.max(rssi);
            self.state.ave_rssi += rssi as u32;
            self.state.rssi_count += 1;
        }

        let consumed = match lich.usc {
            Usc::Udch => {
                debug!("user data channel frames are not repeated");
                false
            }
            usc => self
                .voice
                .process(&mut self.state, usc, lich.option, data, net),
        };

        if consumed && self.state.rf_state == RfState::Audio {
            self.state.rf_last_src_id = self.state.rf_layer3.src_id();
            self.state.rf_last_dst_id = self.state.rf_layer3.dst_id();
            self.state.rf_tg_hang.start();
        }

        consumed
    }

    /// Handle one frame from the peer network. Returns whether the frame was
    /// consumed.
    pub fn process_network(&mut self, data: &mut FrameBuf) -> bool {
        scramble::scramble(&mut data[2..]);

        let lich = match Lich::decode(&data[2..]) {
            Some(lich) => lich,
            None => {
                debug!("undecodable LICH on network frame, dropping");
                return false;
            }
        };

        let consumed = match lich.usc {
            Usc::Udch => {
                debug!("user data channel frames are not repeated");
                false
            }
            usc => self
                .voice
                .process_network(&mut self.state, usc, lich.option, data),
        };

        if consumed && self.state.net_state == NetState::Audio {
            self.state.net_last_dst_id = self.state.net_layer3.dst_id();
        }

        consumed
    }

    /// Drain one queued frame destined for the modem.
    pub fn read_frame(&mut self) -> Option<FrameBuf> {
        self.state.queue.pop_front()
    }

    /// Run the timers. Call between frames from the host loop.
    pub fn clock(&mut self) {
        if self.state.rf_timeout.has_expired() && self.state.rf_state == RfState::Audio {
            warn!("RF call watchdog expired, forcing end of call");
            self.voice.rf_timed_out(&mut self.state);
        }

        if self.state.net_timeout.has_expired() && self.state.net_state == NetState::Audio {
            warn!("network call watchdog expired, forcing end of call");
            self.voice.net_timed_out(&mut self.state);
        }

        if self.state.rf_tg_hang.is_running() && self.state.rf_tg_hang.has_expired() {
            self.state.rf_tg_hang.stop();
            self.state.rf_last_dst_id = 0;
        }

        if self.state.call_hang.is_running() && self.state.call_hang.has_expired() {
            self.state.call_hang.stop();
            self.state.rf_last_src_id = 0;
        }
    }

    /// Current RF-side state.
    pub fn rf_state(&self) -> RfState {
        self.state.rf_state
    }

    /// Current network-side state.
    pub fn net_state(&self) -> NetState {
        self.state.net_state
    }

    /// Identities of the most recent RF call, zero when none.
    pub fn rf_last_ids(&self) -> (u16, u16) {
        (self.state.rf_last_src_id, self.state.rf_last_dst_id)
    }

    /// Site identity in use.
    pub fn site(&self) -> SiteData {
        self.state.site
    }

    /// Record fixed-network connectivity in the site identity.
    pub fn set_net_active(&mut self, active: bool) {
        self.state.site.set_net_active(active);
    }
}
