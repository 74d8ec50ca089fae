//! Voice call state machines for the RF and network sides of the channel.
//!
//! Both sides follow the same shape. A non-superblock frame carries a whole
//! Layer-3 message in its FACCH1 slots and drives call setup and release
//! directly. Superblock frames carry voice; while the side is quiet they
//! feed late entry, either from a stolen FACCH1 or by reassembling the
//! Layer-3 from four 18-bit SACCH fragments. Once a side owns the channel,
//! every frame is rewritten before rebroadcast: sync and LICH regenerated,
//! SACCH restamped with the local access number, voice FEC corrected in
//! place, stolen FACCH1s re-encoded, and the scrambler reapplied.
//!
//! Admission runs the traffic-collision rule against the opposite side and
//! then the access-control predicates; the machines act on the resulting
//! decision.

use log::{debug, info, warn};

use crate::ambe;
use crate::channel::facch1::Facch1;
use crate::channel::lich::{ChannelType, Direction, Lich, Steal, Usc};
use crate::channel::sacch::Sacch;
use crate::consts::{
    FACCH1_FIRST_OFFSET, FACCH1_SECOND_OFFSET, FRAGMENT_BITS, FRAMES_PER_SECOND,
    FSW_LICH_SACCH_BYTES, FULL_FRAME_BYTES, VOICE_GROUP_BYTES,
};
use crate::control::{ChannelState, FrameBuf, NetState, RfState};
use crate::frame::Tag;
use crate::layer3::{Layer3, MessageType};
use crate::network::PeerLink;
use crate::scramble;
use crate::sync;

/// Outcome of the admission checks ahead of a state transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Admission {
    /// Clear to take the call.
    Admit,
    /// The new call loses to traffic already in progress.
    PreemptNew,
    /// The source identifier is not permitted.
    RejectSrc,
    /// The destination identifier is not permitted.
    RejectDst,
}

/// Superframe fragment positions, from the SACCH structure countdown.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Fragment {
    First,
    Second,
    Third,
    Last,
}

impl Fragment {
    /// Interpret the 2-bit frames-remaining countdown.
    fn from_countdown(bits: u8) -> Fragment {
        use self::Fragment::*;

        match bits & 0x3 {
            3 => First,
            2 => Second,
            1 => Third,
            _ => Last,
        }
    }
}

/// Voice call handler for both sides of the channel.
pub struct Voice {
    rf_frames: u32,
    rf_bits: u32,
    rf_errs: u32,
    rf_undecodable_lc: u32,

    net_frames: u32,
    net_bits: u32,
    net_errs: u32,
    net_undecodable_lc: u32,

    last_reject_id: u16,
    verbose: bool,
}

impl Voice {
    /// Construct an idle `Voice` handler.
    pub(crate) fn new(verbose: bool) -> Voice {
        Voice {
            rf_frames: 0,
            rf_bits: 1,
            rf_errs: 0,
            rf_undecodable_lc: 0,

            net_frames: 0,
            net_bits: 1,
            net_errs: 0,
            net_undecodable_lc: 0,

            last_reject_id: 0,
            verbose,
        }
    }

    /// Reset the RF-side call counters.
    fn reset_rf(&mut self) {
        self.rf_frames = 0;
        self.rf_errs = 0;
        self.rf_bits = 1;
        self.rf_undecodable_lc = 0;
    }

    /// Reset the network-side call counters.
    fn reset_net(&mut self) {
        self.net_frames = 0;
        self.net_errs = 0;
        self.net_bits = 1;
        self.net_undecodable_lc = 0;
    }

    /// Process one descrambled frame from the RF side. Returns whether the
    /// frame was consumed.
    pub(crate) fn process<N: PeerLink>(
        &mut self,
        state: &mut ChannelState,
        usc: Usc,
        option: Steal,
        data: &mut FrameBuf,
        net: &mut N,
    ) -> bool {
        let sacch = Sacch::decode(&data[2..]);

        match sacch {
            Some((sacch, _)) => {
                // Frames from foreign sites are not ours to repeat.
                let ran = sacch.ran();
                if ran != state.ran && ran != 0 {
                    return false;
                }
            }
            // Cannot admit a call without knowing the access number.
            None if state.rf_state == RfState::Listening => return false,
            None => {}
        }

        if usc == Usc::SacchNs {
            return self.process_rf_ns(state, data, net);
        }

        if state.rf_state == RfState::Listening
            && !self.rf_late_entry(state, option, sacch, data, net)
        {
            return false;
        }

        if state.rf_state == RfState::Audio {
            self.rf_audio(state, usc, option, data, net);
        }

        true
    }

    /// Non-superblock frame on the RF side: call setup and release.
    fn process_rf_ns<N: PeerLink>(
        &mut self,
        state: &mut ChannelState,
        data: &mut FrameBuf,
        net: &mut N,
    ) -> bool {
        let facch = Facch1::decode(&data[2..], FACCH1_FIRST_OFFSET)
            .or_else(|| Facch1::decode(&data[2..], FACCH1_SECOND_OFFSET));

        let facch = match facch {
            Some((facch, _)) => facch,
            None => return false,
        };

        let layer3 = Layer3::from_bytes(*facch.data());
        let src_id = layer3.src_id();
        let dst_id = layer3.dst_id();
        let group = layer3.group();

        let eot = match layer3.message_type() {
            Some(MessageType::TxRelease) => {
                if state.rf_state != RfState::Audio {
                    // A stray release; fall back to listening.
                    state.rf_state = RfState::Listening;
                    state.rf_mask = 0;
                    state.rf_layer3.reset();
                    return false;
                }

                true
            }
            Some(MessageType::Vcall) => {
                if self.rf_collision(state, src_id, dst_id) != Admission::Admit {
                    return false;
                }

                if self.validate_rf_access(state, src_id, dst_id, group) != Admission::Admit {
                    return false;
                }

                false
            }
            _ => return false,
        };

        state.rf_layer3 = layer3;

        self.rebuild_setup_frame(state, &facch, self.rf_direction(state), &mut data[2..]);

        data[0] = if eot { Tag::Eot.bits() } else { Tag::Data.bits() };
        data[1] = 0x00;

        self.write_network(state, data, net);

        if state.duplex {
            state.enqueue_frame(data);
        }

        if eot {
            self.rf_frames += 1;
            self.log_rf_end(state, "end of transmission");

            info!(
                "TX_REL, total frames: {}, bits: {}, undecodable LC: {}, errors: {}, BER: {:.4}%",
                self.rf_frames,
                self.rf_bits,
                self.rf_undecodable_lc,
                self.rf_errs,
                self.rf_errs as f32 * 100.0 / self.rf_bits as f32,
            );

            state.write_end_rf();
        } else {
            self.reset_rf();
            state.rf_timeout.start();
            state.rf_state = RfState::Audio;
            state.seed_rssi();

            info!(
                target: "activity",
                "RF voice transmission from {} to {}{}",
                src_id,
                if group { "TG " } else { "" },
                dst_id,
            );
        }

        true
    }

    /// Try to join a voice call already in progress on the RF side.
    fn rf_late_entry<N: PeerLink>(
        &mut self,
        state: &mut ChannelState,
        option: Steal,
        sacch: Option<(Sacch, usize)>,
        data: &mut FrameBuf,
        net: &mut N,
    ) -> bool {
        let facch = match option {
            Steal::FacchBoth => Facch1::decode(&data[2..], FACCH1_FIRST_OFFSET)
                .or_else(|| Facch1::decode(&data[2..], FACCH1_SECOND_OFFSET)),
            Steal::Facch1First => Facch1::decode(&data[2..], FACCH1_FIRST_OFFSET),
            Steal::Facch1Second => Facch1::decode(&data[2..], FACCH1_SECOND_OFFSET),
            Steal::None => None,
        };

        let mut has_info = false;

        if let Some((facch, _)) = facch {
            let layer3 = Layer3::from_bytes(*facch.data());

            if layer3.message_type() != Some(MessageType::Vcall) {
                return false;
            }

            state.rf_layer3 = layer3;
            has_info = true;
        }

        if !has_info {
            let sacch = match sacch {
                Some((sacch, _)) => sacch,
                None => return false,
            };

            let frag = sacch.data();

            match Fragment::from_countdown(sacch.structure()) {
                Fragment::First => {
                    state.rf_layer3.decode(&frag, FRAGMENT_BITS, 0);

                    // Only a voice call announcement starts a superframe.
                    state.rf_mask =
                        if state.rf_layer3.message_type() == Some(MessageType::Vcall) {
                            0x01
                        } else {
                            0x00
                        };
                }
                Fragment::Second => {
                    state.rf_mask |= 0x02;
                    state.rf_layer3.decode(&frag, FRAGMENT_BITS, 18);
                }
                Fragment::Third => {
                    state.rf_mask |= 0x04;
                    state.rf_layer3.decode(&frag, FRAGMENT_BITS, 36);
                }
                Fragment::Last => {
                    state.rf_mask |= 0x08;
                    state.rf_layer3.decode(&frag, FRAGMENT_BITS, 54);
                }
            }

            if state.rf_mask != 0x0F {
                return false;
            }

            if state.rf_layer3.message_type() != Some(MessageType::Vcall) {
                return false;
            }
        }

        let src_id = state.rf_layer3.src_id();
        let dst_id = state.rf_layer3.dst_id();
        let group = state.rf_layer3.group();

        if self.rf_collision(state, src_id, dst_id) != Admission::Admit {
            return false;
        }

        if self.validate_rf_access(state, src_id, dst_id, group) != Admission::Admit {
            return false;
        }

        self.reset_rf();
        state.rf_timeout.start();
        state.rf_state = RfState::Audio;
        state.seed_rssi();

        info!(
            target: "activity",
            "RF late entry from {} to {}{}",
            src_id,
            if group { "TG " } else { "" },
            dst_id,
        );

        // Synthesise the setup frame the mobile never gave us, so remote
        // peers and late listeners can join too.
        let mut start = [0u8; FULL_FRAME_BYTES];
        let facch = Facch1::new(state.rf_layer3.bytes());
        self.rebuild_setup_frame(state, &facch, self.rf_direction(state), &mut start[2..]);

        start[0] = Tag::Data.bits();
        start[1] = 0x00;

        self.write_network(state, &start, net);

        if state.duplex {
            state.enqueue_frame(&start);
        }

        true
    }

    /// Rewrite an in-call RF voice frame for rebroadcast.
    fn rf_audio<N: PeerLink>(
        &mut self,
        state: &mut ChannelState,
        usc: Usc,
        option: Steal,
        data: &mut FrameBuf,
        net: &mut N,
    ) {
        let direction = self.rf_direction(state);
        let (errs, bits, undecodable) = regenerate_traffic(
            state,
            usc,
            option,
            direction,
            &mut data[2..],
            self.verbose,
        );

        self.rf_errs += errs;
        self.rf_bits += bits;
        self.rf_undecodable_lc += undecodable;

        data[0] = Tag::Data.bits();
        data[1] = 0x00;

        self.write_network(state, data, net);

        if state.duplex {
            state.enqueue_frame(data);
        }

        self.rf_frames += 1;
    }

    /// Process one descrambled frame from the peer network. Returns whether
    /// the frame was consumed.
    pub(crate) fn process_network(
        &mut self,
        state: &mut ChannelState,
        usc: Usc,
        option: Steal,
        data: &mut FrameBuf,
    ) -> bool {
        if state.net_state == NetState::Idle && state.rf_state == RfState::Listening {
            // Fresh session housekeeping while the channel is quiet.
            state.queue.clear();
            self.reset_rf();
            self.reset_net();
        }

        // Peers have already applied the access-number filter.
        let sacch = Sacch::decode(&data[2..]);

        if usc == Usc::SacchNs {
            return self.process_net_ns(state, data);
        }

        if state.net_state == NetState::Idle
            && !self.net_late_entry(state, option, sacch, data)
        {
            return false;
        }

        if state.net_state == NetState::Audio {
            self.net_audio(state, usc, option, data);
        }

        true
    }

    /// Non-superblock frame from the network: call setup and release.
    fn process_net_ns(&mut self, state: &mut ChannelState, data: &mut FrameBuf) -> bool {
        let facch = Facch1::decode(&data[2..], FACCH1_FIRST_OFFSET)
            .or_else(|| Facch1::decode(&data[2..], FACCH1_SECOND_OFFSET));

        let facch = match facch {
            Some((facch, _)) => facch,
            None => return false,
        };

        let layer3 = Layer3::from_bytes(*facch.data());
        let src_id = layer3.src_id();
        let dst_id = layer3.dst_id();
        let group = layer3.group();

        let eot = match layer3.message_type() {
            Some(MessageType::TxRelease) => {
                if state.net_state != NetState::Audio {
                    state.net_state = NetState::Idle;
                    state.net_mask = 0;
                    state.net_layer3.reset();
                    return false;
                }

                true
            }
            Some(MessageType::Vcall) => {
                if self.net_collision(state, src_id, dst_id) != Admission::Admit {
                    return false;
                }

                if self.validate_net_access(state, src_id, dst_id, group) != Admission::Admit {
                    return false;
                }

                false
            }
            _ => return false,
        };

        state.net_layer3 = layer3;

        self.rebuild_setup_frame(state, &facch, Direction::Outbound, &mut data[2..]);

        data[0] = if eot { Tag::Eot.bits() } else { Tag::Data.bits() };
        data[1] = 0x00;

        if state.duplex {
            state.enqueue_frame(data);
        }

        if eot {
            self.net_frames += 1;

            info!(
                target: "activity",
                "network end of transmission, {:.1} seconds",
                self.net_frames as f32 / FRAMES_PER_SECOND,
            );

            info!(
                "TX_REL, total frames: {}, bits: {}, undecodable LC: {}, errors: {}",
                self.net_frames, self.net_bits, self.net_undecodable_lc, self.net_errs,
            );

            state.write_end_net();
        } else {
            self.reset_net();
            state.net_timeout.start();
            state.net_state = NetState::Audio;

            info!(
                target: "activity",
                "network voice transmission from {} to {}{}",
                src_id,
                if group { "TG " } else { "" },
                dst_id,
            );
        }

        true
    }

    /// Try to join a voice call already in progress on the network side.
    fn net_late_entry(
        &mut self,
        state: &mut ChannelState,
        option: Steal,
        sacch: Option<(Sacch, usize)>,
        data: &mut FrameBuf,
    ) -> bool {
        let facch = match option {
            Steal::FacchBoth => Facch1::decode(&data[2..], FACCH1_FIRST_OFFSET)
                .or_else(|| Facch1::decode(&data[2..], FACCH1_SECOND_OFFSET)),
            Steal::Facch1First => Facch1::decode(&data[2..], FACCH1_FIRST_OFFSET),
            Steal::Facch1Second => Facch1::decode(&data[2..], FACCH1_SECOND_OFFSET),
            Steal::None => None,
        };

        let mut has_info = false;

        if let Some((facch, _)) = facch {
            let layer3 = Layer3::from_bytes(*facch.data());

            if layer3.message_type() != Some(MessageType::Vcall) {
                return false;
            }

            state.net_layer3 = layer3;
            has_info = true;
        }

        if !has_info {
            let sacch = match sacch {
                Some((sacch, _)) => sacch,
                None => return false,
            };

            let frag = sacch.data();

            match Fragment::from_countdown(sacch.structure()) {
                Fragment::First => {
                    state.net_layer3.decode(&frag, FRAGMENT_BITS, 0);

                    state.net_mask =
                        if state.net_layer3.message_type() == Some(MessageType::Vcall) {
                            0x01
                        } else {
                            0x00
                        };
                }
                Fragment::Second => {
                    state.net_mask |= 0x02;
                    state.net_layer3.decode(&frag, FRAGMENT_BITS, 18);
                }
                Fragment::Third => {
                    state.net_mask |= 0x04;
                    state.net_layer3.decode(&frag, FRAGMENT_BITS, 36);
                }
                Fragment::Last => {
                    state.net_mask |= 0x08;
                    state.net_layer3.decode(&frag, FRAGMENT_BITS, 54);
                }
            }

            if state.net_mask != 0x0F {
                return false;
            }

            if state.net_layer3.message_type() != Some(MessageType::Vcall) {
                return false;
            }
        }

        let src_id = state.net_layer3.src_id();
        let dst_id = state.net_layer3.dst_id();
        let group = state.net_layer3.group();

        if self.net_collision(state, src_id, dst_id) != Admission::Admit {
            return false;
        }

        if self.validate_net_access(state, src_id, dst_id, group) != Admission::Admit {
            return false;
        }

        self.reset_net();
        state.net_timeout.start();
        state.net_state = NetState::Audio;

        info!(
            target: "activity",
            "network late entry from {} to {}{}",
            src_id,
            if group { "TG " } else { "" },
            dst_id,
        );

        let mut start = [0u8; FULL_FRAME_BYTES];
        let facch = Facch1::new(state.net_layer3.bytes());
        self.rebuild_setup_frame(state, &facch, Direction::Outbound, &mut start[2..]);

        start[0] = Tag::Data.bits();
        start[1] = 0x00;

        if state.duplex {
            state.enqueue_frame(&start);
        }

        true
    }

    /// Rewrite an in-call network voice frame for the air.
    fn net_audio(
        &mut self,
        state: &mut ChannelState,
        usc: Usc,
        option: Steal,
        data: &mut FrameBuf,
    ) {
        let (errs, bits, undecodable) = regenerate_traffic(
            state,
            usc,
            option,
            Direction::Outbound,
            &mut data[2..],
            self.verbose,
        );

        self.net_errs += errs;
        self.net_bits += bits;
        self.net_undecodable_lc += undecodable;

        data[0] = Tag::Data.bits();
        data[1] = 0x00;

        if state.duplex {
            state.enqueue_frame(data);
        }

        self.net_frames += 1;
    }

    /// Direction bit for frames regenerated from RF input.
    fn rf_direction(&self, state: &ChannelState) -> Direction {
        if state.duplex {
            Direction::Outbound
        } else {
            Direction::Inbound
        }
    }

    /// Rebuild a non-superblock setup frame in place: sync, LICH, idle
    /// SACCH with the local access number, the given FACCH1 in both slots,
    /// and the scrambler.
    fn rebuild_setup_frame(
        &self,
        state: &ChannelState,
        facch: &Facch1,
        direction: Direction,
        air: &mut [u8],
    ) {
        sync::insert_fsw(air);

        Lich {
            rfct: ChannelType::Rdch,
            usc: Usc::SacchNs,
            option: Steal::FacchBoth,
            direction,
        }
        .encode(air);

        Sacch::idle(state.ran).encode(air);

        facch.encode(air, FACCH1_FIRST_OFFSET);
        facch.encode(air, FACCH1_SECOND_OFFSET);

        scramble::scramble(air);
    }

    /// Mirror a frame to the peers, unless the call watchdog has fired.
    fn write_network<N: PeerLink>(&self, state: &ChannelState, data: &FrameBuf, net: &mut N) {
        if state.rf_timeout.is_running() && state.rf_timeout.has_expired() {
            return;
        }

        net.write_frame(data);
    }

    /// Traffic-collision rule for a new RF call.
    fn rf_collision(&mut self, state: &mut ChannelState, src_id: u16, dst_id: u16) -> Admission {
        if state.net_state != NetState::Idle && dst_id == state.net_last_dst_id {
            warn!(
                "traffic collision, preempting new RF traffic for existing network traffic, dstId = {}",
                dst_id,
            );
            self.reset_rf();

            return Admission::PreemptNew;
        }

        if state.net_state != NetState::Idle {
            if state.net_layer3.src_id() == src_id && state.net_last_dst_id == dst_id {
                warn!(
                    "traffic collision, new RF traffic duplicates the network call (voting?), srcId = {}, dstId = {}",
                    src_id, dst_id,
                );
                self.reset_rf();

                return Admission::PreemptNew;
            }

            warn!(
                "traffic collision, preempting existing network traffic for new RF traffic, rfDstId = {}, netDstId = {}",
                dst_id, state.net_last_dst_id,
            );
            self.reset_net();
            state.write_end_net();
        }

        Admission::Admit
    }

    /// Traffic-collision rule for a new network call.
    fn net_collision(&mut self, state: &mut ChannelState, src_id: u16, dst_id: u16) -> Admission {
        if state.rf_last_dst_id != 0 {
            let hang_active =
                state.rf_tg_hang.is_running() && !state.rf_tg_hang.has_expired();

            if state.rf_last_dst_id != dst_id && hang_active {
                // The channel still belongs to the recent RF talk-group.
                debug!(
                    "dropping network traffic to {}, channel held for talk-group {}",
                    dst_id, state.rf_last_dst_id,
                );
                self.reset_net();

                return Admission::PreemptNew;
            }

            if state.rf_last_dst_id == dst_id && hang_active {
                state.rf_tg_hang.start();
            }
        }

        if state.rf_state != RfState::Listening {
            if state.rf_layer3.src_id() == src_id && state.rf_layer3.dst_id() == dst_id {
                warn!(
                    "traffic collision, new network traffic duplicates the RF call (voting?), srcId = {}, dstId = {}",
                    src_id, dst_id,
                );
            } else {
                warn!(
                    "traffic collision, dropping new network traffic, rfDstId = {}, netDstId = {}",
                    state.rf_layer3.dst_id(),
                    dst_id,
                );
            }

            self.reset_net();

            return Admission::PreemptNew;
        }

        Admission::Admit
    }

    /// Access-control checks for an RF call. Denials park the RF side in the
    /// rejected state until the source stops transmitting.
    fn validate_rf_access(
        &mut self,
        state: &mut ChannelState,
        src_id: u16,
        dst_id: u16,
        group: bool,
    ) -> Admission {
        if !state.acl.validate_src_id(src_id) {
            if self.last_reject_id != src_id {
                warn!("VCALL denial, RID rejection, srcId = {}", src_id);
                self.log_rejection("RF", src_id, dst_id, group);
                self.last_reject_id = src_id;
            }

            state.rf_last_dst_id = 0;
            state.rf_tg_hang.stop();
            state.rf_state = RfState::Rejected;

            return Admission::RejectSrc;
        }

        // An individual destination is itself a radio ID.
        let dst_ok = if group {
            state.acl.validate_tg_id(dst_id)
        } else {
            state.acl.validate_src_id(dst_id)
        };

        if !dst_ok {
            if self.last_reject_id != dst_id {
                if group {
                    warn!("VCALL denial, TGID rejection, dstId = {}", dst_id);
                } else {
                    warn!("VCALL denial, RID rejection, dstId = {}", dst_id);
                }

                self.log_rejection("RF", src_id, dst_id, group);
                self.last_reject_id = dst_id;
            }

            state.rf_last_dst_id = 0;
            state.rf_tg_hang.stop();
            state.rf_state = RfState::Rejected;

            return Admission::RejectDst;
        }

        Admission::Admit
    }

    /// Access-control checks for a network call. Denials drop the network
    /// side back to idle.
    fn validate_net_access(
        &mut self,
        state: &mut ChannelState,
        src_id: u16,
        dst_id: u16,
        group: bool,
    ) -> Admission {
        if !state.acl.validate_src_id(src_id) {
            if self.last_reject_id != src_id {
                warn!("VCALL denial, RID rejection, srcId = {}", src_id);
                self.log_rejection("network", src_id, dst_id, group);
                self.last_reject_id = src_id;
            }

            state.net_last_dst_id = 0;
            state.write_end_net();

            return Admission::RejectSrc;
        }

        let dst_ok = if group {
            state.acl.validate_tg_id(dst_id)
        } else {
            state.acl.validate_src_id(dst_id)
        };

        if !dst_ok {
            if self.last_reject_id != dst_id {
                if group {
                    warn!("VCALL denial, TGID rejection, dstId = {}", dst_id);
                } else {
                    warn!("VCALL denial, RID rejection, dstId = {}", dst_id);
                }

                self.log_rejection("network", src_id, dst_id, group);
                self.last_reject_id = dst_id;
            }

            state.net_last_dst_id = 0;
            state.write_end_net();

            return Admission::RejectDst;
        }

        Admission::Admit
    }

    fn log_rejection(&self, side: &str, src_id: u16, dst_id: u16, group: bool) {
        info!(
            target: "activity",
            "{} voice rejection from {} to {}{}",
            side,
            src_id,
            if group { "TG " } else { "" },
            dst_id,
        );
    }

    fn log_rf_end(&self, state: &ChannelState, what: &str) {
        let duration = self.rf_frames as f32 / FRAMES_PER_SECOND;
        let ber = self.rf_errs as f32 * 100.0 / self.rf_bits as f32;

        if state.rssi_count > 0 && state.max_rssi != 0 {
            info!(
                target: "activity",
                "RF {}, {:.1} seconds, BER: {:.1}%, RSSI: -{} / -{} / -{} dBm",
                what,
                duration,
                ber,
                state.min_rssi,
                state.max_rssi,
                state.ave_rssi / state.rssi_count,
            );
        } else {
            info!(
                target: "activity",
                "RF {}, {:.1} seconds, BER: {:.1}%",
                what, duration, ber,
            );
        }
    }

    /// Carrier disappeared mid-call.
    pub(crate) fn rf_lost(&mut self, state: &mut ChannelState) {
        self.log_rf_end(state, "transmission lost");
        state.write_end_rf();
    }

    /// RF call watchdog fired.
    pub(crate) fn rf_timed_out(&mut self, state: &mut ChannelState) {
        self.log_rf_end(state, "transmission timed out");
        state.write_end_rf();
    }

    /// Network call watchdog fired.
    pub(crate) fn net_timed_out(&mut self, state: &mut ChannelState) {
        info!(
            target: "activity",
            "network transmission timed out, {:.1} seconds",
            self.net_frames as f32 / FRAMES_PER_SECOND,
        );
        state.write_end_net();
    }
}

/// Rewrite an in-call voice frame in place: sync, LICH, SACCH restamp, FEC
/// regeneration, FACCH1 re-encode, scrambler. Returns the errored and
/// surveyed bit counts plus the number of undecodable protected words.
fn regenerate_traffic(
    state: &ChannelState,
    usc: Usc,
    option: Steal,
    direction: Direction,
    air: &mut [u8],
    verbose: bool,
) -> (u32, u32, u32) {
    sync::insert_fsw(air);

    Lich {
        rfct: ChannelType::Rdch,
        usc,
        option,
        direction,
    }
    .encode(air);

    // Restamp the SACCH with the local access number when intact; a corrupt
    // SACCH passes through as received.
    if let Some((mut sacch, _)) = Sacch::decode(air) {
        sacch.set_ran(state.ran);
        sacch.encode(air);
    }

    let mut errs = 0;
    let mut bits = 0;
    let mut undecodable = 0;

    match option {
        Steal::None => {
            for idx in 0..4 {
                regen_group(air, idx, &mut errs, &mut undecodable);
            }
            bits += 4 * ambe::GROUP_SURVEY_BITS;
        }
        Steal::Facch1First => {
            reencode_facch(air, FACCH1_FIRST_OFFSET, &mut undecodable);

            for idx in 2..4 {
                regen_group(air, idx, &mut errs, &mut undecodable);
            }
            bits += 2 * ambe::GROUP_SURVEY_BITS;
        }
        Steal::Facch1Second => {
            for idx in 0..2 {
                regen_group(air, idx, &mut errs, &mut undecodable);
            }
            bits += 2 * ambe::GROUP_SURVEY_BITS;

            reencode_facch(air, FACCH1_SECOND_OFFSET, &mut undecodable);
        }
        Steal::FacchBoth => {
            reencode_facch(air, FACCH1_FIRST_OFFSET, &mut undecodable);
            reencode_facch(air, FACCH1_SECOND_OFFSET, &mut undecodable);
        }
    }

    if verbose && bits > 0 {
        debug!(
            "VCALL, audio, errs = {}/{} ({:.1}%)",
            errs,
            bits,
            errs as f32 * 100.0 / bits as f32,
        );
    }

    scramble::scramble(air);

    (errs, bits, undecodable)
}

/// Regenerate one voice group, folding its corrections into the counters.
fn regen_group(air: &mut [u8], idx: usize, errs: &mut u32, undecodable: &mut u32) {
    let off = FSW_LICH_SACCH_BYTES + idx * VOICE_GROUP_BYTES;

    match ambe::regenerate(&mut air[off..off + VOICE_GROUP_BYTES]) {
        Some(e) => *errs += e,
        None => *undecodable += 1,
    }
}

/// Re-encode a stolen FACCH1 slot so downstream receivers see clean parity.
fn reencode_facch(air: &mut [u8], offset: usize, undecodable: &mut u32) {
    match Facch1::decode(air, offset) {
        Some((facch, _)) => facch.encode(air, offset),
        None => *undecodable += 1,
    }
}
