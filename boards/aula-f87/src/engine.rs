//! Read, write, save and verify transactions against a [`Transport`].
//!
//! Every mutating operation runs the same phases:
//!
//! 1. READ the 10 config fragments as a baseline (skipped in fast mode)
//! 2. WRITE the config message, then the palette or per-key message
//! 3. SAVE
//! 4. VERIFY by reading the config again (optional, observational)
//!
//! Echoes are best effort. A missing echo is counted and the transaction
//! continues; nothing is retried. When the baseline read is incomplete the
//! config message is rebuilt from factory defaults, which reverts any setting
//! the operation does not touch.

use std::collections::BTreeMap;
use std::fmt;
use std::thread;
use std::time::Duration;

use aula_ctl_core::{Error, Received, Result, Transport};
use tracing::{debug, info, trace, warn};

use crate::abi::{self, arity, color_mode, field};
use crate::frame::Frame;
use crate::layout::{self, decode_speed, effect_slot, encode_speed, EffectSlot};
use crate::plane;
use crate::templates;
use crate::types::{EffectId, Level, Rgb, SleepTimer};

/// Timing and polling limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Per-read timeout while collecting the config baseline
    pub read_timeout: Duration,
    /// Responses polled while collecting the config baseline
    pub max_reads: usize,
    /// Per-read timeout for the standalone config dump
    pub full_read_timeout: Duration,
    /// Responses polled for the standalone config dump
    pub full_max_reads: usize,
    /// Wait for the echo of a single written frame
    pub echo_timeout: Duration,
    /// Per-read timeout when collecting responses to a raw frame
    pub raw_timeout: Duration,
    /// Responses polled after a raw frame
    pub raw_max_reads: usize,
    /// Pause after the read request before polling
    pub request_settle: Duration,
    /// Pause between a write and its echo read
    pub echo_settle: Duration,
    /// Re-read the config after saving
    pub verify: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(300),
            max_reads: 12,
            full_read_timeout: Duration::from_millis(500),
            full_max_reads: 15,
            echo_timeout: Duration::from_millis(200),
            raw_timeout: Duration::from_millis(300),
            raw_max_reads: 12,
            request_settle: Duration::from_millis(50),
            echo_settle: Duration::from_millis(3),
            verify: true,
        }
    }
}

/// Built-in effect selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectRequest {
    pub effect: EffectId,
    pub color: Option<Rgb>,
    pub colorful: bool,
    pub speed: Option<Level>,
    pub brightness: Option<Level>,
    /// Skip the baseline read, echo reads and verification
    pub fast: bool,
}

impl EffectRequest {
    pub fn new(effect: EffectId) -> Self {
        Self {
            effect,
            color: None,
            colorful: false,
            speed: None,
            brightness: None,
            fast: false,
        }
    }

    fn slot(&self) -> EffectSlot {
        effect_slot(self.effect.get())
    }

    fn uses_custom_color(&self) -> bool {
        self.color.is_some() || self.colorful
    }

    fn apply(&self, seq: usize, frame: &mut Frame) {
        if seq == field::EFFECT_SEQ {
            frame.set(field::EFFECT_AUX, 0x00);
            frame.set(field::EFFECT, self.effect.get());
            frame.set(
                field::COLOR_MODE,
                if self.uses_custom_color() {
                    color_mode::CUSTOM
                } else {
                    color_mode::DEFAULT
                },
            );
        }

        let slot = self.slot();
        if seq == slot.seq {
            if let Some(brightness) = self.brightness {
                frame.set(slot.brightness(), brightness.get());
            }
            let (current_speed, current_colorful) = decode_speed(frame.get(slot.speed()));
            let speed = self.speed.map_or(current_speed, Level::get);
            // a single color turns colorful off, otherwise the stored mode is kept
            let colorful = self.colorful || (self.color.is_none() && current_colorful);
            frame.set(slot.speed(), encode_speed(speed, colorful));
        }
    }

    fn verified_fields(&self) -> Vec<(&'static str, usize, usize)> {
        let slot = self.slot();
        vec![
            ("effect", field::EFFECT_SEQ, field::EFFECT),
            ("color mode", field::EFFECT_SEQ, field::COLOR_MODE),
            ("brightness", slot.seq, slot.brightness()),
            ("speed", slot.seq, slot.speed()),
        ]
    }
}

/// Per-key colors, applied through the self-define effect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerKeyRequest {
    /// LED index to color
    pub colors: BTreeMap<u8, Rgb>,
}

impl PerKeyRequest {
    /// Parse `name:#RRGGBB` specs, where `name` is a key or a group.
    /// Later specs override earlier ones for the same key.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::NoKeys);
        }
        let mut colors = BTreeMap::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (name, color) = spec
                .split_once(':')
                .ok_or_else(|| Error::InvalidColor(spec.to_string()))?;
            let color: Rgb = color.parse()?;
            for idx in layout::resolve_keys(name)? {
                colors.insert(idx, color);
            }
        }
        Ok(Self { colors })
    }

    fn apply(&self, seq: usize, frame: &mut Frame) {
        if seq == field::EFFECT_SEQ {
            frame.set(field::EFFECT_AUX, 0x00);
            frame.set(field::EFFECT, abi::SELF_DEFINE_EFFECT);
            frame.set(field::COLOR_MODE, color_mode::CUSTOM);
        }
    }
}

/// A validated device operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Dump the config message
    Read,
    Effect(EffectRequest),
    PerKey(PerKeyRequest),
    Sleep(SleepTimer),
    /// Write factory config and palette
    Reset,
    /// Send one frame verbatim and collect whatever comes back
    Raw(Frame),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Effect(_) => "effect",
            Operation::PerKey(_) => "perkey",
            Operation::Sleep(_) => "sleep",
            Operation::Reset => "reset",
            Operation::Raw(_) => "raw",
        }
    }
}

/// The 10 config fragments as returned by the keyboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBuffer {
    slots: [Option<Frame>; arity::CONFIG],
}

impl ConfigBuffer {
    pub fn get(&self, seq: usize) -> Option<&Frame> {
        self.slots.get(seq).and_then(Option::as_ref)
    }

    pub fn insert(&mut self, frame: Frame) -> bool {
        match self.slots.get_mut(frame.seq() as usize) {
            Some(slot) => {
                *slot = Some(frame);
                true
            },
            None => false,
        }
    }

    pub fn received(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_complete(&self) -> bool {
        self.received() == arity::CONFIG
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&Frame>)> {
        self.slots.iter().enumerate().map(|(seq, f)| (seq, f.as_ref()))
    }

    /// Byte at an absolute frame offset of fragment `seq`
    pub fn byte(&self, seq: usize, offset: usize) -> Option<u8> {
        self.get(seq).map(|f| f.get(offset))
    }

    /// Active effect number
    pub fn effect(&self) -> Option<u8> {
        self.byte(field::EFFECT_SEQ, field::EFFECT)
    }

    /// Stored settings of the active effect, when it is a built-in effect
    pub fn effect_settings(&self) -> Option<EffectSettings> {
        let effect = EffectId::new(self.effect()?).ok()?;
        let slot = effect_slot(effect.get());
        let brightness = self.byte(slot.seq, slot.brightness())?;
        let (speed, colorful) = decode_speed(self.byte(slot.seq, slot.speed())?);
        Some(EffectSettings {
            effect,
            brightness,
            speed,
            colorful,
        })
    }

    pub fn sleep_minutes(&self) -> Option<u8> {
        self.byte(field::SLEEP_SEQ, field::SLEEP)
            .map(SleepTimer::minutes_from_byte)
    }
}

/// Decoded brightness/speed pair of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectSettings {
    pub effect: EffectId,
    pub brightness: u8,
    pub speed: u8,
    pub colorful: bool,
}

impl fmt::Display for EffectSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "effect={} bright={} speed={} [{}]",
            self.effect,
            self.brightness,
            self.speed,
            if self.colorful { "colorful" } else { "single-color" }
        )
    }
}

/// Logical message written during a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Config,
    Palette,
    PerKey,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Config => "Config",
            Phase::Palette => "Palette",
            Phase::PerKey => "PerKey",
        })
    }
}

/// Echo count for one written message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTally {
    pub phase: Phase,
    pub sent: usize,
    pub echoed: usize,
}

impl fmt::Display for PhaseTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{} OK", self.phase, self.echoed, self.sent)
    }
}

/// Result of the SAVE phase. The keyboard often does not echo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Confirmed,
    Unconfirmed,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Confirmed => f.write_str("Save: OK"),
            SaveStatus::Unconfirmed => f.write_str("Save: OK (delayed echo)"),
        }
    }
}

/// A written field that did not read back as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub field: &'static str,
    pub seq: usize,
    pub offset: usize,
    pub expected: u8,
    /// `None` when the fragment was not read back
    pub actual: Option<u8>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.actual {
            Some(actual) => write!(
                f,
                "{} (cfg[{}][{}]): wrote 0x{:02x}, read 0x{:02x}",
                self.field, self.seq, self.offset, self.expected, actual
            ),
            None => write!(
                f,
                "{} (cfg[{}][{}]): wrote 0x{:02x}, not read back",
                self.field, self.seq, self.offset, self.expected
            ),
        }
    }
}

/// Config read back after saving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub config: ConfigBuffer,
    pub mismatches: Vec<Mismatch>,
}

impl Verification {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Everything observed during one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Config read before writing, or the standalone dump
    pub baseline: Option<ConfigBuffer>,
    /// The config message was rebuilt from factory defaults
    pub used_defaults: bool,
    pub writes: Vec<PhaseTally>,
    pub save: Option<SaveStatus>,
    pub verify: Option<Verification>,
    /// Responses collected after a raw frame
    pub responses: Vec<Vec<u8>>,
}

impl Outcome {
    pub fn tally(&self, phase: Phase) -> Option<&PhaseTally> {
        self.writes.iter().find(|t| t.phase == phase)
    }
}

/// Drives one operation at a time over an exclusively owned transport
pub struct TransactionEngine<T: Transport> {
    transport: T,
    config: EngineConfig,
}

impl<T: Transport> TransactionEngine<T> {
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Release the transport, closing it when dropped
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Run an operation to completion.
    ///
    /// Device-level anomalies (missing echoes, malformed responses, failed
    /// writes) are recorded in the outcome. The only error returned here is
    /// a sleep change without a complete baseline.
    pub fn run(&mut self, op: &Operation) -> Result<Outcome> {
        info!(operation = op.name(), "starting transaction");
        let outcome = match op {
            Operation::Read => {
                let (timeout, max_reads) = (self.config.full_read_timeout, self.config.full_max_reads);
                Outcome {
                    baseline: Some(self.read_config(timeout, max_reads)),
                    ..Default::default()
                }
            },
            Operation::Effect(req) => self.apply_effect(req),
            Operation::PerKey(req) => self.apply_perkey(req),
            Operation::Sleep(timer) => self.apply_sleep(*timer)?,
            Operation::Reset => self.apply_reset(),
            Operation::Raw(frame) => self.send_raw(frame),
        };
        info!(operation = op.name(), "transaction complete");
        Ok(outcome)
    }

    fn apply_effect(&mut self, req: &EffectRequest) -> Outcome {
        let wait = !req.fast;
        let baseline = (!req.fast).then(|| self.baseline());
        let (config, used_defaults) =
            config_frames(baseline.as_ref(), |seq, frame| req.apply(seq, frame));

        let mut writes = vec![self.send_all(Phase::Config, &config, wait)];
        if req.color.is_some() || !req.fast {
            let palette = plane::palette_frames(req.color);
            writes.push(self.send_all(Phase::Palette, &palette, wait));
        }
        let save = self.save(wait);
        let verify = (self.config.verify && !req.fast)
            .then(|| self.verify(&config, &req.verified_fields()));

        Outcome {
            baseline,
            used_defaults,
            writes,
            save: Some(save),
            verify,
            responses: Vec::new(),
        }
    }

    fn apply_perkey(&mut self, req: &PerKeyRequest) -> Outcome {
        let baseline = self.baseline();
        let (config, used_defaults) =
            config_frames(Some(&baseline), |seq, frame| req.apply(seq, frame));

        let perkey = plane::build_perkey(&req.colors);
        let writes = vec![
            self.send_all(Phase::Config, &config, true),
            self.send_all(Phase::PerKey, &perkey, true),
        ];
        let save = self.save(true);
        let verify = self.config.verify.then(|| {
            self.verify(
                &config,
                &[
                    ("effect", field::EFFECT_SEQ, field::EFFECT),
                    ("color mode", field::EFFECT_SEQ, field::COLOR_MODE),
                ],
            )
        });

        Outcome {
            baseline: Some(baseline),
            used_defaults,
            writes,
            save: Some(save),
            verify,
            responses: Vec::new(),
        }
    }

    fn apply_sleep(&mut self, timer: SleepTimer) -> Result<Outcome> {
        let baseline = self.baseline();
        // rebuilding from defaults would reset the lighting, so refuse instead
        if !baseline.is_complete() {
            warn!(received = baseline.received(), "incomplete config read, not writing sleep timer");
            return Err(Error::IncompleteReadBuffer {
                received: baseline.received(),
                expected: arity::CONFIG,
            });
        }

        let (config, used_defaults) = config_frames(Some(&baseline), |seq, frame| {
            if seq == field::SLEEP_SEQ {
                frame.set(field::SLEEP, timer.to_byte());
            }
        });
        let writes = vec![self.send_all(Phase::Config, &config, true)];
        let save = self.save(true);
        let verify = self
            .config
            .verify
            .then(|| self.verify(&config, &[("sleep", field::SLEEP_SEQ, field::SLEEP)]));

        Ok(Outcome {
            baseline: Some(baseline),
            used_defaults,
            writes,
            save: Some(save),
            verify,
            responses: Vec::new(),
        })
    }

    fn apply_reset(&mut self) -> Outcome {
        let (config, used_defaults) = config_frames(None, |_, _| {});
        let palette = plane::palette_frames(None);
        let writes = vec![
            self.send_all(Phase::Config, &config, true),
            self.send_all(Phase::Palette, &palette, true),
        ];
        let save = self.save(true);
        let verify = self.config.verify.then(|| {
            self.verify(
                &config,
                &[
                    ("effect", field::EFFECT_SEQ, field::EFFECT),
                    ("sleep", field::SLEEP_SEQ, field::SLEEP),
                ],
            )
        });

        Outcome {
            baseline: None,
            used_defaults,
            writes,
            save: Some(save),
            verify,
            responses: Vec::new(),
        }
    }

    fn send_raw(&mut self, frame: &Frame) -> Outcome {
        let mut responses = Vec::new();
        if self.transmit(frame).is_ok() {
            thread::sleep(self.config.request_settle);
            for _ in 0..self.config.raw_max_reads {
                match self.transport.read(self.config.raw_timeout) {
                    Ok(Received::Data(data)) if !data.is_empty() => responses.push(data),
                    Ok(_) => break,
                    Err(e) => {
                        warn!("read failed: {e}");
                        break;
                    },
                }
            }
        }
        Outcome {
            responses,
            ..Default::default()
        }
    }

    /// Baseline read with the transaction limits
    fn baseline(&mut self) -> ConfigBuffer {
        let (timeout, max_reads) = (self.config.read_timeout, self.config.max_reads);
        let buffer = self.read_config(timeout, max_reads);
        if !buffer.is_complete() {
            let err = Error::IncompleteReadBuffer {
                received: buffer.received(),
                expected: arity::CONFIG,
            };
            info!("{err}, falling back to factory defaults");
        }
        buffer
    }

    /// Request the config message and demultiplex the responses by sequence.
    ///
    /// Polling stops at the first empty read or after `max_reads` responses.
    /// Unrelated and malformed responses are dropped.
    pub fn read_config(&mut self, timeout: Duration, max_reads: usize) -> ConfigBuffer {
        let mut buffer = ConfigBuffer::default();
        if self.transmit(&abi::read_config()).is_err() {
            return buffer;
        }
        thread::sleep(self.config.request_settle);

        for _ in 0..max_reads {
            let raw = match self.transport.read(timeout) {
                Ok(Received::Data(data)) if !data.is_empty() => data,
                Ok(_) => break,
                Err(e) => {
                    warn!("read failed: {e}");
                    break;
                },
            };
            match Frame::parse(&raw) {
                Ok(frame) if abi::is_config_response(&frame) => {
                    trace!(seq = frame.seq(), "rx {frame}");
                    if !buffer.insert(frame) {
                        debug!(seq = frame.seq(), "config fragment out of range");
                    }
                },
                Ok(frame) => trace!("ignoring {frame}"),
                Err(e) => warn!("dropping response: {e}"),
            }
        }

        debug!(received = buffer.received(), "config read finished");
        buffer
    }

    fn transmit(&mut self, frame: &Frame) -> Result<()> {
        trace!(seq = frame.seq(), "tx {frame}");
        self.transport.write(frame.as_bytes()).inspect_err(|e| {
            warn!(seq = frame.seq(), "write failed: {e}");
        })
    }

    fn await_echo(&mut self) -> Result<Vec<u8>> {
        thread::sleep(self.config.echo_settle);
        match self.transport.read(self.config.echo_timeout)? {
            Received::Data(data) if !data.is_empty() => Ok(data),
            _ => Err(Error::EchoTimeout),
        }
    }

    /// Send every frame once, counting the echoes that arrive
    fn send_all(&mut self, phase: Phase, frames: &[Frame], wait: bool) -> PhaseTally {
        info!(%phase, fragments = frames.len(), "writing");
        let mut echoed = 0;
        for frame in frames {
            if self.transmit(frame).is_err() || !wait {
                continue;
            }
            match self.await_echo() {
                Ok(echo) => {
                    trace!(seq = frame.seq(), "echo {}", hex(&echo));
                    echoed += 1;
                },
                Err(Error::EchoTimeout) => debug!(%phase, seq = frame.seq(), "no echo"),
                Err(e) => warn!(%phase, seq = frame.seq(), "echo read failed: {e}"),
            }
        }
        let tally = PhaseTally {
            phase,
            sent: frames.len(),
            echoed,
        };
        info!("{tally}");
        tally
    }

    fn save(&mut self, wait: bool) -> SaveStatus {
        let frame = abi::save();
        if self.transmit(&frame).is_ok() && wait && self.await_echo().is_ok() {
            SaveStatus::Confirmed
        } else {
            SaveStatus::Unconfirmed
        }
    }

    /// Read the config back and compare the given fields with what was written
    fn verify(&mut self, written: &[Frame], fields: &[(&'static str, usize, usize)]) -> Verification {
        let (timeout, max_reads) = (self.config.read_timeout, self.config.max_reads);
        let config = self.read_config(timeout, max_reads);
        let mismatches: Vec<Mismatch> = fields
            .iter()
            .filter_map(|&(name, seq, offset)| {
                let expected = written[seq].get(offset);
                let actual = config.byte(seq, offset);
                (actual != Some(expected)).then_some(Mismatch {
                    field: name,
                    seq,
                    offset,
                    expected,
                    actual,
                })
            })
            .collect();
        for mismatch in &mismatches {
            warn!("verify: {mismatch}");
        }
        Verification { config, mismatches }
    }
}

/// Build the 10 config frames from the baseline, or from factory defaults when
/// the baseline is missing or incomplete, then apply `edit` to each.
///
/// Returns the frames and whether factory defaults were used.
fn config_frames(
    baseline: Option<&ConfigBuffer>,
    mut edit: impl FnMut(usize, &mut Frame),
) -> (Vec<Frame>, bool) {
    let complete = baseline.filter(|b| b.is_complete());
    let frames = (0..arity::CONFIG)
        .map(|seq| {
            let mut frame = match complete.and_then(|b| b.get(seq)) {
                Some(read) => read.with_cmd(abi::cmd::WRITE),
                None => abi::config(seq as u8, &templates::CONFIG[seq]),
            };
            if seq == field::EFFECT_SEQ {
                frame.set(field::WRITE_FLAG, 0x01);
            }
            edit(seq, &mut frame);
            frame
        })
        .collect();
    (frames, complete.is_none())
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(seq: u8, payload: &[u8]) -> Frame {
        Frame::build(abi::cmd::READ, abi::subcmd::CONFIG, seq, payload)
    }

    fn full_buffer() -> ConfigBuffer {
        let mut buffer = ConfigBuffer::default();
        for seq in 0..10u8 {
            buffer.insert(response(seq, &[0xA0 + seq; 15]));
        }
        buffer
    }

    #[test]
    fn config_frames_keep_unrelated_bytes() {
        let baseline = full_buffer();
        let req = EffectRequest {
            brightness: Some(Level::new("brightness", 2).unwrap()),
            ..EffectRequest::new(EffectId::new(8).unwrap())
        };
        let (frames, used_defaults) = config_frames(Some(&baseline), |s, f| req.apply(s, f));
        assert!(!used_defaults);

        let slot = effect_slot(8);
        for (seq, frame) in frames.iter().enumerate() {
            assert_eq!(frame.cmd(), abi::cmd::WRITE);
            assert!(frame.is_sealed());
            for offset in 4..19 {
                let touched = (seq == 0 && [8, 14, 15, 17].contains(&offset))
                    || (seq == slot.seq && [slot.brightness(), slot.speed()].contains(&offset));
                if !touched {
                    assert_eq!(frame.get(offset), 0xA0 + seq as u8, "{seq}:{offset}");
                }
            }
        }
        assert_eq!(frames[0].get(15), 8);
        assert_eq!(frames[0].get(17), color_mode::DEFAULT);
        assert_eq!(frames[slot.seq].get(slot.brightness()), 2);
    }

    #[test]
    fn incomplete_baseline_uses_defaults() {
        let mut baseline = full_buffer();
        baseline.slots[7] = None;
        let (frames, used_defaults) = config_frames(Some(&baseline), |_, _| {});
        assert!(used_defaults);
        for (seq, frame) in frames.iter().enumerate().skip(1) {
            assert_eq!(*frame, abi::config(seq as u8, &templates::CONFIG[seq]));
        }
        assert_eq!(frames[0].get(field::WRITE_FLAG), 0x01);
    }

    #[test]
    fn speed_byte_rules() {
        let effect = EffectId::new(2).unwrap();
        let slot = effect_slot(2);
        let mut frame = abi::config(slot.seq as u8, &templates::CONFIG[slot.seq]);

        // keep stored speed and colorful mode
        EffectRequest::new(effect).apply(slot.seq, &mut frame);
        assert_eq!(frame.get(slot.speed()), 0x37);

        // a single color clears colorful
        let req = EffectRequest {
            color: Some(Rgb::new(255, 0, 0)),
            ..EffectRequest::new(effect)
        };
        req.apply(slot.seq, &mut frame);
        assert_eq!(frame.get(slot.speed()), 0x30);

        // stays single color until colorful is requested
        let req = EffectRequest {
            speed: Some(Level::new("speed", 1).unwrap()),
            ..EffectRequest::new(effect)
        };
        req.apply(slot.seq, &mut frame);
        assert_eq!(frame.get(slot.speed()), 0x10);

        let req = EffectRequest {
            colorful: true,
            ..EffectRequest::new(effect)
        };
        req.apply(slot.seq, &mut frame);
        assert_eq!(frame.get(slot.speed()), 0x17);
    }

    #[test]
    fn perkey_specs() {
        let req = PerKeyRequest::parse(&["esc:#ff0000", "WASD:00ff00", "w:#0000ff"]).unwrap();
        assert_eq!(req.colors.len(), 5);
        assert_eq!(req.colors[&0], Rgb::new(255, 0, 0));
        assert_eq!(req.colors[&14], Rgb::new(0, 0, 255));
        assert_eq!(req.colors[&9], Rgb::new(0, 255, 0));

        assert!(matches!(PerKeyRequest::parse(&["esc"]), Err(Error::InvalidColor(_))));
        assert!(matches!(PerKeyRequest::parse(&["esc:#ff00"]), Err(Error::InvalidColor(_))));
        assert!(matches!(PerKeyRequest::parse(&["hyper:#ff0000"]), Err(Error::UnknownKey(_))));
    }

    #[test]
    fn buffer_decoding() {
        let mut buffer = ConfigBuffer::default();
        let mut first = [0u8; 15];
        first[11] = 2; // effect at frame offset 15
        buffer.insert(response(0, &first));
        let mut second = [0u8; 15];
        second[11] = 0x14;
        buffer.insert(response(1, &second));
        assert_eq!(buffer.effect(), Some(2));
        assert_eq!(buffer.sleep_minutes(), Some(10));
        // effect table fragment missing
        assert_eq!(buffer.effect_settings(), None);

        buffer.insert(response(4, &templates::CONFIG[4]));
        let settings = buffer.effect_settings().unwrap();
        assert_eq!((settings.brightness, settings.speed, settings.colorful), (4, 3, true));
        assert_eq!(buffer.received(), 3);
        assert!(!buffer.insert(response(12, &[])));
    }

    #[test]
    fn tally_display() {
        let tally = PhaseTally {
            phase: Phase::Palette,
            sent: 37,
            echoed: 0,
        };
        assert_eq!(tally.to_string(), "Palette: 0/37 OK");
        assert_eq!(SaveStatus::Unconfirmed.to_string(), "Save: OK (delayed echo)");
    }
}
