//! Offline reassembly and diffing of captured 20-byte fragments.
//!
//! Fragments are grouped per `(direction, endpoint)` into logical reports of up
//! to 26 fragments (520 bytes). A fragment whose sequence byte is 0 starts a new
//! report. Runs shorter than two fragments are treated as noise.

use std::fmt::{self, Write as _};

use crate::frame::FRAME_LEN;

/// Fragments in a full-size report
pub const MAX_FRAGMENTS: usize = 26;
/// Bytes in a full-size report
pub const MAX_REPORT_LEN: usize = MAX_FRAGMENTS * FRAME_LEN;
/// Shortest report considered by the diff
pub const MIN_DIFF_LEN: usize = 100;
/// Shortest run emitted as a report
const MIN_FRAGMENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::HostToDevice => "host→device",
            Direction::DeviceToHost => "device→host",
        })
    }
}

/// One captured 20-byte fragment
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFragment {
    pub packet: u32,
    /// Seconds since capture start
    pub timestamp: f64,
    pub direction: Direction,
    pub endpoint: u8,
    pub data: [u8; FRAME_LEN],
}

impl CapturedFragment {
    /// Sequence byte at offset 3
    #[inline]
    pub fn sequence(&self) -> u8 {
        self.data[3]
    }
}

/// Fragments of one run concatenated in packet order
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedReport {
    pub start_packet: u32,
    pub end_packet: u32,
    pub timestamp: f64,
    pub direction: Direction,
    pub endpoint: u8,
    pub data: Vec<u8>,
}

impl CapturedReport {
    fn from_run(run: &[CapturedFragment]) -> Option<Self> {
        let (first, last) = (run.first()?, run.last()?);
        Some(Self {
            start_packet: first.packet,
            end_packet: last.packet,
            timestamp: first.timestamp,
            direction: first.direction,
            endpoint: first.endpoint,
            data: run.iter().flat_map(|f| f.data).collect(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte at `offset`, 0 past the end
    pub fn byte(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }
}

impl fmt::Display for CapturedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Report: Packets #{}-{} | {}",
            self.start_packet, self.end_packet, self.direction
        )?;
        writeln!(
            f,
            "Time: {:.6}s | Endpoint: {} | Length: {} bytes",
            self.timestamp,
            self.endpoint,
            self.len()
        )?;
        f.write_str(&hex_dump(&self.data[..self.len().min(MAX_REPORT_LEN)], 0))
    }
}

/// Streaming grouper with one open run per `(direction, endpoint)`
#[derive(Debug, Default)]
pub struct Reassembler {
    open: Vec<((Direction, u8), Vec<CapturedFragment>)>,
    reports: Vec<CapturedReport>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next fragment in packet order
    pub fn push(&mut self, fragment: CapturedFragment) {
        let key = (fragment.direction, fragment.endpoint);
        let idx = match self.open.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                self.open.push((key, Vec::new()));
                self.open.len() - 1
            },
        };

        let run = &mut self.open[idx].1;
        if fragment.sequence() == 0 && !run.is_empty() {
            let closed = std::mem::take(run);
            Self::emit(&mut self.reports, &closed);
        }

        let run = &mut self.open[idx].1;
        run.push(fragment);
        if run.len() >= MAX_FRAGMENTS {
            let full = std::mem::take(run);
            self.reports.extend(CapturedReport::from_run(&full));
        }
    }

    fn emit(reports: &mut Vec<CapturedReport>, run: &[CapturedFragment]) {
        if run.len() >= MIN_FRAGMENTS {
            reports.extend(CapturedReport::from_run(run));
        }
    }

    /// Flush open runs and return every report in emission order
    pub fn finish(mut self) -> Vec<CapturedReport> {
        for (_, run) in std::mem::take(&mut self.open) {
            Self::emit(&mut self.reports, &run);
        }
        self.reports
    }
}

/// Group fragments into logical reports, sorting by packet index first
pub fn reassemble(fragments: impl IntoIterator<Item = CapturedFragment>) -> Vec<CapturedReport> {
    let mut fragments: Vec<_> = fragments.into_iter().collect();
    fragments.sort_by_key(|f| f.packet);
    let mut reassembler = Reassembler::new();
    for fragment in fragments {
        reassembler.push(fragment);
    }
    reassembler.finish()
}

/// Protocol label of a report byte offset
pub fn label_offset(offset: usize) -> &'static str {
    match offset {
        0 => "report_id",
        1 => "cmd_byte1",
        2 => "cmd_byte2",
        3 => "seq_num",
        4 => "cmd_type",
        5 => "subcmd",
        13 => "model_id",
        8..MAX_REPORT_LEN => "data/payload",
        _ => "",
    }
}

/// Coarse region of a report byte offset
pub fn region(offset: usize) -> &'static str {
    match offset {
        0..8 => "header",
        13 => "model_id",
        8..MIN_DIFF_LEN => "effect_params",
        _ => "rgb_data",
    }
}

/// One differing byte between two reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteDiff {
    pub offset: usize,
    pub old: u8,
    pub new: u8,
    pub label: &'static str,
}

impl fmt::Display for ByteDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {:<15} 0x{:02x} -> 0x{:02x}  {}",
            self.offset,
            region(self.offset),
            self.old,
            self.new,
            self.label
        )
    }
}

/// Byte-wise differences over the common prefix of two buffers
pub fn diff_bytes(old: &[u8], new: &[u8]) -> Vec<ByteDiff> {
    old.iter()
        .zip(new)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(offset, (&old, &new))| ByteDiff {
            offset,
            old,
            new,
            label: label_offset(offset),
        })
        .collect()
}

/// Differences between two reports of equal length, at least 100 bytes.
/// `None` when the reports are not comparable.
pub fn diff_reports(old: &CapturedReport, new: &CapturedReport) -> Option<Vec<ByteDiff>> {
    (old.len() == new.len() && old.len() >= MIN_DIFF_LEN).then(|| diff_bytes(&old.data, &new.data))
}

/// Compare two captures: each command-sized report of `old` against the
/// first report of `new` with the same length
pub fn compare_reports(old: &[CapturedReport], new: &[CapturedReport]) -> Vec<ByteDiff> {
    let candidates: Vec<_> = new.iter().filter(|r| r.len() >= MIN_DIFF_LEN).collect();
    old.iter()
        .filter(|r| r.len() >= MIN_DIFF_LEN)
        .filter_map(|r1| {
            let r2 = candidates.iter().find(|r2| r2.len() == r1.len())?;
            diff_reports(r1, r2)
        })
        .flatten()
        .collect()
}

/// Counts describing one capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub fragments: usize,
    pub reports: usize,
    pub host_to_device: usize,
    pub device_to_host: usize,
    /// Reports of at least 520 bytes
    pub full_size: usize,
}

impl CaptureSummary {
    pub fn new(fragments: usize, reports: &[CapturedReport]) -> Self {
        let count = |dir| reports.iter().filter(|r| r.direction == dir).count();
        Self {
            fragments,
            reports: reports.len(),
            host_to_device: count(Direction::HostToDevice),
            device_to_host: count(Direction::DeviceToHost),
            full_size: reports.iter().filter(|r| r.len() >= MAX_REPORT_LEN).count(),
        }
    }
}

/// Hex dump, 16 bytes per line with offset and ASCII columns
pub fn hex_dump(data: &[u8], base: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<_> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let _ = writeln!(
            out,
            "{:04x}:  {:<48}  {}",
            base + i * 16,
            hex.join(" "),
            ascii(chunk)
        );
    }
    out
}

/// Hex dump marking `highlight` offsets and listing labelled offsets per line
pub fn annotated_dump(data: &[u8], highlight: &[usize]) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let start = i * 16;
        let hex: Vec<_> = chunk
            .iter()
            .enumerate()
            .map(|(j, b)| {
                if highlight.contains(&(start + j)) {
                    format!("**{b:02x}**")
                } else {
                    format!("{b:02x}")
                }
            })
            .collect();
        let _ = writeln!(out, "{start:04x}:  {:<64}  {}", hex.join(" "), ascii(chunk));

        let labels: Vec<_> = (start..start + chunk.len())
            .filter(|o| !label_offset(*o).is_empty())
            .map(|o| format!("[{o:03}:{}]", label_offset(o)))
            .collect();
        if !labels.is_empty() {
            let _ = writeln!(out, "       {}", labels.join("  "));
        }
    }
    out
}

fn ascii(chunk: &[u8]) -> String {
    chunk
        .iter()
        .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
        .collect()
}
