//! Core transport trait and related types.

use std::time::Duration;

use crate::error::Result;

/// Static information about a board type for detection and CLI
#[derive(Debug, Clone, Copy)]
pub struct BoardInfo {
    pub name: &'static str,
    pub cli_name: &'static str,
    /// `(label, vendor_id, product_id)` in enumeration order
    pub connections: &'static [(&'static str, u16, u16)],
}

/// First usage page of the vendor-specific range
pub const VENDOR_PAGE_START: u16 = 0xFF00;

/// Returns true for usage pages in the vendor-specific range `0xFF00..=0xFFFF`
#[inline]
pub fn is_vendor_page(usage_page: u16) -> bool {
    usage_page >= VENDOR_PAGE_START
}

/// Outcome of a single bounded read.
///
/// A timeout is an expected outcome on this hardware, so it is a variant
/// rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Data(Vec<u8>),
    Timeout,
}

impl Received {
    pub fn into_data(self) -> Option<Vec<u8>> {
        match self {
            Received::Data(data) => Some(data),
            Received::Timeout => None,
        }
    }
}

/// Exclusive request/response channel to one HID collection.
///
/// Implementations close the underlying handle on drop.
pub trait Transport {
    /// Write one complete report, report id included
    fn write(&mut self, report: &[u8]) -> Result<()>;

    /// Wait up to `timeout` for a single input report
    fn read(&mut self, timeout: Duration) -> Result<Received>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, report: &[u8]) -> Result<()> {
        (**self).write(report)
    }

    fn read(&mut self, timeout: Duration) -> Result<Received> {
        (**self).read(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, report: &[u8]) -> Result<()> {
        (**self).write(report)
    }

    fn read(&mut self, timeout: Duration) -> Result<Received> {
        (**self).read(timeout)
    }
}
