//! Reverse engineered hidapi bindings for the AULA F87 lighting controller

use std::ffi::CString;
use std::time::Duration;

use aula_ctl_core::{is_vendor_page, BoardInfo, Error, Received, Result, Transport};
use hidapi::{HidApi, HidDevice};
use tracing::{debug, info};

pub mod abi;
pub mod capture;
pub mod engine;
pub mod frame;
pub mod layout;
pub mod plane;
pub mod templates;
pub mod types;

pub use engine::{EngineConfig, Operation, Outcome, TransactionEngine};
pub use frame::Frame;

use crate::frame::FRAME_LEN;

pub mod consts {
    pub const WIRED_VENDOR_ID: u16 = 0x258A;
    pub const WIRED_PRODUCT_ID: u16 = 0x010C;
    pub const WIRELESS_VENDOR_ID: u16 = 0x3554;
    pub const WIRELESS_PRODUCT_ID: u16 = 0xFA09;
}

/// Static board info for detection
pub static INFO: BoardInfo = BoardInfo {
    name: "AULA F87",
    cli_name: "aula-f87",
    connections: &[
        ("wired", consts::WIRED_VENDOR_ID, consts::WIRED_PRODUCT_ID),
        ("wireless", consts::WIRELESS_VENDOR_ID, consts::WIRELESS_PRODUCT_ID),
    ],
};

/// One HID collection exposed by a supported keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Connection name from [`INFO`]
    pub mode: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u16,
    pub usage: u16,
    pub interface: i32,
    pub path: CString,
}

/// All collections of supported keyboards, wired connections first
pub fn enumerate(api: &HidApi) -> Vec<Collection> {
    INFO.connections
        .iter()
        .flat_map(move |&(mode, vid, pid)| {
            api.device_list()
                .filter(move |d| d.vendor_id() == vid && d.product_id() == pid)
                .map(move |d| Collection {
                    mode,
                    vendor_id: vid,
                    product_id: pid,
                    usage_page: d.usage_page(),
                    usage: d.usage(),
                    interface: d.interface_number(),
                    path: d.path().to_owned(),
                })
        })
        .collect()
}

/// Pick the collection to open.
///
/// Only vendor pages qualify. With a preferred page the first collection on
/// that page wins, falling back to the first vendor collection. Without one
/// the last vendor collection wins.
pub fn select(candidates: &[Collection], prefer_page: Option<u16>) -> Option<&Collection> {
    let mut best = None;
    for candidate in candidates.iter().filter(|c| is_vendor_page(c.usage_page)) {
        match prefer_page {
            Some(page) if candidate.usage_page == page => return Some(candidate),
            Some(_) => {
                best.get_or_insert(candidate);
            },
            None => best = Some(candidate),
        }
    }
    best
}

/// An open lighting interface of an AULA F87
pub struct AulaF87 {
    pub device: HidDevice,
    pub collection: Collection,
    buf: [u8; FRAME_LEN],
}

impl AulaF87 {
    /// Find and open the keyboard, optionally on a specific usage page
    pub fn open(prefer_page: Option<u16>) -> Result<Self> {
        let api = HidApi::new()?;
        let candidates = enumerate(&api);
        debug!(candidates = candidates.len(), "enumerated collections");
        let collection = select(&candidates, prefer_page)
            .ok_or(Error::DeviceNotFound)?
            .clone();
        let device = api.open_path(&collection.path)?;
        info!(
            mode = collection.mode,
            usage_page = collection.usage_page,
            "opened {}",
            INFO.name
        );

        Ok(Self {
            device,
            collection,
            buf: [0u8; FRAME_LEN],
        })
    }
}

impl Transport for AulaF87 {
    fn write(&mut self, report: &[u8]) -> Result<()> {
        self.device.write(report)?;
        Ok(())
    }

    fn read(&mut self, timeout: Duration) -> Result<Received> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let len = self.device.read_timeout(&mut self.buf, millis)?;
        Ok(received(&self.buf[..len]))
    }
}

/// Reads are capped at one frame, longer input reports are truncated by hidapi
fn received(data: &[u8]) -> Received {
    match data {
        [] => Received::Timeout,
        data => Received::Data(data.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(mode: &'static str, usage_page: u16) -> Collection {
        Collection {
            mode,
            vendor_id: 0,
            product_id: 0,
            usage_page,
            usage: 1,
            interface: 0,
            path: CString::new(format!("{mode}-{usage_page:04x}")).unwrap(),
        }
    }

    #[test]
    fn last_vendor_collection_by_default() {
        let candidates = [
            collection("wired", 0x0001),
            collection("wired", 0xFF00),
            collection("wired", 0x000C),
            collection("wired", 0xFF13),
        ];
        assert_eq!(select(&candidates, None).unwrap().usage_page, 0xFF13);
    }

    #[test]
    fn preferred_page() {
        let candidates = [
            collection("wired", 0xFF00),
            collection("wireless", 0xFF13),
            collection("wireless", 0xFF13),
        ];
        let chosen = select(&candidates, Some(0xFF13)).unwrap();
        assert!(std::ptr::eq(chosen, &candidates[1]));
        // falls back to the first vendor collection
        assert_eq!(select(&candidates, Some(0xFF42)).unwrap().usage_page, 0xFF00);
    }

    #[test]
    fn wired_before_wireless() {
        let candidates = [collection("wired", 0xFF00), collection("wireless", 0xFF00)];
        assert_eq!(select(&candidates, Some(0xFF00)).unwrap().mode, "wired");
    }

    #[test]
    fn read_buffer_holds_one_frame() {
        let board_buf = [0x13u8; FRAME_LEN];
        let Received::Data(data) = received(&board_buf) else {
            panic!("expected data");
        };
        assert!(Frame::parse(&data).is_ok());
        assert!(matches!(received(&[]), Received::Timeout));
    }

    #[test]
    fn no_vendor_collection() {
        let candidates = [collection("wired", 0x0001), collection("wired", 0x000C)];
        assert_eq!(select(&candidates, None), None);
        assert_eq!(select(&candidates, Some(0x0001)), None);
        assert_eq!(select(&[], None), None);
    }
}
