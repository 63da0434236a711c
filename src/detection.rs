//! Keyboard discovery and the `--page` selector.

use std::fmt;
use std::str::FromStr;

use aula_ctl_core::is_vendor_page;
use aula_f87::{Collection, INFO};
use hidapi::HidApi;

/// HID usage page given as hex (`0xFF13`) or decimal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsagePage(pub u16);

impl FromStr for UsagePage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed
            .map(Self)
            .map_err(|_| format!("invalid usage page: {s}"))
    }
}

impl fmt::Display for UsagePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Collections found for one connection type
pub struct ConnectionScan {
    pub label: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
    pub collections: Vec<Collection>,
}

impl fmt::Display for ConnectionScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.collections.is_empty() {
            return write!(f, "  {}: not connected", self.label);
        }
        write!(
            f,
            "  {} (0x{:04X}:0x{:04X}) - {} collection(s):",
            self.label,
            self.vendor_id,
            self.product_id,
            self.collections.len()
        )?;
        for c in &self.collections {
            let tag = if is_vendor_page(c.usage_page) { " ** vendor **" } else { "" };
            write!(
                f,
                "\n    iface={}  page=0x{:04X}  usage=0x{:04X}{tag}",
                c.interface, c.usage_page, c.usage
            )?;
        }
        Ok(())
    }
}

/// List every collection of every supported connection, wired first
pub fn scan(api: &HidApi) -> Vec<ConnectionScan> {
    let collections = aula_f87::enumerate(api);
    INFO.connections
        .iter()
        .map(|&(label, vendor_id, product_id)| ConnectionScan {
            label,
            vendor_id,
            product_id,
            collections: collections
                .iter()
                .filter(|c| c.mode == label)
                .cloned()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;

    use super::*;

    #[test]
    fn usage_page_formats() {
        assert_eq!("0xFF13".parse(), Ok(UsagePage(0xFF13)));
        assert_eq!("0xff00".parse(), Ok(UsagePage(0xFF00)));
        assert_eq!("65280".parse(), Ok(UsagePage(0xFF00)));
        assert!("0x1FFFF".parse::<UsagePage>().is_err());
        assert!("vendor".parse::<UsagePage>().is_err());
        assert_eq!(UsagePage(0xFF13).to_string(), "0xFF13");
    }

    #[test]
    fn scan_listing() {
        let collection = |usage_page| Collection {
            mode: "wired",
            vendor_id: 0x258A,
            product_id: 0x010C,
            usage_page,
            usage: 1,
            interface: 1,
            path: CString::new("p").unwrap(),
        };
        let wired = ConnectionScan {
            label: "wired",
            vendor_id: 0x258A,
            product_id: 0x010C,
            collections: vec![collection(0x0001), collection(0xFF00)],
        };
        assert_eq!(
            wired.to_string(),
            "  wired (0x258A:0x010C) - 2 collection(s):\n    \
             iface=1  page=0x0001  usage=0x0001\n    \
             iface=1  page=0xFF00  usage=0x0001 ** vendor **"
        );

        let wireless = ConnectionScan {
            label: "wireless",
            vendor_id: 0x3554,
            product_id: 0xFA09,
            collections: vec![],
        };
        assert_eq!(wireless.to_string(), "  wireless: not connected");
    }
}
