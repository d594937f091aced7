//! Named color tag type (ncl2)
//!
//! See ICC.1:2022 Section 10.18. Each entry carries a fixed-width name plus
//! PCS coordinates (always 3 channels) and device coordinates (0 or more
//! channels, device_channels taken from the tag header).

use crate::icc::error::IccError;

#[derive(Debug, Clone)]
pub struct NamedColorEntry {
    pub name: String,
    pub pcs: [f64; 3],
    pub device: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct NamedColorData {
    pub prefix: String,
    pub suffix: String,
    pub device_channels: u32,
    pub colors: Vec<NamedColorEntry>,
}

fn read_fixed_ascii(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl NamedColorData {
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 84 {
            return Err(IccError::CorruptedData(
                "named color tag too small".to_string(),
            ));
        }
        // vendor flags (4 bytes), skipped
        let count = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let device_channels = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
        let prefix = read_fixed_ascii(&data[12..44]);
        let suffix = read_fixed_ascii(&data[44..76]);

        let entry_name_len = 32usize;
        let entry_size = entry_name_len + 3 * 2 + device_channels as usize * 2;
        let mut colors = Vec::with_capacity(count);
        let mut pos = 76;
        for _ in 0..count {
            if pos + entry_size > data.len() {
                return Err(IccError::CorruptedData(
                    "named color entries truncated".to_string(),
                ));
            }
            let name = read_fixed_ascii(&data[pos..pos + entry_name_len]);
            let mut p = pos + entry_name_len;
            let mut pcs = [0.0f64; 3];
            for c in pcs.iter_mut() {
                let v = u16::from_be_bytes([data[p], data[p + 1]]);
                *c = v as f64 / 65535.0;
                p += 2;
            }
            let mut device = Vec::with_capacity(device_channels as usize);
            for _ in 0..device_channels {
                let v = u16::from_be_bytes([data[p], data[p + 1]]);
                device.push(v as f64 / 65535.0);
                p += 2;
            }
            colors.push(NamedColorEntry { name, pcs, device });
            pos += entry_size;
        }

        Ok(Self {
            prefix,
            suffix,
            device_channels,
            colors,
        })
    }

    pub fn find(&self, name: &str) -> Option<&NamedColorEntry> {
        self.colors.iter().find(|c| c.name == name)
    }

    pub fn nearest_to_device(&self, device: &[f64]) -> Option<&NamedColorEntry> {
        self.colors.iter().min_by(|a, b| {
            let da = squared_dist(&a.device, device);
            let db = squared_dist(&b.device, device);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Reverse lookup: the named entry whose PCS coordinate is closest to
    /// `pcs`, for PcsToDevice named-color kernels.
    pub fn nearest_to_pcs(&self, pcs: &[f64; 3]) -> Option<&NamedColorEntry> {
        self.colors.iter().min_by(|a, b| {
            let da = squared_dist(&a.pcs, pcs);
            let db = squared_dist(&b.pcs, pcs);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

fn squared_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_entry(name: &str, pcs: [u16; 3], device: [u16; 1]) -> Vec<u8> {
        let mut buf = vec![0u8; 32];
        buf[..name.len()].copy_from_slice(name.as_bytes());
        for v in pcs {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        for v in device {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        buf
    }

    #[test]
    fn parse_single_entry() {
        let mut data = vec![0u8; 76];
        data[4..8].copy_from_slice(&1u32.to_be_bytes());
        data[8..12].copy_from_slice(&1u32.to_be_bytes());
        data.extend(build_entry("Red", [65535, 0, 0], [65535]));

        let table = NamedColorData::parse(&data).unwrap();
        assert_eq!(table.colors.len(), 1);
        let red = table.find("Red").unwrap();
        assert!((red.pcs[0] - 1.0).abs() < 1e-9);
        assert_eq!(red.device, vec![1.0]);
    }

    #[test]
    fn nearest_to_pcs_picks_closest_entry() {
        let mut data = vec![0u8; 76];
        data[4..8].copy_from_slice(&3u32.to_be_bytes());
        data[8..12].copy_from_slice(&1u32.to_be_bytes());
        data.extend(build_entry("Red", [65535, 0, 0], [65535]));
        data.extend(build_entry("Green", [0, 65535, 0], [0]));
        data.extend(build_entry("Blue", [0, 0, 65535], [0]));

        let table = NamedColorData::parse(&data).unwrap();
        let nearest = table.nearest_to_pcs(&[0.05, 0.95, 0.02]).unwrap();
        assert_eq!(nearest.name, "Green");
    }
}
