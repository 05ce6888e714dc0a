//! Upload parts: byte ranges of a file as assigned by the server.

use serde::{Deserialize, Serialize};

/// One part: byte range [start, end) (half-open) of the file.
///
/// On the wire the end offset is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WirePart", into = "WirePart")]
pub struct Part {
    /// 1-based part number.
    pub part_no: u32,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Part {
    /// Length of this part in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize, Deserialize)]
struct WirePart {
    part_no: u32,
    start_offset: u64,
    end_offset: u64,
}

impl From<WirePart> for Part {
    fn from(w: WirePart) -> Self {
        Self {
            part_no: w.part_no,
            start: w.start_offset,
            end: w.end_offset.saturating_add(1),
        }
    }
}

impl From<Part> for WirePart {
    fn from(p: Part) -> Self {
        Self {
            part_no: p.part_no,
            start_offset: p.start,
            end_offset: p.end.saturating_sub(1),
        }
    }
}

/// Split `total_size` bytes into parts of at most `part_size` bytes, the way
/// the server assigns them. Returns an empty vec if either is 0.
#[cfg(test)]
pub(crate) fn plan_parts(total_size: u64, part_size: u64) -> Vec<Part> {
    if total_size == 0 || part_size == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(total_size.div_ceil(part_size) as usize);
    let mut offset = 0u64;
    let mut part_no = 1u32;
    while offset < total_size {
        let end = (offset + part_size).min(total_size);
        out.push(Part {
            part_no,
            start: offset,
            end,
        });
        offset = end;
        part_no += 1;
    }
    out
}
