//! Frame extraction for the reader's inventory stream.
//!
//! The reader emits tag reports without a length-prefixed envelope that is
//! worth trusting, so records are recovered by scanning for the EPC header
//! marker and slicing a fixed-width identifier plus one RSSI byte after it.
//!
//! A record that is cut off by the end of the buffer is dropped rather than
//! carried over to the next read; the reader repeats tags often enough that
//! the next inventory round re-synchronizes.

use crate::tag::{EPC_LEN, Epc, TagEvent};

/// Byte pair that starts every EPC this reader reports.
pub const MARKER: [u8; 2] = [0xE2, 0x80];

/// Extract every tag event from a raw reader buffer, left to right.
///
/// # Arguments
/// * `buf` - Bytes as read from the device in one poll
///
/// # Returns
/// The events in the order they appear in `buf`. Marker matches inside an
/// already-consumed record are never revisited.
///
/// # Example
/// ```
/// use rfid_forwarder::frame::extract_events;
///
/// let buf = [
///     0xE2, 0x80, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xC5,
/// ];
/// let events = extract_events(&buf);
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].epc.to_string(), "E280AAAAAAAAAAAAAAAAAAAA");
/// assert_eq!(events[0].rssi, Some(-59));
/// ```
pub fn extract_events(buf: &[u8]) -> Vec<TagEvent> {
    let mut events = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_marker(buf, pos) {
        let end = start + EPC_LEN;
        let Some(epc_bytes) = buf.get(start..end) else {
            break;
        };

        let mut epc = [0u8; EPC_LEN];
        epc.copy_from_slice(epc_bytes);

        let rssi = buf.get(end).map(|&b| b as i8);
        events.push(TagEvent {
            epc: Epc(epc),
            rssi,
        });

        pos = end + usize::from(rssi.is_some());
    }

    events
}

/// Position of the next marker at or after `from`.
fn find_marker(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(MARKER.len())
        .position(|w| w == MARKER)
        .map(|offset| from + offset)
}

/// Uppercase hex rendering of a raw read, used for debug dumps.
pub fn to_hex(buf: &[u8]) -> String {
    buf.iter().map(|b| format!("{b:02X}")).collect()
}
