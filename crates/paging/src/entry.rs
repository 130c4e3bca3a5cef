//! Page table entry.

use crate::{FrameNumber, layout::PTE_SIZE};

/// A single page table entry.
///
/// Entries are stored in simulated physical memory as `PTE_SIZE` bytes:
/// - Byte 0: Frame number
/// - Byte 1: Valid flag (`0` invalid, `1` valid)
/// - Byte 2: Reference count
/// - Byte 3: Padding (always zero)
///
/// The same format is used for first-level entries (pointing at a second-level table)
/// and second-level entries (pointing at a data frame). First-level entries never
/// carry a reference count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageEntry {
    frame: u8,
    valid: bool,
    ref_count: u8,
}

impl PageEntry {
    const INVALID: u8 = 0;
    const VALID: u8 = 1;

    /// Creates a valid entry pointing at `frame` with the given reference count.
    ///
    /// # Panics
    /// Panics if the frame number does not fit in a byte.
    pub fn new(frame: FrameNumber, ref_count: u8) -> Self {
        let frame = u8::try_from(frame.as_usize()).expect("frame number exceeds entry width");
        Self {
            frame,
            valid: true,
            ref_count,
        }
    }

    /// Returns the frame this entry points at.
    ///
    /// Returns None if the entry is not valid.
    pub fn frame(self) -> Option<FrameNumber> {
        self.valid.then(|| FrameNumber::new(self.frame as usize))
    }

    /// Returns whether this entry is valid.
    pub fn is_valid(self) -> bool {
        self.valid
    }

    /// Returns the reference count of this entry.
    pub fn ref_count(self) -> u8 {
        self.ref_count
    }

    /// Records one more reference through this entry.
    ///
    /// The count saturates at `u8::MAX`.
    pub fn touch(&mut self) {
        self.ref_count = self.ref_count.saturating_add(1);
    }

    /// Decodes an entry from its in-memory representation.
    pub fn from_bytes(bytes: [u8; PTE_SIZE]) -> Self {
        Self {
            frame: bytes[0],
            valid: bytes[1] != Self::INVALID,
            ref_count: bytes[2],
        }
    }

    /// Encodes this entry into its in-memory representation.
    pub fn to_bytes(self) -> [u8; PTE_SIZE] {
        let flag = if self.valid { Self::VALID } else { Self::INVALID };
        [self.frame, flag, self.ref_count, 0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_entry_is_invalid() {
        let entry = PageEntry::default();
        assert!(!entry.is_valid());
        assert_eq!(entry.frame(), None);
        assert_eq!(entry.to_bytes(), [0; PTE_SIZE]);
    }

    #[test]
    fn zeroed_bytes_decode_as_invalid() {
        let entry = PageEntry::from_bytes([0; PTE_SIZE]);
        assert_eq!(entry, PageEntry::default());
    }

    #[test]
    fn valid_entry_layout() {
        let entry = PageEntry::new(FrameNumber::new(200), 3);
        assert_eq!(entry.to_bytes(), [200, 1, 3, 0]);
        assert_eq!(entry.frame(), Some(FrameNumber::new(200)));
        assert_eq!(entry.ref_count(), 3);
    }

    #[test]
    fn invalid_entry_hides_stale_frame() {
        let entry = PageEntry::from_bytes([9, 0, 4, 0]);
        assert_eq!(entry.frame(), None);
    }

    #[test]
    fn touch_increments_and_saturates() {
        let mut entry = PageEntry::new(FrameNumber::new(1), 1);
        entry.touch();
        assert_eq!(entry.ref_count(), 2);

        let mut full = PageEntry::new(FrameNumber::new(1), u8::MAX);
        full.touch();
        assert_eq!(full.ref_count(), u8::MAX);
    }

    #[test]
    #[should_panic]
    fn frame_must_fit_in_a_byte() {
        let _ = PageEntry::new(FrameNumber::new(256), 0);
    }
}
