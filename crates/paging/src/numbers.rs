//! Page and frame number types.
//!
//! This module provides newtypes for physical frame numbers and logical page numbers,
//! which are used throughout the simulator so the two index spaces cannot be mixed up.

use core::{fmt, ops::Range};

use crate::layout::{self, PAGE_SIZE, VAS_PAGES};

/// Macro to define common page/frame number functionality.
///
/// This macro generates the basic structure and methods common to both frame
/// and page number types, reducing code duplication.
macro_rules! impl_page_number_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Returns the raw page/frame number.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Zero-padded so trace and report columns line up.
                write!(f, "{:03}", self.0)
            }
        }
    };
}

impl_page_number_common!(
    FrameNumber,
    "A physical frame number.\n\n\
     Frame numbers are zero-indexed and always below the frame count of the\n\
     `PhysicalMemory` that issued them, which never exceeds `PAS_FRAMES`."
);

impl FrameNumber {
    /// Creates a new frame number.
    #[inline]
    pub const fn new(number: usize) -> Self {
        Self(number)
    }

    /// Returns the byte range this frame occupies in physical memory.
    #[inline]
    pub const fn range(self) -> Range<usize> {
        self.0 * PAGE_SIZE..(self.0 + 1) * PAGE_SIZE
    }
}

impl_page_number_common!(
    PageNumber,
    "A logical page number within a process's address space.\n\n\
     Page numbers are always below `VAS_PAGES`."
);

impl PageNumber {
    /// Creates a new page number, or `None` if it lies outside the address space.
    #[inline]
    pub const fn new(number: usize) -> Option<Self> {
        if number < VAS_PAGES {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Rebuilds a page number from its first- and second-level table indexes.
    #[inline]
    pub const fn from_indices(l1: usize, l2: usize) -> Option<Self> {
        Self::new(layout::page_from_indices(l1, l2))
    }

    /// Index of this page's entry in the first-level table.
    #[inline]
    pub const fn l1_index(self) -> usize {
        layout::l1_index(self.0)
    }

    /// Index of this page's entry in its second-level table.
    #[inline]
    pub const fn l2_index(self) -> usize {
        layout::l2_index(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod frame_number {
        use super::*;

        #[test]
        fn new_frame() {
            let frame = FrameNumber::new(42);
            assert_eq!(frame.as_usize(), 42);
        }

        #[test]
        fn byte_range() {
            assert_eq!(FrameNumber::new(0).range(), 0..PAGE_SIZE);
            assert_eq!(FrameNumber::new(3).range(), 3 * PAGE_SIZE..4 * PAGE_SIZE);
        }

        #[test]
        fn adjacent_ranges_do_not_overlap() {
            let a = FrameNumber::new(4).range();
            let b = FrameNumber::new(5).range();
            assert_eq!(a.end, b.start);
        }

        #[test]
        fn display_is_zero_padded() {
            assert_eq!(format!("{}", FrameNumber::new(7)), "007");
            assert_eq!(format!("{:?}", FrameNumber::new(7)), "FrameNumber(7)");
        }
    }

    mod page_number {
        use super::*;

        #[test]
        fn rejects_out_of_range() {
            assert!(PageNumber::new(VAS_PAGES - 1).is_some());
            assert!(PageNumber::new(VAS_PAGES).is_none());
        }

        #[test]
        fn indices() {
            let page = PageNumber::new(13).unwrap();
            assert_eq!(page.l1_index(), 1);
            assert_eq!(page.l2_index(), 5);
        }

        #[test]
        fn round_trip() {
            for raw in 0..VAS_PAGES {
                let page = PageNumber::new(raw).unwrap();
                let rebuilt = PageNumber::from_indices(page.l1_index(), page.l2_index());
                assert_eq!(rebuilt, Some(page));
            }
        }

        #[test]
        fn comparison() {
            let page1 = PageNumber::new(5).unwrap();
            let page2 = PageNumber::new(10).unwrap();
            assert!(page1 < page2);
            assert_ne!(page1, page2);
        }
    }
}
