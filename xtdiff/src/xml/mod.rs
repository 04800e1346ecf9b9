//! XML collaborators.
//!
//! Parsing raw markup into the arena tree model and serializing trees back
//! to markup. The diff core itself never touches markup; it consumes
//! [`Tree`](crate::tree::Tree) values these collaborators produce.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str};
pub use printer::{to_string, PrinterOptions, XmlPrinter};

use bitflags::bitflags;

bitflags! {
    /// Whitespace normalization applied while parsing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Normalize: u8 {
        /// Preserve all whitespace.
        const NONE = 0;
        /// Drop whitespace-only text between elements.
        const TAGS = 1;
        /// Collapse whitespace runs inside text to a single space.
        const TEXT = 2;
        /// Both of the above.
        const BOTH = Self::TAGS.bits() | Self::TEXT.bits();
    }
}
