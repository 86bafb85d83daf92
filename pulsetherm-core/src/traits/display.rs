//! Two-line character display trait

use heapless::String;

/// Columns per display line
pub const LINE_WIDTH: usize = 16;

/// One line of display text
pub type DisplayLine = String<LINE_WIDTH>;

/// Errors from the display link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transaction failed
    Bus,
    /// Controller never answered
    NotResponding,
}

/// Status display with two lines of [`LINE_WIDTH`] characters
pub trait Display {
    /// Write one line (0 or 1)
    ///
    /// Text shorter than the line is padded with spaces; longer text is cut.
    fn write_line(&mut self, row: u8, text: &str) -> Result<(), DisplayError>;

    /// Write both lines
    fn show(&mut self, lines: &[DisplayLine; 2]) -> Result<(), DisplayError> {
        self.write_line(0, &lines[0])?;
        self.write_line(1, &lines[1])
    }
}
