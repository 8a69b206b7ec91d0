//! Panel bus seam
//!
//! Implemented by the platform's SPI-plus-DMA glue. The engine owns the
//! DC/CS lines and the framing discipline; the bus moves bytes and switches
//! frame width.

/// Frame width of the panel bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusWidth {
    /// 8-bit frames, command and parameter traffic
    Narrow,
    /// 16-bit frames, pixel traffic
    Wide,
}

/// Raw bus under the panel
///
/// One shared serial channel carries both command and pixel traffic, in
/// different frame widths. Width changes are only legal while the
/// peripheral is disabled; the transport sequences that, implementations
/// just poke the registers.
pub trait PanelBus {
    /// Error type for bus operations
    type Error;

    /// Enable the peripheral
    fn enable(&mut self);

    /// Disable the peripheral, letting any frame on the wire drain first
    fn disable(&mut self);

    /// Select the frame width
    ///
    /// Called only while the bus is disabled.
    fn set_width(&mut self, width: BusWidth);

    /// Blocking write in the current width
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Start an asynchronous write and return immediately
    ///
    /// The engine keeps `bytes` untouched until the implementation signals
    /// the outcome through [`crate::panel::FlushShared::transfer_complete`]
    /// or [`crate::panel::FlushShared::transfer_failed`], so implementations
    /// may stream from the region (e.g. via a DMA channel) until then.
    fn start_write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Errors surfaced by the flush engine
///
/// Generic over the bus error `B` and the strobe pin error `P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushError<B, P> {
    /// Request extends beyond the active panel area
    OutOfBounds,
    /// Pixel slice length does not match the request rectangle
    SourceMismatch,
    /// Bus rejected a transfer
    Bus(B),
    /// A strobe line could not be driven
    Pin(P),
    /// Completion interrupt never arrived; the stuck buffer was abandoned
    TransferTimeout,
    /// An earlier asynchronous burst faulted and was abandoned
    TransferFailed,
}
