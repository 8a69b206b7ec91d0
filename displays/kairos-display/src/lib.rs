//! Double-buffered flush engine for an ILI9341 TFT panel
//!
//! Moves rendered pixel regions from a UI toolkit to the panel over one
//! shared serial bus, using two fixed transfer buffers so the next region
//! can be packed while the previous one is still on the wire.
//!
//! # Architecture
//!
//! ```text
//!  foreground                              interrupt
//! ┌──────────────────────────────┐      ┌──────────────────────────┐
//! │ Ili9341                      │      │ FlushShared              │
//! │  clip → window → chunk       │      │  transfer_complete():    │
//! │  pack buffer (overlaps burst)│─────▶│   restore narrow width   │
//! │  start wide burst            │      │   raise CS, free buffer  │
//! └──────────────┬───────────────┘      │   set frame-done flag    │
//!                │                      └────────────┬─────────────┘
//!                ▼                                   │
//!        PanelBus + CS/DC pins  ◀────────────────────┘
//! ```
//!
//! Commands travel narrow (8-bit frames, DC strobed); pixels travel wide
//! (16-bit frames) in asynchronous bursts completed by interrupt. The bus
//! is disabled around every width change.
//!
//! Platform glue implements [`PanelBus`] over its SPI/DMA peripheral,
//! provides the two 10 KiB buffers, and forwards the transfer interrupts
//! to [`FlushShared`].

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod area;
pub mod buffer;
pub mod bus;
pub mod chunk;
pub mod color;
pub mod panel;
pub mod transport;

// Re-export key types
pub use area::Area;
pub use buffer::{BufferArbiter, BufferId, Ownership, BUFFER_LEN, BUFFER_PIXELS};
pub use bus::{BusWidth, FlushError, PanelBus};
pub use color::rgb888_to_rgb565;
pub use panel::{DrawBuffers, FlushShared, Ili9341, Orientation, PANEL_HEIGHT, PANEL_WIDTH};
pub use transport::Transport;
