//! Bus transport and strobe discipline
//!
//! Wraps the raw [`PanelBus`] together with the CS and DC lines and keeps
//! the one rule the panel cares about: the bus is disabled before every
//! frame-width change and re-enabled after. Commands go out narrow with DC
//! low for the opcode byte; pixel bursts go out wide with DC high and CS
//! held until the completion interrupt runs [`Transport::finish_pixel_burst`].

use embedded_hal::digital::OutputPin;

use crate::bus::{BusWidth, FlushError, PanelBus};

/// Framed access to the panel over one shared bus
pub struct Transport<B, CS, DC> {
    bus: B,
    cs: CS,
    dc: DC,
    width: BusWidth,
}

impl<B, CS, DC> Transport<B, CS, DC>
where
    B: PanelBus,
    CS: OutputPin,
    DC: OutputPin<Error = CS::Error>,
{
    /// Wrap a bus and its strobe lines
    ///
    /// Does not touch the hardware; call [`Self::normalize`] before the
    /// first command so the recorded width matches the peripheral.
    pub fn new(bus: B, cs: CS, dc: DC) -> Self {
        Self {
            bus,
            cs,
            dc,
            width: BusWidth::Narrow,
        }
    }

    /// Force the bus into the narrow idle state
    pub fn normalize(&mut self) {
        self.bus.disable();
        self.bus.set_width(BusWidth::Narrow);
        self.bus.enable();
        self.width = BusWidth::Narrow;
    }

    fn select_width(&mut self, width: BusWidth) {
        if self.width != width {
            self.bus.disable();
            self.bus.set_width(width);
            self.bus.enable();
            self.width = width;
        }
    }

    /// Send a one-byte command, DC strobed low around the opcode
    pub fn write_command(&mut self, op: u8) -> Result<(), FlushError<B::Error, CS::Error>> {
        self.select_width(BusWidth::Narrow);
        self.cs.set_low().map_err(FlushError::Pin)?;
        self.dc.set_low().map_err(FlushError::Pin)?;
        let sent = self.bus.write(&[op]).map_err(FlushError::Bus);
        self.dc.set_high().map_err(FlushError::Pin)?;
        self.cs.set_high().map_err(FlushError::Pin)?;
        sent
    }

    /// Send command parameters, DC high
    pub fn write_data(&mut self, bytes: &[u8]) -> Result<(), FlushError<B::Error, CS::Error>> {
        self.select_width(BusWidth::Narrow);
        self.cs.set_low().map_err(FlushError::Pin)?;
        self.dc.set_high().map_err(FlushError::Pin)?;
        let sent = self.bus.write(bytes).map_err(FlushError::Bus);
        self.cs.set_high().map_err(FlushError::Pin)?;
        sent
    }

    /// Start an asynchronous wide burst, CS held low until completion
    ///
    /// On failure the bus is returned to the narrow idle state before the
    /// error comes back.
    pub fn start_pixel_burst(&mut self, bytes: &[u8]) -> Result<(), FlushError<B::Error, CS::Error>> {
        self.select_width(BusWidth::Wide);
        self.cs.set_low().map_err(FlushError::Pin)?;
        self.dc.set_high().map_err(FlushError::Pin)?;
        match self.bus.start_write(bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = self.cs.set_high();
                self.select_width(BusWidth::Narrow);
                Err(FlushError::Bus(e))
            }
        }
    }

    /// Close out a wide burst: raise CS, restore the narrow width
    ///
    /// Runs in the completion interrupt, so the next foreground command
    /// finds the bus ready no matter what the foreground was doing.
    pub fn finish_pixel_burst(&mut self) -> Result<(), FlushError<B::Error, CS::Error>> {
        let raised = self.cs.set_high().map_err(FlushError::Pin);
        self.select_width(BusWidth::Narrow);
        raised
    }
}
