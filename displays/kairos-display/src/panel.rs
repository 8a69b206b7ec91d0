//! ILI9341 panel driver and flush orchestration
//!
//! Two halves share the hardware. The foreground half ([`Ili9341`]) clips,
//! chunks, packs and starts bursts; the interrupt half lives in
//! [`FlushShared`], which the platform's transfer-complete ISR pokes. The
//! split keeps every interrupt-side step cheap: close out the burst, free
//! the buffer, set a flag. Everything heavier happens in the foreground.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::area::Area;
use crate::buffer::{BufferArbiter, BUFFER_LEN, BUFFER_PIXELS};
use crate::bus::{FlushError, PanelBus};
use crate::chunk::{self, Chunk};
use crate::color::rgb888_to_rgb565;
use crate::transport::Transport;

/// Panel width in its native portrait orientation
pub const PANEL_WIDTH: u16 = 240;
/// Panel height in its native portrait orientation
pub const PANEL_HEIGHT: u16 = 320;

mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const PASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    /// Continue a memory write from where the last burst stopped
    pub const RAMWRC: u8 = 0x3C;

    /// 16 bits per pixel on both interfaces
    pub const COLMOD_16BPP: u8 = 0x55;

    // MADCTL bits
    pub const MADCTL_MY: u8 = 0x80;
    pub const MADCTL_MX: u8 = 0x40;
    pub const MADCTL_MV: u8 = 0x20;
    pub const MADCTL_BGR: u8 = 0x08;
}

/// Panel mounting orientation, set once at init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Memory-access-control byte for this orientation
    pub const fn madctl(self) -> u8 {
        match self {
            Orientation::Portrait => cmd::MADCTL_MY | cmd::MADCTL_MX,
            Orientation::Landscape => cmd::MADCTL_MV | cmd::MADCTL_MY | cmd::MADCTL_BGR,
        }
    }

    /// Active (width, height) in this orientation
    pub const fn dimensions(self) -> (u16, u16) {
        match self {
            Orientation::Portrait => (PANEL_WIDTH, PANEL_HEIGHT),
            Orientation::Landscape => (PANEL_HEIGHT, PANEL_WIDTH),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    /// The last armed frame finished; consumed by the foreground poll
    ready: bool,
    /// A burst faulted; surfaced by the next engine call
    fault: bool,
    /// Set before the final burst of a frame starts
    armed: bool,
}

/// State shared between the foreground driver and the completion interrupt
///
/// Owns the transport so the interrupt can restore the bus no matter what
/// the foreground was doing. Platform glue keeps one of these where the ISR
/// can reach it and forwards the transfer-complete and transfer-error
/// interrupts to [`Self::transfer_complete`] and [`Self::transfer_failed`].
pub struct FlushShared<B, CS, DC> {
    transport: Mutex<RefCell<Transport<B, CS, DC>>>,
    arbiter: BufferArbiter,
    flags: Mutex<Cell<Flags>>,
}

impl<B, CS, DC> FlushShared<B, CS, DC>
where
    B: PanelBus,
    CS: OutputPin,
    DC: OutputPin<Error = CS::Error>,
{
    pub fn new(bus: B, cs: CS, dc: DC) -> Self {
        Self {
            transport: Mutex::new(RefCell::new(Transport::new(bus, cs, dc))),
            arbiter: BufferArbiter::new(),
            flags: Mutex::new(Cell::new(Flags::default())),
        }
    }

    fn with_transport<R>(&self, f: impl FnOnce(&mut Transport<B, CS, DC>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.transport.borrow_ref_mut(cs)))
    }

    /// Burst done: restore the bus, free the buffer, flag the frame
    ///
    /// Call from the transfer-complete interrupt.
    pub fn transfer_complete(&self) {
        let restored = self.with_transport(|t| t.finish_pixel_burst());
        self.arbiter.release();
        critical_section::with(|cs| {
            let flags = self.flags.borrow(cs);
            let mut f = flags.get();
            if restored.is_err() {
                f.fault = true;
            }
            if f.armed {
                f.armed = false;
                f.ready = true;
            }
            flags.set(f);
        });
    }

    /// Burst faulted: restore the bus, abandon the buffer, latch the fault
    ///
    /// Call from the transfer-error interrupt. The engine keeps running;
    /// the fault comes back as [`FlushError::TransferFailed`] from the next
    /// foreground call.
    pub fn transfer_failed(&self) {
        let _ = self.with_transport(|t| t.finish_pixel_burst());
        self.arbiter.release();
        critical_section::with(|cs| {
            let flags = self.flags.borrow(cs);
            let mut f = flags.get();
            f.fault = true;
            if f.armed {
                // unblock whoever is waiting on the frame
                f.armed = false;
                f.ready = true;
            }
            flags.set(f);
        });
    }

    /// Consume the frame-done flag
    pub fn take_ready(&self) -> bool {
        critical_section::with(|cs| {
            let flags = self.flags.borrow(cs);
            let mut f = flags.get();
            let was = f.ready;
            f.ready = false;
            flags.set(f);
            was
        })
    }

    fn arm_ready(&self) {
        self.update_flags(|f| f.armed = true);
    }

    fn disarm_ready(&self) {
        self.update_flags(|f| f.armed = false);
    }

    fn signal_ready(&self) {
        self.update_flags(|f| f.ready = true);
    }

    fn take_fault(&self) -> bool {
        critical_section::with(|cs| {
            let flags = self.flags.borrow(cs);
            let mut f = flags.get();
            let was = f.fault;
            f.fault = false;
            flags.set(f);
            was
        })
    }

    fn update_flags(&self, f: impl FnOnce(&mut Flags)) {
        critical_section::with(|cs| {
            let flags = self.flags.borrow(cs);
            let mut v = flags.get();
            f(&mut v);
            flags.set(v);
        });
    }
}

/// Registration data for a rendering toolkit
///
/// Raw addresses because toolkit glue is typically C FFI; the capacity is
/// shared between the two buffers, in RGB565 pixels.
#[derive(Debug, Clone, Copy)]
pub struct DrawBuffers {
    pub first: *mut u8,
    pub second: *mut u8,
    pub capacity_px: u32,
}

/// Foreground half of the panel driver
///
/// Owns the two transfer buffers and the window bookkeeping. All methods
/// run in thread context; the interrupt side goes through [`FlushShared`].
pub struct Ili9341<'a, B, CS, DC> {
    shared: &'a FlushShared<B, CS, DC>,
    bufs: [&'a mut [u8; BUFFER_LEN]; 2],
    orientation: Orientation,
    width: u16,
    height: u16,
    last_window: Option<Area>,
}

impl<'a, B, CS, DC> Ili9341<'a, B, CS, DC>
where
    B: PanelBus,
    CS: OutputPin,
    DC: OutputPin<Error = CS::Error>,
{
    pub fn new(
        shared: &'a FlushShared<B, CS, DC>,
        buffers: [&'a mut [u8; BUFFER_LEN]; 2],
        orientation: Orientation,
    ) -> Self {
        let (width, height) = orientation.dimensions();
        Self {
            shared,
            bufs: buffers,
            orientation,
            width,
            height,
            last_window: None,
        }
    }

    /// Wake the panel and configure pixel format and orientation
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), FlushError<B::Error, CS::Error>> {
        let shared = self.shared;
        let madctl = self.orientation.madctl();
        shared.with_transport(|t| t.normalize());
        shared.with_transport(|t| t.write_command(cmd::SWRESET))?;
        delay.delay_ms(120);
        shared.with_transport(|t| t.write_command(cmd::SLPOUT))?;
        delay.delay_ms(120);
        shared.with_transport(|t| {
            t.write_command(cmd::COLMOD)?;
            t.write_data(&[cmd::COLMOD_16BPP])?;
            t.write_command(cmd::MADCTL)?;
            t.write_data(&[madctl])
        })?;
        self.set_window(Area::full(self.width, self.height))?;
        shared.with_transport(|t| t.write_command(cmd::DISPON))?;
        delay.delay_ms(20);
        Ok(())
    }

    /// Push a rendered region to the panel
    ///
    /// `pixels` holds the region's RGB565 pixels row-major, one per pixel
    /// of `area`. The area is clipped to the panel; a region entirely
    /// off-panel completes immediately with no bus traffic. The call
    /// returns once the final burst has started; the frame-done flag
    /// arrives with the completion interrupt and is polled through
    /// [`Self::take_ready`].
    pub fn flush(
        &mut self,
        area: &Area,
        pixels: &[u16],
    ) -> Result<(), FlushError<B::Error, CS::Error>> {
        self.surface_fault()?;
        if pixels.len() != area.pixels() as usize {
            return Err(FlushError::SourceMismatch);
        }
        let Some(clipped) = area.clipped(self.width, self.height) else {
            self.shared.signal_ready();
            return Ok(());
        };
        let src_w = area.width() as usize;
        let clip_w = clipped.width() as usize;
        self.push_chunks(clipped, true, |dst, run| {
            // the source keeps the unclipped row stride
            let mut idx = run.offset_px as usize;
            let mut remaining = run.len_px as usize;
            let mut out = dst.chunks_exact_mut(2);
            while remaining > 0 {
                let row = idx / clip_w;
                let col = idx % clip_w;
                let take = (clip_w - col).min(remaining);
                let start = row * src_w + col;
                for (p, d) in pixels[start..start + take].iter().zip(&mut out) {
                    d.copy_from_slice(&p.to_ne_bytes());
                }
                idx += take;
                remaining -= take;
            }
        })
    }

    /// Fill a rectangle with one color
    ///
    /// Strict bounds: any part of `area` outside the active panel is
    /// rejected with [`FlushError::OutOfBounds`] before any bus traffic.
    /// Returns once the final burst has started; use [`Self::wait_idle`]
    /// for quiescence.
    pub fn fill_rect(
        &mut self,
        rgb888: u32,
        area: &Area,
    ) -> Result<(), FlushError<B::Error, CS::Error>> {
        self.surface_fault()?;
        if !area.fits(self.width, self.height) {
            return Err(FlushError::OutOfBounds);
        }
        let px = rgb888_to_rgb565(rgb888).to_ne_bytes();
        self.push_chunks(*area, false, |dst, _| {
            for d in dst.chunks_exact_mut(2) {
                d.copy_from_slice(&px);
            }
        })
    }

    /// Fill the whole active area with one color
    pub fn clear(&mut self, rgb888: u32) -> Result<(), FlushError<B::Error, CS::Error>> {
        self.fill_rect(rgb888, &Area::full(self.width, self.height))
    }

    /// Spin, bounded, until no burst is in flight
    pub fn wait_idle(&mut self) -> Result<(), FlushError<B::Error, CS::Error>> {
        self.shared
            .arbiter
            .wait_channel_clear()
            .map_err(|_| FlushError::TransferTimeout)?;
        self.surface_fault()
    }

    /// Consume the frame-done flag
    pub fn take_ready(&mut self) -> bool {
        self.shared.take_ready()
    }

    /// Buffer addresses and capacity for toolkit registration
    pub fn draw_buffers(&mut self) -> DrawBuffers {
        DrawBuffers {
            first: self.bufs[0].as_mut_ptr(),
            second: self.bufs[1].as_mut_ptr(),
            capacity_px: BUFFER_PIXELS,
        }
    }

    /// Active (width, height) for the configured orientation
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Cut `target` into runs and stream them through alternating buffers
    ///
    /// `pack` fills the given buffer slice for one run. Packing overlaps
    /// the previous run's burst; the bus itself is touched only once that
    /// burst's completion interrupt has closed it out. With `arm_on_last`
    /// the frame-done flag is armed for the final run; fills leave it
    /// unarmed, frame completion belongs to flush.
    fn push_chunks(
        &mut self,
        target: Area,
        arm_on_last: bool,
        mut pack: impl FnMut(&mut [u8], &Chunk),
    ) -> Result<(), FlushError<B::Error, CS::Error>> {
        let shared = self.shared;
        let runs = chunk::chunks(target, BUFFER_PIXELS);
        let total = runs.len();
        for (i, run) in runs.enumerate() {
            let id = shared
                .arbiter
                .acquire()
                .map_err(|_| FlushError::TransferTimeout)?;
            let bytes = run.len_bytes() as usize;
            pack(&mut self.bufs[id.index()][..bytes], &run);
            if shared.arbiter.wait_channel_clear().is_err() {
                shared.arbiter.abandon(id);
                return Err(FlushError::TransferTimeout);
            }
            let commanded = if i == 0 {
                self.set_window(target)
                    .and_then(|()| shared.with_transport(|t| t.write_command(cmd::RAMWR)))
            } else {
                shared.with_transport(|t| t.write_command(cmd::RAMWRC))
            };
            if let Err(e) = commanded {
                shared.arbiter.abandon(id);
                return Err(e);
            }
            if arm_on_last && i + 1 == total {
                // must be armed before the burst starts or the completion
                // interrupt can race past it
                shared.arm_ready();
            }
            shared.arbiter.mark_in_flight(id);
            let buf = &self.bufs[id.index()][..bytes];
            if let Err(e) = shared.with_transport(|t| t.start_pixel_burst(buf)) {
                shared.arbiter.release();
                shared.disarm_ready();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Program the addressing window if it changed since the last transfer
    fn set_window(&mut self, area: Area) -> Result<(), FlushError<B::Error, CS::Error>> {
        if self.last_window == Some(area) {
            return Ok(());
        }
        let cols = [
            (area.x1 >> 8) as u8,
            area.x1 as u8,
            (area.x2 >> 8) as u8,
            area.x2 as u8,
        ];
        let pages = [
            (area.y1 >> 8) as u8,
            area.y1 as u8,
            (area.y2 >> 8) as u8,
            area.y2 as u8,
        ];
        self.shared.with_transport(|t| {
            t.write_command(cmd::CASET)?;
            t.write_data(&cols)?;
            t.write_command(cmd::PASET)?;
            t.write_data(&pages)
        })?;
        self.last_window = Some(area);
        Ok(())
    }

    fn surface_fault(&mut self) -> Result<(), FlushError<B::Error, CS::Error>> {
        if self.shared.take_fault() {
            Err(FlushError::TransferFailed)
        } else {
            Ok(())
        }
    }
}
