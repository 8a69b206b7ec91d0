//! Mock panel bus for pipeline tests
//!
//! Records every bus and pin operation in order, enforces the hardware
//! rules the real peripheral would (no width change while enabled, one
//! burst at a time), and lets a separate thread play the role of the
//! transfer-complete interrupt.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use kairos_display::{BusWidth, FlushShared, PanelBus};

/// One recorded bus or pin operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Enable,
    Disable,
    SetWidth(BusWidth),
    /// Blocking narrow write with DC low: a command opcode
    Cmd(u8),
    /// Blocking narrow write with DC high: command parameters
    Data(Vec<u8>),
    /// Asynchronous wide burst payload
    Burst(Vec<u8>),
    CsLow,
    CsHigh,
    DcLow,
    DcHigh,
}

#[derive(Default)]
struct Inner {
    events: Vec<BusEvent>,
    enabled: bool,
    wide: bool,
    cs_low: bool,
    dc_low: bool,
    pending_bursts: u32,
    fail_start_in: Option<u32>,
}

/// Shared recorder handed to the bus and both pins
#[derive(Clone, Default)]
pub struct BusLog {
    inner: Arc<Mutex<Inner>>,
}

impl BusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Opcode sequence of all commands sent
    pub fn commands(&self) -> Vec<u8> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                BusEvent::Cmd(op) => Some(*op),
                _ => None,
            })
            .collect()
    }

    /// Payloads of all bursts, in order
    pub fn bursts(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BusEvent::Burst(bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    /// Every burst byte pair decoded back into a pixel
    pub fn burst_pixels(&self) -> Vec<u16> {
        self.bursts()
            .concat()
            .chunks_exact(2)
            .map(|p| u16::from_ne_bytes([p[0], p[1]]))
            .collect()
    }

    /// Make the n-th upcoming burst start fail (0 = the next one)
    pub fn fail_start_in(&self, n: u32) {
        self.inner.lock().unwrap().fail_start_in = Some(n);
    }

    pub fn has_pending_burst(&self) -> bool {
        self.inner.lock().unwrap().pending_bursts > 0
    }

    fn take_pending_burst(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.pending_bursts > 0 {
            inner.pending_bursts -= 1;
            true
        } else {
            false
        }
    }

    fn record(&self, event: BusEvent) {
        self.inner.lock().unwrap().events.push(event);
    }
}

/// Bus start error injected by [`BusLog::fail_start_in`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

pub struct MockBus {
    log: BusLog,
}

impl MockBus {
    pub fn new(log: &BusLog) -> Self {
        Self { log: log.clone() }
    }
}

impl PanelBus for MockBus {
    type Error = MockBusError;

    fn enable(&mut self) {
        let mut inner = self.log.inner.lock().unwrap();
        inner.enabled = true;
        inner.events.push(BusEvent::Enable);
    }

    fn disable(&mut self) {
        let mut inner = self.log.inner.lock().unwrap();
        inner.enabled = false;
        inner.events.push(BusEvent::Disable);
    }

    fn set_width(&mut self, width: BusWidth) {
        let mut inner = self.log.inner.lock().unwrap();
        assert!(!inner.enabled, "width changed while the bus is enabled");
        inner.wide = width == BusWidth::Wide;
        inner.events.push(BusEvent::SetWidth(width));
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), MockBusError> {
        let mut inner = self.log.inner.lock().unwrap();
        assert!(inner.enabled, "blocking write while the bus is disabled");
        assert!(!inner.wide, "command traffic sent in wide mode");
        assert!(inner.cs_low, "write without chip select");
        assert_eq!(
            inner.pending_bursts, 0,
            "blocking write while a burst is on the wire"
        );
        let event = if inner.dc_low {
            assert_eq!(bytes.len(), 1, "opcode writes are one byte");
            BusEvent::Cmd(bytes[0])
        } else {
            BusEvent::Data(bytes.to_vec())
        };
        inner.events.push(event);
        Ok(())
    }

    fn start_write(&mut self, bytes: &[u8]) -> Result<(), MockBusError> {
        let mut inner = self.log.inner.lock().unwrap();
        assert!(inner.enabled, "burst started while the bus is disabled");
        assert!(inner.wide, "pixel burst sent in narrow mode");
        assert!(inner.cs_low, "burst without chip select");
        assert!(!inner.dc_low, "burst with DC in command position");
        assert_eq!(inner.pending_bursts, 0, "second burst while one is pending");
        if let Some(n) = inner.fail_start_in {
            if n == 0 {
                inner.fail_start_in = None;
                return Err(MockBusError);
            }
            inner.fail_start_in = Some(n - 1);
        }
        inner.events.push(BusEvent::Burst(bytes.to_vec()));
        inner.pending_bursts += 1;
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Line {
    Cs,
    Dc,
}

pub struct MockPin {
    log: BusLog,
    line: Line,
}

impl MockPin {
    pub fn cs(log: &BusLog) -> Self {
        Self {
            log: log.clone(),
            line: Line::Cs,
        }
    }

    pub fn dc(log: &BusLog) -> Self {
        Self {
            log: log.clone(),
            line: Line::Dc,
        }
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut inner = self.log.inner.lock().unwrap();
        match self.line {
            Line::Cs => {
                inner.cs_low = true;
                inner.events.push(BusEvent::CsLow);
            }
            Line::Dc => {
                inner.dc_low = true;
                inner.events.push(BusEvent::DcLow);
            }
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut inner = self.log.inner.lock().unwrap();
        match self.line {
            Line::Cs => {
                inner.cs_low = false;
                inner.events.push(BusEvent::CsHigh);
            }
            Line::Dc => {
                inner.dc_low = false;
                inner.events.push(BusEvent::DcHigh);
            }
        }
        Ok(())
    }
}

/// Delay source that returns immediately
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Mock flush stack: shared state plus its recorder
pub type MockShared = FlushShared<MockBus, MockPin, MockPin>;

pub fn mock_shared(log: &BusLog) -> MockShared {
    FlushShared::new(MockBus::new(log), MockPin::cs(log), MockPin::dc(log))
}

/// Run `f` while a second thread plays the completion interrupt
///
/// Every burst the engine starts is completed shortly after from the other
/// thread, through the same critical sections the real ISR would take.
/// Returns once `f` is done and the wire is drained.
pub fn with_completion_irq<R>(shared: &MockShared, log: &BusLog, f: impl FnOnce() -> R) -> R {
    run_irq_thread(shared, log, false, f)
}

/// Like [`with_completion_irq`], but the first burst faults instead
pub fn with_failing_irq<R>(shared: &MockShared, log: &BusLog, f: impl FnOnce() -> R) -> R {
    run_irq_thread(shared, log, true, f)
}

fn run_irq_thread<R>(
    shared: &MockShared,
    log: &BusLog,
    fail_first: bool,
    f: impl FnOnce() -> R,
) -> R {
    let stop = AtomicBool::new(false);
    std::thread::scope(|s| {
        s.spawn(|| {
            let mut fail_next = fail_first;
            while !stop.load(Ordering::Acquire) {
                if log.take_pending_burst() {
                    if fail_next {
                        fail_next = false;
                        shared.transfer_failed();
                    } else {
                        shared.transfer_complete();
                    }
                }
                std::thread::yield_now();
            }
        });
        let out = f();
        while log.has_pending_burst() {
            std::thread::yield_now();
        }
        stop.store(true, Ordering::Release);
        out
    })
}
