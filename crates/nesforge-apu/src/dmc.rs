//! DMC (Delta Modulation Channel) placeholder.
//!
//! The real DMC plays 1-bit delta-encoded samples fetched from CPU memory via
//! DMA, stealing CPU cycles as it goes. That memory-stealing DMA is out of
//! scope here: this channel only tracks enough register state to answer
//! `$4015` status reads faithfully, and always outputs silence. A full
//! implementation would add a CPU-cycle-stealing DMA read driven by the bus.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stubbed DMC channel. Registers are latched but never produce sound.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dmc {
    irq_enabled: bool,
    loop_enabled: bool,
    rate_index: u8,
    direct_load: u8,
    sample_address: u8,
    sample_length: u8,
    enabled: bool,
}

impl Dmc {
    /// Create a new, silent DMC channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `$4010`: IRQ enable, loop flag, rate index.
    pub fn write_ctrl(&mut self, value: u8) {
        self.irq_enabled = value & 0x80 != 0;
        self.loop_enabled = value & 0x40 != 0;
        self.rate_index = value & 0x0F;
    }

    /// `$4011`: direct load of the (unused) output level.
    pub fn write_direct_load(&mut self, value: u8) {
        self.direct_load = value & 0x7F;
    }

    /// `$4012`: sample address = `$C000 + (A * $40)`.
    pub fn write_sample_address(&mut self, value: u8) {
        self.sample_address = value;
    }

    /// `$4013`: sample length = `(L * $10) + 1` bytes.
    pub fn write_sample_length(&mut self, value: u8) {
        self.sample_length = value;
    }

    /// Set channel enable state (from a `$4015` write).
    ///
    /// Since no sample is ever played, enabling the channel has no audible
    /// effect; it only affects the `$4015` status bit.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Clock the (disabled) timer. No-op: there is no DMA to drive.
    pub fn clock_timer(&mut self) {}

    /// Always silent.
    #[must_use]
    pub fn output(&self) -> u8 {
        0
    }

    /// Never raises an IRQ.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        false
    }

    /// No-op: the stub never sets its IRQ flag.
    pub fn clear_irq(&mut self) {}

    /// `$4015` bit 4 reflects whether the channel is enabled, matching
    /// hardware's "bytes remaining > 0" semantics closely enough for
    /// software that merely probes the enable bit after a write.
    #[must_use]
    pub fn active(&self) -> bool {
        self.enabled
    }
}
