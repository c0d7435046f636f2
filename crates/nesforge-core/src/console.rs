//! NES Console Implementation.
//!
//! The Console struct provides the high-level emulation API, managing the
//! CPU, PPU, APU, and mapper integration with proper timing.

use crate::bus::{ControllerState, NesBus};
use nesforge_apu::ChannelSamples;
use nesforge_cpu::{Cpu, CpuTracer, StatusFlags};
use nesforge_mappers::{Mapper, Rom, RomError, create_mapper};

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

#[cfg(feature = "std")]
use crate::recording::{RecordingSession, SampleSink};
#[cfg(feature = "std")]
use std::io::Write;
#[cfg(feature = "std")]
use std::sync::mpsc::{self, Receiver, SyncSender};

/// Capacity of the bounded audio channel returned by [`Console::audio_channel`].
///
/// Matches the "bounded, lock-free, single-producer single-consumer queue"
/// the mixer publishes onto; overruns are dropped rather than blocking the
/// producer.
#[cfg(feature = "std")]
const AUDIO_CHANNEL_CAPACITY: usize = 4096;

/// NES emulation timing constants.
pub mod timing {
    /// Master clock frequency (NTSC).
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock frequency (NTSC).
    pub const CPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 12;
    /// PPU clock frequency (NTSC).
    pub const PPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 4;
    /// CPU cycles per frame (NTSC).
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
    /// PPU dots per scanline.
    pub const PPU_DOTS_PER_SCANLINE: u16 = 341;
    /// Total scanlines (including vblank).
    pub const PPU_SCANLINES: u16 = 262;
    /// Target frame rate (NTSC).
    pub const FRAME_RATE_NTSC: f64 = 60.0988;
}

/// Console error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsoleError {
    /// ROM loading error (magic mismatch or truncated input).
    #[error("ROM error: {0}")]
    RomError(#[from] RomError),
    /// Invalid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Fetched a JAM/KIL opcode; the CPU is halted until reset.
    #[error("CPU jammed on illegal opcode at ${pc:04X}")]
    KillOpcode {
        /// Program counter where the JAM opcode was fetched.
        pc: u16,
    },
    /// A WAV recording sink reported a write failure.
    #[error("recording I/O error: {0}")]
    RecordingIO(String),
}

/// NES console emulator.
pub struct Console {
    /// 6502 CPU.
    cpu: Cpu,
    /// System bus (PPU, APU, mapper, RAM).
    bus: NesBus,
    /// Frame buffer (256x240 RGBA).
    framebuffer: Vec<u8>,
    /// Audio sample buffer.
    audio_buffer: Vec<f32>,
    /// Total CPU cycles executed.
    total_cycles: u64,
    /// Frame counter.
    frame_count: u64,
    /// Is emulation running?
    running: bool,
    /// Bounded sender side of the channel handed out by [`Console::audio_channel`].
    #[cfg(feature = "std")]
    audio_sender: Option<SyncSender<f32>>,
    /// Active WAV recording session, if any.
    #[cfg(feature = "std")]
    recording: Option<RecordingSession>,
    /// Error raised by the most recent `step`/`step_frame` call, if any
    /// (recording I/O failures and CPU jams are reported this way so the
    /// hot loop's return type stays a plain cycle count).
    pending_error: Option<ConsoleError>,
    /// PC value to load on `reset()` instead of the 0xFFFC reset vector
    /// (used to drive automation-mode ROMs such as `nestest.nes`, which
    /// starts execution at $C000 rather than its own reset vector).
    pc_override: Option<u16>,
    /// Instruction tracer used when a trace sink is attached.
    tracer: CpuTracer,
    /// Destination for nestest-log-format trace lines, one per executed
    /// instruction (see `Console::set_trace_sink`).
    #[cfg(feature = "std")]
    trace_sink: Option<Box<dyn Write>>,
}

impl Console {
    /// Create a new console with the given ROM.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        Self::with_mapper(mapper)
    }

    /// Create a new console from ROM bytes (alias for `new`).
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn from_rom_bytes(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        Self::new(rom_data)
    }

    /// Create a new console from ROM bytes, configuring the mixer's output
    /// sample rate (default is 48000 Hz; see `NesBus::with_sample_rate`).
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn from_rom_bytes_with_sample_rate(
        rom_data: &[u8],
        sample_rate: u32,
    ) -> Result<Self, ConsoleError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        let bus = NesBus::with_sample_rate(mapper, sample_rate);
        Ok(Self::from_parts(bus))
    }

    /// Create a console with a pre-created mapper.
    ///
    /// # Errors
    ///
    /// Returns an error if the console cannot be initialized.
    pub fn with_mapper(mapper: Box<dyn Mapper>) -> Result<Self, ConsoleError> {
        Ok(Self::from_parts(NesBus::new(mapper)))
    }

    fn from_parts(bus: NesBus) -> Self {
        Self {
            cpu: Cpu::new(),
            bus,
            framebuffer: vec![0; 256 * 240 * 4],
            audio_buffer: Vec::with_capacity(2048),
            total_cycles: 0,
            frame_count: 0,
            running: true,
            #[cfg(feature = "std")]
            audio_sender: None,
            #[cfg(feature = "std")]
            recording: None,
            pending_error: None,
            pc_override: None,
            tracer: CpuTracer::new(),
            #[cfg(feature = "std")]
            trace_sink: None,
        }
    }

    /// Create a console with an initial-PC override applied on every
    /// subsequent `reset()`/`power_on()`, instead of loading the $FFFC
    /// reset vector.
    ///
    /// This is the automation entry point used by conformance ROMs such as
    /// `nestest.nes`, which expects execution to begin at $C000.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn new_with_pc_override(
        rom_data: &[u8],
        initial_pc_override: u16,
    ) -> Result<Self, ConsoleError> {
        let mut console = Self::new(rom_data)?;
        console.pc_override = Some(initial_pc_override);
        Ok(console)
    }

    /// Set (or clear) the initial-PC override applied on `reset()`.
    pub fn set_pc_override(&mut self, pc: Option<u16>) {
        self.pc_override = pc;
    }

    /// Attach a trace sink receiving one nestest-log-format line per
    /// executed instruction (see the crate-level trace format docs). Use
    /// [`Console::take_trace_sink`] to detach it.
    #[cfg(feature = "std")]
    pub fn set_trace_sink(&mut self, sink: Box<dyn Write>) {
        self.trace_sink = Some(sink);
    }

    /// Detach and return the current trace sink, if any.
    #[cfg(feature = "std")]
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn Write>> {
        self.trace_sink.take()
    }

    /// Reset the console to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        if let Some(pc) = self.pc_override {
            self.cpu.pc = pc;
        }
        self.bus.reset();
        self.total_cycles = 0;
        self.running = true;
    }

    /// Power on the console (cold boot).
    pub fn power_on(&mut self) {
        self.reset();
    }

    /// Run emulation for one CPU instruction.
    ///
    /// Returns the number of CPU cycles executed. A JAM/KIL opcode halts
    /// the CPU (subsequent calls return 0 until [`Console::reset`]) and a
    /// `KillOpcode` error becomes available from [`Console::take_error`].
    /// A WAV recording write failure is reported the same way, without
    /// interrupting the cycle count this call returns.
    pub fn step(&mut self) -> u8 {
        if !self.running {
            return 0;
        }

        // Handle OAM DMA
        if self.bus.oam_dma_pending() {
            let dma_cycles = self.bus.execute_oam_dma();
            self.step_components(dma_cycles);
            return dma_cycles as u8;
        }

        // Handle interrupts
        if self.bus.nmi_pending() {
            self.bus.acknowledge_nmi();
            self.cpu.trigger_nmi();
        } else if self.bus.irq_pending() && !self.cpu.status.contains(StatusFlags::INTERRUPT_DISABLE) {
            self.cpu.set_irq(true);
        }

        // Execute one CPU instruction
        let pc_before = self.cpu.pc;
        #[cfg(feature = "std")]
        self.emit_trace_line();
        let cycles = self.cpu.step(&mut self.bus);
        self.step_components(u16::from(cycles));
        self.bus.add_cpu_cycles(cycles);
        self.total_cycles += u64::from(cycles);

        if self.cpu.is_jammed() && self.pending_error.is_none() {
            self.pending_error = Some(ConsoleError::KillOpcode { pc: pc_before });
        }

        cycles
    }

    /// Take and clear the error raised by the most recent `step`/`step_frame`
    /// call, if any (see [`Console::step`]).
    pub fn take_error(&mut self) -> Option<ConsoleError> {
        self.pending_error.take()
    }

    /// Log the pre-instruction trace line (PC/bytes/mnemonic/registers plus
    /// `PPU:dot,scanline CYC:total`) to the attached trace sink, if any.
    ///
    /// Called before the instruction executes, matching nestest.log's
    /// convention of showing state at the start of each instruction.
    #[cfg(feature = "std")]
    fn emit_trace_line(&mut self) {
        let Some(sink) = self.trace_sink.as_mut() else {
            return;
        };

        self.tracer.trace(&self.cpu, &mut self.bus);
        let Some(base_line) = self.tracer.last() else {
            return;
        };

        let scanline = self.bus.ppu.scanline();
        let dot = self.bus.ppu.dot();
        let line = if let Some((pre, cyc)) = base_line.split_once("CYC:") {
            format!("{pre}PPU:{dot:3},{scanline:3} CYC:{cyc}")
        } else {
            base_line.to_string()
        };

        if let Err(e) = writeln!(sink, "{line}") {
            if self.pending_error.is_none() {
                self.pending_error = Some(ConsoleError::RecordingIO(e.to_string()));
            }
        }
        self.tracer.clear();
    }

    /// Step PPU and APU for the given number of CPU cycles.
    fn step_components(&mut self, cpu_cycles: u16) {
        for _ in 0..cpu_cycles {
            // Step PPU (3 dots per CPU cycle)
            self.bus.step_ppu();

            // Step APU (1:1 with CPU)
            if let Some(samples) = self.bus.step_apu() {
                self.route_audio(samples);
            }
        }
    }

    /// Fan a mixed sample set out to the legacy buffer, the audio channel
    /// (if one has been handed out), and an active recording session.
    fn route_audio(&mut self, samples: ChannelSamples) {
        self.audio_buffer.push(samples.mix);

        #[cfg(feature = "std")]
        {
            if let Some(sender) = &self.audio_sender {
                // Non-blocking: a full channel means the consumer is behind,
                // so the sample is simply dropped rather than stalling the
                // emulation loop.
                let _ = sender.try_send(samples.mix);
            }

            if let Some(session) = &mut self.recording {
                if let Err(e) = session.write_samples(samples) {
                    if self.pending_error.is_none() {
                        self.pending_error = Some(ConsoleError::RecordingIO(e.to_string()));
                    }
                }
            }
        }
    }

    /// Run emulation for one frame (approximately 29,780 CPU cycles).
    ///
    /// Returns the actual number of CPU cycles executed.
    pub fn step_frame(&mut self) -> u64 {
        let start_cycles = self.total_cycles;
        let target_cycles = self.total_cycles + u64::from(timing::CPU_CYCLES_PER_FRAME);

        while self.total_cycles < target_cycles && self.running {
            self.step();
        }

        // Copy PPU framebuffer
        self.update_framebuffer();
        self.frame_count += 1;

        self.total_cycles - start_cycles
    }

    /// Run emulation for one frame with cycle-accurate timing.
    ///
    /// This is an alias for `step_frame()` for API compatibility.
    /// Returns the actual number of CPU cycles executed.
    pub fn step_frame_accurate(&mut self) -> u64 {
        self.step_frame()
    }

    /// Update the framebuffer from PPU output.
    fn update_framebuffer(&mut self) {
        let ppu_buffer = self.bus.ppu.frame_buffer();

        // Convert PPU palette indices to RGBA
        for (i, &palette_idx) in ppu_buffer.iter().enumerate() {
            let rgb = crate::palette::NES_PALETTE[palette_idx as usize & 0x3F];
            let offset = i * 4;
            self.framebuffer[offset] = rgb.0; // R
            self.framebuffer[offset + 1] = rgb.1; // G
            self.framebuffer[offset + 2] = rgb.2; // B
            self.framebuffer[offset + 3] = 255; // A
        }
    }

    /// Get the current framebuffer (256x240 RGBA).
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Take the audio buffer (drains accumulated samples).
    pub fn take_audio(&mut self) -> Vec<f32> {
        core::mem::take(&mut self.audio_buffer)
    }

    /// Get the audio buffer without draining.
    #[must_use]
    pub fn audio_buffer(&self) -> &[f32] {
        &self.audio_buffer
    }

    /// Get audio samples (alias for `audio_buffer`).
    #[must_use]
    pub fn audio_samples(&self) -> &[f32] {
        &self.audio_buffer
    }

    /// Clear the audio sample buffer.
    pub fn clear_audio_samples(&mut self) {
        self.audio_buffer.clear();
    }

    /// Set controller 1 state from button byte.
    pub fn set_controller_1(&mut self, buttons: u8) {
        self.bus.controller1 = ControllerState { buttons };
    }

    /// Set controller 2 state from button byte.
    pub fn set_controller_2(&mut self, buttons: u8) {
        self.bus.controller2 = ControllerState { buttons };
    }

    /// Set controller 1 state.
    pub fn set_controller1(&mut self, state: ControllerState) {
        self.bus.controller1 = state;
    }

    /// Set controller 2 state.
    pub fn set_controller2(&mut self, state: ControllerState) {
        self.bus.controller2 = state;
    }

    /// Get controller 1 state.
    #[must_use]
    pub fn controller1(&self) -> ControllerState {
        self.bus.controller1
    }

    /// Get controller 2 state.
    #[must_use]
    pub fn controller2(&self) -> ControllerState {
        self.bus.controller2
    }

    /// Get the total CPU cycles executed.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Get the frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Check if emulation is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pause emulation.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume emulation.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Get a reference to the CPU for debugging.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Get a reference to the PPU for debugging.
    #[must_use]
    pub fn ppu(&self) -> &nesforge_ppu::Ppu {
        &self.bus.ppu
    }

    /// Get a reference to the APU for debugging.
    #[must_use]
    pub fn apu(&self) -> &nesforge_apu::Apu {
        &self.bus.apu
    }

    /// Get the total CPU cycles (alias for `total_cycles`).
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Peek at memory without side effects.
    ///
    /// This is useful for debugging/display purposes where we don't want
    /// to trigger PPU register side effects or mapper state changes.
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Get a reference to the bus for debugging.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Get a mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Get the mapper number.
    #[must_use]
    pub fn mapper_number(&self) -> u16 {
        self.bus.mapper.mapper_number()
    }

    /// Get the mapper name.
    #[must_use]
    pub fn mapper_name(&self) -> &'static str {
        self.bus.mapper.mapper_name()
    }

    /// Check if the ROM has battery-backed RAM.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.bus.mapper.has_battery()
    }

    /// Get battery-backed RAM for saving.
    #[must_use]
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.bus.mapper.battery_ram()
    }

    /// Load battery-backed RAM.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        self.bus.mapper.set_battery_ram(data);
    }

    /// Render both 4 KiB pattern tables (left at $0000, right at $1000) into a
    /// 256x128 RGBA buffer, two 128x128 halves side by side, applying
    /// background palette `palette_num` (0-3) to both halves.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is not exactly `256 * 128 * 4` bytes.
    pub fn draw_pattern_tables(&self, buf: &mut [u8], palette_num: u8) {
        assert_eq!(
            buf.len(),
            256 * 128 * 4,
            "pattern table buffer must be 256x128 RGBA"
        );

        let colors = self.bg_palette_colors(palette_num & 0x03);

        for half in 0..2u16 {
            let table_base = half * 0x1000;
            let x_origin = half as usize * 128;
            for tile_y in 0..16usize {
                for tile_x in 0..16usize {
                    let tile_addr = table_base + (tile_y * 16 + tile_x) as u16 * 16;
                    self.blit_tile(buf, 256, tile_addr, x_origin + tile_x * 8, tile_y * 8, &colors);
                }
            }
        }
    }

    /// Render the four logical nametables into a 512x480 RGBA buffer arranged
    /// as a 2x2 grid (mirrored tables repeat the same content, as on
    /// hardware), using the background pattern table currently selected by
    /// PPUCTRL and each tile's own attribute-table palette.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is not exactly `512 * 480 * 4` bytes.
    pub fn draw_nametables(&self, buf: &mut [u8]) {
        assert_eq!(
            buf.len(),
            512 * 480 * 4,
            "nametable buffer must be 512x480 RGBA"
        );

        let bg_table = self.bus.ppu.bg_pattern_table_addr();

        for nt in 0..4usize {
            let nt_base: u16 = 0x2000 + (nt as u16) * 0x0400;
            let x_origin = (nt % 2) * 256;
            let y_origin = (nt / 2) * 240;

            for tile_y in 0..30usize {
                for tile_x in 0..32usize {
                    let tile_index = self
                        .bus
                        .ppu
                        .peek_nametable(nt_base + (tile_y * 32 + tile_x) as u16);
                    let attr_addr =
                        nt_base + 0x03C0 + ((tile_y / 4) * 8 + (tile_x / 4)) as u16;
                    let attr_byte = self.bus.ppu.peek_nametable(attr_addr);
                    let shift = (((tile_y % 4) / 2) * 2 + ((tile_x % 4) / 2)) * 2;
                    let palette_num = (attr_byte >> shift) & 0x03;
                    let colors = self.bg_palette_colors(palette_num);

                    let tile_addr = bg_table + u16::from(tile_index) * 16;
                    self.blit_tile(
                        buf,
                        512,
                        tile_addr,
                        x_origin + tile_x * 8,
                        y_origin + tile_y * 8,
                        &colors,
                    );
                }
            }
        }
    }

    /// Resolve the 4-color RGB ramp (backdrop + 3 background colors) for
    /// background palette `palette_num` (0-3).
    fn bg_palette_colors(&self, palette_num: u8) -> [(u8, u8, u8); 4] {
        let base = 4 * palette_num;
        [
            crate::palette::palette_to_rgb(self.bus.ppu.peek_palette(0)),
            crate::palette::palette_to_rgb(self.bus.ppu.peek_palette(base + 1)),
            crate::palette::palette_to_rgb(self.bus.ppu.peek_palette(base + 2)),
            crate::palette::palette_to_rgb(self.bus.ppu.peek_palette(base + 3)),
        ]
    }

    /// Decode one 8x8 CHR tile at `tile_addr` and paint it into `buf` (a
    /// `stride`-pixel-wide RGBA image) at pixel origin `(x, y)`.
    fn blit_tile(
        &self,
        buf: &mut [u8],
        stride: usize,
        tile_addr: u16,
        x: usize,
        y: usize,
        colors: &[(u8, u8, u8); 4],
    ) {
        for row in 0..8usize {
            let low = self.bus.mapper.read_chr(tile_addr + row as u16);
            let high = self.bus.mapper.read_chr(tile_addr + 8 + row as u16);
            for col in 0..8usize {
                let bit = 7 - col;
                let value = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
                let rgb = colors[value as usize];
                let offset = ((y + row) * stride + (x + col)) * 4;
                buf[offset] = rgb.0;
                buf[offset + 1] = rgb.1;
                buf[offset + 2] = rgb.2;
                buf[offset + 3] = 0xFF;
            }
        }
    }

    /// Hand out a bounded receiver fed by the mixer's mixed-channel output.
    ///
    /// Only the most recently handed-out receiver stays connected — calling
    /// this again replaces the previous channel.
    #[cfg(feature = "std")]
    pub fn audio_channel(&mut self) -> Receiver<f32> {
        let (sender, receiver) = mpsc::sync_channel(AUDIO_CHANNEL_CAPACITY);
        self.audio_sender = Some(sender);
        receiver
    }

    /// Start a WAV recording session, calling `sink_factory` once per
    /// channel (`pulse_0`, `pulse_1`, `triangle`, `noise`, `dmc`, `mix`) to
    /// obtain its backing sink. Replaces any recording already in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if a sink's header could not be written.
    #[cfg(feature = "std")]
    pub fn start_recording<F>(&mut self, sink_factory: F) -> Result<(), ConsoleError>
    where
        F: FnMut(&'static str) -> Box<dyn SampleSink>,
    {
        let sample_rate = self.bus.apu.sample_rate();
        let session = RecordingSession::start(sample_rate, sink_factory)
            .map_err(|e| ConsoleError::RecordingIO(e.to_string()))?;
        self.recording = Some(session);
        Ok(())
    }

    /// Suspend the active recording session's writes, if one is running.
    #[cfg(feature = "std")]
    pub fn pause_recording(&mut self) {
        if let Some(session) = &mut self.recording {
            session.pause();
        }
    }

    /// Resume a paused recording session's writes, if one is running.
    #[cfg(feature = "std")]
    pub fn resume_recording(&mut self) {
        if let Some(session) = &mut self.recording {
            session.resume();
        }
    }

    /// Finalize and close the active recording session, if any.
    ///
    /// # Errors
    ///
    /// Returns the first write failure encountered while finalizing the
    /// per-channel encoders; the rest are still finalized best-effort.
    #[cfg(feature = "std")]
    pub fn stop_recording(&mut self) -> Result<(), ConsoleError> {
        if let Some(session) = self.recording.take() {
            session
                .finish()
                .map_err(|e| ConsoleError::RecordingIO(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nesforge_mappers::{Mirroring, Nrom, RomHeader};

    #[cfg(not(feature = "std"))]
    use alloc::{boxed::Box, vec, vec::Vec};

    fn create_test_console() -> Console {
        let rom = Rom {
            header: RomHeader {
                prg_rom_size: 32768,
                chr_rom_size: 8192,
                mapper_number: 0,
                submapper: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
                prg_ram_size: 0,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
            },
            // Simple program: NOP loop at $8000
            prg_rom: {
                let mut prg = vec![0xEA; 32768]; // Fill with NOPs
                // Reset vector at $FFFC points to $8000
                prg[0x7FFC] = 0x00;
                prg[0x7FFD] = 0x80;
                prg
            },
            chr_rom: vec![0; 8192],
            trainer: None,
        };
        Console::with_mapper(Box::new(Nrom::new(&rom))).unwrap()
    }

    #[test]
    fn test_console_creation() {
        let console = create_test_console();
        assert_eq!(console.mapper_number(), 0);
        assert_eq!(console.mapper_name(), "NROM");
    }

    #[test]
    fn test_console_step() {
        let mut console = create_test_console();
        console.reset();

        let cycles = console.step();
        assert!(cycles > 0);
        assert!(console.total_cycles() > 0);
    }

    #[test]
    fn test_console_framebuffer() {
        let console = create_test_console();
        let fb = console.framebuffer();
        assert_eq!(fb.len(), 256 * 240 * 4);
    }

    #[test]
    fn test_console_pause_resume() {
        let mut console = create_test_console();
        assert!(console.is_running());

        console.pause();
        assert!(!console.is_running());

        console.resume();
        assert!(console.is_running());
    }

    #[test]
    fn test_controller_state() {
        let mut console = create_test_console();

        let state = ControllerState {
            buttons: ControllerState::A | ControllerState::START,
        };
        console.set_controller1(state);

        assert_eq!(console.controller1().buttons, 0x09);
    }

    #[test]
    fn test_console_reset() {
        let mut console = create_test_console();

        // Run some cycles
        for _ in 0..100 {
            console.step();
        }

        let cycles_before = console.total_cycles();
        assert!(cycles_before > 0);

        console.reset();
        assert_eq!(console.total_cycles(), 0);
    }

    #[test]
    fn test_draw_pattern_tables_fills_full_buffer() {
        let console = create_test_console();
        let mut buf = vec![0u8; 256 * 128 * 4];
        console.draw_pattern_tables(&mut buf, 0);
        // All-zero CHR-RAM decodes to palette entry 0 (the backdrop) everywhere;
        // every alpha byte must still be opaque.
        assert!(buf.chunks_exact(4).all(|px| px[3] == 0xFF));
    }

    #[test]
    #[should_panic(expected = "256x128 RGBA")]
    fn test_draw_pattern_tables_rejects_wrong_buffer_size() {
        let console = create_test_console();
        let mut buf = vec![0u8; 16];
        console.draw_pattern_tables(&mut buf, 0);
    }

    #[test]
    fn test_draw_nametables_fills_full_buffer() {
        let console = create_test_console();
        let mut buf = vec![0u8; 512 * 480 * 4];
        console.draw_nametables(&mut buf);
        assert!(buf.chunks_exact(4).all(|px| px[3] == 0xFF));
    }

    #[test]
    fn test_audio_channel_receives_samples() {
        let mut console = create_test_console();
        console.reset();
        let rx = console.audio_channel();

        for _ in 0..2000 {
            console.step();
        }

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_recording_round_trip() {
        use std::io::Cursor;

        let mut console = create_test_console();
        console.reset();

        console
            .start_recording(|_name| Box::new(Cursor::new(Vec::new())))
            .unwrap();

        for _ in 0..100 {
            console.step();
        }

        console.pause_recording();
        console.resume_recording();
        console.stop_recording().unwrap();
    }
}
