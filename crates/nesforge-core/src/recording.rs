//! WAV recording of APU output channels.
//!
//! `Console::start_recording` hands one sink per recordable channel (see
//! [`nesforge_apu::RecordingChannel`]) to a caller-supplied factory, wraps
//! each in a 32-bit IEEE-float mono WAV encoder, and from then on every
//! mixed sample is written to all six streams until the recording is
//! stopped.

use std::io::{self, Seek, SeekFrom, Write};

use nesforge_apu::{ChannelSamples, RecordingChannel};

/// A byte sink a recording encoder can write to. Any `Write + Seek` works —
/// a `File`, an in-memory `Cursor<Vec<u8>>`, and so on — since the encoder
/// seeks back to patch the RIFF header's size fields once recording stops.
pub trait SampleSink: Write + Seek {}
impl<T: Write + Seek> SampleSink for T {}

/// Minimal 32-bit IEEE-float, mono WAV encoder.
struct WavEncoder {
    writer: Box<dyn SampleSink>,
    sample_rate: u32,
    samples_written: u32,
}

impl WavEncoder {
    fn new(mut writer: Box<dyn SampleSink>, sample_rate: u32) -> io::Result<Self> {
        Self::write_header(&mut writer, sample_rate, 0)?;
        Ok(Self {
            writer,
            sample_rate,
            samples_written: 0,
        })
    }

    /// Writes (or rewrites, on finalize) the 44-byte RIFF/WAVE header.
    fn write_header(w: &mut dyn SampleSink, sample_rate: u32, data_len: u32) -> io::Result<()> {
        const BITS_PER_SAMPLE: u16 = 32;
        const CHANNELS: u16 = 1;
        const FMT_CHUNK_SIZE: u32 = 16;
        const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

        let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
        let byte_rate = sample_rate * u32::from(block_align);
        let riff_size = 4 + (8 + FMT_CHUNK_SIZE) + (8 + data_len);

        w.seek(SeekFrom::Start(0))?;
        w.write_all(b"RIFF")?;
        w.write_all(&riff_size.to_le_bytes())?;
        w.write_all(b"WAVE")?;
        w.write_all(b"fmt ")?;
        w.write_all(&FMT_CHUNK_SIZE.to_le_bytes())?;
        w.write_all(&WAVE_FORMAT_IEEE_FLOAT.to_le_bytes())?;
        w.write_all(&CHANNELS.to_le_bytes())?;
        w.write_all(&sample_rate.to_le_bytes())?;
        w.write_all(&byte_rate.to_le_bytes())?;
        w.write_all(&block_align.to_le_bytes())?;
        w.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;
        w.write_all(b"data")?;
        w.write_all(&data_len.to_le_bytes())?;
        Ok(())
    }

    fn write_sample(&mut self, sample: f32) -> io::Result<()> {
        self.writer.write_all(&sample.to_le_bytes())?;
        self.samples_written += 1;
        Ok(())
    }

    /// Patches the header with the final sizes and flushes.
    fn finalize(mut self) -> io::Result<()> {
        let data_len = self.samples_written * 4;
        Self::write_header(&mut self.writer, self.sample_rate, data_len)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()
    }
}

/// An in-progress recording: one WAV encoder per channel in
/// [`RecordingChannel::ALL`] order, plus a pause flag.
pub struct RecordingSession {
    encoders: [WavEncoder; 6],
    paused: bool,
}

impl RecordingSession {
    /// Starts a new session, calling `sink_factory` once per channel (in
    /// `pulse_0, pulse_1, triangle, noise, dmc, mix` order) to obtain each
    /// channel's backing sink.
    pub fn start<F>(sample_rate: u32, mut sink_factory: F) -> io::Result<Self>
    where
        F: FnMut(&'static str) -> Box<dyn SampleSink>,
    {
        let mut encoders = Vec::with_capacity(6);
        for channel in RecordingChannel::ALL {
            let sink = sink_factory(channel.name());
            encoders.push(WavEncoder::new(sink, sample_rate)?);
        }
        let encoders: [WavEncoder; 6] = encoders
            .try_into()
            .unwrap_or_else(|_| unreachable!("RecordingChannel::ALL has exactly 6 entries"));
        Ok(Self {
            encoders,
            paused: false,
        })
    }

    /// Suspends writes without closing the underlying sinks.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes writes after a pause.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Writes one sample to each channel's encoder, unless paused.
    ///
    /// On the first write failure, the remaining encoders are still written
    /// best-effort (see the crate's error-aggregation policy); the first
    /// error encountered is returned.
    pub fn write_samples(&mut self, samples: ChannelSamples) -> io::Result<()> {
        if self.paused {
            return Ok(());
        }
        let mut first_err = None;
        for (channel, encoder) in RecordingChannel::ALL.iter().zip(self.encoders.iter_mut()) {
            if let Err(e) = encoder.write_sample(samples.get(*channel)) {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Finalizes every encoder, collecting the first error and continuing
    /// the rest best-effort.
    pub fn finish(self) -> io::Result<()> {
        let mut first_err = None;
        for encoder in self.encoders {
            if let Err(e) = encoder.finalize() {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_session(rate: u32) -> RecordingSession {
        RecordingSession::start(rate, |_name| Box::new(Cursor::new(Vec::new()))).unwrap()
    }

    #[test]
    fn start_creates_six_encoders() {
        let session = make_session(48_000);
        assert_eq!(session.encoders.len(), 6);
    }

    #[test]
    fn pause_suppresses_writes() {
        let mut session = make_session(48_000);
        session.pause();
        session
            .write_samples(ChannelSamples {
                mix: 0.5,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.encoders[5].samples_written, 0);
    }

    #[test]
    fn write_then_finish_succeeds() {
        let mut session = make_session(48_000);
        for _ in 0..10 {
            session.write_samples(ChannelSamples::default()).unwrap();
        }
        session.finish().unwrap();
    }
}
