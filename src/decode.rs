//! Decoding of audio byte blobs into playable buffers.
//!
//! Anything symphonia can probe is accepted (MP3, WAV, OGG/Vorbis,
//! FLAC, ...). Decoding happens entirely on the control path; the render
//! path only ever sees the finished `AudioClip`.
//!
//! Multichannel input is downmixed to mono by averaging, since a source
//! occupies a single point on the room plane.

use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::error::DecodeError;

/// A decoded, mono, ready-to-loop buffer.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode a blob into a mono clip.
pub fn decode_blob(bytes: &[u8]) -> Result<AudioClip, DecodeError> {
    let stream = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        Default::default(),
    );

    let probed = get_probe()
        .format(
            &Hint::new(),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| {
            warn!("audio probe failed: {err}");
            DecodeError::UnsupportedFormat
        })?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or(DecodeError::UnsupportedFormat)?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnsupportedFormat)?;
    let channels = track
        .codec_params
        .channels
        .ok_or(DecodeError::UnsupportedFormat)?
        .count()
        .max(1);

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|_| DecodeError::UnsupportedFormat)?;

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream surfaces as an IO error in symphonia.
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(err) => return Err(DecodeError::DecodeFailure(err.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is recoverable; skip it and keep going.
            Err(SymphoniaError::DecodeError(err)) => {
                debug!("skipping corrupt packet: {err}");
                continue;
            }
            Err(err) => return Err(DecodeError::DecodeFailure(err.to_string())),
        };

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks(channels) {
            let sum: f32 = frame.iter().copied().sum();
            samples.push(sum / channels as f32);
        }
    }

    if samples.is_empty() {
        return Err(DecodeError::DecodeFailure(
            "no audio frames in payload".into(),
        ));
    }

    debug!(
        "decoded {} frames at {} Hz ({} channel{})",
        samples.len(),
        sample_rate,
        channels,
        if channels == 1 { "" } else { "s" }
    );

    Ok(AudioClip {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit PCM WAV writer for fixtures.
    pub(crate) fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let byte_rate = sample_rate * channels as u32 * 2;
        let block_align = channels * 2;

        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&byte_rate.to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn decodes_mono_wav() {
        let samples: Vec<i16> = (0..4_410).map(|i| ((i % 100) * 300) as i16).collect();
        let bytes = wav_bytes(&samples, 44_100, 1);

        let clip = decode_blob(&bytes).expect("valid WAV should decode");
        assert_eq!(clip.sample_rate, 44_100);
        assert_eq!(clip.samples.len(), 4_410);
        assert!((clip.duration_seconds() - 0.1).abs() < 1e-3);
    }

    #[test]
    fn downmixes_stereo_to_mono_by_averaging() {
        // Left = +16384, right = -16384: the average is zero.
        let mut samples = Vec::new();
        for _ in 0..1_000 {
            samples.push(16_384i16);
            samples.push(-16_384i16);
        }
        let bytes = wav_bytes(&samples, 48_000, 2);

        let clip = decode_blob(&bytes).expect("stereo WAV should decode");
        assert_eq!(clip.samples.len(), 1_000);
        assert!(clip.samples.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn sample_values_are_normalized() {
        let samples = vec![i16::MAX; 256];
        let bytes = wav_bytes(&samples, 22_050, 1);

        let clip = decode_blob(&bytes).unwrap();
        assert!(clip.samples.iter().all(|s| (*s - 1.0).abs() < 1e-3));
    }

    #[test]
    fn garbage_is_rejected_not_panicked() {
        let garbage = vec![0xA5u8; 512];
        match decode_blob(&garbage) {
            Err(DecodeError::UnsupportedFormat) | Err(DecodeError::DecodeFailure(_)) => {}
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(decode_blob(&[]).is_err());
    }

    #[test]
    fn truncated_wav_still_fails_cleanly() {
        let samples: Vec<i16> = (0..1_000).map(|i| i as i16).collect();
        let mut bytes = wav_bytes(&samples, 44_100, 1);
        bytes.truncate(50); // header survives, data is gone

        // Either error or an empty-frame failure is fine; no panic.
        let _ = decode_blob(&bytes);
    }
}
