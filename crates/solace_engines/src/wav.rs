#![forbid(unsafe_code)]

use solace_contracts::voice::SpeechFormat;

const RIFF_HEADER_BYTES: usize = 44;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WavEncodeError {
    EmptyPcm,
    MisalignedFrames { block_align: u16, got_len: usize },
    PcmTooLarge { got_len: usize },
}

/// Wrap raw PCM frames in a RIFF/WAVE container. The declared byte counts are
/// derived from the PCM length and the requested format; callers rely on that
/// consistency when handing the payload to a player.
pub fn encode_wav(pcm: &[u8], format: &SpeechFormat) -> Result<Vec<u8>, WavEncodeError> {
    if pcm.is_empty() {
        return Err(WavEncodeError::EmptyPcm);
    }
    let block_align = format.block_align();
    if block_align == 0 || pcm.len() % usize::from(block_align) != 0 {
        return Err(WavEncodeError::MisalignedFrames {
            block_align,
            got_len: pcm.len(),
        });
    }
    let data_len = u32::try_from(pcm.len()).map_err(|_| WavEncodeError::PcmTooLarge {
        got_len: pcm.len(),
    })?;
    if data_len > u32::MAX - 36 {
        return Err(WavEncodeError::PcmTooLarge {
            got_len: pcm.len(),
        });
    }

    let mut out = Vec::with_capacity(RIFF_HEADER_BYTES + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&format.channels.0.to_le_bytes());
    out.extend_from_slice(&format.sample_rate_hz.0.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.0.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    Ok(out)
}
