use base64::Engine;

/// Maximum bytes of synthesized audio per socket frame. Narration clips are
/// split so a long answer never produces one multi-megabyte message.
pub const AUDIO_FRAME_BYTES: usize = 48 * 1024;

/// Encodes one audio fragment for transport.
pub fn encode_chunk(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decodes a transport fragment back into raw audio bytes.
pub fn decode_chunk(fragment: &str) -> Vec<u8> {
    match base64::engine::general_purpose::STANDARD.decode(fragment) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::error!("Failed to decode base64 audio fragment");
            Vec::new()
        }
    }
}

/// Splits a synthesized clip into transport-sized fragments, preserving
/// order. An empty clip yields no fragments.
pub fn frame_clip(bytes: &[u8]) -> Vec<String> {
    bytes.chunks(AUDIO_FRAME_BYTES).map(encode_chunk).collect()
}
