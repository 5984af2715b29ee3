use std::fmt;

use num_complex::Complex32;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How amplitudes are stored in texels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PixelEncoding {
    /// `Rg32Float`: real and imaginary parts as 32-bit floats.
    #[default]
    Float,
    /// `Rgba8Unorm`: each part as 16-bit fixed point over [-1, 1], split
    /// into a high and a low byte.
    Byte,
}

impl PixelEncoding {
    /// The wgpu texture format backing this encoding.
    #[must_use]
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            Self::Float => wgpu::TextureFormat::Rg32Float,
            Self::Byte => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    /// Bytes per texel.
    #[must_use]
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            Self::Float => 8,
            Self::Byte => 4,
        }
    }

    /// Append the texel bytes for `amplitude` to `out`.
    pub fn write_texel(self, amplitude: Complex32, out: &mut Vec<u8>) {
        match self {
            Self::Float => {
                out.extend_from_slice(&amplitude.re.to_le_bytes());
                out.extend_from_slice(&amplitude.im.to_le_bytes());
            }
            Self::Byte => {
                out.extend_from_slice(&encode_fixed(amplitude.re));
                out.extend_from_slice(&encode_fixed(amplitude.im));
            }
        }
    }

    /// Decode one texel. `bytes` must hold at least
    /// [`Self::bytes_per_texel`] bytes.
    #[must_use]
    pub fn read_texel(self, bytes: &[u8]) -> Complex32 {
        match self {
            Self::Float => {
                let re = f32::from_le_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3],
                ]);
                let im = f32::from_le_bytes([
                    bytes[4], bytes[5], bytes[6], bytes[7],
                ]);
                Complex32::new(re, im)
            }
            Self::Byte => Complex32::new(
                decode_fixed([bytes[0], bytes[1]]),
                decode_fixed([bytes[2], bytes[3]]),
            ),
        }
    }

    /// The value a texel actually holds after storing `amplitude`.
    #[must_use]
    pub fn quantize(self, amplitude: Complex32) -> Complex32 {
        match self {
            Self::Float => amplitude,
            Self::Byte => Complex32::new(
                decode_fixed(encode_fixed(amplitude.re)),
                decode_fixed(encode_fixed(amplitude.im)),
            ),
        }
    }
}

// Mirrors `encode_amplitude` in assets/shaders/modules/amplitude.wgsl.
fn encode_fixed(x: f32) -> [u8; 2] {
    let fixed = (((x + 1.0) * 0.5).clamp(0.0, 1.0) * 65535.0).round_ties_even();
    (fixed as u16).to_be_bytes()
}

fn decode_fixed(bytes: [u8; 2]) -> f32 {
    f32::from(u16::from_be_bytes(bytes)) / 65535.0 * 2.0 - 1.0
}

/// Width, height and encoding of an amplitude texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureShape {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel encoding.
    pub encoding: PixelEncoding,
}

impl TextureShape {
    /// Shape with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32, encoding: PixelEncoding) -> Self {
        Self {
            width,
            height,
            encoding,
        }
    }

    /// The shape holding `2^qubits` amplitudes: width `2^ceil(n/2)`, height
    /// `2^floor(n/2)`. Amplitude `i` lives at `(i % width, i / width)`.
    ///
    /// `None` when an edge would not fit in a `u32`.
    #[must_use]
    pub const fn for_qubits(qubits: u32, encoding: PixelEncoding) -> Option<Self> {
        match (
            1u32.checked_shl(qubits.div_ceil(2)),
            1u32.checked_shl(qubits / 2),
        ) {
            (Some(width), Some(height)) => Some(Self {
                width,
                height,
                encoding,
            }),
            _ => None,
        }
    }

    /// Number of texels.
    #[must_use]
    pub const fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of qubits whose amplitudes fill this shape exactly.
    #[must_use]
    pub const fn qubit_count(&self) -> u32 {
        self.texel_count().trailing_zeros()
    }
}

impl fmt::Display for TextureShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {:?}", self.width, self.height, self.encoding)
    }
}

/// Logical identity of a cached texture: its shape plus a slot number that
/// distinguishes textures of the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey {
    /// Texture shape.
    pub shape: TextureShape,
    /// Slot within that shape.
    pub slot: u32,
}

/// A materialized texture. Handles are never reused: reinitializing a slot
/// after context loss produces a new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub(crate) key: TextureKey,
    pub(crate) serial: u64,
}

impl TextureHandle {
    /// The logical texture this handle materializes.
    #[must_use]
    pub fn key(&self) -> TextureKey {
        self.key
    }

    /// The handle's texture shape.
    #[must_use]
    pub fn shape(&self) -> TextureShape {
        self.key.shape
    }
}

/// Residency of a cached slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Never materialized, or released.
    Uninitialized,
    /// Backed by a live texture on the current context.
    Bound,
    /// Its context was lost; the next acquire reinitializes it.
    Lost,
}
