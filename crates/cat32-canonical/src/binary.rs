//! Byte buffers and fixed-width element views over them.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::number::format_number;

/// Error returned when a typed view does not fit its buffer.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// The view extends past the end of the buffer.
    #[error("view of {byte_length} bytes at offset {byte_offset} exceeds buffer of {buffer_length} bytes")]
    OutOfBounds {
        /// Requested start offset.
        byte_offset: usize,
        /// Requested length in bytes.
        byte_length: usize,
        /// Length of the backing buffer.
        buffer_length: usize,
    },
    /// The start offset is not a multiple of the element width.
    #[error("offset {byte_offset} is not aligned to {width}-byte {kind} elements")]
    Misaligned {
        /// Requested start offset.
        byte_offset: usize,
        /// Element width in bytes.
        width: usize,
        /// Element kind name.
        kind: &'static str,
    },
}

#[derive(Clone)]
enum Backing {
    Local(Arc<[u8]>),
    Shared(Arc<[AtomicU8]>),
}

/// Raw bytes, either owned by one context or shared across contexts.
#[derive(Clone)]
pub struct ByteBuffer(Backing);

impl ByteBuffer {
    /// Buffer owned by a single context.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Backing::Local(Arc::from(bytes.into())))
    }

    /// Buffer whose bytes may be written concurrently from other contexts.
    pub fn shared(bytes: impl Into<Vec<u8>>) -> Self {
        let cells: Vec<AtomicU8> = bytes.into().into_iter().map(AtomicU8::new).collect();
        Self(Backing::Shared(Arc::from(cells)))
    }

    /// True for buffers created with [`ByteBuffer::shared`].
    pub fn is_shared(&self) -> bool {
        matches!(self.0, Backing::Shared(_))
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        match &self.0 {
            Backing::Local(bytes) => bytes.len(),
            Backing::Shared(cells) => cells.len(),
        }
    }

    /// True when the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a byte into a shared buffer. Returns false for local buffers
    /// and out-of-range indices.
    pub fn store(&self, index: usize, byte: u8) -> bool {
        match &self.0 {
            Backing::Shared(cells) => match cells.get(index) {
                Some(cell) => {
                    cell.store(byte, Ordering::SeqCst);
                    true
                }
                None => false,
            },
            Backing::Local(_) => false,
        }
    }

    /// Copies `len` bytes starting at `offset`.
    fn snapshot(&self, offset: usize, len: usize) -> Vec<u8> {
        match &self.0 {
            Backing::Local(bytes) => bytes[offset..offset + len].to_vec(),
            Backing::Shared(cells) => cells[offset..offset + len]
                .iter()
                .map(|cell| cell.load(Ordering::SeqCst))
                .collect(),
        }
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("shared", &self.is_shared())
            .field("len", &self.len())
            .finish()
    }
}

/// Element type of a typed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Unsigned 8-bit.
    Uint8,
    /// Unsigned 8-bit, clamped on write.
    Uint8Clamped,
    /// Signed 8-bit.
    Int8,
    /// Unsigned 16-bit.
    Uint16,
    /// Signed 16-bit.
    Int16,
    /// Unsigned 32-bit.
    Uint32,
    /// Signed 32-bit.
    Int32,
    /// IEEE-754 single precision.
    Float32,
    /// IEEE-754 double precision.
    Float64,
    /// Signed 64-bit.
    BigInt64,
    /// Unsigned 64-bit.
    BigUint64,
}

impl ElementKind {
    /// Element width in bytes.
    pub fn width(self) -> usize {
        match self {
            ElementKind::Uint8 | ElementKind::Uint8Clamped | ElementKind::Int8 => 1,
            ElementKind::Uint16 | ElementKind::Int16 => 2,
            ElementKind::Uint32 | ElementKind::Int32 | ElementKind::Float32 => 4,
            ElementKind::Float64 | ElementKind::BigInt64 | ElementKind::BigUint64 => 8,
        }
    }

    /// Conventional type name, e.g. `Uint8Array`.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Uint8 => "Uint8Array",
            ElementKind::Uint8Clamped => "Uint8ClampedArray",
            ElementKind::Int8 => "Int8Array",
            ElementKind::Uint16 => "Uint16Array",
            ElementKind::Int16 => "Int16Array",
            ElementKind::Uint32 => "Uint32Array",
            ElementKind::Int32 => "Int32Array",
            ElementKind::Float32 => "Float32Array",
            ElementKind::Float64 => "Float64Array",
            ElementKind::BigInt64 => "BigInt64Array",
            ElementKind::BigUint64 => "BigUint64Array",
        }
    }

    /// Decimal rendering of one little-endian element.
    fn render(self, chunk: &[u8]) -> String {
        let mut raw = [0u8; 8];
        raw[..chunk.len()].copy_from_slice(chunk);
        match self {
            ElementKind::Uint8 | ElementKind::Uint8Clamped => chunk[0].to_string(),
            ElementKind::Int8 => (chunk[0] as i8).to_string(),
            ElementKind::Uint16 => u16::from_le_bytes([raw[0], raw[1]]).to_string(),
            ElementKind::Int16 => i16::from_le_bytes([raw[0], raw[1]]).to_string(),
            ElementKind::Uint32 => {
                u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]).to_string()
            }
            ElementKind::Int32 => {
                i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]).to_string()
            }
            ElementKind::Float32 => {
                format_number(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64)
            }
            ElementKind::Float64 => format_number(f64::from_le_bytes(raw)),
            ElementKind::BigInt64 => i64::from_le_bytes(raw).to_string(),
            ElementKind::BigUint64 => u64::from_le_bytes(raw).to_string(),
        }
    }
}

/// A whole buffer or a typed window onto part of one.
#[derive(Debug, Clone)]
pub struct BinaryView {
    buffer: ByteBuffer,
    kind: Option<ElementKind>,
    byte_offset: usize,
    byte_length: usize,
}

impl BinaryView {
    /// View covering an entire buffer, rendered byte by byte.
    pub fn buffer(buffer: ByteBuffer) -> Self {
        let byte_length = buffer.len();
        Self {
            buffer,
            kind: None,
            byte_offset: 0,
            byte_length,
        }
    }

    /// `Uint8` view over a fresh local buffer holding `bytes`.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let buffer = ByteBuffer::new(bytes);
        let len = buffer.len();
        Self {
            buffer,
            kind: Some(ElementKind::Uint8),
            byte_offset: 0,
            byte_length: len,
        }
    }

    /// Typed view of `length` elements starting at `byte_offset`.
    pub fn typed(
        buffer: ByteBuffer,
        kind: ElementKind,
        byte_offset: usize,
        length: usize,
    ) -> Result<Self, ViewError> {
        let width = kind.width();
        if byte_offset % width != 0 {
            return Err(ViewError::Misaligned {
                byte_offset,
                width,
                kind: kind.name(),
            });
        }
        let byte_length = length.saturating_mul(width);
        let buffer_length = buffer.len();
        if byte_offset
            .checked_add(byte_length)
            .map_or(true, |end| end > buffer_length)
        {
            return Err(ViewError::OutOfBounds {
                byte_offset,
                byte_length,
                buffer_length,
            });
        }
        Ok(Self {
            buffer,
            kind: Some(kind),
            byte_offset,
            byte_length,
        })
    }

    /// Element kind, or `None` for a whole-buffer view.
    pub fn kind(&self) -> Option<ElementKind> {
        self.kind
    }

    /// Backing buffer.
    pub fn backing(&self) -> &ByteBuffer {
        &self.buffer
    }

    /// Comma-joined decimal rendering of the view's elements.
    pub fn conventional_string(&self) -> String {
        let bytes = self.buffer.snapshot(self.byte_offset, self.byte_length);
        let kind = self.kind.unwrap_or(ElementKind::Uint8);
        bytes
            .chunks(kind.width())
            .map(|chunk| kind.render(chunk))
            .collect::<Vec<_>>()
            .join(",")
    }
}
