///
/// Byte Buffers and Typed Array Views
///
/// An owned buffer is carried directly as `Value::Bytes`. A typed array is a
/// window (`byte_offset`, `byte_length`) onto a shared buffer; several views
/// may alias the same buffer, so the buffer sits behind an `Arc`.
///

use std::sync::Arc;

/// Element type of a typed array view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    BigInt64,
    BigUint64,
    Float32,
    Float64,
}

impl ElementKind {
    pub fn class_name(self) -> &'static str {
        match self {
            ElementKind::Int8 => "Int8Array",
            ElementKind::Uint8 => "Uint8Array",
            ElementKind::Uint8Clamped => "Uint8ClampedArray",
            ElementKind::Int16 => "Int16Array",
            ElementKind::Uint16 => "Uint16Array",
            ElementKind::Int32 => "Int32Array",
            ElementKind::Uint32 => "Uint32Array",
            ElementKind::BigInt64 => "BigInt64Array",
            ElementKind::BigUint64 => "BigUint64Array",
            ElementKind::Float32 => "Float32Array",
            ElementKind::Float64 => "Float64Array",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypedArray {
    buffer: Arc<Vec<u8>>,
    byte_offset: usize,
    byte_length: usize,
    kind: ElementKind,
}

impl TypedArray {
    pub fn new(
        buffer: Arc<Vec<u8>>,
        byte_offset: usize,
        byte_length: usize,
        kind: ElementKind,
    ) -> Self {
        Self {
            buffer,
            byte_offset,
            byte_length,
            kind,
        }
    }

    /// View covering a whole freshly allocated buffer
    pub fn from_bytes(bytes: Vec<u8>, kind: ElementKind) -> Self {
        let len = bytes.len();
        Self::new(Arc::new(bytes), 0, len, kind)
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The viewed bytes, or `None` if the window runs past the buffer
    pub fn bytes(&self) -> Option<&[u8]> {
        let end = self.byte_offset.checked_add(self.byte_length)?;
        self.buffer.get(self.byte_offset..end)
    }
}
