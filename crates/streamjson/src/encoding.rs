//! Multi-encoding byte decoder and BOM/heuristic autodetector.
//!
//! [`ByteDecoder`] is a pure per-byte state machine: feed it one byte and the
//! declared [`Encoding`], get back a [`DecodeResult`]. It holds at most a
//! handful of bytes of partial-sequence state.
//! [`Autodetector`] buffers the first up to four bytes when the input
//! encoding is unknown and resolves them against the RFC 4627 BOM/zero-byte
//! heuristic table.

/// The closed set of encodings this parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Not yet determined; only valid before parsing starts.
    #[default]
    Unknown,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl Encoding {
    /// Minimum byte length of one scalar's encoded sequence. `Unknown` has
    /// none.
    #[must_use]
    pub fn min_sequence_len(self) -> Option<u8> {
        match self {
            Encoding::Unknown => None,
            Encoding::Utf8 => Some(1),
            Encoding::Utf16Le | Encoding::Utf16Be => Some(2),
            Encoding::Utf32Le | Encoding::Utf32Be => Some(4),
        }
    }
}

/// Outcome of feeding one byte to [`ByteDecoder::decode_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeResult {
    /// The byte was consumed; no scalar is ready yet.
    Pending,
    /// A valid scalar was produced. `sequence_length` is the total byte
    /// count of that scalar's encoding.
    Complete { scalar: char, sequence_length: u8 },
    /// The current byte is part of the invalid sequence; `sequence_length`
    /// counts how many bytes (including this one) are bad.
    InvalidInclusive { sequence_length: u8 },
    /// The current byte is *not* part of the invalid sequence: it is the
    /// first byte of a fresh attempt and must be reprocessed. The decoder's
    /// state has already been reset.
    InvalidExclusive { sequence_length: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Reset,
    Processed1of2,
    Processed1of3,
    Processed2of3,
    Processed1of4,
    Processed2of4,
    Processed3of4,
}

/// Per-instance UTF-8 lead-byte class, remembered across the continuation
/// bytes of a multi-byte sequence so overlong/out-of-range checks on the
/// *second* byte can be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Utf8Lead {
    None,
    /// C2..DF: plain two-byte lead, any continuation is fine.
    Plain2,
    /// E0: first continuation must be A0..BF (rules out overlong).
    E0,
    /// ED: first continuation must be 80..9F (rules out surrogates).
    Ed,
    /// E1..EC, EE, EF: any 80..BF continuation.
    Plain3,
    /// F0: first continuation must be 90..BF (rules out overlong).
    F0,
    /// F4: first continuation must be 80..8F (rules out > U+10FFFF).
    F4,
    /// F1..F3: any 80..BF continuation.
    Plain4,
}

/// A small per-byte state machine producing Unicode scalar values from one
/// of five encodings. Independent instances never share state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteDecoder {
    state: DecoderState,
    bits: u32,
    lead: Utf8Lead,
    /// UTF-16 little-endian unpaired-surrogate edge case: the decoder must
    /// discover the second code unit is not a trailing surrogate only after
    /// reading *both* of its bytes (the high byte, which decides surrogate
    /// range, arrives second in LE order). When that happens we have one
    /// byte left over that the caller still needs to reprocess; we stash it
    /// here rather than break the one-byte-in/one-result-out contract.
    replay: Option<u8>,
    /// UTF-16: the completed high surrogate, held while we wait for the
    /// trailing surrogate's two bytes.
    high_surrogate: u32,
}

impl Default for ByteDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteDecoder {
    pub(crate) fn new() -> Self {
        Self {
            state: DecoderState::Reset,
            bits: 0,
            lead: Utf8Lead::None,
            replay: None,
            high_surrogate: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Takes a byte previously stashed for mandatory replay, if any.
    pub(crate) fn take_replay(&mut self) -> Option<u8> {
        self.replay.take()
    }

    pub(crate) fn decode_byte(&mut self, encoding: Encoding, byte: u8) -> DecodeResult {
        match encoding {
            Encoding::Utf8 => self.decode_utf8(byte),
            Encoding::Utf16Le => self.decode_utf16(byte, true),
            Encoding::Utf16Be => self.decode_utf16(byte, false),
            Encoding::Utf32Le => self.decode_utf32(byte, true),
            Encoding::Utf32Be => self.decode_utf32(byte, false),
            Encoding::Unknown => unreachable!("decode_byte called before encoding was resolved"),
        }
    }

    fn decode_utf8(&mut self, byte: u8) -> DecodeResult {
        match self.state {
            DecoderState::Reset => match byte {
                0x00..=0x7F => DecodeResult::Complete {
                    scalar: byte as char,
                    sequence_length: 1,
                },
                0xC0 | 0xC1 => DecodeResult::InvalidInclusive { sequence_length: 1 },
                0xC2..=0xDF => {
                    self.bits = u32::from(byte & 0x1F);
                    self.lead = Utf8Lead::Plain2;
                    self.state = DecoderState::Processed1of2;
                    DecodeResult::Pending
                }
                0xE0 => self.start_three_byte(byte, Utf8Lead::E0),
                0xED => self.start_three_byte(byte, Utf8Lead::Ed),
                0xE1..=0xEC | 0xEE | 0xEF => self.start_three_byte(byte, Utf8Lead::Plain3),
                0xF0 => self.start_four_byte(byte, Utf8Lead::F0),
                0xF4 => self.start_four_byte(byte, Utf8Lead::F4),
                0xF1..=0xF3 => self.start_four_byte(byte, Utf8Lead::Plain4),
                // F5..FF and stray continuation bytes (80..BF).
                _ => DecodeResult::InvalidInclusive { sequence_length: 1 },
            },
            DecoderState::Processed1of2 => self.finish_continuation(byte, 1),
            DecoderState::Processed1of3 => {
                if self.continuation_in_range(byte) {
                    self.bits = (self.bits << 6) | u32::from(byte & 0x3F);
                    self.state = DecoderState::Processed2of3;
                    DecodeResult::Pending
                } else {
                    self.reset();
                    DecodeResult::InvalidExclusive { sequence_length: 1 }
                }
            }
            DecoderState::Processed2of3 => self.finish_continuation(byte, 2),
            DecoderState::Processed1of4 => {
                if self.continuation_in_range(byte) {
                    self.bits = (self.bits << 6) | u32::from(byte & 0x3F);
                    self.state = DecoderState::Processed2of4;
                    DecodeResult::Pending
                } else {
                    self.reset();
                    DecodeResult::InvalidExclusive { sequence_length: 1 }
                }
            }
            DecoderState::Processed2of4 => {
                if (0x80..=0xBF).contains(&byte) {
                    self.bits = (self.bits << 6) | u32::from(byte & 0x3F);
                    self.state = DecoderState::Processed3of4;
                    DecodeResult::Pending
                } else {
                    self.reset();
                    DecodeResult::InvalidExclusive { sequence_length: 2 }
                }
            }
            DecoderState::Processed3of4 => self.finish_continuation(byte, 3),
        }
    }

    fn start_three_byte(&mut self, byte: u8, lead: Utf8Lead) -> DecodeResult {
        self.bits = u32::from(byte & 0x0F);
        self.lead = lead;
        self.state = DecoderState::Processed1of3;
        DecodeResult::Pending
    }

    fn start_four_byte(&mut self, byte: u8, lead: Utf8Lead) -> DecodeResult {
        self.bits = u32::from(byte & 0x07);
        self.lead = lead;
        self.state = DecoderState::Processed1of4;
        DecodeResult::Pending
    }

    /// Range check applied to the *first* continuation byte of a 3- or
    /// 4-byte sequence, which narrows per the remembered lead class.
    fn continuation_in_range(&self, byte: u8) -> bool {
        match self.lead {
            Utf8Lead::E0 => (0xA0..=0xBF).contains(&byte),
            Utf8Lead::Ed => (0x80..=0x9F).contains(&byte),
            Utf8Lead::F0 => (0x90..=0xBF).contains(&byte),
            Utf8Lead::F4 => (0x80..=0x8F).contains(&byte),
            _ => (0x80..=0xBF).contains(&byte),
        }
    }

    /// Consumes a plain (unconstrained-range) final continuation byte,
    /// completing the scalar.
    fn finish_continuation(&mut self, byte: u8, consumed_so_far: u8) -> DecodeResult {
        if !(0x80..=0xBF).contains(&byte) {
            self.reset();
            return DecodeResult::InvalidExclusive {
                sequence_length: consumed_so_far,
            };
        }
        let value = (self.bits << 6) | u32::from(byte & 0x3F);
        let sequence_length = consumed_so_far + 1;
        self.reset();
        match char::from_u32(value) {
            Some(scalar) => DecodeResult::Complete {
                scalar,
                sequence_length,
            },
            None => DecodeResult::InvalidInclusive { sequence_length },
        }
    }

    fn decode_utf16(&mut self, byte: u8, little_endian: bool) -> DecodeResult {
        match self.state {
            DecoderState::Reset => {
                self.bits = u32::from(byte);
                self.state = DecoderState::Processed1of2;
                DecodeResult::Pending
            }
            DecoderState::Processed1of2 => {
                let unit = Self::combine_unit(self.bits, byte, little_endian);
                self.finish_utf16_unit(unit)
            }
            // A high surrogate is complete (`self.high_surrogate` holds it);
            // now reading the first byte of the trailing code unit.
            DecoderState::Processed1of4 => {
                self.bits = u32::from(byte);
                self.state = DecoderState::Processed2of4;
                DecodeResult::Pending
            }
            DecoderState::Processed2of4 => {
                let first_byte_of_second_unit = self.bits as u8;
                let unit = Self::combine_unit(self.bits, byte, little_endian);
                if (0xDC00..=0xDFFF).contains(&unit) {
                    let high = self.high_surrogate;
                    let scalar_value = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                    self.reset();
                    match char::from_u32(scalar_value) {
                        Some(scalar) => DecodeResult::Complete {
                            scalar,
                            sequence_length: 4,
                        },
                        None => DecodeResult::InvalidInclusive { sequence_length: 4 },
                    }
                } else {
                    // Not a trailing surrogate: the lone leading surrogate
                    // (2 bytes) is invalid. We only learn this once both
                    // bytes of the second unit are read, so the first of
                    // those two bytes must be replayed as a fresh attempt.
                    self.reset();
                    self.replay = Some(first_byte_of_second_unit);
                    DecodeResult::InvalidExclusive { sequence_length: 2 }
                }
            }
            DecoderState::Processed1of3 | DecoderState::Processed2of3 | DecoderState::Processed3of4 => {
                unreachable!("utf16 decoder never enters 3-byte states")
            }
        }
    }

    /// Combines a stored first byte with an arriving second byte into a
    /// 16-bit code unit, honoring endianness.
    fn combine_unit(first: u32, second: u8, little_endian: bool) -> u32 {
        if little_endian {
            (u32::from(second) << 8) | first
        } else {
            (first << 8) | u32::from(second)
        }
    }

    fn finish_utf16_unit(&mut self, unit: u32) -> DecodeResult {
        match unit {
            0xD800..=0xDBFF => {
                // Leading surrogate: reserve 2 more bytes for the trailing one.
                self.high_surrogate = unit;
                self.bits = 0;
                self.state = DecoderState::Processed1of4;
                DecodeResult::Pending
            }
            0xDC00..=0xDFFF => {
                // Lone trailing surrogate: invalid over both of its bytes.
                self.reset();
                DecodeResult::InvalidInclusive { sequence_length: 2 }
            }
            _ => {
                self.reset();
                match char::from_u32(unit) {
                    Some(scalar) => DecodeResult::Complete {
                        scalar,
                        sequence_length: 2,
                    },
                    None => DecodeResult::InvalidInclusive { sequence_length: 2 },
                }
            }
        }
    }

    fn decode_utf32(&mut self, byte: u8, little_endian: bool) -> DecodeResult {
        let shift = match self.state {
            DecoderState::Reset => 0,
            DecoderState::Processed1of4 => 1,
            DecoderState::Processed2of4 => 2,
            DecoderState::Processed3of4 => 3,
            _ => unreachable!("utf32 decoder never enters 2-/3-byte states"),
        };
        let byte_shift = if little_endian { shift * 8 } else { (3 - shift) * 8 };
        self.bits |= u32::from(byte) << byte_shift;

        if shift < 3 {
            self.state = match shift {
                0 => DecoderState::Processed1of4,
                1 => DecoderState::Processed2of4,
                _ => DecoderState::Processed3of4,
            };
            DecodeResult::Pending
        } else {
            let value = self.bits;
            self.reset();
            if value > 0x10FFFF || (0xD800..=0xDFFF).contains(&value) {
                DecodeResult::InvalidInclusive { sequence_length: 4 }
            } else {
                match char::from_u32(value) {
                    Some(scalar) => DecodeResult::Complete {
                        scalar,
                        sequence_length: 4,
                    },
                    None => DecodeResult::InvalidInclusive { sequence_length: 4 },
                }
            }
        }
    }
}

/// Buffers the first up to four input bytes while the encoding is unknown
/// and resolves them against the BOM/zero-byte heuristic table.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Autodetector {
    buf: [u8; 4],
    len: u8,
}

/// What the autodetector decided, plus how many of the leading buffered
/// bytes are the BOM itself (to be discarded rather than replayed as data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Detected {
    pub encoding: Encoding,
    pub bom_len: u8,
}

impl Autodetector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte. Returns `Some` once resolution is possible (the 4th
    /// byte arrived), `None` if more bytes are needed.
    pub(crate) fn push(&mut self, byte: u8) -> Option<Result<Detected, ()>> {
        self.buf[self.len as usize] = byte;
        self.len += 1;
        if self.len == 4 {
            Some(Self::resolve(&self.buf))
        } else {
            None
        }
    }

    /// Resolves from a short (1..=3 byte) tail at end-of-input.
    pub(crate) fn finish(&self) -> Result<Detected, ()> {
        match self.len {
            0 => Ok(Detected {
                encoding: Encoding::Utf8,
                bom_len: 0,
            }),
            1 | 3 => Ok(Detected {
                encoding: Encoding::Utf8,
                bom_len: 0,
            }),
            2 => {
                let [a, b, ..] = self.buf;
                match (a, b) {
                    (0xFF, 0xFE) => Ok(Detected {
                        encoding: Encoding::Utf16Le,
                        bom_len: 2,
                    }),
                    (0xFE, 0xFF) => Ok(Detected {
                        encoding: Encoding::Utf16Be,
                        bom_len: 2,
                    }),
                    (nz_a, 0x00) if nz_a != 0 => Ok(Detected {
                        encoding: Encoding::Utf16Le,
                        bom_len: 0,
                    }),
                    (0x00, nz_b) if nz_b != 0 => Ok(Detected {
                        encoding: Encoding::Utf16Be,
                        bom_len: 0,
                    }),
                    (nz_a, nz_b) if nz_a != 0 && nz_b != 0 => Ok(Detected {
                        encoding: Encoding::Utf8,
                        bom_len: 0,
                    }),
                    _ => Err(()),
                }
            }
            _ => unreachable!("buffered more than 3 bytes without resolving via push()"),
        }
    }

    pub(crate) fn buffered(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    fn resolve(buf: &[u8; 4]) -> Result<Detected, ()> {
        match buf {
            [0xEF, 0xBB, 0xBF, _] => Ok(Detected {
                encoding: Encoding::Utf8,
                bom_len: 3,
            }),
            [0xFF, 0xFE, 0x00, 0x00] => Ok(Detected {
                encoding: Encoding::Utf32Le,
                bom_len: 4,
            }),
            [0xFF, 0xFE, nz, 0x00] if *nz != 0 => Ok(Detected {
                encoding: Encoding::Utf16Le,
                bom_len: 2,
            }),
            [0x00, 0x00, 0xFE, 0xFF] => Ok(Detected {
                encoding: Encoding::Utf32Be,
                bom_len: 4,
            }),
            [0xFE, 0xFF, ..] => Ok(Detected {
                encoding: Encoding::Utf16Be,
                bom_len: 2,
            }),
            [nz_a, nz_b, ..] if *nz_a != 0 && *nz_b != 0 => Ok(Detected {
                encoding: Encoding::Utf8,
                bom_len: 0,
            }),
            [nz, 0x00, nz2, _] if *nz != 0 && *nz2 != 0 => Ok(Detected {
                encoding: Encoding::Utf16Le,
                bom_len: 0,
            }),
            [nz, 0x00, 0x00, 0x00] if *nz != 0 => Ok(Detected {
                encoding: Encoding::Utf32Le,
                bom_len: 0,
            }),
            [0x00, nz, ..] if *nz != 0 => Ok(Detected {
                encoding: Encoding::Utf16Be,
                bom_len: 0,
            }),
            [0x00, 0x00, 0x00, nz] if *nz != 0 => Ok(Detected {
                encoding: Encoding::Utf32Be,
                bom_len: 0,
            }),
            _ => Err(()),
        }
    }
}
