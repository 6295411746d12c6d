// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::Endian;
use crate::error::CaptureError;
use std::io::Read;
use std::iter::FusedIterator;

// Each token leads with a u32 carrying a 4-byte-aligned pointer and the
// token type in its two low bits.
const TYPE_MASK: u32 = 0x3;
const TYPE_MALLOC: u32 = 0;
const TYPE_FREE: u32 = 1;
const TYPE_REALLOC: u32 = 2;
const TYPE_OTHER: u32 = 3;

// Subtypes of TYPE_OTHER. The payload word that follows the subtype is
// parsed and discarded.
pub const SUBTYPE_END_OF_STREAM: u32 = 0;
pub const SUBTYPE_END_OF_FILE: u32 = 1;
pub const SUBTYPE_SNAPSHOT_MARKER: u32 = 2;

/// One decoded event from the token region.
///
/// Callstack indices are kept as the raw wire value; the replay engine
/// validates them against the callstack table on use, so an ignored malloc
/// never has its index looked at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Malloc {
        pointer: u64,
        call_stack_index: i32,
        size: i64,
    },
    Free {
        pointer: u64,
    },
    Realloc {
        old_pointer: u64,
        new_pointer: u64,
        call_stack_index: i32,
        size: i64,
    },
    /// Snapshot the live state and keep replaying.
    SnapshotMarker,
    /// Data-file boundary marker. Decodable, but this build has no replay
    /// semantics for it.
    EndOfFile,
}

/// Lazy decoder over the token region: a fused iterator that ends at the
/// end-of-stream token. Reaching I/O EOF first means the capture was
/// truncated and comes out as an error. No state besides stream position,
/// so consume it exactly once, front to back.
pub struct TokenDecoder<R> {
    reader: R,
    endian: Endian,
    finished: bool,
}

impl<R: Read> TokenDecoder<R> {
    pub fn new(reader: R, endian: Endian) -> Self {
        Self {
            reader,
            endian,
            finished: false,
        }
    }

    /// Ok(None) is the end-of-stream token.
    fn read_token(&mut self) -> Result<Option<Token>, CaptureError> {
        let word = self.endian.read_u32(&mut self.reader)?;
        let pointer = u64::from(word & !TYPE_MASK);
        match word & TYPE_MASK {
            TYPE_MALLOC => {
                let call_stack_index = self.endian.read_i32(&mut self.reader)?;
                let size = i64::from(self.endian.read_u32(&mut self.reader)?);
                Ok(Some(Token::Malloc {
                    pointer,
                    call_stack_index,
                    size,
                }))
            }
            TYPE_FREE => Ok(Some(Token::Free { pointer })),
            TYPE_REALLOC => {
                let new_pointer = u64::from(self.endian.read_u32(&mut self.reader)?);
                let call_stack_index = self.endian.read_i32(&mut self.reader)?;
                let size = i64::from(self.endian.read_u32(&mut self.reader)?);
                Ok(Some(Token::Realloc {
                    old_pointer: pointer,
                    new_pointer,
                    call_stack_index,
                    size,
                }))
            }
            _ => {
                let subtype = self.endian.read_u32(&mut self.reader)?;
                let _payload = self.endian.read_u32(&mut self.reader)?;
                match subtype {
                    SUBTYPE_END_OF_STREAM => Ok(None),
                    SUBTYPE_END_OF_FILE => Ok(Some(Token::EndOfFile)),
                    SUBTYPE_SNAPSHOT_MARKER => Ok(Some(Token::SnapshotMarker)),
                    subtype => Err(CaptureError::UnknownTokenSubtype { subtype }),
                }
            }
        }
    }
}

impl<R: Read> Iterator for TokenDecoder<R> {
    type Item = Result<Token, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for TokenDecoder<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};

    fn write_u32(bytes: &mut Vec<u8>, value: u32) {
        let mut word = [0u8; 4];
        LittleEndian::write_u32(&mut word, value);
        bytes.extend_from_slice(&word);
    }

    fn end_of_stream(bytes: &mut Vec<u8>) {
        write_u32(bytes, TYPE_OTHER);
        write_u32(bytes, SUBTYPE_END_OF_STREAM);
        write_u32(bytes, 0);
    }

    fn decode_all(bytes: &[u8]) -> Vec<Token> {
        TokenDecoder::new(bytes, Endian::Little)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_malloc_free_realloc_round() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0x1000 | TYPE_MALLOC);
        write_u32(&mut bytes, 3); // callstack index
        write_u32(&mut bytes, 64); // size
        write_u32(&mut bytes, 0x1000 | TYPE_FREE);
        write_u32(&mut bytes, 0x2000 | TYPE_REALLOC);
        write_u32(&mut bytes, 0x3000); // new pointer
        write_u32(&mut bytes, 4);
        write_u32(&mut bytes, 128);
        end_of_stream(&mut bytes);

        let tokens = decode_all(&bytes);
        assert_eq!(
            vec![
                Token::Malloc {
                    pointer: 0x1000,
                    call_stack_index: 3,
                    size: 64,
                },
                Token::Free { pointer: 0x1000 },
                Token::Realloc {
                    old_pointer: 0x2000,
                    new_pointer: 0x3000,
                    call_stack_index: 4,
                    size: 128,
                },
            ],
            tokens
        );
    }

    #[test]
    fn test_control_tokens_and_fuse() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, TYPE_OTHER);
        write_u32(&mut bytes, SUBTYPE_SNAPSHOT_MARKER);
        write_u32(&mut bytes, 7); // payload, ignored
        write_u32(&mut bytes, TYPE_OTHER);
        write_u32(&mut bytes, SUBTYPE_END_OF_FILE);
        write_u32(&mut bytes, 0);
        end_of_stream(&mut bytes);
        // Bytes past end-of-stream must never be decoded.
        write_u32(&mut bytes, 0xffff_ffff);

        let mut decoder = TokenDecoder::new(bytes.as_slice(), Endian::Little);
        assert_eq!(Token::SnapshotMarker, decoder.next().unwrap().unwrap());
        assert_eq!(Token::EndOfFile, decoder.next().unwrap().unwrap());
        assert!(decoder.next().is_none());
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_unknown_subtype_is_fatal() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, TYPE_OTHER);
        write_u32(&mut bytes, 9);
        write_u32(&mut bytes, 0);

        let mut decoder = TokenDecoder::new(bytes.as_slice(), Endian::Little);
        match decoder.next() {
            Some(Err(CaptureError::UnknownTokenSubtype { subtype })) => assert_eq!(9, subtype),
            other => panic!("expected UnknownTokenSubtype, got {other:?}"),
        }
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_truncated_stream_is_fatal() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0x1000 | TYPE_MALLOC);
        write_u32(&mut bytes, 3);
        // Size word missing, then the stream just stops.

        let mut decoder = TokenDecoder::new(bytes.as_slice(), Endian::Little);
        match decoder.next() {
            Some(Err(CaptureError::Io(e))) => {
                assert_eq!(std::io::ErrorKind::UnexpectedEof, e.kind())
            }
            other => panic!("expected Io, got {other:?}"),
        }
        assert!(decoder.next().is_none());
    }
}
