//! Shared utility modules used across the codecs.

pub mod varint;
