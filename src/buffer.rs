//! Bounds-checked big-endian field access at fixed offsets
//!
//! Binary tables are read sequentially with [`bytes::Buf`] where possible. These helpers cover
//! the remaining cases where a single field at a known offset has to be read or patched in place.
//! Every accessor returns [`WoffError::UnexpectedEof`] rather than panicking when the field does
//! not fit inside the slice.

use bytes::{Buf, BufMut};

use crate::error::WoffError;

#[inline]
fn window(data: &[u8], offset: usize, len: usize) -> Result<&[u8], WoffError> {
    let end = offset.checked_add(len).ok_or(WoffError::UnexpectedEof)?;
    data.get(offset..end).ok_or(WoffError::UnexpectedEof)
}

#[inline]
fn window_mut(data: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8], WoffError> {
    let end = offset.checked_add(len).ok_or(WoffError::UnexpectedEof)?;
    data.get_mut(offset..end).ok_or(WoffError::UnexpectedEof)
}

#[inline]
pub fn read_u8_at(data: &[u8], offset: usize) -> Result<u8, WoffError> {
    data.get(offset).copied().ok_or(WoffError::UnexpectedEof)
}

#[inline]
pub fn read_u16_at(data: &[u8], offset: usize) -> Result<u16, WoffError> {
    Ok(window(data, offset, 2)?.try_get_u16()?)
}

#[inline]
pub fn read_i16_at(data: &[u8], offset: usize) -> Result<i16, WoffError> {
    Ok(window(data, offset, 2)?.try_get_i16()?)
}

#[inline]
pub fn read_u32_at(data: &[u8], offset: usize) -> Result<u32, WoffError> {
    Ok(window(data, offset, 4)?.try_get_u32()?)
}

#[inline]
pub fn write_u8_at(data: &mut [u8], offset: usize, value: u8) -> Result<(), WoffError> {
    let byte = data.get_mut(offset).ok_or(WoffError::UnexpectedEof)?;
    *byte = value;
    Ok(())
}

#[inline]
pub fn write_u16_at(data: &mut [u8], offset: usize, value: u16) -> Result<(), WoffError> {
    window_mut(data, offset, 2)?.put_u16(value);
    Ok(())
}

#[inline]
pub fn write_i16_at(data: &mut [u8], offset: usize, value: i16) -> Result<(), WoffError> {
    window_mut(data, offset, 2)?.put_i16(value);
    Ok(())
}

#[inline]
pub fn write_u32_at(data: &mut [u8], offset: usize, value: u32) -> Result<(), WoffError> {
    window_mut(data, offset, 4)?.put_u32(value);
    Ok(())
}
