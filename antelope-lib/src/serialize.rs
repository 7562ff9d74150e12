//! Binary encoding used by the chain for transactions and action payloads.
//!
//! Integers are little-endian, lengths and counts are LEB128 `varuint32`.

use crate::name::Name;

#[derive(Default, Debug)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_varuint32(&mut self, mut v: u32) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_varuint32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_name(&mut self, name: &Name) {
        self.write_u64(name.as_u64());
    }

    pub fn write_vec<T: Pack>(&mut self, items: &[T]) {
        self.write_varuint32(items.len() as u32);
        for item in items {
            item.pack(self);
        }
    }
}

pub trait Pack {
    fn pack(&self, writer: &mut Writer);

    fn packed(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.pack(&mut writer);
        writer.into_bytes()
    }
}

impl Pack for Name {
    fn pack(&self, writer: &mut Writer) {
        writer.write_name(self);
    }
}
