// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Code stream with operand backpatching and hex/bin output helpers.

use std::collections::BTreeSet;
use std::io::{self, Write};

use crate::core::encoder::{ByteOrder, OPERAND_WIDTH};
use crate::core::error::FlowErrorKind;

/// Bytes written for an operand whose target is not known yet.
pub const OPERAND_PLACEHOLDER: [u8; 2] = [0xFF, 0xFF];

const ADDRESS_LIMIT: u32 = 0x1_0000;

/// Append-only byte image starting at `origin`.
///
/// Bytes are appended via `emit`/`reserve_operand` and a reserved operand is
/// later overwritten in place, exactly once, by `patch_operand`. The finished
/// image is emitted as Intel HEX or raw binary.
#[derive(Debug, Clone)]
pub struct CodeStream {
    origin: u16,
    byte_order: ByteOrder,
    bytes: Vec<u8>,
    reserved: BTreeSet<u16>,
    patches: usize,
}

impl CodeStream {
    pub fn new(origin: u16, byte_order: ByteOrder) -> Self {
        Self {
            origin,
            byte_order,
            bytes: Vec::new(),
            reserved: BTreeSet::new(),
            patches: 0,
        }
    }

    pub fn origin(&self) -> u16 {
        self.origin
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Current cursor address. Wraps to $0000 once the image ends at $FFFF;
    /// use [`next_address`](Self::next_address) for anything emitted.
    pub fn here(&self) -> u16 {
        self.cursor() as u16
    }

    /// Cursor as a 17-bit value; `0x1_0000` means the address space is full.
    pub fn cursor(&self) -> u32 {
        u32::from(self.origin) + self.bytes.len() as u32
    }

    /// Address the next byte would occupy.
    pub fn next_address(&self) -> Result<u16, FlowErrorKind> {
        let cursor = self.cursor();
        u16::try_from(cursor).map_err(|_| FlowErrorKind::AddressOverflow { address: cursor })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Append `values` and return the address of the first byte.
    pub fn emit(&mut self, values: &[u8]) -> Result<u16, FlowErrorKind> {
        let start = self.here();
        let end = self.cursor() + values.len() as u32;
        if end > ADDRESS_LIMIT {
            return Err(FlowErrorKind::AddressOverflow { address: end });
        }
        self.bytes.extend_from_slice(values);
        tracing::trace!(address = start, len = values.len(), "emit");
        Ok(start)
    }

    /// Append a placeholder operand and record it as awaiting a patch.
    pub fn reserve_operand(&mut self) -> Result<u16, FlowErrorKind> {
        let operand = self.emit(&OPERAND_PLACEHOLDER)?;
        self.reserved.insert(operand);
        tracing::debug!(operand, "reserve operand");
        Ok(operand)
    }

    /// Overwrite a reserved operand with `value`. The cursor does not move.
    pub fn patch_operand(&mut self, operand: u16, value: u16) -> Result<(), FlowErrorKind> {
        let here = self.cursor();
        let end = u32::from(operand) + u32::from(OPERAND_WIDTH);
        if operand < self.origin || end > here {
            return Err(FlowErrorKind::PatchBeyondCursor {
                address: operand,
                here,
            });
        }
        if !self.reserved.remove(&operand) {
            return Err(FlowErrorKind::InvalidPatch { address: operand });
        }
        let idx = usize::from(operand - self.origin);
        let word = self.byte_order.word_bytes(value);
        self.bytes[idx..idx + word.len()].copy_from_slice(&word);
        self.patches += 1;
        tracing::debug!(operand, target = value, "patch operand");
        Ok(())
    }

    /// Reserved operands not patched yet, in address order.
    pub fn unresolved(&self) -> impl Iterator<Item = u16> + '_ {
        self.reserved.iter().copied()
    }

    pub fn unresolved_count(&self) -> usize {
        self.reserved.len()
    }

    /// Number of patches applied so far.
    pub fn patch_count(&self) -> usize {
        self.patches
    }

    /// Read the 16-bit operand stored at `operand`.
    pub fn operand_at(&self, operand: u16) -> Option<u16> {
        let idx = usize::from(operand.checked_sub(self.origin)?);
        let pair = self.bytes.get(idx..idx + 2)?;
        Some(match self.byte_order {
            ByteOrder::Little => u16::from_le_bytes([pair[0], pair[1]]),
            ByteOrder::Big => u16::from_be_bytes([pair[0], pair[1]]),
        })
    }

    /// Write an Intel HEX image. Optional `go_addr` emits a start-address record.
    pub fn write_hex<W: Write>(&self, mut out: W, go_addr: Option<u16>) -> io::Result<()> {
        const LINE_LIMIT: usize = 32;

        for (ix, chunk) in self.bytes.chunks(LINE_LIMIT).enumerate() {
            let line_addr = self.origin.wrapping_add((ix * LINE_LIMIT) as u16);
            let mut checksum = (chunk.len() as u8)
                .wrapping_add((line_addr >> 8) as u8)
                .wrapping_add((line_addr & 0xff) as u8);
            let mut hex_data = String::with_capacity(chunk.len() * 2);
            for val in chunk {
                hex_data.push(hex_digit(val >> 4));
                hex_data.push(hex_digit(val & 0x0f));
                checksum = checksum.wrapping_add(*val);
            }
            checksum = (!checksum).wrapping_add(1);
            writeln!(
                out,
                ":{:02X}{:04X}00{}{:02X}",
                chunk.len(),
                line_addr,
                hex_data,
                checksum
            )?;
        }

        if let Some(addr) = go_addr {
            let mut csum: u8 = 0;
            csum = csum.wrapping_add(4);
            csum = csum.wrapping_add(3);
            csum = csum.wrapping_add((addr >> 8) as u8);
            csum = csum.wrapping_add((addr & 0xff) as u8);
            csum = (!csum).wrapping_add(1);
            writeln!(out, ":040000030000{:04X}{:02X}", addr, csum)?;
        }

        writeln!(out, ":00000001FF")?;
        Ok(())
    }

    /// Write the raw image, starting at the origin.
    pub fn write_bin<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(&self.bytes)
    }
}

fn hex_digit(val: u8) -> char {
    match val {
        0..=9 => (b'0' + val) as char,
        _ => (b'A' + (val - 10)) as char,
    }
}
