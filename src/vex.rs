//! VEX and EVEX vector-prefix parsing.
//!
//! The three signature bytes (0xC5, 0xC4, 0x62) collide with the legacy
//! LDS/LES/BOUND opcodes in 16/32-bit mode. The architecture disambiguates
//! with the byte *after* the signature: those legacy instructions can only
//! take a memory operand, so a mod field of 11 in that byte can never be a
//! legal LDS/LES/BOUND encoding and selects the vector-prefix reading
//! instead. In 64-bit mode the signature bytes are unconditionally vector
//! prefixes. Getting this wrong silently misdecodes every following byte,
//! which is why `try_parse` is the most heavily tested function here.
//!
//! All fields are extracted raw; overloaded bits (EVEX L'L/b meaning vector
//! length, rounding control or SAE depending on the addressing form) are
//! interpreted later, at the point of use.

use cursor::ByteCursor;
use decoder::{DecodeError, ExecutionMode};
use operand::Register;
use prefix::{MandatoryPrefix, PrefixState};
use table::OpcodeMap;

/// Which vector-prefix encoding introduced the instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VexKind {
    Vex2,
    Vex3,
    Evex,
}

/// Raw vector-prefix state, populated once per decode call and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct VectorContext {
    pub kind: VexKind,
    pub map: OpcodeMap,
    /// Implied mandatory prefix (pp field).
    pub pp: MandatoryPrefix,
    pub w: bool,
    /// Register operand selected by vvvv (including EVEX V' as bit 4).
    /// Stored un-inverted; masked to 3 bits outside 64-bit mode.
    pub vvvv: u8,
    /// Raw L'L bits. Interpreted as vector length *or* rounding control,
    /// depending on the b bit and the addressing form.
    pub ll: u8,
    /// Register-extension bits, un-inverted. Always false outside 64-bit
    /// mode, where the encodings are ignored by the CPU.
    pub r: bool,
    pub x: bool,
    pub b: bool,
    /// EVEX R' (second reg-field extension bit, reaching registers 16-31).
    pub r2: bool,
    /// EVEX opmask register selector; 0 means no masking.
    pub aaa: u8,
    /// EVEX zeroing-masking bit.
    pub z: bool,
    /// EVEX b bit: broadcast for memory forms, rounding/SAE for register
    /// forms. Raw here.
    pub bcst: bool,
}

impl VectorContext {
    /// Vector length in bits from the raw L'L field. L'L == 3 is reserved
    /// and reported as 512 here; entries reject it via length dispatch.
    pub fn vector_length(&self) -> u16 {
        match self.ll {
            0 => 128,
            1 => 256,
            _ => 512,
        }
    }

    /// Opmask register, or `None` when aaa selects k0 (no masking).
    pub fn opmask(&self) -> Option<Register> {
        if self.aaa == 0 {
            None
        } else {
            Some(Register::mask(self.aaa))
        }
    }
}

fn vex2(b1: u8, mode: ExecutionMode) -> VectorContext {
    let is64 = mode == ExecutionMode::Bits64;
    VectorContext {
        kind: VexKind::Vex2,
        map: OpcodeMap::Map0F,
        pp: pp_from_bits(b1 & 3),
        w: false,
        vvvv: (!b1 >> 3) & if is64 { 0x0F } else { 0x07 },
        ll: (b1 >> 2) & 1,
        r: is64 && b1 & 0x80 == 0,
        x: false,
        b: false,
        r2: false,
        aaa: 0,
        z: false,
        bcst: false,
    }
}

fn vex3(b1: u8, b2: u8, map: OpcodeMap, mode: ExecutionMode) -> VectorContext {
    let is64 = mode == ExecutionMode::Bits64;
    VectorContext {
        kind: VexKind::Vex3,
        map,
        pp: pp_from_bits(b2 & 3),
        w: b2 & 0x80 != 0,
        vvvv: (!b2 >> 3) & if is64 { 0x0F } else { 0x07 },
        ll: (b2 >> 2) & 1,
        r: is64 && b1 & 0x80 == 0,
        x: is64 && b1 & 0x40 == 0,
        b: is64 && b1 & 0x20 == 0,
        r2: false,
        aaa: 0,
        z: false,
        bcst: false,
    }
}

fn evex(p0: u8, p1: u8, p2: u8, map: OpcodeMap, mode: ExecutionMode) -> VectorContext {
    let is64 = mode == ExecutionMode::Bits64;
    let mut vvvv = (!p1 >> 3) & if is64 { 0x0F } else { 0x07 };
    if is64 {
        // V' extends vvvv to 5 bits (registers 16-31).
        vvvv |= (!p2 & 0x08) << 1;
    }
    VectorContext {
        kind: VexKind::Evex,
        map,
        pp: pp_from_bits(p1 & 3),
        w: p1 & 0x80 != 0,
        vvvv,
        ll: (p2 >> 5) & 3,
        r: is64 && p0 & 0x80 == 0,
        x: is64 && p0 & 0x40 == 0,
        b: is64 && p0 & 0x20 == 0,
        r2: is64 && p0 & 0x10 == 0,
        aaa: p2 & 7,
        z: p2 & 0x80 != 0,
        bcst: p2 & 0x10 != 0,
    }
}

fn pp_from_bits(pp: u8) -> MandatoryPrefix {
    match pp & 3 {
        0 => MandatoryPrefix::None,
        1 => MandatoryPrefix::P66,
        2 => MandatoryPrefix::PF3,
        _ => MandatoryPrefix::PF2,
    }
}

/// Whether the byte after a signature byte selects the vector-prefix
/// reading. Outside 64-bit mode only mod == 11 does; the memory forms stay
/// LDS/LES/BOUND.
fn takes_vector_path(next: u8, mode: ExecutionMode) -> bool {
    mode == ExecutionMode::Bits64 || next & 0xC0 == 0xC0
}

/// Recognizes a VEX/EVEX prefix at the cursor, if present.
///
/// Returns `Ok(None)` (cursor unadvanced) when the next byte is not a vector
/// prefix in this mode, including the 16/32-bit signature-byte collisions.
/// A vector prefix after a REX byte or a 66/F2/F3 prefix is an invalid
/// encoding: the extension schemes are mutually exclusive.
pub fn try_parse(
    cursor: &mut ByteCursor,
    mode: ExecutionMode,
    prefixes: &PrefixState,
) -> Result<Option<VectorContext>, DecodeError> {
    let sig = match cursor.peek() {
        Ok(b) => b,
        Err(_) => return Ok(None),
    };

    let ctx = match sig {
        0xC5 => {
            if !takes_vector_path(cursor.peek_at(1)?, mode) {
                return Ok(None);
            }
            cursor.read()?;
            let b1 = cursor.read()?;
            vex2(b1, mode)
        }
        0xC4 => {
            if !takes_vector_path(cursor.peek_at(1)?, mode) {
                return Ok(None);
            }
            cursor.read()?;
            let b1 = cursor.read()?;
            let b2 = cursor.read()?;
            let map = match b1 & 0x1F {
                1 => OpcodeMap::Map0F,
                2 => OpcodeMap::Map0F38,
                3 => OpcodeMap::Map0F3A,
                m => return Err(DecodeError::invalid(format!("VEX map {}", m))),
            };
            vex3(b1, b2, map, mode)
        }
        0x62 => {
            if !takes_vector_path(cursor.peek_at(1)?, mode) {
                return Ok(None);
            }
            cursor.read()?;
            let p0 = cursor.read()?;
            let p1 = cursor.read()?;
            let p2 = cursor.read()?;
            if p1 & 0x04 == 0 {
                // MVEX (Knights Corner) encoding, not supported.
                return Err(DecodeError::invalid("MVEX encoding"));
            }
            if p0 & 0x0C != 0 {
                return Err(DecodeError::invalid("EVEX reserved bits set"));
            }
            let map = match p0 & 3 {
                1 => OpcodeMap::Map0F,
                2 => OpcodeMap::Map0F38,
                3 => OpcodeMap::Map0F3A,
                _ => return Err(DecodeError::invalid("EVEX map 0")),
            };
            evex(p0, p1, p2, map, mode)
        }
        _ => return Ok(None),
    };

    // Exactly one of REX / VEX2 / VEX3 / EVEX may be active per instruction,
    // and a mandatory prefix is already folded into pp.
    if prefixes.rex.is_some() {
        return Err(DecodeError::invalid("REX prefix before a vector prefix"));
    }
    if prefixes.mandatory != MandatoryPrefix::None {
        return Err(DecodeError::invalid("66/F2/F3 prefix before a vector prefix"));
    }

    Ok(Some(ctx))
}
