//! Legacy prefix and REX byte scanning.
//!
//! Prefixes are folded into an immutable [`PrefixState`] snapshot before any
//! further decoding happens, so later stages never observe a partially-built
//! prefix set. Within one category the *last* prefix byte wins; across
//! categories order is irrelevant.

use cursor::{ByteCursor, ReadError};
use decoder::ExecutionMode;
use operand::{OpSize, Segment};

bitflags! {
    /// Bitmask of single-bit legacy prefixes.
    ///
    /// Segment overrides are not part of this mask since "last one wins"
    /// needs more than a bit; they live in [`PrefixState::segment`].
    pub struct RawPrefixes: u8 {
        /// `0xF0`
        const LOCK             = 0x01;
        /// `0xF3` - `rep` or `repe`, depending on the instruction.
        const REPE             = 0x02;
        /// `0xF2`
        const REPNE            = 0x04;
        /// `0x66` - Operand size override.
        const OVERRIDE_OPERAND = 0x08;
        /// `0x67` - Address size override.
        const OVERRIDE_ADDRESS = 0x10;
    }
}

/// Decoded REX prefix bits (64-bit mode only).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rex {
    /// 64-bit operand size.
    pub w: bool,
    /// Extends ModRM.reg.
    pub r: bool,
    /// Extends SIB.index.
    pub x: bool,
    /// Extends ModRM.rm / SIB.base / opcode register.
    pub b: bool,
}

impl Rex {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            w: byte & 0x08 != 0,
            r: byte & 0x04 != 0,
            x: byte & 0x02 != 0,
            b: byte & 0x01 != 0,
        }
    }
}

/// The 66/F3/F2 prefix that participates in opcode selection for SSE-style
/// instructions. Tracked separately from the raw flags because the opcode
/// table may *consume* it, cancelling its legacy effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MandatoryPrefix {
    None,
    P66,
    PF3,
    PF2,
}

/// Immutable snapshot of all prefix bytes of one instruction.
#[derive(Debug, Clone)]
pub struct PrefixState {
    pub flags: RawPrefixes,
    /// Last segment-override prefix, if any.
    pub segment: Option<Segment>,
    /// REX byte, 64-bit mode only. Valid only when the byte directly
    /// precedes the opcode; `scan` already enforces that by dropping a REX
    /// followed by another legacy prefix.
    pub rex: Option<Rex>,
    /// Mandatory-prefix candidate for opcode table keying: 0x66 registers
    /// only if no F2/F3 was seen, F2/F3 overwrite each other.
    pub mandatory: MandatoryPrefix,
}

impl PrefixState {
    fn empty() -> Self {
        Self {
            flags: RawPrefixes::empty(),
            segment: None,
            rex: None,
            mandatory: MandatoryPrefix::None,
        }
    }

    pub fn has(&self, flag: RawPrefixes) -> bool {
        self.flags.contains(flag)
    }

    /// Effective operand size under this mode and prefix set.
    pub fn operand_size(&self, mode: ExecutionMode) -> OpSize {
        if self.rex.map(|r| r.w).unwrap_or(false) {
            return OpSize::Bits64;
        }
        let flipped = self.has(RawPrefixes::OVERRIDE_OPERAND);
        match mode {
            ExecutionMode::Bits16 => {
                if flipped { OpSize::Bits32 } else { OpSize::Bits16 }
            }
            ExecutionMode::Bits32 | ExecutionMode::Bits64 => {
                if flipped { OpSize::Bits16 } else { OpSize::Bits32 }
            }
        }
    }

    /// Effective address size under this mode and prefix set.
    pub fn address_size(&self, mode: ExecutionMode) -> OpSize {
        let flipped = self.has(RawPrefixes::OVERRIDE_ADDRESS);
        match mode {
            ExecutionMode::Bits16 => {
                if flipped { OpSize::Bits32 } else { OpSize::Bits16 }
            }
            ExecutionMode::Bits32 => {
                if flipped { OpSize::Bits16 } else { OpSize::Bits32 }
            }
            ExecutionMode::Bits64 => {
                if flipped { OpSize::Bits32 } else { OpSize::Bits64 }
            }
        }
    }

    /// Segment for a memory operand: explicit override wins, else `default`.
    pub fn segment(&self, default: Segment) -> Segment {
        self.segment.unwrap_or(default)
    }
}

/// Consumes all legacy prefix bytes plus an optional trailing REX byte.
///
/// Stops at the first byte that is neither a recognized legacy prefix nor
/// (in 64-bit mode) a REX byte. A REX byte followed by another legacy prefix
/// is architecturally ignored, so only a REX directly before the opcode is
/// recorded.
pub fn scan(cursor: &mut ByteCursor, mode: ExecutionMode) -> Result<PrefixState, ReadError> {
    let mut state = PrefixState::empty();
    let mut rex_byte = 0u8;

    loop {
        let byte = cursor.peek()?;
        match byte {
            0x26 => state.segment = Some(Segment::Es),
            0x2E => state.segment = Some(Segment::Cs),
            0x36 => state.segment = Some(Segment::Ss),
            0x3E => state.segment = Some(Segment::Ds),
            0x64 => state.segment = Some(Segment::Fs),
            0x65 => state.segment = Some(Segment::Gs),
            0x66 => {
                state.flags |= RawPrefixes::OVERRIDE_OPERAND;
                if state.mandatory == MandatoryPrefix::None {
                    state.mandatory = MandatoryPrefix::P66;
                }
            }
            0x67 => state.flags |= RawPrefixes::OVERRIDE_ADDRESS,
            0xF0 => state.flags |= RawPrefixes::LOCK,
            0xF2 => {
                state.flags |= RawPrefixes::REPNE;
                state.mandatory = MandatoryPrefix::PF2;
            }
            0xF3 => {
                state.flags |= RawPrefixes::REPE;
                state.mandatory = MandatoryPrefix::PF3;
            }
            0x40...0x4F if mode == ExecutionMode::Bits64 => {
                // Remembered, but cancelled if any further prefix follows.
                cursor.read()?;
                rex_byte = byte;
                continue;
            }
            _ => break,
        }
        cursor.read()?;
        rex_byte = 0;
    }

    if rex_byte != 0 {
        state.rex = Some(Rex::from_byte(rex_byte));
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursor::ByteCursor;
    use decoder::ExecutionMode::*;

    fn scan_bytes(bytes: &[u8], mode: ::decoder::ExecutionMode) -> (PrefixState, usize) {
        let mut cur = ByteCursor::new(bytes, 0);
        let state = scan(&mut cur, mode).unwrap();
        (state, cur.consumed())
    }

    #[test]
    fn stops_at_opcode() {
        let (state, used) = scan_bytes(&[0x66, 0x0F, 0x58], Bits32);
        assert!(state.has(RawPrefixes::OVERRIDE_OPERAND));
        assert_eq!(used, 1);
    }

    #[test]
    fn last_segment_wins() {
        let (state, _) = scan_bytes(&[0x2E, 0x65, 0x90], Bits32);
        assert_eq!(state.segment, Some(Segment::Gs));
    }

    #[test]
    fn prefix_order_is_irrelevant_across_categories() {
        let (a, _) = scan_bytes(&[0x66, 0x67, 0x90], Bits16);
        let (b, _) = scan_bytes(&[0x67, 0x66, 0x90], Bits16);
        assert_eq!(a.flags, b.flags);
    }

    #[test]
    fn rex_only_in_64_bit_mode() {
        let (state, used) = scan_bytes(&[0x48, 0x89], Bits64);
        assert_eq!(state.rex, Some(Rex { w: true, r: false, x: false, b: false }));
        assert_eq!(used, 1);

        // In 32-bit mode 0x48 is `dec eax`, not a prefix.
        let (state, used) = scan_bytes(&[0x48, 0x89], Bits32);
        assert_eq!(state.rex, None);
        assert_eq!(used, 0);
    }

    #[test]
    fn rex_cancelled_by_later_prefix() {
        // REX must directly precede the opcode; `48 66 ..` drops the REX.
        let (state, used) = scan_bytes(&[0x48, 0x66, 0x90], Bits64);
        assert_eq!(state.rex, None);
        assert!(state.has(RawPrefixes::OVERRIDE_OPERAND));
        assert_eq!(used, 2);
    }

    #[test]
    fn mandatory_prefix_tracking() {
        // 66 then F3: F3 wins the mandatory slot.
        let (state, _) = scan_bytes(&[0x66, 0xF3, 0x90], Bits32);
        assert_eq!(state.mandatory, MandatoryPrefix::PF3);
        // 66 after F2 does not displace it.
        let (state, _) = scan_bytes(&[0xF2, 0x66, 0x90], Bits32);
        assert_eq!(state.mandatory, MandatoryPrefix::PF2);
    }

    #[test]
    fn operand_size_resolution() {
        let (state, _) = scan_bytes(&[0x66, 0x90], Bits64);
        assert_eq!(state.operand_size(Bits64), ::operand::OpSize::Bits16);
        let (state, _) = scan_bytes(&[0x66, 0x48, 0x90], Bits64);
        // REX.W beats the 66 prefix.
        assert_eq!(state.operand_size(Bits64), ::operand::OpSize::Bits64);
    }
}
