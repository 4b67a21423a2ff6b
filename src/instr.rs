//! The decoded instruction record handed back to callers.

use operand::{Operand, Register, Segment};
use table::Code;

bitflags! {
    /// Per-instruction status flags.
    pub struct InstrFlags: u16 {
        /// LOCK prefix present and legal for this form.
        const LOCK         = 0x0001;
        /// F3 prefix surfaced as rep/repe (not consumed by opcode selection).
        const REPE         = 0x0002;
        /// F2 prefix surfaced as repne.
        const REPNE        = 0x0004;
        /// EVEX broadcast memory access.
        const BROADCAST    = 0x0008;
        /// EVEX zeroing-masking (z bit).
        const ZEROING      = 0x0010;
        /// EVEX suppress-all-exceptions.
        const SAE          = 0x0020;
        /// LOCK prefix present but illegal for this form. The instruction
        /// still decodes; the caller decides whether to fault.
        const INVALID_LOCK = 0x0040;
    }
}

/// EVEX embedded rounding mode. `None` unless a register-form instruction
/// with rounding support set the b bit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum RoundingControl {
    None = 0,
    RoundToNearest = 1,
    RoundDown = 2,
    RoundUp = 3,
    RoundTowardZero = 4,
}

/// One fully decoded instruction.
///
/// All encoding-level detail (prefixes, compressed displacements, inverted
/// fields) has been resolved; what remains is the architectural meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInstruction {
    pub(crate) code: Code,
    pub(crate) operands: Vec<Operand>,
    pub(crate) len: u8,
    pub(crate) flags: InstrFlags,
    pub(crate) segment_override: Option<Segment>,
    pub(crate) opmask: Option<Register>,
    pub(crate) rounding: RoundingControl,
}

impl DecodedInstruction {
    /// Instruction kind identifier.
    pub fn code(&self) -> Code {
        self.code
    }

    pub fn op_count(&self) -> usize {
        self.operands.len()
    }

    /// The `n`th operand, destination first.
    pub fn op(&self, n: usize) -> &Operand {
        &self.operands[n]
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Total encoded length in bytes, prefixes included.
    pub fn byte_len(&self) -> usize {
        self.len as usize
    }

    pub fn has_lock(&self) -> bool {
        self.flags.contains(InstrFlags::LOCK)
    }

    pub fn has_repe(&self) -> bool {
        self.flags.contains(InstrFlags::REPE)
    }

    pub fn has_repne(&self) -> bool {
        self.flags.contains(InstrFlags::REPNE)
    }

    pub fn is_broadcast(&self) -> bool {
        self.flags.contains(InstrFlags::BROADCAST)
    }

    pub fn zeroing_masking(&self) -> bool {
        self.flags.contains(InstrFlags::ZEROING)
    }

    pub fn suppress_all_exceptions(&self) -> bool {
        self.flags.contains(InstrFlags::SAE)
    }

    pub fn has_invalid_lock(&self) -> bool {
        self.flags.contains(InstrFlags::INVALID_LOCK)
    }

    pub fn flags(&self) -> InstrFlags {
        self.flags
    }

    /// Explicit segment-override prefix, if one was present. Memory operands
    /// already have it folded into their segment field.
    pub fn segment_override(&self) -> Option<Segment> {
        self.segment_override
    }

    /// AVX-512 opmask register (k1-k7), if masking is active.
    pub fn opmask(&self) -> Option<Register> {
        self.opmask
    }

    pub fn rounding_control(&self) -> RoundingControl {
        self.rounding
    }
}
