//! Decoded operand representation: registers, immediates, memory locations.

use std::fmt;

/// Operand or address size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpSize {
    Bits8,
    Bits16,
    Bits32,
    Bits64,
}

impl OpSize {
    /// Size in bytes.
    pub fn bytes(&self) -> u8 {
        match self {
            OpSize::Bits8 => 1,
            OpSize::Bits16 => 2,
            OpSize::Bits32 => 4,
            OpSize::Bits64 => 8,
        }
    }
}

/// An x86 segment register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Segment {
    Es,
    Cs,
    Ss,
    Ds,
    Fs,
    Gs,
}

impl Segment {
    pub fn name(&self) -> &'static str {
        match self {
            Segment::Es => "es",
            Segment::Cs => "cs",
            Segment::Ss => "ss",
            Segment::Ds => "ds",
            Segment::Fs => "fs",
            Segment::Gs => "gs",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Register file a register number indexes into.
///
/// x86 has far too many architectural registers for a flat enum to stay
/// readable once AVX-512's 32 vector registers enter the picture, so a
/// register is a (class, number) pair instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegClass {
    /// 8-bit GPRs without REX (AL..BH; 4-7 are AH/CH/DH/BH).
    Byte,
    /// 8-bit GPRs with any REX prefix present (4-7 are SPL/BPL/SIL/DIL,
    /// 8-15 are R8B..R15B).
    ByteRex,
    /// 16-bit GPRs (AX..DI, R8W..R15W).
    Word,
    /// 32-bit GPRs (EAX..EDI, R8D..R15D).
    Dword,
    /// 64-bit GPRs (RAX..RDI, R8..R15).
    Qword,
    /// XMM0-XMM31.
    Xmm,
    /// YMM0-YMM31.
    Ymm,
    /// ZMM0-ZMM31.
    Zmm,
    /// AVX-512 opmask registers K0-K7.
    Mask,
    /// Instruction pointer (number 0 = EIP, 1 = RIP).
    Ip,
}

/// A single architectural register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Register {
    pub class: RegClass,
    pub num: u8,
}

impl Register {
    pub fn new(class: RegClass, num: u8) -> Self {
        Self { class, num }
    }

    /// GPR of the given operand size. `rex` selects the SPL/BPL/SIL/DIL
    /// variants of encodings 4-7 for byte registers.
    pub fn gpr(size: OpSize, num: u8, rex: bool) -> Self {
        let class = match size {
            OpSize::Bits8 => {
                if rex {
                    RegClass::ByteRex
                } else {
                    RegClass::Byte
                }
            }
            OpSize::Bits16 => RegClass::Word,
            OpSize::Bits32 => RegClass::Dword,
            OpSize::Bits64 => RegClass::Qword,
        };
        Self::new(class, num)
    }

    pub fn xmm(num: u8) -> Self {
        Self::new(RegClass::Xmm, num)
    }

    pub fn ymm(num: u8) -> Self {
        Self::new(RegClass::Ymm, num)
    }

    pub fn zmm(num: u8) -> Self {
        Self::new(RegClass::Zmm, num)
    }

    /// Vector register of the given length in bits (128/256/512).
    pub fn vec(length: u16, num: u8) -> Self {
        match length {
            256 => Self::ymm(num),
            512 => Self::zmm(num),
            _ => Self::xmm(num),
        }
    }

    pub fn mask(num: u8) -> Self {
        Self::new(RegClass::Mask, num & 7)
    }

    pub fn eip() -> Self {
        Self::new(RegClass::Ip, 0)
    }

    pub fn rip() -> Self {
        Self::new(RegClass::Ip, 1)
    }

    /// Whether this register belongs to the stack-pointer family (SP/BP and
    /// their wider forms). Memory operands based on these default to SS.
    pub fn is_stack_family(&self) -> bool {
        match self.class {
            RegClass::Word | RegClass::Dword | RegClass::Qword => {
                self.num == 4 || self.num == 5
            }
            _ => false,
        }
    }

    pub fn name(&self) -> String {
        static WORD: [&str; 8] = ["ax", "cx", "dx", "bx", "sp", "bp", "si", "di"];
        static BYTE: [&str; 8] = ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"];
        static BYTE_REX: [&str; 8] = ["al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil"];

        let n = self.num as usize;
        match self.class {
            RegClass::Byte => BYTE[n & 7].to_string(),
            RegClass::ByteRex => {
                if n < 8 {
                    BYTE_REX[n].to_string()
                } else {
                    format!("r{}b", n)
                }
            }
            RegClass::Word => {
                if n < 8 {
                    WORD[n].to_string()
                } else {
                    format!("r{}w", n)
                }
            }
            RegClass::Dword => {
                if n < 8 {
                    format!("e{}", WORD[n])
                } else {
                    format!("r{}d", n)
                }
            }
            RegClass::Qword => {
                if n < 8 {
                    format!("r{}", WORD[n])
                } else {
                    format!("r{}", n)
                }
            }
            RegClass::Xmm => format!("xmm{}", n),
            RegClass::Ymm => format!("ymm{}", n),
            RegClass::Zmm => format!("zmm{}", n),
            RegClass::Mask => format!("k{}", n),
            RegClass::Ip => if n == 0 { "eip".to_string() } else { "rip".to_string() },
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// An 8/16/32/64-bit immediate value.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Immediate {
    Imm8(i8),
    Imm16(i16),
    Imm32(i32),
    Imm64(i64),
}

impl Immediate {
    /// Returns the sign-extended value as an `i64`.
    pub fn sign_extended(&self) -> i64 {
        match *self {
            Immediate::Imm8(imm) => imm as i64,
            Immediate::Imm16(imm) => imm as i64,
            Immediate::Imm32(imm) => imm as i64,
            Immediate::Imm64(imm) => imm,
        }
    }

    /// Sign-extend or truncate to a different size.
    pub fn sign_ext_to(&self, size: OpSize) -> Immediate {
        let v = self.sign_extended();
        match size {
            OpSize::Bits8 => Immediate::Imm8(v as i8),
            OpSize::Bits16 => Immediate::Imm16(v as i16),
            OpSize::Bits32 => Immediate::Imm32(v as i32),
            OpSize::Bits64 => Immediate::Imm64(v),
        }
    }

    pub fn size(&self) -> OpSize {
        match self {
            Immediate::Imm8(_) => OpSize::Bits8,
            Immediate::Imm16(_) => OpSize::Bits16,
            Immediate::Imm32(_) => OpSize::Bits32,
            Immediate::Imm64(_) => OpSize::Bits64,
        }
    }
}

impl From<i8> for Immediate {
    fn from(imm: i8) -> Self {
        Immediate::Imm8(imm)
    }
}

impl From<i16> for Immediate {
    fn from(imm: i16) -> Self {
        Immediate::Imm16(imm)
    }
}

impl From<i32> for Immediate {
    fn from(imm: i32) -> Self {
        Immediate::Imm32(imm)
    }
}

impl From<i64> for Immediate {
    fn from(imm: i64) -> Self {
        Immediate::Imm64(imm)
    }
}

/// Size and interpretation of a memory operand.
///
/// The variant names are part of the stable output contract; broadcast
/// variants describe a single scalar replicated across all vector lanes.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemorySize {
    Unknown,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Two 16-bit values (legacy BOUND operand).
    Bound16_WordWord,
    /// Two 32-bit values (legacy BOUND operand).
    Bound32_DwordDword,
    /// 16:16 far pointer (LES/LDS with a 16-bit operand).
    SegPtr16,
    /// 16:32 far pointer (LES/LDS with a 32-bit operand).
    SegPtr32,
    Packed128_Float32,
    Packed128_Float64,
    Packed256_Float32,
    Packed256_Float64,
    Packed512_Float32,
    Packed512_Float64,
    Broadcast128_Float32,
    Broadcast128_Float64,
    Broadcast256_Float32,
    Broadcast256_Float64,
    Broadcast512_Float32,
    Broadcast512_Float64,
}

impl MemorySize {
    pub fn is_broadcast(&self) -> bool {
        match self {
            MemorySize::Broadcast128_Float32
            | MemorySize::Broadcast128_Float64
            | MemorySize::Broadcast256_Float32
            | MemorySize::Broadcast256_Float64
            | MemorySize::Broadcast512_Float32
            | MemorySize::Broadcast512_Float64 => true,
            _ => false,
        }
    }

    /// Memory size for a plain integer access of the given operand size.
    pub fn uint(size: OpSize) -> Self {
        match size {
            OpSize::Bits8 => MemorySize::UInt8,
            OpSize::Bits16 => MemorySize::UInt16,
            OpSize::Bits32 => MemorySize::UInt32,
            OpSize::Bits64 => MemorySize::UInt64,
        }
    }
}

/// A resolved memory addressing form.
///
/// `displ` holds the final displacement value: for EVEX compressed
/// displacements this is the raw byte already multiplied by the tuple scale,
/// while `displ_size` still records the *encoded* width (0/1/2/4 bytes).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryOperand {
    pub segment: Segment,
    /// `None` for absolute or disp-only addressing.
    pub base: Option<Register>,
    pub index: Option<Register>,
    /// 1, 2, 4 or 8. Meaningless without an index register.
    pub scale: u8,
    pub displ: i64,
    /// Encoded displacement width in bytes: 0, 1, 2 or 4.
    pub displ_size: u8,
    pub size: MemorySize,
}

/// A branch target encoded relative to the end of the instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RelOffset {
    pub offset: i64,
    /// Encoded width of the offset.
    pub size: OpSize,
}

/// A decoded operand.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Register),
    Mem(MemoryOperand),
    Imm(Immediate),
    Rel(RelOffset),
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Reg(reg)
    }
}

impl From<MemoryOperand> for Operand {
    fn from(mem: MemoryOperand) -> Self {
        Operand::Mem(mem)
    }
}

impl From<Immediate> for Operand {
    fn from(imm: Immediate) -> Self {
        Operand::Imm(imm)
    }
}

impl From<RelOffset> for Operand {
    fn from(rel: RelOffset) -> Self {
        Operand::Rel(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_names() {
        assert_eq!(Register::gpr(OpSize::Bits32, 0, false).name(), "eax");
        assert_eq!(Register::gpr(OpSize::Bits8, 4, false).name(), "ah");
        assert_eq!(Register::gpr(OpSize::Bits8, 4, true).name(), "spl");
        assert_eq!(Register::gpr(OpSize::Bits64, 13, true).name(), "r13");
        assert_eq!(Register::xmm(18).name(), "xmm18");
        assert_eq!(Register::mask(5).name(), "k5");
    }

    #[test]
    fn stack_family() {
        assert!(Register::gpr(OpSize::Bits16, 5, false).is_stack_family()); // bp
        assert!(Register::gpr(OpSize::Bits64, 4, false).is_stack_family()); // rsp
        assert!(!Register::gpr(OpSize::Bits32, 3, false).is_stack_family()); // ebx
        assert!(!Register::xmm(4).is_stack_family());
    }

    #[test]
    fn immediate_extension() {
        assert_eq!(Immediate::Imm8(-2).sign_ext_to(OpSize::Bits32), Immediate::Imm32(-2));
        assert_eq!(Immediate::Imm32(-1).sign_extended(), -1);
    }
}
