//! Opcode table boundary.
//!
//! The decoder core never hardcodes per-instruction knowledge; it asks an
//! [`OpcodeTable`] what a (mode, encoding, map, opcode, mandatory prefix)
//! combination means and receives an instruction kind plus an operand-shape
//! template. The full ISA table is enormous and generated elsewhere; the
//! [`BuiltinTable`] here covers a representative subset so the crate works
//! stand-alone, but any table implementing the trait plugs in.

use decoder::ExecutionMode;
use operand::MemorySize;
use prefix::MandatoryPrefix;

/// Opcode map selected by escape bytes or the VEX/EVEX map field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpcodeMap {
    /// One-byte opcodes.
    Legacy,
    /// `0F xx`
    Map0F,
    /// `0F 38 xx`
    Map0F38,
    /// `0F 3A xx`
    Map0F3A,
}

/// Which prefix scheme encoded the instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EncodingKind {
    Legacy,
    Vex,
    Evex,
}

/// Instruction kind identifier.
///
/// Names follow the `mnemonic_operands` convention and are part of the
/// stable output contract asserted by callers.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Code {
    Add_rm8_r8,
    Add_rm16_r16,
    Add_rm32_r32,
    Add_rm64_r64,
    Add_r8_rm8,
    Add_r16_rm16,
    Add_r32_rm32,
    Add_r64_rm64,
    Add_AL_imm8,
    Add_AX_imm16,
    Add_EAX_imm32,
    Add_RAX_imm32,

    Mov_rm8_r8,
    Mov_rm16_r16,
    Mov_rm32_r32,
    Mov_rm64_r64,
    Mov_r8_rm8,
    Mov_r16_rm16,
    Mov_r32_rm32,
    Mov_r64_rm64,
    Mov_rm8_imm8,
    Mov_rm16_imm16,
    Mov_rm32_imm32,
    Mov_rm64_imm32,
    Mov_r8_imm8,
    Mov_r16_imm16,
    Mov_r32_imm32,
    Mov_r64_imm64,

    Push_r16,
    Push_r32,
    Push_r64,
    Pop_r16,
    Pop_r32,
    Pop_r64,

    Nopw,
    Nopd,
    Nopq,
    Retnw,
    Retnd,
    Retnq,
    Int3,

    Je_rel8_16,
    Je_rel8_32,
    Je_rel8_64,
    Jne_rel8_16,
    Jne_rel8_32,
    Jne_rel8_64,

    Bound_r16_m1616,
    Bound_r32_m3232,
    Les_r16_m1616,
    Les_r32_m1632,
    Lds_r16_m1616,
    Lds_r32_m1632,

    Addps_xmm_xmmm128,
    Addpd_xmm_xmmm128,
    Addss_xmm_xmmm32,
    Addsd_xmm_xmmm64,
    Ucomiss_xmm_xmmm32,
    Ucomisd_xmm_xmmm64,

    VEX_Vaddps_xmm_xmm_xmmm128,
    VEX_Vaddps_ymm_ymm_ymmm256,
    VEX_Vaddpd_xmm_xmm_xmmm128,
    VEX_Vaddpd_ymm_ymm_ymmm256,
    VEX_Vaddss_xmm_xmm_xmmm32,
    VEX_Vaddsd_xmm_xmm_xmmm64,
    VEX_Vucomiss_xmm_xmmm32,
    VEX_Vucomisd_xmm_xmmm64,

    EVEX_Vaddps_xmm_k1z_xmm_xmmm128b32,
    EVEX_Vaddps_ymm_k1z_ymm_ymmm256b32,
    EVEX_Vaddps_zmm_k1z_zmm_zmmm512b32_er,
    EVEX_Vaddpd_xmm_k1z_xmm_xmmm128b64,
    EVEX_Vaddpd_ymm_k1z_ymm_ymmm256b64,
    EVEX_Vaddpd_zmm_k1z_zmm_zmmm512b64_er,
    EVEX_Vaddss_xmm_k1z_xmm_xmmm32_er,
    EVEX_Vaddsd_xmm_k1z_xmm_xmmm64_er,
    EVEX_Vucomiss_xmm_xmmm32_sae,
    EVEX_Vucomisd_xmm_xmmm64_sae,
}

/// EVEX tuple type, controlling the compressed-disp8 scale factor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TupleType {
    None,
    /// Full vector, element size selected by W; broadcast shrinks the
    /// access to one element.
    Full,
    /// Full vector, never broadcast.
    FullMem,
    /// One scalar element, size selected by W.
    Tuple1Scalar,
}

impl TupleType {
    /// Scale factor applied to a disp8 byte (disp8*N).
    pub fn disp8n(&self, vector_bytes: u8, w: bool, broadcast: bool) -> u32 {
        let elem = if w { 8 } else { 4 };
        match self {
            TupleType::None => 1,
            TupleType::Full => {
                if broadcast { elem } else { vector_bytes as u32 }
            }
            TupleType::FullMem => vector_bytes as u32,
            TupleType::Tuple1Scalar => elem,
        }
    }
}

/// How one operand of the template is encoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpEnc {
    /// ModRM.reg as a GPR of the effective operand size.
    GprReg,
    /// ModRM.rm as a GPR or a memory operand.
    GprRm,
    /// The accumulator (AL/AX/EAX/RAX) of the effective operand size.
    GprAcc,
    /// GPR encoded in the opcode's low 3 bits (+ REX.B).
    GprOpcode,
    /// Operand-sized immediate; 64-bit forms read imm32 and sign-extend.
    Imm,
    /// Operand-sized immediate; 64-bit forms read a full imm64.
    ImmFull,
    /// 8-bit relative branch offset.
    Rel8,
    /// ModRM.reg as a vector register.
    VecReg,
    /// vvvv as a vector register.
    VecVvvv,
    /// ModRM.rm as a vector register or a memory operand.
    VecRm,
    /// ModRM.rm, memory form required (BOUND/LES/LDS).
    GprRegMemOnly,
}

/// Instruction-kind selection within one entry.
#[derive(Debug, Copy, Clone)]
pub enum CodeSel {
    Fixed(Code),
    /// Selected by effective operand size (16/32/64).
    BySize(Code, Code, Code),
    /// Selected by the raw L'L field (128/256/512).
    ByLength(Code, Code, Code),
}

/// Memory-operand size selection within one entry.
#[derive(Debug, Copy, Clone)]
pub enum MemSel {
    None,
    Fixed(MemorySize),
    /// Plain integer access of the effective operand size.
    Uint,
    /// By operand size, 16-bit vs 32-bit forms (BOUND/LES/LDS).
    ByOpSize(MemorySize, MemorySize),
    /// Vector access by raw L'L, with broadcast variants for EVEX b=1.
    Vector {
        packed: [MemorySize; 3],
        broadcast: [MemorySize; 3],
    },
}

bitflags! {
    /// Per-entry decode properties.
    pub struct EntryFlags: u16 {
        /// A ModRM byte follows the opcode.
        const HAS_MODRM   = 0x0001;
        /// Fixed 8-bit operand size, prefixes notwithstanding.
        const OP8         = 0x0002;
        /// Defaults to 64-bit operand size in 64-bit mode (push/pop/ret/jcc).
        const DEFAULT_OP64 = 0x0004;
        /// LOCK prefix is legal with a memory destination.
        const ALLOW_LOCK  = 0x0008;
        /// EVEX b=1 on a register form encodes embedded rounding control.
        const ER          = 0x0010;
        /// EVEX b=1 on a register form encodes SAE only.
        const SAE_ONLY    = 0x0020;
        /// EVEX b=1 on a memory form encodes broadcast.
        const BROADCAST   = 0x0040;
    }
}

/// One opcode's decode recipe.
#[derive(Debug, Copy, Clone)]
pub struct OpcodeEntry {
    pub code: CodeSel,
    pub ops: &'static [OpEnc],
    pub flags: EntryFlags,
    pub mem: MemSel,
    pub tuple: TupleType,
}

/// A table answer: either one entry, or a group resolved by ModRM.reg
/// (`/digit` forms). Group slots left empty are invalid opcodes.
#[derive(Debug, Clone)]
pub enum TableAnswer {
    Op(OpcodeEntry),
    Group([Option<OpcodeEntry>; 8]),
}

/// Lookup key: everything known before the ModRM byte.
#[derive(Debug, Copy, Clone)]
pub struct TableKey {
    pub mode: ExecutionMode,
    pub encoding: EncodingKind,
    pub map: OpcodeMap,
    pub opcode: u8,
    pub mandatory: MandatoryPrefix,
}

/// The opcode-table collaborator. Must be a pure function of the key;
/// `None` is the explicit "invalid opcode" answer.
pub trait OpcodeTable {
    fn lookup(&self, key: &TableKey) -> Option<TableAnswer>;
}

/// Built-in table covering a representative opcode subset: the ADD and MOV
/// families, push/pop/jcc/ret/nop/int3, the LES/LDS/BOUND legacy forms that
/// collide with vector-prefix signature bytes, and the `0F 58` add and
/// `0F 2E` unordered-compare families across all three encodings.
#[derive(Debug, Default)]
pub struct BuiltinTable;

use self::Code::*;
use self::OpEnc::*;

fn entry(code: CodeSel, ops: &'static [OpEnc], flags: EntryFlags, mem: MemSel, tuple: TupleType) -> TableAnswer {
    TableAnswer::Op(OpcodeEntry { code, ops, flags, mem, tuple })
}

fn by_size(c16: Code, c32: Code, c64: Code) -> CodeSel {
    CodeSel::BySize(c16, c32, c64)
}

impl BuiltinTable {
    fn legacy_one_byte(&self, key: &TableKey) -> Option<TableAnswer> {
        // No one-byte opcode has a mandatory prefix. Reporting a miss here
        // makes the decoder retry without one, keeping the 66/F2/F3 byte in
        // its legacy size-override/rep role.
        if key.mandatory != MandatoryPrefix::None {
            return None;
        }
        let op = key.opcode;
        let modrm = EntryFlags::HAS_MODRM;
        let none = MemSel::None;

        Some(match op {
            // ADD family. The low two opcode bits are the usual D and S
            // bits: direction (reg<->rm) and byte/full operand size.
            0x00 => entry(
                CodeSel::Fixed(Add_rm8_r8),
                &[GprRm, GprReg],
                modrm | EntryFlags::OP8 | EntryFlags::ALLOW_LOCK,
                MemSel::Uint,
                TupleType::None,
            ),
            0x01 => entry(
                by_size(Add_rm16_r16, Add_rm32_r32, Add_rm64_r64),
                &[GprRm, GprReg],
                modrm | EntryFlags::ALLOW_LOCK,
                MemSel::Uint,
                TupleType::None,
            ),
            0x02 => entry(
                CodeSel::Fixed(Add_r8_rm8),
                &[GprReg, GprRm],
                modrm | EntryFlags::OP8,
                MemSel::Uint,
                TupleType::None,
            ),
            0x03 => entry(
                by_size(Add_r16_rm16, Add_r32_rm32, Add_r64_rm64),
                &[GprReg, GprRm],
                modrm,
                MemSel::Uint,
                TupleType::None,
            ),
            0x04 => entry(
                CodeSel::Fixed(Add_AL_imm8),
                &[GprAcc, Imm],
                EntryFlags::OP8,
                none,
                TupleType::None,
            ),
            0x05 => entry(
                by_size(Add_AX_imm16, Add_EAX_imm32, Add_RAX_imm32),
                &[GprAcc, Imm],
                EntryFlags::empty(),
                none,
                TupleType::None,
            ),

            // 0x50-0x5F: push/pop register.
            _ if bitpat!(0 1 0 1 _ _ _ _)(op) => {
                let pop = op & 0x08 != 0;
                let code = if pop {
                    by_size(Pop_r16, Pop_r32, Pop_r64)
                } else {
                    by_size(Push_r16, Push_r32, Push_r64)
                };
                entry(code, &[GprOpcode], EntryFlags::DEFAULT_OP64, none, TupleType::None)
            }

            // 0x62: BOUND. Only reachable in 16/32-bit mode; in 64-bit mode
            // the byte is always an EVEX prefix and never gets here.
            0x62 if key.mode != ExecutionMode::Bits64 => entry(
                by_size(Bound_r16_m1616, Bound_r32_m3232, Bound_r32_m3232),
                &[GprReg, GprRegMemOnly],
                modrm,
                MemSel::ByOpSize(MemorySize::Bound16_WordWord, MemorySize::Bound32_DwordDword),
                TupleType::None,
            ),

            0x74 => entry(
                by_size(Je_rel8_16, Je_rel8_32, Je_rel8_64),
                &[Rel8],
                EntryFlags::DEFAULT_OP64,
                none,
                TupleType::None,
            ),
            0x75 => entry(
                by_size(Jne_rel8_16, Jne_rel8_32, Jne_rel8_64),
                &[Rel8],
                EntryFlags::DEFAULT_OP64,
                none,
                TupleType::None,
            ),

            // MOV family, same D/S bit layout as ADD.
            0x88 => entry(
                CodeSel::Fixed(Mov_rm8_r8),
                &[GprRm, GprReg],
                modrm | EntryFlags::OP8,
                MemSel::Uint,
                TupleType::None,
            ),
            0x89 => entry(
                by_size(Mov_rm16_r16, Mov_rm32_r32, Mov_rm64_r64),
                &[GprRm, GprReg],
                modrm,
                MemSel::Uint,
                TupleType::None,
            ),
            0x8A => entry(
                CodeSel::Fixed(Mov_r8_rm8),
                &[GprReg, GprRm],
                modrm | EntryFlags::OP8,
                MemSel::Uint,
                TupleType::None,
            ),
            0x8B => entry(
                by_size(Mov_r16_rm16, Mov_r32_rm32, Mov_r64_rm64),
                &[GprReg, GprRm],
                modrm,
                MemSel::Uint,
                TupleType::None,
            ),

            0x90 => entry(
                by_size(Nopw, Nopd, Nopq),
                &[],
                EntryFlags::empty(),
                none,
                TupleType::None,
            ),

            // 0xB0-0xBF: mov register, immediate.
            _ if bitpat!(1 0 1 1 _ _ _ _)(op) => {
                if op & 0x08 == 0 {
                    entry(
                        CodeSel::Fixed(Mov_r8_imm8),
                        &[GprOpcode, Imm],
                        EntryFlags::OP8,
                        none,
                        TupleType::None,
                    )
                } else {
                    // The only form that takes a true 64-bit immediate.
                    entry(
                        by_size(Mov_r16_imm16, Mov_r32_imm32, Mov_r64_imm64),
                        &[GprOpcode, ImmFull],
                        EntryFlags::empty(),
                        none,
                        TupleType::None,
                    )
                }
            }

            0xC3 => entry(
                by_size(Retnw, Retnd, Retnq),
                &[],
                EntryFlags::DEFAULT_OP64,
                none,
                TupleType::None,
            ),

            // 0xC4/0xC5: LES/LDS, 16/32-bit mode only (VEX otherwise).
            0xC4 if key.mode != ExecutionMode::Bits64 => entry(
                by_size(Les_r16_m1616, Les_r32_m1632, Les_r32_m1632),
                &[GprReg, GprRegMemOnly],
                modrm,
                MemSel::ByOpSize(MemorySize::SegPtr16, MemorySize::SegPtr32),
                TupleType::None,
            ),
            0xC5 if key.mode != ExecutionMode::Bits64 => entry(
                by_size(Lds_r16_m1616, Lds_r32_m1632, Lds_r32_m1632),
                &[GprReg, GprRegMemOnly],
                modrm,
                MemSel::ByOpSize(MemorySize::SegPtr16, MemorySize::SegPtr32),
                TupleType::None,
            ),

            // 0xC6/0xC7: group 11, only /0 is defined (mov rm, imm).
            0xC6 => {
                let mut slots = [None; 8];
                slots[0] = Some(OpcodeEntry {
                    code: CodeSel::Fixed(Mov_rm8_imm8),
                    ops: &[GprRm, Imm],
                    flags: modrm | EntryFlags::OP8,
                    mem: MemSel::Uint,
                    tuple: TupleType::None,
                });
                TableAnswer::Group(slots)
            }
            0xC7 => {
                let mut slots = [None; 8];
                slots[0] = Some(OpcodeEntry {
                    code: by_size(Mov_rm16_imm16, Mov_rm32_imm32, Mov_rm64_imm32),
                    ops: &[GprRm, Imm],
                    flags: modrm,
                    mem: MemSel::Uint,
                    tuple: TupleType::None,
                });
                TableAnswer::Group(slots)
            }

            0xCC => entry(CodeSel::Fixed(Int3), &[], EntryFlags::empty(), none, TupleType::None),

            _ => return None,
        })
    }

    fn legacy_0f(&self, key: &TableKey) -> Option<TableAnswer> {
        match (key.opcode, key.mandatory) {
            (0x2E, MandatoryPrefix::None) => Some(entry(
                CodeSel::Fixed(Ucomiss_xmm_xmmm32),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM,
                MemSel::Fixed(MemorySize::Float32),
                TupleType::None,
            )),
            (0x2E, MandatoryPrefix::P66) => Some(entry(
                CodeSel::Fixed(Ucomisd_xmm_xmmm64),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM,
                MemSel::Fixed(MemorySize::Float64),
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::None) => Some(entry(
                CodeSel::Fixed(Addps_xmm_xmmm128),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM,
                MemSel::Fixed(MemorySize::Packed128_Float32),
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::P66) => Some(entry(
                CodeSel::Fixed(Addpd_xmm_xmmm128),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM,
                MemSel::Fixed(MemorySize::Packed128_Float64),
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::PF3) => Some(entry(
                CodeSel::Fixed(Addss_xmm_xmmm32),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM,
                MemSel::Fixed(MemorySize::Float32),
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::PF2) => Some(entry(
                CodeSel::Fixed(Addsd_xmm_xmmm64),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM,
                MemSel::Fixed(MemorySize::Float64),
                TupleType::None,
            )),
            _ => None,
        }
    }

    fn vex_0f(&self, key: &TableKey) -> Option<TableAnswer> {
        let modrm = EntryFlags::HAS_MODRM;
        match (key.opcode, key.mandatory) {
            (0x2E, MandatoryPrefix::None) => Some(entry(
                CodeSel::Fixed(VEX_Vucomiss_xmm_xmmm32),
                &[VecReg, VecRm],
                modrm,
                MemSel::Fixed(MemorySize::Float32),
                TupleType::None,
            )),
            (0x2E, MandatoryPrefix::P66) => Some(entry(
                CodeSel::Fixed(VEX_Vucomisd_xmm_xmmm64),
                &[VecReg, VecRm],
                modrm,
                MemSel::Fixed(MemorySize::Float64),
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::None) => Some(entry(
                CodeSel::ByLength(
                    VEX_Vaddps_xmm_xmm_xmmm128,
                    VEX_Vaddps_ymm_ymm_ymmm256,
                    VEX_Vaddps_ymm_ymm_ymmm256,
                ),
                &[VecReg, VecVvvv, VecRm],
                modrm,
                MemSel::Vector {
                    packed: [
                        MemorySize::Packed128_Float32,
                        MemorySize::Packed256_Float32,
                        MemorySize::Packed512_Float32,
                    ],
                    broadcast: [MemorySize::Unknown; 3],
                },
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::P66) => Some(entry(
                CodeSel::ByLength(
                    VEX_Vaddpd_xmm_xmm_xmmm128,
                    VEX_Vaddpd_ymm_ymm_ymmm256,
                    VEX_Vaddpd_ymm_ymm_ymmm256,
                ),
                &[VecReg, VecVvvv, VecRm],
                modrm,
                MemSel::Vector {
                    packed: [
                        MemorySize::Packed128_Float64,
                        MemorySize::Packed256_Float64,
                        MemorySize::Packed512_Float64,
                    ],
                    broadcast: [MemorySize::Unknown; 3],
                },
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::PF3) => Some(entry(
                CodeSel::Fixed(VEX_Vaddss_xmm_xmm_xmmm32),
                &[VecReg, VecVvvv, VecRm],
                modrm,
                MemSel::Fixed(MemorySize::Float32),
                TupleType::None,
            )),
            (0x58, MandatoryPrefix::PF2) => Some(entry(
                CodeSel::Fixed(VEX_Vaddsd_xmm_xmm_xmmm64),
                &[VecReg, VecVvvv, VecRm],
                modrm,
                MemSel::Fixed(MemorySize::Float64),
                TupleType::None,
            )),
            _ => None,
        }
    }

    fn evex_0f(&self, key: &TableKey) -> Option<TableAnswer> {
        let full = EntryFlags::HAS_MODRM | EntryFlags::ER | EntryFlags::BROADCAST;
        match (key.opcode, key.mandatory) {
            // Comparisons never round; their b bit can only mean SAE.
            (0x2E, MandatoryPrefix::None) => Some(entry(
                CodeSel::Fixed(EVEX_Vucomiss_xmm_xmmm32_sae),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM | EntryFlags::SAE_ONLY,
                MemSel::Fixed(MemorySize::Float32),
                TupleType::Tuple1Scalar,
            )),
            (0x2E, MandatoryPrefix::P66) => Some(entry(
                CodeSel::Fixed(EVEX_Vucomisd_xmm_xmmm64_sae),
                &[VecReg, VecRm],
                EntryFlags::HAS_MODRM | EntryFlags::SAE_ONLY,
                MemSel::Fixed(MemorySize::Float64),
                TupleType::Tuple1Scalar,
            )),
            (0x58, MandatoryPrefix::None) => Some(entry(
                CodeSel::ByLength(
                    EVEX_Vaddps_xmm_k1z_xmm_xmmm128b32,
                    EVEX_Vaddps_ymm_k1z_ymm_ymmm256b32,
                    EVEX_Vaddps_zmm_k1z_zmm_zmmm512b32_er,
                ),
                &[VecReg, VecVvvv, VecRm],
                full,
                MemSel::Vector {
                    packed: [
                        MemorySize::Packed128_Float32,
                        MemorySize::Packed256_Float32,
                        MemorySize::Packed512_Float32,
                    ],
                    broadcast: [
                        MemorySize::Broadcast128_Float32,
                        MemorySize::Broadcast256_Float32,
                        MemorySize::Broadcast512_Float32,
                    ],
                },
                TupleType::Full,
            )),
            (0x58, MandatoryPrefix::P66) => Some(entry(
                CodeSel::ByLength(
                    EVEX_Vaddpd_xmm_k1z_xmm_xmmm128b64,
                    EVEX_Vaddpd_ymm_k1z_ymm_ymmm256b64,
                    EVEX_Vaddpd_zmm_k1z_zmm_zmmm512b64_er,
                ),
                &[VecReg, VecVvvv, VecRm],
                full,
                MemSel::Vector {
                    packed: [
                        MemorySize::Packed128_Float64,
                        MemorySize::Packed256_Float64,
                        MemorySize::Packed512_Float64,
                    ],
                    broadcast: [
                        MemorySize::Broadcast128_Float64,
                        MemorySize::Broadcast256_Float64,
                        MemorySize::Broadcast512_Float64,
                    ],
                },
                TupleType::Full,
            )),
            (0x58, MandatoryPrefix::PF3) => Some(entry(
                CodeSel::Fixed(EVEX_Vaddss_xmm_k1z_xmm_xmmm32_er),
                &[VecReg, VecVvvv, VecRm],
                EntryFlags::HAS_MODRM | EntryFlags::ER,
                MemSel::Fixed(MemorySize::Float32),
                TupleType::Tuple1Scalar,
            )),
            (0x58, MandatoryPrefix::PF2) => Some(entry(
                CodeSel::Fixed(EVEX_Vaddsd_xmm_k1z_xmm_xmmm64_er),
                &[VecReg, VecVvvv, VecRm],
                EntryFlags::HAS_MODRM | EntryFlags::ER,
                MemSel::Fixed(MemorySize::Float64),
                TupleType::Tuple1Scalar,
            )),
            _ => None,
        }
    }
}

impl OpcodeTable for BuiltinTable {
    fn lookup(&self, key: &TableKey) -> Option<TableAnswer> {
        match (key.encoding, key.map) {
            (EncodingKind::Legacy, OpcodeMap::Legacy) => self.legacy_one_byte(key),
            (EncodingKind::Legacy, OpcodeMap::Map0F) => self.legacy_0f(key),
            (EncodingKind::Vex, OpcodeMap::Map0F) => self.vex_0f(key),
            (EncodingKind::Evex, OpcodeMap::Map0F) => self.evex_0f(key),
            _ => None,
        }
    }
}
