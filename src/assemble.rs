//! Final instruction assembly.
//!
//! Takes the prefix state, the vector-prefix context and the opcode-table
//! entry and materializes the operand list, reading ModRM/SIB/displacement/
//! immediate bytes off the cursor along the way. This is also where the
//! overloaded EVEX bits get their meaning: the b bit is broadcast for memory
//! forms but rounding/SAE for register forms, and with rounding active the
//! L'L field is the rounding mode rather than a vector length.

use cursor::ByteCursor;
use decoder::{DecodeError, ExecutionMode};
use instr::{DecodedInstruction, InstrFlags, RoundingControl};
use modrm::{self, ModRM, RegExtension, Rm, RmContext};
use num_traits::FromPrimitive;
use operand::{Immediate, MemorySize, OpSize, Operand, Register, RelOffset};
use prefix::{MandatoryPrefix, PrefixState, RawPrefixes};
use table::{CodeSel, EntryFlags, MemSel, OpEnc, OpcodeEntry};
use vex::VectorContext;

/// Everything the decoder front-end has established about one instruction.
#[derive(Debug)]
pub struct AssembleInput<'a> {
    pub mode: ExecutionMode,
    pub prefixes: &'a PrefixState,
    pub vctx: Option<&'a VectorContext>,
    pub entry: OpcodeEntry,
    /// Final opcode byte (for register-in-opcode forms).
    pub opcode: u8,
    pub modrm: Option<ModRM>,
    /// The table matched under the 66/F2/F3 mandatory prefix, which then no
    /// longer acts as a size override or rep prefix.
    pub consumed_mandatory: bool,
}

pub fn assemble(
    cursor: &mut ByteCursor,
    input: &AssembleInput,
) -> Result<DecodedInstruction, DecodeError> {
    let entry = &input.entry;
    let prefixes = input.prefixes;
    let opsize = effective_op_size(input);
    let reg_form = input.modrm.map(|m| m.is_reg()).unwrap_or(true);

    let mut flags = InstrFlags::empty();
    let mut rounding = RoundingControl::None;
    let mut broadcast = false;

    // Resolve the overloaded EVEX bits before anything else; they decide
    // both the instruction kind and the memory size.
    let raw_ll = input.vctx.map(|c| c.ll).unwrap_or(0);
    let mut length_index = raw_ll;
    if let Some(ctx) = input.vctx {
        if ctx.z {
            if ctx.aaa == 0 {
                return Err(DecodeError::invalid("zeroing-masking without an opmask"));
            }
            flags |= InstrFlags::ZEROING;
        }
        if ctx.bcst {
            if reg_form {
                if entry.flags.contains(EntryFlags::SAE_ONLY) {
                    flags |= InstrFlags::SAE;
                } else if entry.flags.contains(EntryFlags::ER) {
                    // L'L is the rounding mode here, and the operands are
                    // full-width regardless of it.
                    rounding = RoundingControl::from_u8(raw_ll + 1)
                        .expect("2-bit field plus one is always a rounding mode");
                    length_index = 2;
                } else {
                    return Err(DecodeError::invalid("rounding not supported here"));
                }
            } else if entry.flags.contains(EntryFlags::BROADCAST) {
                flags |= InstrFlags::BROADCAST;
                broadcast = true;
            } else {
                return Err(DecodeError::invalid("broadcast not supported here"));
            }
        }
    }

    let code = match entry.code {
        CodeSel::Fixed(code) => {
            length_index = 0;
            code
        }
        CodeSel::BySize(c16, c32, c64) => match opsize {
            OpSize::Bits16 => c16,
            OpSize::Bits64 => c64,
            _ => c32,
        },
        CodeSel::ByLength(l128, l256, l512) => match length_index {
            0 => l128,
            1 => l256,
            2 => l512,
            _ => return Err(DecodeError::invalid("reserved vector length")),
        },
    };
    let vlen: u16 = match length_index {
        0 => 128,
        1 => 256,
        _ => 512,
    };

    let mem_size = match entry.mem {
        MemSel::None => MemorySize::Unknown,
        MemSel::Fixed(size) => size,
        MemSel::Uint => MemorySize::uint(opsize),
        MemSel::ByOpSize(m16, m32) => {
            if opsize == OpSize::Bits16 {
                m16
            } else {
                m32
            }
        }
        MemSel::Vector { packed, broadcast: bcst } => {
            if broadcast {
                bcst[length_index as usize]
            } else {
                packed[length_index as usize]
            }
        }
    };

    let ext = RegExtension::from_prefixes(prefixes, input.vctx);
    let disp8n = input
        .vctx
        .map(|c| entry.tuple.disp8n((vlen / 8) as u8, c.w, broadcast))
        .unwrap_or(1);
    let rm_ctx = RmContext {
        mode: input.mode,
        prefixes,
        ext,
        mem_size,
        disp8n,
    };
    // Resolved lazily: the rm operand is not always first in the template,
    // but its displacement bytes precede any immediate.
    let mut resolved_rm = None;
    let rex_present = prefixes.rex.is_some();

    let mut operands = Vec::with_capacity(entry.ops.len());
    for &op in entry.ops {
        let operand: Operand = match op {
            OpEnc::GprReg => {
                let modrm = require_modrm(input)?;
                Register::gpr(opsize, modrm.reg() + ext.reg_bits(), rex_present).into()
            }
            OpEnc::GprRm => {
                let modrm = require_modrm(input)?;
                match resolve_rm_once(cursor, modrm, &rm_ctx, &mut resolved_rm)? {
                    Rm::Reg(num) => Register::gpr(opsize, num, rex_present).into(),
                    Rm::Mem(mem) => mem.into(),
                }
            }
            OpEnc::GprAcc => Register::gpr(opsize, 0, false).into(),
            OpEnc::GprOpcode => {
                let num = (input.opcode & 7) + ext.base_bits();
                Register::gpr(opsize, num, rex_present).into()
            }
            OpEnc::Imm => read_imm(cursor, opsize, false)?.into(),
            OpEnc::ImmFull => read_imm(cursor, opsize, true)?.into(),
            OpEnc::Rel8 => RelOffset {
                offset: cursor.read_i8()? as i64,
                size: OpSize::Bits8,
            }
            .into(),
            OpEnc::VecReg => {
                let modrm = require_modrm(input)?;
                Register::vec(vlen, modrm.reg() + ext.reg_bits()).into()
            }
            OpEnc::VecVvvv => {
                let ctx = input
                    .vctx
                    .ok_or_else(|| DecodeError::invalid("vvvv operand without a vector prefix"))?;
                Register::vec(vlen, ctx.vvvv).into()
            }
            OpEnc::VecRm => {
                let modrm = require_modrm(input)?;
                match resolve_rm_once(cursor, modrm, &rm_ctx, &mut resolved_rm)? {
                    Rm::Reg(num) => Register::vec(vlen, num).into(),
                    Rm::Mem(mem) => mem.into(),
                }
            }
            OpEnc::GprRegMemOnly => {
                let modrm = require_modrm(input)?;
                match resolve_rm_once(cursor, modrm, &rm_ctx, &mut resolved_rm)? {
                    Rm::Reg(_) => {
                        return Err(DecodeError::invalid("memory operand required"))
                    }
                    Rm::Mem(mem) => mem.into(),
                }
            }
        };
        operands.push(operand);
    }

    // rep/lock surfacing. A mandatory-prefix table match already spent the
    // F2/F3 byte, so it must not reappear as a rep flag.
    if !input.consumed_mandatory {
        if prefixes.has(RawPrefixes::REPE) {
            flags |= InstrFlags::REPE;
        }
        if prefixes.has(RawPrefixes::REPNE) {
            flags |= InstrFlags::REPNE;
        }
    }
    if prefixes.has(RawPrefixes::LOCK) {
        let mem_dest = match operands.first() {
            Some(&Operand::Mem(_)) => true,
            _ => false,
        };
        if entry.flags.contains(EntryFlags::ALLOW_LOCK) && mem_dest {
            flags |= InstrFlags::LOCK;
        } else {
            flags |= InstrFlags::INVALID_LOCK;
        }
    }

    Ok(DecodedInstruction {
        code,
        operands,
        len: 0, // patched by the caller once the cursor settles
        flags,
        segment_override: prefixes.segment,
        opmask: input.vctx.and_then(|c| c.opmask()),
        rounding,
    })
}

fn require_modrm(input: &AssembleInput) -> Result<ModRM, DecodeError> {
    input
        .modrm
        .ok_or_else(|| DecodeError::invalid("entry requires a ModRM byte"))
}

fn resolve_rm_once(
    cursor: &mut ByteCursor,
    modrm: ModRM,
    ctx: &RmContext,
    cache: &mut Option<Rm>,
) -> Result<Rm, DecodeError> {
    // Rm is tiny; re-resolving would re-read displacement bytes, so the
    // first resolution is cached and copied out.
    if cache.is_none() {
        *cache = Some(modrm::resolve(cursor, modrm, ctx)?);
    }
    Ok(match cache {
        Some(Rm::Reg(num)) => Rm::Reg(*num),
        Some(Rm::Mem(mem)) => Rm::Mem(*mem),
        None => unreachable!(),
    })
}

fn read_imm(cursor: &mut ByteCursor, opsize: OpSize, full: bool) -> Result<Immediate, DecodeError> {
    Ok(match opsize {
        OpSize::Bits8 => Immediate::Imm8(cursor.read_i8()?),
        OpSize::Bits16 => Immediate::Imm16(cursor.read_i16()?),
        OpSize::Bits32 => Immediate::Imm32(cursor.read_i32()?),
        OpSize::Bits64 => {
            if full {
                Immediate::Imm64(cursor.read_u64()? as i64)
            } else {
                // Everything except `mov r64, imm64` sign-extends an imm32.
                Immediate::Imm64(cursor.read_i32()? as i64)
            }
        }
    })
}

/// Effective operand size for this entry.
fn effective_op_size(input: &AssembleInput) -> OpSize {
    let entry = &input.entry;
    if entry.flags.contains(EntryFlags::OP8) {
        return OpSize::Bits8;
    }
    if input.prefixes.rex.map(|r| r.w).unwrap_or(false) {
        return OpSize::Bits64;
    }

    // A consumed 66 mandatory prefix loses its size-override meaning.
    let mut flipped = input.prefixes.has(RawPrefixes::OVERRIDE_OPERAND);
    if input.consumed_mandatory && input.prefixes.mandatory == MandatoryPrefix::P66 {
        flipped = false;
    }

    let mut size = match input.mode {
        ExecutionMode::Bits16 => {
            if flipped { OpSize::Bits32 } else { OpSize::Bits16 }
        }
        _ => {
            if flipped { OpSize::Bits16 } else { OpSize::Bits32 }
        }
    };
    // Stack and branch instructions cannot be 32-bit in 64-bit mode.
    if entry.flags.contains(EntryFlags::DEFAULT_OP64)
        && input.mode == ExecutionMode::Bits64
        && size != OpSize::Bits16
    {
        size = OpSize::Bits64;
    }
    size
}
