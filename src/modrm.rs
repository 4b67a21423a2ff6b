//! ModRM/SIB decoding and effective-address resolution.
//!
//! The ModRM byte either names a register (mod == 11) or describes a memory
//! operand whose shape depends on the effective *address* size: 16-bit
//! addressing uses a fixed base/index table, 32/64-bit addressing may pull in
//! a SIB byte. Register numbers coming out of here are already widened by the
//! REX/VEX/EVEX extension bits; the caller only picks the register class.

use cursor::ByteCursor;
use decoder::{DecodeError, ExecutionMode};
use operand::{MemoryOperand, MemorySize, OpSize, Register, Segment};
use prefix::PrefixState;
use vex::{VectorContext, VexKind};

/// View over a raw ModRM byte.
#[derive(Debug, Copy, Clone)]
pub struct ModRM(pub u8);

impl ModRM {
    pub fn mod_(&self) -> u8 {
        self.0 >> 6
    }

    pub fn reg(&self) -> u8 {
        (self.0 >> 3) & 7
    }

    pub fn rm(&self) -> u8 {
        self.0 & 7
    }

    /// Register form (no memory access).
    pub fn is_reg(&self) -> bool {
        self.mod_() == 3
    }
}

/// View over a raw SIB byte.
#[derive(Debug, Copy, Clone)]
struct Sib(u8);

impl Sib {
    fn scale(&self) -> u8 {
        1 << (self.0 >> 6)
    }

    fn index(&self) -> u8 {
        (self.0 >> 3) & 7
    }

    fn base(&self) -> u8 {
        self.0 & 7
    }
}

/// Register-number extension bits from whichever prefix scheme is active.
///
/// The EVEX scheme reuses X as a second rm-extension bit for register forms,
/// which is why the reg-form and memory-form helpers differ.
#[derive(Debug, Copy, Clone)]
pub enum RegExtension {
    None,
    Rex { r: bool, x: bool, b: bool },
    Vex { r: bool, x: bool, b: bool },
    Evex { r: bool, x: bool, b: bool, r2: bool },
}

impl RegExtension {
    pub fn from_prefixes(prefixes: &PrefixState, vctx: Option<&VectorContext>) -> Self {
        match vctx {
            Some(ctx) => match ctx.kind {
                VexKind::Evex => RegExtension::Evex {
                    r: ctx.r,
                    x: ctx.x,
                    b: ctx.b,
                    r2: ctx.r2,
                },
                _ => RegExtension::Vex {
                    r: ctx.r,
                    x: ctx.x,
                    b: ctx.b,
                },
            },
            None => match prefixes.rex {
                Some(rex) => RegExtension::Rex {
                    r: rex.r,
                    x: rex.x,
                    b: rex.b,
                },
                None => RegExtension::None,
            },
        }
    }

    /// Bits added to ModRM.reg (R, plus EVEX R' for registers 16-31).
    pub fn reg_bits(&self) -> u8 {
        match *self {
            RegExtension::None => 0,
            RegExtension::Rex { r, .. } | RegExtension::Vex { r, .. } => (r as u8) << 3,
            RegExtension::Evex { r, r2, .. } => (r as u8) << 3 | (r2 as u8) << 4,
        }
    }

    /// Bits added to ModRM.rm in *register* form. EVEX reuses X as the fifth
    /// register bit here since no SIB index exists.
    pub fn rm_reg_bits(&self) -> u8 {
        match *self {
            RegExtension::None => 0,
            RegExtension::Rex { b, .. } | RegExtension::Vex { b, .. } => (b as u8) << 3,
            RegExtension::Evex { b, x, .. } => (b as u8) << 3 | (x as u8) << 4,
        }
    }

    /// Bits added to a memory base register (ModRM.rm or SIB.base).
    pub fn base_bits(&self) -> u8 {
        match *self {
            RegExtension::None => 0,
            RegExtension::Rex { b, .. }
            | RegExtension::Vex { b, .. }
            | RegExtension::Evex { b, .. } => (b as u8) << 3,
        }
    }

    /// Bits added to the SIB index register.
    pub fn index_bits(&self) -> u8 {
        match *self {
            RegExtension::None => 0,
            RegExtension::Rex { x, .. }
            | RegExtension::Vex { x, .. }
            | RegExtension::Evex { x, .. } => (x as u8) << 3,
        }
    }

    fn extends_rm(&self) -> bool {
        self.rm_reg_bits() != 0 || self.index_bits() != 0
    }
}

/// Resolved ModRM.rm operand: either a widened register number (class chosen
/// by the caller) or a full memory operand.
#[derive(Debug)]
pub enum Rm {
    Reg(u8),
    Mem(MemoryOperand),
}

/// Everything the resolver needs besides the ModRM byte itself.
#[derive(Debug)]
pub struct RmContext<'a> {
    pub mode: ExecutionMode,
    pub prefixes: &'a PrefixState,
    pub ext: RegExtension,
    /// Size tag attached to a resulting memory operand.
    pub mem_size: MemorySize,
    /// Scale factor for a disp8 byte (EVEX compressed displacement); 1
    /// everywhere else.
    pub disp8n: u32,
}

/// Resolves ModRM.rm, reading SIB and displacement bytes as needed.
pub fn resolve(
    cursor: &mut ByteCursor,
    modrm: ModRM,
    ctx: &RmContext,
) -> Result<Rm, DecodeError> {
    if modrm.is_reg() {
        return Ok(Rm::Reg(modrm.rm() + ctx.ext.rm_reg_bits()));
    }
    let mem = match ctx.prefixes.address_size(ctx.mode) {
        OpSize::Bits16 => mem16(cursor, modrm, ctx)?,
        addr => mem32_64(cursor, modrm, ctx, addr)?,
    };
    Ok(Rm::Mem(mem))
}

fn scaled_disp8(cursor: &mut ByteCursor, ctx: &RmContext) -> Result<i64, DecodeError> {
    Ok(cursor.read_i8()? as i64 * ctx.disp8n as i64)
}

/// 16-bit addressing: fixed base/index pairs, no SIB byte.
fn mem16(cursor: &mut ByteCursor, modrm: ModRM, ctx: &RmContext) -> Result<MemoryOperand, DecodeError> {
    // Extended registers do not exist in 16-bit addressing.
    if ctx.ext.extends_rm() {
        return Err(DecodeError::modrm(
            "register extension bits with 16-bit addressing",
        ));
    }

    let word = |num: u8| Register::gpr(OpSize::Bits16, num, false);
    // rm -> (base, index); BX=3, BP=5, SI=6, DI=7.
    static PAIRS: [(u8, Option<u8>); 8] = [
        (3, Some(6)), // [bx+si]
        (3, Some(7)), // [bx+di]
        (5, Some(6)), // [bp+si]
        (5, Some(7)), // [bp+di]
        (6, None),    // [si]
        (7, None),    // [di]
        (5, None),    // [bp] (disp16-only when mod == 00)
        (3, None),    // [bx]
    ];

    let (mut base, index) = PAIRS[modrm.rm() as usize];
    let mut op = MemoryOperand {
        segment: Segment::Ds,
        base: Some(word(base)),
        index: index.map(word),
        scale: 1,
        displ: 0,
        displ_size: 0,
        size: ctx.mem_size,
    };

    match modrm.mod_() {
        0 if modrm.rm() == 6 => {
            // Pure disp16, no base register.
            op.base = None;
            base = 0xFF;
            op.displ = cursor.read_i16()? as i64;
            op.displ_size = 2;
        }
        0 => {}
        1 => {
            op.displ = scaled_disp8(cursor, ctx)?;
            op.displ_size = 1;
        }
        _ => {
            op.displ = cursor.read_i16()? as i64;
            op.displ_size = 2;
        }
    }

    let default = if base == 5 { Segment::Ss } else { Segment::Ds };
    op.segment = ctx.prefixes.segment(default);
    Ok(op)
}

/// 32/64-bit addressing with an optional SIB byte.
fn mem32_64(
    cursor: &mut ByteCursor,
    modrm: ModRM,
    ctx: &RmContext,
    addr: OpSize,
) -> Result<MemoryOperand, DecodeError> {
    let gpr = |num: u8| Register::gpr(addr, num, false);
    let mut op = MemoryOperand {
        segment: Segment::Ds,
        base: None,
        index: None,
        scale: 1,
        displ: 0,
        displ_size: 0,
        size: ctx.mem_size,
    };

    let has_sib = modrm.rm() == 4;
    if has_sib {
        let sib = Sib(cursor.read()?);
        op.scale = sib.scale();
        let index = sib.index() + ctx.ext.index_bits();
        // Encoding 4 (ESP/RSP) with no extension bit means "no index".
        if index != 4 {
            op.index = Some(gpr(index));
        }
        if sib.base() == 5 && modrm.mod_() == 0 {
            // disp32 with no base register.
            op.displ = cursor.read_i32()? as i64;
            op.displ_size = 4;
        } else {
            op.base = Some(gpr(sib.base() + ctx.ext.base_bits()));
        }
    } else if modrm.mod_() == 0 && modrm.rm() == 5 {
        // 64-bit mode: RIP-relative (EIP-relative under a 67 prefix).
        // 16/32-bit mode: absolute disp32.
        op.displ = cursor.read_i32()? as i64;
        op.displ_size = 4;
        if ctx.mode == ExecutionMode::Bits64 {
            op.base = Some(if addr == OpSize::Bits64 {
                Register::rip()
            } else {
                Register::eip()
            });
        }
    } else {
        op.base = Some(gpr(modrm.rm() + ctx.ext.base_bits()));
    }

    match modrm.mod_() {
        1 => {
            op.displ = scaled_disp8(cursor, ctx)?;
            op.displ_size = 1;
        }
        2 => {
            op.displ = cursor.read_i32()? as i64;
            op.displ_size = 4;
        }
        _ => {}
    }

    let default = match op.base {
        Some(base) if base.is_stack_family() => Segment::Ss,
        _ => Segment::Ds,
    };
    op.segment = ctx.prefixes.segment(default);
    Ok(op)
}
