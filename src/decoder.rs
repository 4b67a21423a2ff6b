//! The decoder facade tying all stages together.
//!
//! One `decode` call runs the fixed pipeline: prefix scan, vector-prefix
//! recognition, opcode/escape bytes, table lookup, then operand assembly.
//! Failures never leave a partial instruction behind; the decoder's position
//! only advances on success, so the caller decides how to resynchronize.

use std::fmt;

use assemble::{self, AssembleInput};
use cursor::{ByteCursor, OutOfData, ReadError};
use instr::DecodedInstruction;
use modrm::ModRM;
use prefix::{self, MandatoryPrefix};
use table::{BuiltinTable, EncodingKind, EntryFlags, OpcodeMap, OpcodeTable, TableAnswer, TableKey};
use vex::{self, VexKind};

/// CPU execution mode the byte stream targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    Bits16,
    Bits32,
    Bits64,
}

/// Why a decode attempt failed.
///
/// `OutOfData` is the only data-driven failure: the buffer ended
/// mid-instruction and more input would help. The other two mean the bytes
/// can never form a valid instruction — that includes running past the
/// architectural 15-byte length limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The instruction needs more bytes than the buffer holds.
    OutOfData,
    /// The bytes violate an encoding rule or name an undefined opcode.
    InvalidEncoding(String),
    /// ModRM requests an addressing form that cannot exist in this mode.
    InvalidModRM(String),
}

impl DecodeError {
    #[cold]
    pub fn invalid<S: Into<String>>(why: S) -> Self {
        DecodeError::InvalidEncoding(why.into())
    }

    #[cold]
    pub fn modrm<S: Into<String>>(why: S) -> Self {
        DecodeError::InvalidModRM(why.into())
    }
}

impl From<OutOfData> for DecodeError {
    fn from(_: OutOfData) -> Self {
        DecodeError::OutOfData
    }
}

impl From<ReadError> for DecodeError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::OutOfData => DecodeError::OutOfData,
            // A 16th byte can never become valid, no matter how much more
            // input arrives.
            ReadError::TooLong => DecodeError::invalid("instruction longer than 15 bytes"),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::OutOfData => f.write_str("ran out of instruction bytes"),
            DecodeError::InvalidEncoding(why) => write!(f, "invalid encoding: {}", why),
            DecodeError::InvalidModRM(why) => write!(f, "invalid addressing form: {}", why),
        }
    }
}

/// Streaming instruction decoder over a byte slice.
pub struct Decoder<'a, T: OpcodeTable> {
    bytes: &'a [u8],
    pos: usize,
    mode: ExecutionMode,
    table: T,
    last_len: usize,
}

impl<'a, T: OpcodeTable> fmt::Debug for Decoder<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("mode", &self.mode)
            .field("pos", &self.pos)
            .finish()
    }
}

impl<'a> Decoder<'a, BuiltinTable> {
    pub fn new(mode: ExecutionMode, bytes: &'a [u8]) -> Self {
        Self::with_table(mode, bytes, BuiltinTable::default())
    }
}

impl<'a, T: OpcodeTable> Decoder<'a, T> {
    /// Decoder with a caller-supplied opcode table.
    pub fn with_table(mode: ExecutionMode, bytes: &'a [u8], table: T) -> Self {
        Self {
            bytes,
            pos: 0,
            mode,
            table,
            last_len: 0,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Offset of the next instruction to decode.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn can_decode(&self) -> bool {
        self.pos < self.bytes.len()
    }

    /// Bytes consumed by the last `decode` call, successful or not. After a
    /// failure this is how far the attempt got before giving up; the
    /// decoder's own position does not move.
    pub fn last_attempt_len(&self) -> usize {
        self.last_len
    }

    /// Decodes the instruction at the current position, advancing past it
    /// on success.
    pub fn decode(&mut self) -> Result<DecodedInstruction, DecodeError> {
        let mut cursor = ByteCursor::new(self.bytes, self.pos);
        let result = self.decode_one(&mut cursor);
        self.last_len = cursor.consumed();
        if result.is_ok() {
            self.pos = cursor.position();
        }
        result
    }

    fn decode_one(&self, cursor: &mut ByteCursor) -> Result<DecodedInstruction, DecodeError> {
        let prefixes = prefix::scan(cursor, self.mode)?;
        let vctx = vex::try_parse(cursor, self.mode, &prefixes)?;

        let (encoding, map, opcode, mandatory) = match &vctx {
            Some(ctx) => {
                let encoding = match ctx.kind {
                    VexKind::Evex => EncodingKind::Evex,
                    _ => EncodingKind::Vex,
                };
                (encoding, ctx.map, cursor.read()?, ctx.pp)
            }
            None => {
                let (map, opcode) = read_opcode(cursor)?;
                (EncodingKind::Legacy, map, opcode, prefixes.mandatory)
            }
        };
        trace!(
            "opcode {:02x} in {:?}/{:?}, mandatory prefix {:?}",
            opcode, encoding, map, mandatory
        );

        let mut key = TableKey {
            mode: self.mode,
            encoding,
            map,
            opcode,
            mandatory,
        };
        // An exact match under a 66/F2/F3 prefix consumes it; otherwise the
        // prefix keeps its legacy meaning and the base entry applies.
        let mut consumed_mandatory = mandatory != MandatoryPrefix::None;
        let answer = match self.table.lookup(&key) {
            Some(answer) => answer,
            None if encoding == EncodingKind::Legacy && mandatory != MandatoryPrefix::None => {
                key.mandatory = MandatoryPrefix::None;
                consumed_mandatory = false;
                match self.table.lookup(&key) {
                    Some(answer) => answer,
                    None => return Err(undefined(&key)),
                }
            }
            None => return Err(undefined(&key)),
        };

        let (entry, modrm) = match answer {
            TableAnswer::Op(entry) => {
                let modrm = if entry.flags.contains(EntryFlags::HAS_MODRM) {
                    Some(ModRM(cursor.read()?))
                } else {
                    None
                };
                (entry, modrm)
            }
            TableAnswer::Group(slots) => {
                let modrm = ModRM(cursor.read()?);
                match slots[modrm.reg() as usize] {
                    Some(entry) => (entry, Some(modrm)),
                    None => {
                        return Err(DecodeError::invalid(format!(
                            "undefined group encoding /{}",
                            modrm.reg()
                        )))
                    }
                }
            }
        };

        let mut instr = assemble::assemble(
            cursor,
            &AssembleInput {
                mode: self.mode,
                prefixes: &prefixes,
                vctx: vctx.as_ref(),
                entry,
                opcode,
                modrm,
                consumed_mandatory,
            },
        )?;
        instr.len = cursor.consumed() as u8;
        Ok(instr)
    }
}

/// Reads the opcode byte(s), following the 0F / 0F 38 / 0F 3A escapes.
fn read_opcode(cursor: &mut ByteCursor) -> Result<(OpcodeMap, u8), ReadError> {
    let byte = cursor.read()?;
    if byte != 0x0F {
        return Ok((OpcodeMap::Legacy, byte));
    }
    let byte = cursor.read()?;
    match byte {
        0x38 => Ok((OpcodeMap::Map0F38, cursor.read()?)),
        0x3A => Ok((OpcodeMap::Map0F3A, cursor.read()?)),
        _ => Ok((OpcodeMap::Map0F, byte)),
    }
}

#[cold]
fn undefined(key: &TableKey) -> DecodeError {
    DecodeError::invalid(format!(
        "undefined opcode {:02x} in {:?}/{:?}",
        key.opcode, key.encoding, key.map
    ))
}

#[cfg(test)]
mod tests {
    extern crate env_logger;

    use super::ExecutionMode::*;
    use super::*;
    use instr::RoundingControl;
    use operand::*;
    use table::Code;

    fn hex(s: &str) -> Vec<u8> {
        let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        assert!(digits.len() % 2 == 0, "odd hex string {:?}", s);
        (0..digits.len() / 2)
            .map(|i| u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).unwrap())
            .collect()
    }

    fn try_decode(mode: ExecutionMode, s: &str) -> Result<DecodedInstruction, DecodeError> {
        let _ = env_logger::try_init();
        let bytes = hex(s);
        let mut decoder = Decoder::new(mode, &bytes);
        let result = decoder.decode();
        if let Ok(ref instr) = result {
            assert_eq!(
                instr.byte_len(),
                bytes.len(),
                "instruction did not consume all bytes of {:?}",
                s
            );
            assert_eq!(decoder.position(), bytes.len());
        }
        result
    }

    fn decode(mode: ExecutionMode, s: &str) -> DecodedInstruction {
        match try_decode(mode, s) {
            Ok(instr) => instr,
            Err(e) => panic!("failed to decode {:?}: {}", s, e),
        }
    }

    fn mem_op(instr: &DecodedInstruction, n: usize) -> MemoryOperand {
        match *instr.op(n) {
            Operand::Mem(mem) => mem,
            ref other => panic!("operand {} is {:?}, not memory", n, other),
        }
    }

    fn reg_op(instr: &DecodedInstruction, n: usize) -> Register {
        match *instr.op(n) {
            Operand::Reg(reg) => reg,
            ref other => panic!("operand {} is {:?}, not a register", n, other),
        }
    }

    #[test]
    fn addps_with_16_bit_addressing() {
        let instr = decode(Bits16, "0F58 08");
        assert_eq!(instr.code(), Code::Addps_xmm_xmmm128);
        assert_eq!(instr.byte_len(), 3);
        assert_eq!(reg_op(&instr, 0), Register::xmm(1));
        let mem = mem_op(&instr, 1);
        assert_eq!(mem.segment, Segment::Ds);
        assert_eq!(mem.base, Some(Register::new(RegClass::Word, 3))); // bx
        assert_eq!(mem.index, Some(Register::new(RegClass::Word, 6))); // si
        assert_eq!(mem.displ, 0);
        assert_eq!(mem.displ_size, 0);
        assert_eq!(mem.size, MemorySize::Packed128_Float32);
    }

    #[test]
    fn mandatory_66_selects_addpd() {
        let instr = decode(Bits16, "66 0F58 08");
        assert_eq!(instr.code(), Code::Addpd_xmm_xmmm128);
        assert_eq!(instr.byte_len(), 4);
        assert_eq!(mem_op(&instr, 1).size, MemorySize::Packed128_Float64);
    }

    #[test]
    fn mandatory_f3_is_consumed() {
        let instr = decode(Bits32, "F3 0F58 C1");
        assert_eq!(instr.code(), Code::Addss_xmm_xmmm32);
        assert!(!instr.has_repe());
        assert_eq!(reg_op(&instr, 1), Register::xmm(1));
    }

    #[test]
    fn unconsumed_rep_is_surfaced() {
        let instr = decode(Bits32, "F3 90");
        assert_eq!(instr.code(), Code::Nopd);
        assert!(instr.has_repe());
    }

    #[test]
    fn evex_broadcast_with_compressed_disp8() {
        let instr = decode(Bits16, "62 F14C9D 58 50 01");
        assert_eq!(instr.code(), Code::EVEX_Vaddps_xmm_k1z_xmm_xmmm128b32);
        assert_eq!(instr.byte_len(), 7);
        assert_eq!(reg_op(&instr, 0), Register::xmm(2));
        assert_eq!(reg_op(&instr, 1), Register::xmm(6));
        assert_eq!(instr.opmask(), Some(Register::mask(5)));
        assert!(instr.zeroing_masking());
        assert!(instr.is_broadcast());
        let mem = mem_op(&instr, 2);
        assert_eq!(mem.size, MemorySize::Broadcast128_Float32);
        // disp8 of 1 scaled by the 4-byte broadcast element.
        assert_eq!(mem.displ, 4);
        assert_eq!(mem.displ_size, 1);
        assert_eq!(mem.base, Some(Register::new(RegClass::Word, 3)));
        assert_eq!(mem.index, Some(Register::new(RegClass::Word, 6)));
    }

    #[test]
    fn evex_register_form_rounding() {
        let instr = decode(Bits16, "62 F14CDB 58 D3");
        assert_eq!(instr.code(), Code::EVEX_Vaddps_zmm_k1z_zmm_zmmm512b32_er);
        assert_eq!(instr.byte_len(), 6);
        assert_eq!(reg_op(&instr, 0), Register::zmm(2));
        assert_eq!(reg_op(&instr, 1), Register::zmm(6));
        assert_eq!(reg_op(&instr, 2), Register::zmm(3));
        assert_eq!(instr.rounding_control(), RoundingControl::RoundUp);
        assert!(instr.zeroing_masking());
        assert!(!instr.is_broadcast());
        assert_eq!(instr.opmask(), Some(Register::mask(3)));
    }

    #[test]
    fn evex_rounding_forces_full_width() {
        // Same register form with L'L = 00: the field is the rounding mode
        // (round-to-nearest), not a 128-bit length.
        let instr = decode(Bits64, "62 F14C1B 58 D3");
        assert_eq!(instr.code(), Code::EVEX_Vaddps_zmm_k1z_zmm_zmmm512b32_er);
        assert_eq!(instr.rounding_control(), RoundingControl::RoundToNearest);
        assert_eq!(reg_op(&instr, 0), Register::zmm(2));
    }

    #[test]
    fn evex_extended_registers() {
        let instr = decode(Bits64, "62 E10C0B 58 D3");
        assert_eq!(instr.code(), Code::EVEX_Vaddps_xmm_k1z_xmm_xmmm128b32);
        assert_eq!(instr.byte_len(), 6);
        assert_eq!(reg_op(&instr, 0), Register::xmm(18));
        assert_eq!(reg_op(&instr, 1), Register::xmm(14));
        assert_eq!(reg_op(&instr, 2), Register::xmm(3));
        assert_eq!(instr.opmask(), Some(Register::mask(3)));
        assert_eq!(instr.rounding_control(), RoundingControl::None);
    }

    #[test]
    fn evex_comparison_suppresses_exceptions() {
        // vucomiss never rounds, so b on the register form means SAE.
        let instr = decode(Bits64, "62 F17C18 2E D3");
        assert_eq!(instr.code(), Code::EVEX_Vucomiss_xmm_xmmm32_sae);
        assert_eq!(instr.byte_len(), 6);
        assert!(instr.suppress_all_exceptions());
        assert_eq!(instr.rounding_control(), RoundingControl::None);
        assert_eq!(reg_op(&instr, 0), Register::xmm(2));
        assert_eq!(reg_op(&instr, 1), Register::xmm(3));

        // Without b there is nothing to suppress.
        let instr = decode(Bits64, "62 F17C08 2E D3");
        assert_eq!(instr.code(), Code::EVEX_Vucomiss_xmm_xmmm32_sae);
        assert!(!instr.suppress_all_exceptions());
    }

    #[test]
    fn evex_comparison_rejects_broadcast() {
        // b on the memory form would mean broadcast, which a scalar
        // comparison does not have.
        assert!(match try_decode(Bits64, "62 F17C18 2E 13") {
            Err(DecodeError::InvalidEncoding(_)) => true,
            other => panic!("unexpected result {:?}", other),
        });
    }

    #[test]
    fn legacy_comparison_memory_size() {
        let instr = decode(Bits32, "66 0F2E 08");
        assert_eq!(instr.code(), Code::Ucomisd_xmm_xmmm64);
        assert_eq!(reg_op(&instr, 0), Register::xmm(1));
        assert_eq!(mem_op(&instr, 1).size, MemorySize::Float64);
    }

    #[test]
    fn evex_zeroing_needs_an_opmask() {
        assert!(match try_decode(Bits16, "62 F14C80 58 D3") {
            Err(DecodeError::InvalidEncoding(_)) => true,
            other => panic!("unexpected result {:?}", other),
        });
    }

    #[test]
    fn vex_lengths() {
        let instr = decode(Bits32, "C5 F0 58 D9");
        assert_eq!(instr.code(), Code::VEX_Vaddps_xmm_xmm_xmmm128);
        assert_eq!(reg_op(&instr, 0), Register::xmm(3));
        assert_eq!(reg_op(&instr, 1), Register::xmm(1));
        assert_eq!(reg_op(&instr, 2), Register::xmm(1));

        let instr = decode(Bits32, "C5 F4 58 D9");
        assert_eq!(instr.code(), Code::VEX_Vaddps_ymm_ymm_ymmm256);
        assert_eq!(reg_op(&instr, 0), Register::ymm(3));
    }

    #[test]
    fn bound_and_les_survive_in_32_bit_mode() {
        // The vector signature bytes stay legacy opcodes when the next
        // byte's mod field is not 11.
        let instr = decode(Bits32, "62 08");
        assert_eq!(instr.code(), Code::Bound_r32_m3232);
        assert_eq!(reg_op(&instr, 0), Register::new(RegClass::Dword, 1));
        assert_eq!(mem_op(&instr, 1).size, MemorySize::Bound32_DwordDword);

        let instr = decode(Bits32, "C4 08");
        assert_eq!(instr.code(), Code::Les_r32_m1632);
        assert_eq!(mem_op(&instr, 1).size, MemorySize::SegPtr32);

        let instr = decode(Bits16, "C5 10");
        assert_eq!(instr.code(), Code::Lds_r16_m1616);
        assert_eq!(mem_op(&instr, 1).size, MemorySize::SegPtr16);
    }

    #[test]
    fn mod_11_after_62_selects_evex_even_in_16_bit_mode() {
        // BOUND takes a memory operand only, which is exactly why mod == 11
        // after 0x62 flips to the EVEX reading. With a 66 prefix in front
        // that reading is then rejected as a prefix clash, not as BOUND.
        assert!(decode_fails(Bits16, "66 62 F14C9D 58 D3"));
    }

    fn decode_fails(mode: ExecutionMode, s: &str) -> bool {
        match try_decode(mode, s) {
            Err(DecodeError::InvalidEncoding(_)) | Err(DecodeError::InvalidModRM(_)) => true,
            _ => false,
        }
    }

    #[test]
    fn prefix_order_is_irrelevant() {
        let a = decode(Bits32, "66 67 01 00");
        let b = decode(Bits32, "67 66 01 00");
        assert_eq!(a.code(), Code::Add_rm16_r16);
        assert_eq!(a.code(), b.code());
        assert_eq!(a.operands(), b.operands());
        // 67 in 32-bit mode switches to the 16-bit base/index pairs.
        assert_eq!(mem_op(&a, 0).base, Some(Register::new(RegClass::Word, 3)));
    }

    #[test]
    fn lock_legality() {
        // lock add [eax], ecx
        let instr = decode(Bits32, "F0 01 08");
        assert!(instr.has_lock());
        assert!(!instr.has_invalid_lock());

        // lock with a register destination is illegal but still decodes.
        let instr = decode(Bits32, "F0 01 C8");
        assert!(!instr.has_lock());
        assert!(instr.has_invalid_lock());

        // mov never takes lock.
        let instr = decode(Bits32, "F0 89 08");
        assert!(instr.has_invalid_lock());
    }

    #[test]
    fn rex_widens_operands() {
        let instr = decode(Bits64, "48 01 C8");
        assert_eq!(instr.code(), Code::Add_rm64_r64);
        assert_eq!(reg_op(&instr, 0), Register::new(RegClass::Qword, 0)); // rax
        assert_eq!(reg_op(&instr, 1), Register::new(RegClass::Qword, 1)); // rcx

        let instr = decode(Bits64, "41 50");
        assert_eq!(instr.code(), Code::Push_r64);
        assert_eq!(reg_op(&instr, 0), Register::new(RegClass::Qword, 8)); // r8
    }

    #[test]
    fn rex_byte_register_renaming() {
        // With REX, encoding 4 is spl rather than ah.
        let instr = decode(Bits64, "40 88 E0");
        assert_eq!(reg_op(&instr, 1), Register::new(RegClass::ByteRex, 4));
        let instr = decode(Bits64, "88 E0");
        assert_eq!(reg_op(&instr, 1), Register::new(RegClass::Byte, 4));
    }

    #[test]
    fn mov_imm64() {
        let instr = decode(Bits64, "48 B8 1122334455667788");
        assert_eq!(instr.code(), Code::Mov_r64_imm64);
        assert_eq!(
            *instr.op(1),
            Operand::Imm(Immediate::Imm64(0x8877665544332211u64 as i64))
        );
        assert_eq!(instr.byte_len(), 10);
    }

    #[test]
    fn add_rax_sign_extends_imm32() {
        let instr = decode(Bits64, "48 05 FFFFFFFF");
        assert_eq!(instr.code(), Code::Add_RAX_imm32);
        assert_eq!(*instr.op(1), Operand::Imm(Immediate::Imm64(-1)));
    }

    #[test]
    fn group_11_mov() {
        let instr = decode(Bits16, "C7 00 3412");
        assert_eq!(instr.code(), Code::Mov_rm16_imm16);
        assert_eq!(*instr.op(1), Operand::Imm(Immediate::Imm16(0x1234)));
        assert_eq!(instr.byte_len(), 4);

        // Slots 1-7 of group 11 are undefined.
        assert!(decode_fails(Bits16, "C7 08 3412"));
    }

    #[test]
    fn rel8_branches() {
        let instr = decode(Bits32, "74 FE");
        assert_eq!(instr.code(), Code::Je_rel8_32);
        assert_eq!(
            *instr.op(0),
            Operand::Rel(RelOffset { offset: -2, size: OpSize::Bits8 })
        );
        let instr = decode(Bits64, "75 00");
        assert_eq!(instr.code(), Code::Jne_rel8_64);
    }

    #[test]
    fn rip_relative_mov() {
        let instr = decode(Bits64, "8B 05 01000000");
        assert_eq!(instr.code(), Code::Mov_r32_rm32);
        let mem = mem_op(&instr, 1);
        assert_eq!(mem.base, Some(Register::rip()));
        assert_eq!(mem.displ, 1);
    }

    #[test]
    fn segment_override_is_recorded() {
        let instr = decode(Bits32, "65 8B 00");
        assert_eq!(instr.segment_override(), Some(Segment::Gs));
        assert_eq!(mem_op(&instr, 1).segment, Segment::Gs);
        assert_eq!(decode(Bits32, "8B 00").segment_override(), None);
    }

    #[test]
    fn truncated_instructions_are_out_of_data() {
        for &(mode, bytes) in &[
            (Bits16, "0F"),
            (Bits16, "0F58"),
            (Bits16, "66 0F58"),
            (Bits16, "62 F14C9D 58 50"),
            (Bits16, "62 F14C"),
            (Bits32, "C5"),
            (Bits32, "C5 F0 58"),
            (Bits64, "48 B8 11223344556677"),
            (Bits32, "C7 00 34"),
            (Bits32, ""),
        ] {
            let bytes = hex(bytes);
            let mut decoder = Decoder::new(mode, &bytes);
            assert_eq!(decoder.decode(), Err(DecodeError::OutOfData));
            // Failure never advances the stream.
            assert_eq!(decoder.position(), 0);
        }
    }

    #[test]
    fn undefined_opcodes_are_invalid_encodings() {
        assert!(decode_fails(Bits32, "0F 04"));
        assert!(decode_fails(Bits32, "0F38 00 C0"));
    }

    #[test]
    fn fifteen_byte_limit() {
        // 14 size-override prefixes, an opcode and a ModRM byte: 16 bytes.
        // The 16th byte is sitting right there in the buffer, so this is an
        // invalid encoding, not an out-of-data condition.
        let mut s = "66 ".repeat(14);
        s.push_str("01 C8");
        assert!(match try_decode(Bits32, &s) {
            Err(DecodeError::InvalidEncoding(_)) => true,
            other => panic!("unexpected result {:?}", other),
        });

        // Extra bytes after the over-long instruction change nothing.
        s.push_str(" 90 90 90 90");
        let bytes = hex(&s);
        let mut decoder = Decoder::new(Bits32, &bytes);
        assert!(match decoder.decode() {
            Err(DecodeError::InvalidEncoding(_)) => true,
            other => panic!("unexpected result {:?}", other),
        });

        // 13 prefixes keep it at 15 bytes, which is fine.
        let mut s = "66 ".repeat(13);
        s.push_str("01 C8");
        assert_eq!(decode(Bits32, &s).byte_len(), 15);
    }

    #[test]
    fn streaming_decode_advances() {
        let bytes = hex("90 48 01 C8 CC");
        let mut decoder = Decoder::new(Bits64, &bytes);
        assert_eq!(decoder.decode().unwrap().code(), Code::Nopd);
        assert_eq!(decoder.position(), 1);
        assert_eq!(decoder.decode().unwrap().code(), Code::Add_rm64_r64);
        assert_eq!(decoder.position(), 4);
        assert_eq!(decoder.decode().unwrap().code(), Code::Int3);
        assert!(!decoder.can_decode());
    }

    #[test]
    fn decoding_is_deterministic() {
        let bytes = hex("62 F14C9D 58 50 01");
        let mut a = Decoder::new(Bits16, &bytes);
        let mut b = Decoder::new(Bits16, &bytes);
        assert_eq!(a.decode().unwrap(), b.decode().unwrap());
    }

    #[test]
    fn failed_attempt_reports_consumed_bytes() {
        let bytes = hex("66 0F58");
        let mut decoder = Decoder::new(Bits16, &bytes);
        assert_eq!(decoder.decode(), Err(DecodeError::OutOfData));
        // Prefix + two opcode bytes were consumed before the ModRM ran out.
        assert_eq!(decoder.last_attempt_len(), 3);
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn rex_before_vex_is_rejected() {
        assert!(decode_fails(Bits64, "48 C5 F0 58 D9"));
    }

    #[test]
    fn mandatory_prefix_before_vex_is_rejected() {
        assert!(decode_fails(Bits64, "66 C5 F0 58 D9"));
        assert!(decode_fails(Bits64, "F2 62 F14C9D 58 D3"));
    }
}
