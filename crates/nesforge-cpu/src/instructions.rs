//! 6502 Instruction implementations.
//!
//! This module contains the implementations of all 256 opcodes, including
//! official and unofficial (undocumented) instructions. Every method
//! returns the number of *extra* cycles taken beyond the base cycle count
//! already accounted for in [`crate::opcodes::OPCODE_TABLE`].

use crate::addressing::AddressingMode;
use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::status::StatusFlags;

impl Cpu {
    // =====================================================================
    // Internal helpers
    // =====================================================================

    /// Common accumulator add used by ADC/SBC and their unofficial cousins.
    fn add(&mut self, value: u8) {
        let a = u16::from(self.a);
        let v = u16::from(value);
        let c = u16::from(self.status.contains(StatusFlags::CARRY));

        let result = a + v + c;
        let result8 = result as u8;

        self.status.set_flag(StatusFlags::CARRY, result > 0xFF);
        self.status.set_flag(
            StatusFlags::OVERFLOW,
            (!(a ^ v) & (a ^ result)) & 0x80 != 0,
        );

        self.a = result8;
        self.set_zn(result8);
    }

    /// Resolve the effective address for a read-modify-write instruction and
    /// perform the unconditional dummy read hardware does for indexed modes
    /// before the real read.
    fn rmw_addr(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u16 {
        let result = mode.resolve(self.pc, self.x, self.y, bus);
        self.pc = self.pc.wrapping_add(u16::from(mode.operand_bytes()));
        if matches!(mode, AddressingMode::AbsoluteX | AddressingMode::AbsoluteY) {
            let wrong_addr = (result.base_addr & 0xFF00) | (result.addr & 0x00FF);
            let _ = bus.read(wrong_addr);
        }
        result.addr
    }

    /// Shared branch implementation. Reads the signed offset, and if
    /// `condition` holds, applies it to PC and returns the extra cycles
    /// (1 for a same-page branch, 2 if it crosses a page).
    fn branch(&mut self, bus: &mut impl Bus, condition: bool) -> u8 {
        let offset = bus.read(self.pc) as i8;
        self.pc = self.pc.wrapping_add(1);

        if !condition {
            return 0;
        }

        let old_pc = self.pc;
        let new_pc = old_pc.wrapping_add(offset as u16);
        self.pc = new_pc;

        if (old_pc & 0xFF00) != (new_pc & 0xFF00) {
            2
        } else {
            1
        }
    }

    // =====================================================================
    // Load / Store
    // =====================================================================

    pub(crate) fn lda(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.a = value;
        self.set_zn(value);
        u8::from(crossed)
    }

    pub(crate) fn ldx(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.x = value;
        self.set_zn(value);
        u8::from(crossed)
    }

    pub(crate) fn ldy(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.y = value;
        self.set_zn(value);
        u8::from(crossed)
    }

    pub(crate) fn sta(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        self.write_operand(bus, mode, self.a);
        0
    }

    pub(crate) fn stx(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        self.write_operand(bus, mode, self.x);
        0
    }

    pub(crate) fn sty(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        self.write_operand(bus, mode, self.y);
        0
    }

    // =====================================================================
    // Register transfers
    // =====================================================================

    pub(crate) fn tax(&mut self, _bus: &mut impl Bus) -> u8 {
        self.x = self.a;
        self.set_zn(self.x);
        0
    }

    pub(crate) fn tay(&mut self, _bus: &mut impl Bus) -> u8 {
        self.y = self.a;
        self.set_zn(self.y);
        0
    }

    pub(crate) fn txa(&mut self, _bus: &mut impl Bus) -> u8 {
        self.a = self.x;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn tya(&mut self, _bus: &mut impl Bus) -> u8 {
        self.a = self.y;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn tsx(&mut self, _bus: &mut impl Bus) -> u8 {
        self.x = self.sp;
        self.set_zn(self.x);
        0
    }

    pub(crate) fn txs(&mut self, _bus: &mut impl Bus) -> u8 {
        self.sp = self.x;
        0
    }

    // =====================================================================
    // Stack
    // =====================================================================

    pub(crate) fn pha(&mut self, bus: &mut impl Bus) -> u8 {
        self.push(bus, self.a);
        0
    }

    pub(crate) fn php(&mut self, bus: &mut impl Bus) -> u8 {
        let value = self.status.to_stack_byte(true);
        self.push(bus, value);
        0
    }

    pub(crate) fn pla(&mut self, bus: &mut impl Bus) -> u8 {
        self.a = self.pop(bus);
        self.set_zn(self.a);
        0
    }

    pub(crate) fn plp(&mut self, bus: &mut impl Bus) -> u8 {
        let value = self.pop(bus);
        self.status = StatusFlags::from_stack_byte(value);
        0
    }

    // =====================================================================
    // Arithmetic
    // =====================================================================

    pub(crate) fn adc(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.add(value);
        u8::from(crossed)
    }

    pub(crate) fn sbc(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.add(!value);
        u8::from(crossed)
    }

    // =====================================================================
    // Increment / Decrement
    // =====================================================================

    pub(crate) fn inc(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let result = value.wrapping_add(1);
        bus.write(addr, result);
        self.set_zn(result);
        0
    }

    pub(crate) fn dec(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let result = value.wrapping_sub(1);
        bus.write(addr, result);
        self.set_zn(result);
        0
    }

    pub(crate) fn inx(&mut self, _bus: &mut impl Bus) -> u8 {
        self.x = self.x.wrapping_add(1);
        self.set_zn(self.x);
        0
    }

    pub(crate) fn iny(&mut self, _bus: &mut impl Bus) -> u8 {
        self.y = self.y.wrapping_add(1);
        self.set_zn(self.y);
        0
    }

    pub(crate) fn dex(&mut self, _bus: &mut impl Bus) -> u8 {
        self.x = self.x.wrapping_sub(1);
        self.set_zn(self.x);
        0
    }

    pub(crate) fn dey(&mut self, _bus: &mut impl Bus) -> u8 {
        self.y = self.y.wrapping_sub(1);
        self.set_zn(self.y);
        0
    }

    // =====================================================================
    // Logic
    // =====================================================================

    pub(crate) fn and(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.a &= value;
        self.set_zn(self.a);
        u8::from(crossed)
    }

    pub(crate) fn ora(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.a |= value;
        self.set_zn(self.a);
        u8::from(crossed)
    }

    pub(crate) fn eor(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.a ^= value;
        self.set_zn(self.a);
        u8::from(crossed)
    }

    pub(crate) fn bit(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, _) = self.read_operand(bus, mode);
        self.status.set_flag(StatusFlags::ZERO, self.a & value == 0);
        self.status.set_flag(StatusFlags::OVERFLOW, value & 0x40 != 0);
        self.status.set_flag(StatusFlags::NEGATIVE, value & 0x80 != 0);
        0
    }

    // =====================================================================
    // Shifts / Rotates
    // =====================================================================

    pub(crate) fn asl_acc(&mut self, _bus: &mut impl Bus) -> u8 {
        let value = self.a;
        self.status.set_flag(StatusFlags::CARRY, value & 0x80 != 0);
        self.a = value << 1;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn asl(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        self.status.set_flag(StatusFlags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        bus.write(addr, result);
        self.set_zn(result);
        0
    }

    pub(crate) fn lsr_acc(&mut self, _bus: &mut impl Bus) -> u8 {
        let value = self.a;
        self.status.set_flag(StatusFlags::CARRY, value & 0x01 != 0);
        self.a = value >> 1;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn lsr(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        self.status.set_flag(StatusFlags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        bus.write(addr, result);
        self.set_zn(result);
        0
    }

    pub(crate) fn rol_acc(&mut self, _bus: &mut impl Bus) -> u8 {
        let value = self.a;
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        self.status.set_flag(StatusFlags::CARRY, value & 0x80 != 0);
        self.a = (value << 1) | carry_in;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn rol(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        self.status.set_flag(StatusFlags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        bus.write(addr, result);
        self.set_zn(result);
        0
    }

    pub(crate) fn ror_acc(&mut self, _bus: &mut impl Bus) -> u8 {
        let value = self.a;
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        self.status.set_flag(StatusFlags::CARRY, value & 0x01 != 0);
        self.a = (value >> 1) | (carry_in << 7);
        self.set_zn(self.a);
        0
    }

    pub(crate) fn ror(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        self.status.set_flag(StatusFlags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | (carry_in << 7);
        bus.write(addr, result);
        self.set_zn(result);
        0
    }

    // =====================================================================
    // Compare
    // =====================================================================

    pub(crate) fn cmp(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.status.set_flag(StatusFlags::CARRY, self.a >= value);
        self.set_zn(self.a.wrapping_sub(value));
        u8::from(crossed)
    }

    pub(crate) fn cpx(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.status.set_flag(StatusFlags::CARRY, self.x >= value);
        self.set_zn(self.x.wrapping_sub(value));
        u8::from(crossed)
    }

    pub(crate) fn cpy(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.status.set_flag(StatusFlags::CARRY, self.y >= value);
        self.set_zn(self.y.wrapping_sub(value));
        u8::from(crossed)
    }

    // =====================================================================
    // Branches
    // =====================================================================

    pub(crate) fn bpl(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = !self.status.contains(StatusFlags::NEGATIVE);
        self.branch(bus, condition)
    }

    pub(crate) fn bmi(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = self.status.contains(StatusFlags::NEGATIVE);
        self.branch(bus, condition)
    }

    pub(crate) fn bvc(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = !self.status.contains(StatusFlags::OVERFLOW);
        self.branch(bus, condition)
    }

    pub(crate) fn bvs(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = self.status.contains(StatusFlags::OVERFLOW);
        self.branch(bus, condition)
    }

    pub(crate) fn bcc(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = !self.status.contains(StatusFlags::CARRY);
        self.branch(bus, condition)
    }

    pub(crate) fn bcs(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = self.status.contains(StatusFlags::CARRY);
        self.branch(bus, condition)
    }

    pub(crate) fn bne(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = !self.status.contains(StatusFlags::ZERO);
        self.branch(bus, condition)
    }

    pub(crate) fn beq(&mut self, bus: &mut impl Bus) -> u8 {
        let condition = self.status.contains(StatusFlags::ZERO);
        self.branch(bus, condition)
    }

    // =====================================================================
    // Jumps / Subroutines / Interrupts
    // =====================================================================

    pub(crate) fn jmp_abs(&mut self, bus: &mut impl Bus) -> u8 {
        let lo = bus.read(self.pc);
        let hi = bus.read(self.pc.wrapping_add(1));
        self.pc = u16::from_le_bytes([lo, hi]);
        0
    }

    pub(crate) fn jmp_ind(&mut self, bus: &mut impl Bus) -> u8 {
        let lo = bus.read(self.pc);
        let hi = bus.read(self.pc.wrapping_add(1));
        let ptr = u16::from_le_bytes([lo, hi]);
        let target_lo = bus.read(ptr);
        let target_hi = if ptr & 0x00FF == 0x00FF {
            bus.read(ptr & 0xFF00)
        } else {
            bus.read(ptr.wrapping_add(1))
        };
        self.pc = u16::from_le_bytes([target_lo, target_hi]);
        0
    }

    pub(crate) fn jsr(&mut self, bus: &mut impl Bus) -> u8 {
        let lo = bus.read(self.pc);
        let hi = bus.read(self.pc.wrapping_add(1));
        let return_addr = self.pc.wrapping_add(1);
        self.push_u16(bus, return_addr);
        self.pc = u16::from_le_bytes([lo, hi]);
        0
    }

    pub(crate) fn rts(&mut self, bus: &mut impl Bus) -> u8 {
        let addr = self.pop_u16(bus);
        self.pc = addr.wrapping_add(1);
        0
    }

    pub(crate) fn rti(&mut self, bus: &mut impl Bus) -> u8 {
        let status_byte = self.pop(bus);
        self.status = StatusFlags::from_stack_byte(status_byte);
        self.pc = self.pop_u16(bus);
        0
    }

    pub(crate) fn brk(&mut self, bus: &mut impl Bus) -> u8 {
        self.pc = self.pc.wrapping_add(1); // BRK's operand byte is a padding byte.
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(true));
        self.status.insert(StatusFlags::INTERRUPT_DISABLE);
        self.pc = bus.read_u16(0xFFFE);
        self.suppress_nmi_next = true;
        0
    }

    // =====================================================================
    // Flags
    // =====================================================================

    pub(crate) fn clc(&mut self, _bus: &mut impl Bus) -> u8 {
        self.status.remove(StatusFlags::CARRY);
        0
    }

    pub(crate) fn sec(&mut self, _bus: &mut impl Bus) -> u8 {
        self.status.insert(StatusFlags::CARRY);
        0
    }

    pub(crate) fn cli(&mut self, _bus: &mut impl Bus) -> u8 {
        self.status.remove(StatusFlags::INTERRUPT_DISABLE);
        0
    }

    pub(crate) fn sei(&mut self, _bus: &mut impl Bus) -> u8 {
        self.status.insert(StatusFlags::INTERRUPT_DISABLE);
        0
    }

    pub(crate) fn clv(&mut self, _bus: &mut impl Bus) -> u8 {
        self.status.remove(StatusFlags::OVERFLOW);
        0
    }

    pub(crate) fn cld(&mut self, _bus: &mut impl Bus) -> u8 {
        self.status.remove(StatusFlags::DECIMAL);
        0
    }

    pub(crate) fn sed(&mut self, _bus: &mut impl Bus) -> u8 {
        self.status.insert(StatusFlags::DECIMAL);
        0
    }

    pub(crate) fn nop(&mut self, _bus: &mut impl Bus) -> u8 {
        0
    }

    // =====================================================================
    // Unofficial opcodes
    // =====================================================================

    pub(crate) fn lax(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.a = value;
        self.x = value;
        self.set_zn(value);
        u8::from(crossed)
    }

    pub(crate) fn sax(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        self.write_operand(bus, mode, self.a & self.x);
        0
    }

    pub(crate) fn dcp(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let result = value.wrapping_sub(1);
        bus.write(addr, result);
        self.status.set_flag(StatusFlags::CARRY, self.a >= result);
        self.set_zn(self.a.wrapping_sub(result));
        0
    }

    pub(crate) fn isc(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let result = value.wrapping_add(1);
        bus.write(addr, result);
        self.add(!result);
        0
    }

    pub(crate) fn slo(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        self.status.set_flag(StatusFlags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        bus.write(addr, result);
        self.a |= result;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn rla(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        self.status.set_flag(StatusFlags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        bus.write(addr, result);
        self.a &= result;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn sre(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        self.status.set_flag(StatusFlags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        bus.write(addr, result);
        self.a ^= result;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn rra(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let addr = self.rmw_addr(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        self.status.set_flag(StatusFlags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | (carry_in << 7);
        bus.write(addr, result);
        self.add(result);
        0
    }

    pub(crate) fn anc(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.a &= value;
        self.set_zn(self.a);
        self.status.set_flag(StatusFlags::CARRY, self.a & 0x80 != 0);
        0
    }

    pub(crate) fn alr(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.a &= value;
        self.status.set_flag(StatusFlags::CARRY, self.a & 0x01 != 0);
        self.a >>= 1;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn arr(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.a &= value;
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        self.a = (self.a >> 1) | (carry_in << 7);
        self.set_zn(self.a);
        self.status.set_flag(StatusFlags::CARRY, self.a & 0x40 != 0);
        self.status.set_flag(
            StatusFlags::OVERFLOW,
            ((self.a >> 6) ^ (self.a >> 5)) & 0x01 != 0,
        );
        0
    }

    /// XAA — highly unstable on real hardware (depends on analog bus decay).
    /// Modeled with the common deterministic approximation `A = X & imm`.
    pub(crate) fn xaa(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.a = self.x & value;
        self.set_zn(self.a);
        0
    }

    /// LXA/LAX-immediate — unstable; modeled as `A = X = imm`.
    pub(crate) fn lxa(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.a = value;
        self.x = value;
        self.set_zn(self.a);
        0
    }

    pub(crate) fn axs(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        let masked = self.a & self.x;
        self.status.set_flag(StatusFlags::CARRY, masked >= value);
        self.x = masked.wrapping_sub(value);
        self.set_zn(self.x);
        0
    }

    /// SHA/AHX — unstable; modeled as `A & X & (high_byte(addr) + 1)`.
    pub(crate) fn sha(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let result = mode.resolve(self.pc, self.x, self.y, bus);
        self.pc = self.pc.wrapping_add(u16::from(mode.operand_bytes()));
        let high = (result.addr >> 8) as u8;
        let value = self.a & self.x & high.wrapping_add(1);
        bus.write(result.addr, value);
        0
    }

    /// SHY — unstable; modeled as `Y & (high_byte(addr) + 1)`.
    pub(crate) fn shy(&mut self, bus: &mut impl Bus) -> u8 {
        let result = AddressingMode::AbsoluteX.resolve(self.pc, self.x, self.y, bus);
        self.pc = self.pc.wrapping_add(2);
        let high = (result.addr >> 8) as u8;
        let value = self.y & high.wrapping_add(1);
        bus.write(result.addr, value);
        0
    }

    /// SHX — unstable; modeled as `X & (high_byte(addr) + 1)`.
    pub(crate) fn shx(&mut self, bus: &mut impl Bus) -> u8 {
        let result = AddressingMode::AbsoluteY.resolve(self.pc, self.x, self.y, bus);
        self.pc = self.pc.wrapping_add(2);
        let high = (result.addr >> 8) as u8;
        let value = self.x & high.wrapping_add(1);
        bus.write(result.addr, value);
        0
    }

    /// TAS — unstable; modeled the same way as SHA/SHX, with SP := A & X.
    pub(crate) fn tas(&mut self, bus: &mut impl Bus) -> u8 {
        let result = AddressingMode::AbsoluteY.resolve(self.pc, self.x, self.y, bus);
        self.pc = self.pc.wrapping_add(2);
        self.sp = self.a & self.x;
        let high = (result.addr >> 8) as u8;
        let value = self.sp & high.wrapping_add(1);
        bus.write(result.addr, value);
        0
    }

    /// LAS — unstable; modeled as `A = X = SP = (value & SP)`.
    pub(crate) fn las(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        let result = value & self.sp;
        self.a = result;
        self.x = result;
        self.sp = result;
        self.set_zn(result);
        u8::from(crossed)
    }

    pub(crate) fn nop_read(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> u8 {
        let (_, crossed) = self.read_operand(bus, mode);
        u8::from(crossed)
    }

    /// JAM/KIL — halts the CPU permanently until reset.
    pub(crate) fn jam(&mut self) -> u8 {
        self.jammed = true;
        0
    }
}
