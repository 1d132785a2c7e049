/// Driver-visible register surface
///
/// 命令字段寄存器为影子寄存器：仅在写入 start 位时被锁存为一条命令入队。
/// CTRL 写入的 bit1 同时选择取数模式（1 = interleaved），与 start 同一笔写入生效。
use super::cmd::{Command, FetchMode, MAX_DIM};
use log::debug;

/// 字节偏移
pub mod offset {
  pub const CTRL: u32 = 0x00;
  pub const B_ADDR: u32 = 0x04;
  pub const A_ADDR: u32 = 0x08;
  pub const M_DIM: u32 = 0x0C;
  pub const N_DIM: u32 = 0x10;
  pub const K_DIM: u32 = 0x14;
  pub const RESULT_BASE: u32 = 0x18;
  pub const RESULT_LAST: u32 = 0x54;
  pub const A_STRIDE: u32 = 0x58;
  pub const K_ROW_LEN: u32 = 0x5C;
}

/// CTRL 写位
pub mod ctrl {
  pub const START: u32 = 1 << 0;
  pub const INTERLEAVED: u32 = 1 << 1;
  pub const CLEAR_ERR: u32 = 1 << 4;
}

/// STATUS 读位
pub mod status {
  pub const BUSY: u32 = 1 << 0;
  pub const DONE: u32 = 1 << 1;
  pub const QUEUE_FULL: u32 = 1 << 2;
  pub const QUEUE_EMPTY: u32 = 1 << 3;
  pub const STICKY_ERR: u32 = 1 << 4;
}

/// 影子寄存器组
#[derive(Debug, Clone, Default)]
pub struct ShadowRegs {
  pub b_addr: u32,
  pub a_addr: u32,
  pub m: u32,
  pub n: u32,
  pub k: u32,
  pub a_stride: u32,
  pub k_row_len: u32,
  pub interleaved: bool,
}

impl ShadowRegs {
  pub fn new() -> Self {
    Self::default()
  }

  /// 写命令字段寄存器，CTRL 与结果寄存器不经过这里
  pub fn write(&mut self, off: u32, value: u32) {
    match off {
      offset::B_ADDR => self.b_addr = value,
      offset::A_ADDR => self.a_addr = value,
      offset::M_DIM => self.m = value,
      offset::N_DIM => self.n = value,
      offset::K_DIM => self.k = value,
      offset::A_STRIDE => self.a_stride = value,
      offset::K_ROW_LEN => self.k_row_len = value,
      _ => {
        // 只读或未映射的偏移，写入忽略
        debug!("ignored write to offset {:#x} (value {:#x})", off, value);
      },
    }
  }

  /// 锁存为一条命令，M/N 在此处收限到 [1, 4]
  pub fn to_command(&self) -> Command {
    Command {
      mode: if self.interleaved {
        FetchMode::Interleaved
      } else {
        FetchMode::Split
      },
      b_addr: self.b_addr,
      a_addr: self.a_addr,
      a_stride: self.a_stride,
      m: self.m.clamp(1, MAX_DIM),
      n: self.n.clamp(1, MAX_DIM),
      k: self.k,
      k_row_len: self.k_row_len,
    }
  }

  pub fn reset(&mut self) {
    *self = Self::default();
  }
}

/// 结果寄存器偏移 -> (行, 列)，偏移未对齐或越界时返回 None
pub fn result_index(off: u32) -> Option<(usize, usize)> {
  if off < offset::RESULT_BASE || off > offset::RESULT_LAST {
    return None;
  }
  let delta = off - offset::RESULT_BASE;
  if delta % 4 != 0 {
    return None;
  }
  let idx = (delta / 4) as usize;
  Some((idx / 4, idx % 4))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_shadow_latch_clamps_dims() {
    let mut sh = ShadowRegs::new();
    sh.write(offset::M_DIM, 0);
    sh.write(offset::N_DIM, 9);
    sh.write(offset::K_DIM, 12);
    let cmd = sh.to_command();
    assert_eq!(cmd.m, 1);
    assert_eq!(cmd.n, 4);
    assert_eq!(cmd.k, 12);
    assert_eq!(cmd.mode, FetchMode::Split);
  }

  #[test]
  fn test_mode_bit_selects_interleaved() {
    let mut sh = ShadowRegs::new();
    sh.interleaved = true;
    assert_eq!(sh.to_command().mode, FetchMode::Interleaved);
    sh.interleaved = false;
    assert_eq!(sh.to_command().mode, FetchMode::Split);
  }

  #[test]
  fn test_result_index_decode() {
    assert_eq!(result_index(offset::RESULT_BASE), Some((0, 0)));
    assert_eq!(result_index(offset::RESULT_BASE + 4), Some((0, 1)));
    assert_eq!(result_index(offset::RESULT_BASE + 16), Some((1, 0)));
    assert_eq!(result_index(offset::RESULT_LAST), Some((3, 3)));
    assert_eq!(result_index(offset::RESULT_BASE + 2), None);
    assert_eq!(result_index(offset::A_STRIDE), None);
    assert_eq!(result_index(offset::CTRL), None);
  }

  #[test]
  fn test_unmapped_write_ignored() {
    let mut sh = ShadowRegs::new();
    sh.write(offset::CTRL, 0xFFFF_FFFF);
    sh.write(0x80, 7);
    assert_eq!(sh.to_command().k, 0);
  }
}
