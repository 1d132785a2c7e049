/// Flat operand store
use log::warn;

/// 字节编址的操作数存储，保存打包后的有符号 8 位操作数
pub struct Dram {
  bytes: Vec<i8>,
}

impl Dram {
  pub fn new(size: usize) -> Self {
    Self { bytes: vec![0; size] }
  }

  pub fn size(&self) -> usize {
    self.bytes.len()
  }

  /// 直接写入数据（用于初始化，不经过信号线）
  /// 超出容量的部分被截断
  pub fn load(&mut self, addr: usize, data: &[i8]) {
    if addr >= self.bytes.len() {
      warn!("image load at {:#x} beyond memory size {:#x}", addr, self.bytes.len());
      return;
    }
    let end = usize::min(addr + data.len(), self.bytes.len());
    if end - addr < data.len() {
      warn!(
        "image load at {:#x} truncated to {} of {} bytes",
        addr,
        end - addr,
        data.len()
      );
    }
    self.bytes[addr..end].copy_from_slice(&data[..end - addr]);
  }

  /// 读取一个 block 到 out，越界部分补 0
  pub fn read_block(&self, addr: u32, out: &mut [i8]) {
    let base = addr as usize;
    for (i, b) in out.iter_mut().enumerate() {
      *b = match self.bytes.get(base + i) {
        Some(v) => *v,
        None => 0, // 越界返回0
      };
    }
  }

  pub fn clear(&mut self) {
    self.bytes.fill(0);
  }
}
