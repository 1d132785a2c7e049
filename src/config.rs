/// Hardware geometry and construction-time configuration
use serde::{Deserialize, Serialize};

/// 每个 K-block 的归约元素数
pub const BLOCK_LEN: usize = 4;

/// 输出 lane 数（结果栅格为 LANES x LANES）
pub const LANES: usize = 4;

/// 单个操作数 block 的字节数（LANES 个 lane，每 lane BLOCK_LEN 字节）
pub const BLOCK_BYTES: usize = LANES * BLOCK_LEN;

/// 交织模式下一次取数的字节数（A block + B block）
pub const PAIR_BYTES: usize = 2 * BLOCK_BYTES;

/// 结果寄存器个数
pub const RESULT_CELLS: usize = LANES * LANES;

/// 加速器构造参数
/// num_slots = 2 即为早期双缓冲流水，默认 6 为深流水配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccelConfig {
  pub queue_depth: usize,
  pub num_slots: usize,
  pub tag_depth: usize,
  pub mem_latency: u64,
  pub mem_size: usize,
}

impl Default for AccelConfig {
  fn default() -> Self {
    Self {
      queue_depth: 4,
      num_slots: 6,
      tag_depth: 4,
      mem_latency: 4,
      mem_size: 1 << 20,
    }
  }
}

impl AccelConfig {
  /// 校验几何参数
  pub fn validate(&self) -> Result<(), String> {
    if self.queue_depth == 0 {
      return Err("queue_depth must be at least 1".to_string());
    }
    // 流水预热需要两个有效槽位，单槽位无法满足
    if self.num_slots < 2 {
      return Err(format!("num_slots must be at least 2, got {}", self.num_slots));
    }
    if self.tag_depth == 0 {
      return Err("tag_depth must be at least 1".to_string());
    }
    if self.mem_latency == 0 {
      return Err("mem_latency must be at least 1".to_string());
    }
    if self.mem_size < PAIR_BYTES {
      return Err(format!("mem_size must be at least {} bytes", PAIR_BYTES));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config_valid() {
    assert!(AccelConfig::default().validate().is_ok());
  }

  #[test]
  fn test_single_slot_rejected() {
    let cfg = AccelConfig {
      num_slots: 1,
      ..AccelConfig::default()
    };
    assert!(cfg.validate().is_err());
  }
}
