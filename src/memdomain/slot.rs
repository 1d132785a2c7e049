/// Buffer pool slots
use crate::config::BLOCK_BYTES;

/// 一个缓冲槽位，保存一个 K-block 的 A/B 操作数对
/// 生命周期：空闲 -> 请求在途(pending) -> 半边到达(has) -> 就绪(valid) -> 被消费清空
#[derive(Clone)]
pub struct Slot {
  pub a_data: [i8; BLOCK_BYTES],
  pub b_data: [i8; BLOCK_BYTES],
  pub has_a: bool,
  pub has_b: bool,
  pub pending_a: bool,
  pub pending_b: bool,
  pub valid: bool,
}

impl Default for Slot {
  fn default() -> Self {
    Self {
      a_data: [0; BLOCK_BYTES],
      b_data: [0; BLOCK_BYTES],
      has_a: false,
      has_b: false,
      pending_a: false,
      pending_b: false,
      valid: false,
    }
  }
}

impl Slot {
  /// 完全空闲，可被重新分配
  pub fn is_free(&self) -> bool {
    !self.has_a && !self.has_b && !self.pending_a && !self.pending_b && !self.valid
  }

  /// 预取分配：两个半边的请求同时标记在途
  pub fn mark_pending(&mut self) {
    debug_assert!(self.is_free(), "allocation of an occupied slot");
    self.pending_a = true;
    self.pending_b = true;
  }

  /// A 半边到达
  pub fn fill_a(&mut self, data: &[i8]) {
    debug_assert!(!self.valid, "fill into a valid slot");
    debug_assert!(self.pending_a, "A response without pending request");
    self.a_data.copy_from_slice(data);
    self.has_a = true;
    self.pending_a = false;
  }

  /// B 半边到达
  pub fn fill_b(&mut self, data: &[i8]) {
    debug_assert!(!self.valid, "fill into a valid slot");
    debug_assert!(self.pending_b, "B response without pending request");
    self.b_data.copy_from_slice(data);
    self.has_b = true;
    self.pending_b = false;
  }

  /// 两半齐备且无在途请求则标记就绪
  pub fn try_promote(&mut self) -> bool {
    if self.has_a && self.has_b && !self.pending_a && !self.pending_b {
      self.valid = true;
    }
    self.valid
  }

  /// 消费后清空，重新进入空闲态
  pub fn clear(&mut self) {
    *self = Self::default();
  }
}

/// 固定大小的槽位池
pub struct SlotPool {
  slots: Vec<Slot>,
}

impl SlotPool {
  pub fn new(num_slots: usize) -> Self {
    Self {
      slots: vec![Slot::default(); num_slots],
    }
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn get(&self, idx: usize) -> &Slot {
    &self.slots[idx]
  }

  pub fn get_mut(&mut self, idx: usize) -> &mut Slot {
    &mut self.slots[idx]
  }

  /// 就绪槽位数量
  pub fn valid_count(&self) -> usize {
    self.slots.iter().filter(|s| s.valid).count()
  }

  pub fn reset(&mut self) {
    for s in self.slots.iter_mut() {
      s.clear();
    }
  }
}
