/// Response routing tags
use std::collections::VecDeque;

/// 响应归属的操作数半边
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandHalf {
  A,
  B,
  /// 交织模式下一次响应同时携带 A/B
  Both,
}

/// 一条在途请求的路由记录
#[derive(Debug, Clone, Copy)]
pub struct Tag {
  pub slot: usize,
  pub half: OperandHalf,
}

/// 严格 FIFO 的标签队列，容量即访存通道允许的在途请求数。
/// 上溢/下溢只会由调度器缺陷引起，按不变式处理而非运行时错误。
pub struct TagQueue {
  depth: usize,
  q: VecDeque<Tag>,
}

impl TagQueue {
  pub fn new(depth: usize) -> Self {
    Self {
      depth,
      q: VecDeque::with_capacity(depth),
    }
  }

  pub fn push(&mut self, tag: Tag) {
    if self.q.len() >= self.depth {
      debug_assert!(false, "tag queue overflow (depth {})", self.depth);
      return;
    }
    self.q.push_back(tag);
  }

  pub fn pop(&mut self) -> Option<Tag> {
    self.q.pop_front()
  }

  pub fn is_empty(&self) -> bool {
    self.q.is_empty()
  }

  pub fn is_full(&self) -> bool {
    self.q.len() >= self.depth
  }

  pub fn free(&self) -> usize {
    self.depth - self.q.len()
  }

  pub fn len(&self) -> usize {
    self.q.len()
  }

  pub fn reset(&mut self) {
    self.q.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fifo_order() {
    let mut t = TagQueue::new(4);
    t.push(Tag { slot: 0, half: OperandHalf::A });
    t.push(Tag { slot: 0, half: OperandHalf::B });
    t.push(Tag { slot: 1, half: OperandHalf::A });
    assert_eq!(t.free(), 1);

    let first = t.pop().expect("tag");
    assert_eq!(first.slot, 0);
    assert_eq!(first.half, OperandHalf::A);
    let second = t.pop().expect("tag");
    assert_eq!(second.half, OperandHalf::B);
    assert_eq!(t.len(), 1);
  }

  #[test]
  fn test_capacity_tracking() {
    let mut t = TagQueue::new(2);
    assert!(!t.is_full());
    t.push(Tag { slot: 0, half: OperandHalf::Both });
    t.push(Tag { slot: 1, half: OperandHalf::Both });
    assert!(t.is_full());
    assert_eq!(t.free(), 0);
    t.pop();
    assert_eq!(t.free(), 1);
    t.reset();
    assert!(t.is_empty());
  }
}
