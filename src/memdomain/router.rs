/// Response router
///
/// 将按请求顺序到达的访存响应，经由标签队列归位到对应槽位的对应半边。
/// 标签下溢（无标签却有响应）属于调度器缺陷，按不变式处理。
use super::channel::MemResp;
use super::slot::SlotPool;
use super::tag::{OperandHalf, TagQueue};
use crate::builtin::{TraceRecord, Wire};
use crate::config::BLOCK_BYTES;
use crate::simulator::utils::log_config::is_fetch_log_enabled;
use crate::trace_record;
use log::trace;

pub struct ResponseRouter {
  name: String,

  // 输入：读响应
  pub resp_in: Wire<MemResp>,

  // 本条命令内已就绪的 block 数
  produced: u32,
  produced_total: u64,

  time: u64,
  records: Vec<TraceRecord>,
}

impl ResponseRouter {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      resp_in: Wire::default(),
      produced: 0,
      produced_total: 0,
      time: 0,
      records: Vec::new(),
    }
  }

  /// 新命令开始，计数清零
  pub fn begin(&mut self) {
    self.produced = 0;
  }

  pub fn produced(&self) -> u32 {
    self.produced
  }

  pub fn produced_total(&self) -> u64 {
    self.produced_total
  }

  pub fn take_records(&mut self) -> Vec<TraceRecord> {
    std::mem::take(&mut self.records)
  }

  pub fn run_step(&mut self, slots: &mut SlotPool, tags: &mut TagQueue) {
    if let Some(resp) = self.resp_in.get() {
      let resp = resp.clone();
      let Some(tag) = tags.pop() else {
        debug_assert!(false, "memory response with no pending tag");
        self.time += 1;
        return;
      };

      let slot = slots.get_mut(tag.slot);
      match tag.half {
        OperandHalf::A => {
          debug_assert_eq!(resp.len, BLOCK_BYTES);
          slot.fill_a(&resp.data[..BLOCK_BYTES]);
        },
        OperandHalf::B => {
          debug_assert_eq!(resp.len, BLOCK_BYTES);
          slot.fill_b(&resp.data[..BLOCK_BYTES]);
        },
        OperandHalf::Both => {
          debug_assert_eq!(resp.len, 2 * BLOCK_BYTES);
          slot.fill_a(&resp.data[..BLOCK_BYTES]);
          slot.fill_b(&resp.data[BLOCK_BYTES..2 * BLOCK_BYTES]);
        },
      }

      if slot.try_promote() {
        self.produced += 1;
        self.produced_total += 1;
        trace!("block ready slot={} produced={}", tag.slot, self.produced);
        if is_fetch_log_enabled() {
          trace_record!(self, "block_ready", format!("slot={} produced={}", tag.slot, self.produced));
        }
      }
    }
    self.time += 1;
  }

  pub fn reset(&mut self) {
    self.resp_in = Wire::default();
    self.produced = 0;
    self.produced_total = 0;
    self.time = 0;
    self.records.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::PAIR_BYTES;
  use crate::memdomain::tag::Tag;

  fn resp(len: usize, fill: i8) -> MemResp {
    MemResp {
      addr: 0,
      len,
      data: [fill; PAIR_BYTES],
    }
  }

  #[test]
  fn test_split_halves_promote_on_second() {
    let mut router = ResponseRouter::new("router");
    let mut slots = SlotPool::new(2);
    let mut tags = TagQueue::new(4);

    slots.get_mut(0).mark_pending();
    tags.push(Tag { slot: 0, half: OperandHalf::A });
    tags.push(Tag { slot: 0, half: OperandHalf::B });

    router.resp_in.set(resp(BLOCK_BYTES, 3));
    router.run_step(&mut slots, &mut tags);
    assert!(slots.get(0).has_a);
    assert!(!slots.get(0).valid);
    assert_eq!(router.produced(), 0);

    router.resp_in.set(resp(BLOCK_BYTES, 7));
    router.run_step(&mut slots, &mut tags);
    assert!(slots.get(0).valid);
    assert_eq!(router.produced(), 1);
    assert_eq!(slots.get(0).a_data[0], 3);
    assert_eq!(slots.get(0).b_data[0], 7);
    assert!(tags.is_empty());
  }

  #[test]
  fn test_interleaved_promotes_at_once() {
    let mut router = ResponseRouter::new("router");
    let mut slots = SlotPool::new(2);
    let mut tags = TagQueue::new(4);

    slots.get_mut(1).mark_pending();
    tags.push(Tag { slot: 1, half: OperandHalf::Both });

    let mut r = resp(PAIR_BYTES, 0);
    r.data[..BLOCK_BYTES].fill(5);
    r.data[BLOCK_BYTES..].fill(-6);
    router.resp_in.set(r);
    router.run_step(&mut slots, &mut tags);

    assert!(slots.get(1).valid);
    assert_eq!(router.produced(), 1);
    assert_eq!(slots.get(1).a_data[0], 5);
    assert_eq!(slots.get(1).b_data[0], -6);
  }

  #[test]
  fn test_idle_step_no_effect() {
    let mut router = ResponseRouter::new("router");
    let mut slots = SlotPool::new(2);
    let mut tags = TagQueue::new(4);
    router.run_step(&mut slots, &mut tags);
    assert_eq!(router.produced(), 0);
    assert!(tags.is_empty());
  }
}
