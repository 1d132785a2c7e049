/// Prefetch scheduler
///
/// 在访存通道允许的在途请求数与槽位可用性约束下，尽量让缓冲池保持满，
/// 并严格保持 K-block 的发出顺序。每步最多发出一个请求。
use super::channel::MemReq;
use super::slot::SlotPool;
use super::tag::{OperandHalf, Tag, TagQueue};
use crate::builtin::{TraceRecord, Wire};
use crate::config::{BLOCK_BYTES, PAIR_BYTES};
use crate::frontend::cmd::{Command, FetchMode};
use crate::simulator::utils::log_config::is_fetch_log_enabled;
use crate::trace_record;
use log::trace;
use std::collections::VecDeque;

/// 延迟补发的 B 请求（split 模式，槽位已分配）
#[derive(Debug, Clone, Copy)]
struct DeferredB {
  slot: usize,
  addr: u32,
}

pub struct PrefetchUnit {
  name: String,

  // 输出：读请求
  pub req_out: Wire<MemReq>,

  // 当前命令的取数状态
  mode: FetchMode,
  active: bool,
  a_cur: u32,
  row_base: u32,
  row_pos: u32,
  b_cur: u32,
  a_stride: u32,
  k_row_len: u32,
  k_limit: u32,
  blocks_allocated: u32,
  alloc_ptr: usize,
  pending_b: VecDeque<DeferredB>,

  time: u64,
  records: Vec<TraceRecord>,
  requests_issued: u64,
}

impl PrefetchUnit {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      req_out: Wire::default(),
      mode: FetchMode::Split,
      active: false,
      a_cur: 0,
      row_base: 0,
      row_pos: 0,
      b_cur: 0,
      a_stride: 0,
      k_row_len: 0,
      k_limit: 0,
      blocks_allocated: 0,
      alloc_ptr: 0,
      pending_b: VecDeque::new(),
      time: 0,
      records: Vec::new(),
      requests_issued: 0,
    }
  }

  /// 锁存一条命令，重置取数游标
  pub fn begin(&mut self, cmd: &Command) {
    self.mode = cmd.mode;
    self.a_cur = cmd.a_addr;
    self.row_base = cmd.a_addr;
    self.row_pos = 0;
    self.b_cur = cmd.b_addr;
    self.a_stride = cmd.a_stride;
    self.k_row_len = cmd.k_row_len;
    self.k_limit = cmd.k_limit();
    self.blocks_allocated = 0;
    self.alloc_ptr = 0;
    self.pending_b.clear();
    self.active = true;
  }

  pub fn requests_issued(&self) -> u64 {
    self.requests_issued
  }

  pub fn take_records(&mut self) -> Vec<TraceRecord> {
    std::mem::take(&mut self.records)
  }

  /// A 地址步进：行末跳 stride，否则线性前进一个 block
  /// k_row_len 为 0 表示纯线性寻址
  fn advance_a(&mut self, width: u32) {
    self.row_pos += 1;
    if self.k_row_len > 0 && self.row_pos >= self.k_row_len {
      self.row_base = self.row_base.wrapping_add(self.a_stride);
      self.a_cur = self.row_base;
      self.row_pos = 0;
    } else {
      self.a_cur = self.a_cur.wrapping_add(width);
    }
  }

  /// 单步调度。一次最多发出一个请求：
  /// 1) 优先补发已分配槽位的 B 请求，保证在途槽位数有界
  /// 2) 否则在标签与槽位都可用时分配下一个 K-block
  pub fn run_step(&mut self, slots: &mut SlotPool, tags: &mut TagQueue) {
    self.req_out.clear();
    if self.active {
      self.schedule(slots, tags);
    }
    self.time += 1;
  }

  fn schedule(&mut self, slots: &mut SlotPool, tags: &mut TagQueue) {
    // 1) 已分配槽位的 B 请求优先
    if let Some(d) = self.pending_b.front().copied() {
      if tags.is_full() {
        return; // 在途请求额度用尽，等待
      }
      self.pending_b.pop_front();
      self.req_out.set(MemReq {
        addr: d.addr,
        len: BLOCK_BYTES,
      });
      tags.push(Tag {
        slot: d.slot,
        half: OperandHalf::B,
      });
      self.requests_issued += 1;
      trace!("prefetch B slot={} addr={:#x}", d.slot, d.addr);
      if is_fetch_log_enabled() {
        trace_record!(self, "issue_b", format!("slot={} addr={:#x}", d.slot, d.addr));
      }
      return;
    }

    // 2) 分配新槽位
    if self.blocks_allocated >= self.k_limit {
      return; // 所有 K-block 已发出
    }
    if tags.is_full() {
      return;
    }
    let slot = self.alloc_ptr;
    if !slots.get(slot).is_free() {
      return; // 下一个环上槽位尚未被消费
    }

    slots.get_mut(slot).mark_pending();
    match self.mode {
      FetchMode::Split => {
        self.req_out.set(MemReq {
          addr: self.a_cur,
          len: BLOCK_BYTES,
        });
        tags.push(Tag {
          slot,
          half: OperandHalf::A,
        });
        trace!("prefetch A slot={} addr={:#x}", slot, self.a_cur);
        if is_fetch_log_enabled() {
          trace_record!(self, "issue_a", format!("slot={} addr={:#x}", slot, self.a_cur));
        }
        self.pending_b.push_back(DeferredB {
          slot,
          addr: self.b_cur,
        });
        self.b_cur = self.b_cur.wrapping_add(BLOCK_BYTES as u32);
        self.advance_a(BLOCK_BYTES as u32);
      },
      FetchMode::Interleaved => {
        // 单次取数携带 A/B 两半，地址走 A 流
        self.req_out.set(MemReq {
          addr: self.a_cur,
          len: PAIR_BYTES,
        });
        tags.push(Tag {
          slot,
          half: OperandHalf::Both,
        });
        trace!("prefetch AB slot={} addr={:#x}", slot, self.a_cur);
        if is_fetch_log_enabled() {
          trace_record!(self, "issue_pair", format!("slot={} addr={:#x}", slot, self.a_cur));
        }
        self.advance_a(PAIR_BYTES as u32);
      },
    }
    self.requests_issued += 1;
    self.blocks_allocated += 1;
    self.alloc_ptr = (self.alloc_ptr + 1) % slots.len();
  }

  pub fn reset(&mut self) {
    self.req_out = Wire::default();
    self.active = false;
    self.a_cur = 0;
    self.row_base = 0;
    self.row_pos = 0;
    self.b_cur = 0;
    self.a_stride = 0;
    self.k_row_len = 0;
    self.k_limit = 0;
    self.blocks_allocated = 0;
    self.alloc_ptr = 0;
    self.pending_b.clear();
    self.time = 0;
    self.records.clear();
    self.requests_issued = 0;
  }
}
