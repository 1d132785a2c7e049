/// Operand memory with a pipelined request/response channel
use super::dram::Dram;
use crate::builtin::{Module, Wire};
use crate::config::PAIR_BYTES;
use std::collections::VecDeque;

/// 读请求：地址加取数宽度（16 或 32 字节）
#[derive(Clone, Default)]
pub struct MemReq {
  pub addr: u32,
  pub len: usize,
}

/// 读响应，按请求顺序返回
#[derive(Clone)]
pub struct MemResp {
  pub addr: u32,
  pub len: usize,
  pub data: [i8; PAIR_BYTES],
}

impl Default for MemResp {
  fn default() -> Self {
    Self {
      addr: 0,
      len: 0,
      data: [0; PAIR_BYTES],
    }
  }
}

struct Inflight {
  ready_at: u64,
  resp: MemResp,
}

/// Operand Memory - 带固定延迟的流水化取数通道
/// 每步最多接受一个请求、交付一个响应；响应严格按请求顺序
pub struct OperandMemory {
  name: String,

  // 输入：读请求
  pub req: Wire<MemReq>,

  // 输出：读响应
  pub resp: Wire<MemResp>,

  dram: Dram,
  latency: u64,
  pipe: VecDeque<Inflight>,
  step: u64,
  requests: u64,
  responses: u64,
}

impl OperandMemory {
  pub fn new(name: impl Into<String>, size: usize, latency: u64) -> Self {
    Self {
      name: name.into(),
      req: Wire::default(),
      resp: Wire::default(),
      dram: Dram::new(size),
      latency: latency.max(1),
      pipe: VecDeque::new(),
      step: 0,
      requests: 0,
      responses: 0,
    }
  }

  /// 直接写入数据（用于初始化，不经过信号线）
  pub fn load_image(&mut self, addr: usize, data: &[i8]) {
    self.dram.load(addr, data);
  }

  pub fn size(&self) -> usize {
    self.dram.size()
  }

  /// 通道内无未完成请求
  pub fn idle(&self) -> bool {
    self.pipe.is_empty()
  }

  pub fn requests(&self) -> u64 {
    self.requests
  }

  pub fn responses(&self) -> u64 {
    self.responses
  }
}

impl Module for OperandMemory {
  fn run(&mut self) {
    // 接受本步的请求（延迟 1 时同步交付）
    if let Some(r) = self.req.get() {
      let mut data = [0i8; PAIR_BYTES];
      let len = r.len.min(PAIR_BYTES);
      self.dram.read_block(r.addr, &mut data[..len]);
      self.pipe.push_back(Inflight {
        ready_at: self.step + self.latency - 1,
        resp: MemResp { addr: r.addr, len, data },
      });
      self.requests += 1;
    }

    // 队首到期则交付响应
    let due = self.pipe.front().map_or(false, |f| f.ready_at <= self.step);
    if due {
      if let Some(inflight) = self.pipe.pop_front() {
        self.resp.set(inflight.resp);
        self.responses += 1;
      }
    } else {
      self.resp.clear();
    }

    self.step += 1;
  }

  fn reset(&mut self) {
    self.req = Wire::default();
    self.resp = Wire::default();
    self.pipe.clear();
    self.dram.clear();
    self.step = 0;
    self.requests = 0;
    self.responses = 0;
  }

  fn name(&self) -> &str {
    &self.name
  }
}
