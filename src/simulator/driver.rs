/// Driver harness - 平铺驱动：打包操作数、编程寄存器、轮询完成、回读结果
///
/// 输出按 4x4 瓦片切分，每个瓦片打包整条 K-block 流，线性布局
/// （k_row_len = 0）。2D 跨步走法由测试单独覆盖。
use crate::builtin::Module;
use crate::config::{BLOCK_BYTES, BLOCK_LEN, LANES};
use crate::frontend::regs::{ctrl, offset};
use crate::frontend::FetchMode;
use crate::top::Accelerator;
use log::debug;
use std::io;

/// 软件参考实现，i32 环绕累加，与硬件语义一致
pub fn reference_matmul(a: &[i8], b: &[i8], m: usize, n: usize, k: usize) -> Vec<i32> {
  let mut c = vec![0i32; m * n];
  for i in 0..m {
    for j in 0..n {
      let mut acc: i32 = 0;
      for s in 0..k {
        acc = acc.wrapping_add(a[i * k + s] as i32 * b[s * n + j] as i32);
      }
      c[i * n + j] = acc;
    }
  }
  c
}

fn k_blocks(k: usize) -> usize {
  (k + BLOCK_LEN - 1) / BLOCK_LEN
}

/// 打包一个输出瓦片的 A 操作数流：每个 K-block 16 字节，
/// lane 为输出行，行越界或 K 越界补 0
pub fn pack_a_tile(a: &[i8], m: usize, k: usize, row0: usize) -> Vec<i8> {
  let blocks = k_blocks(k);
  let mut out = vec![0i8; blocks * BLOCK_BYTES];
  for kb in 0..blocks {
    for lane in 0..LANES {
      for elem in 0..BLOCK_LEN {
        let row = row0 + lane;
        let kk = kb * BLOCK_LEN + elem;
        if row < m && kk < k {
          out[kb * BLOCK_BYTES + lane * BLOCK_LEN + elem] = a[row * k + kk];
        }
      }
    }
  }
  out
}

/// 打包一个输出瓦片的 B 操作数流：lane 为输出列，打包时转置
pub fn pack_b_tile(b: &[i8], k: usize, n: usize, col0: usize) -> Vec<i8> {
  let blocks = k_blocks(k);
  let mut out = vec![0i8; blocks * BLOCK_BYTES];
  for kb in 0..blocks {
    for lane in 0..LANES {
      for elem in 0..BLOCK_LEN {
        let col = col0 + lane;
        let kk = kb * BLOCK_LEN + elem;
        if col < n && kk < k {
          out[kb * BLOCK_BYTES + lane * BLOCK_LEN + elem] = b[kk * n + col];
        }
      }
    }
  }
  out
}

/// 交织模式的 32 字节对流：每个 K-block 先 A 后 B
pub fn pack_pair_tile(
  a: &[i8],
  b: &[i8],
  m: usize,
  k: usize,
  n: usize,
  row0: usize,
  col0: usize,
) -> Vec<i8> {
  let a_stream = pack_a_tile(a, m, k, row0);
  let b_stream = pack_b_tile(b, k, n, col0);
  let blocks = k_blocks(k);
  let mut out = Vec::with_capacity(blocks * 2 * BLOCK_BYTES);
  for kb in 0..blocks {
    out.extend_from_slice(&a_stream[kb * BLOCK_BYTES..(kb + 1) * BLOCK_BYTES]);
    out.extend_from_slice(&b_stream[kb * BLOCK_BYTES..(kb + 1) * BLOCK_BYTES]);
  }
  out
}

#[derive(Debug)]
pub struct MatmulRun {
  pub c: Vec<i32>,
  pub steps: u64,
}

#[derive(Debug)]
pub enum RunOutcome {
  Completed(MatmulRun),
  Timeout { steps: u64 },
}

/// 任意 M x K x N 问题的完整驱动循环
///
/// budget 为整个问题所有瓦片的总步数预算。
pub fn run_matmul(
  accel: &mut Accelerator,
  mode: FetchMode,
  a: &[i8],
  b: &[i8],
  m: usize,
  n: usize,
  k: usize,
  budget: u64,
) -> io::Result<RunOutcome> {
  let mut c = vec![0i32; m * n];
  let mut steps_used: u64 = 0;

  let mut row0 = 0;
  while row0 < m {
    let tile_m = usize::min(LANES, m - row0);
    let mut col0 = 0;
    while col0 < n {
      let tile_n = usize::min(LANES, n - col0);

      stage_tile(accel, mode, a, b, m, n, k, row0, col0)?;
      debug!("tile ({}, {}) started, {} x {}", row0, col0, tile_m, tile_n);

      // 轮询状态直到 done，预算用尽则超时
      while !accel.is_done() {
        if steps_used >= budget {
          return Ok(RunOutcome::Timeout { steps: steps_used });
        }
        accel.run();
        steps_used += 1;
      }

      // 回读 16 个结果寄存器，散射有效子块
      for i in 0..tile_m {
        for j in 0..tile_n {
          let off = offset::RESULT_BASE + 4 * (i * LANES + j) as u32;
          c[(row0 + i) * n + (col0 + j)] = accel.mmio_read(off) as i32;
        }
      }

      col0 += LANES;
    }
    row0 += LANES;
  }

  Ok(RunOutcome::Completed(MatmulRun { c, steps: steps_used }))
}

/// 打包并启动一个瓦片：装载操作数镜像、写寄存器、置 start
///
/// 调用方负责确认加速器处于 done 状态（无在途访存）。
pub fn stage_tile(
  accel: &mut Accelerator,
  mode: FetchMode,
  a: &[i8],
  b: &[i8],
  m: usize,
  n: usize,
  k: usize,
  row0: usize,
  col0: usize,
) -> io::Result<()> {
  let tile_m = usize::min(LANES, m.saturating_sub(row0).max(1));
  let tile_n = usize::min(LANES, n.saturating_sub(col0).max(1));

  let (a_addr, b_addr, total_bytes) = match mode {
    FetchMode::Split => {
      let a_stream = pack_a_tile(a, m, k, row0);
      let b_stream = pack_b_tile(b, k, n, col0);
      let b_base = a_stream.len();
      let total = b_base + b_stream.len();
      check_fit(accel, total)?;
      accel.load_image(0, &a_stream);
      accel.load_image(b_base as u32, &b_stream);
      (0u32, b_base as u32, total)
    }
    FetchMode::Interleaved => {
      let pair_stream = pack_pair_tile(a, b, m, k, n, row0, col0);
      let total = pair_stream.len();
      check_fit(accel, total)?;
      accel.load_image(0, &pair_stream);
      // 交织模式下 B_ADDR 不参与取数
      (0u32, 0u32, total)
    }
  };
  debug!("staged {} operand bytes", total_bytes);

  accel.mmio_write(offset::A_ADDR, a_addr);
  accel.mmio_write(offset::B_ADDR, b_addr);
  accel.mmio_write(offset::M_DIM, tile_m as u32);
  accel.mmio_write(offset::N_DIM, tile_n as u32);
  accel.mmio_write(offset::K_DIM, k as u32);
  accel.mmio_write(offset::A_STRIDE, 0);
  accel.mmio_write(offset::K_ROW_LEN, 0);

  let mut start = ctrl::START;
  if mode == FetchMode::Interleaved {
    start |= ctrl::INTERLEAVED;
  }
  accel.mmio_write(offset::CTRL, start);

  Ok(())
}

fn check_fit(accel: &Accelerator, bytes: usize) -> io::Result<()> {
  if bytes > accel.mem_size() {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      format!("operands need {} bytes, memory holds {}", bytes, accel.mem_size()),
    ));
  }
  Ok(())
}
