use opal::config::AccelConfig;
use opal::frontend::FetchMode;
use opal::simulator::driver::{reference_matmul, run_matmul, RunOutcome};
use opal::simulator::utils::log::init_log;
use opal::top::Accelerator;

fn pattern_a(m: usize, k: usize) -> Vec<i8> {
  (0..m * k).map(|x| ((x * 7 + 3) % 23) as i8 - 11).collect()
}

fn pattern_b(k: usize, n: usize) -> Vec<i8> {
  (0..k * n).map(|x| ((x * 5 + 1) % 19) as i8 - 9).collect()
}

/// 在给定几何参数下跑一个问题，校验结果并返回耗费步数
fn run_case(mode: FetchMode, latency: u64, slots: usize, m: usize, n: usize, k: usize) -> u64 {
  let cfg = AccelConfig {
    mem_latency: latency,
    num_slots: slots,
    ..AccelConfig::default()
  };
  let mut accel = Accelerator::new("accel", &cfg);
  let a = pattern_a(m, k);
  let b = pattern_b(k, n);
  match run_matmul(&mut accel, mode, &a, &b, m, n, k, 1_000_000).unwrap() {
    RunOutcome::Completed(run) => {
      assert_eq!(
        run.c,
        reference_matmul(&a, &b, m, n, k),
        "wrong result for mode={:?} latency={} slots={}",
        mode,
        latency,
        slots
      );
      run.steps
    }
    RunOutcome::Timeout { steps } => {
      panic!(
        "timed out after {} steps (mode={:?} latency={} slots={})",
        steps, mode, latency, slots
      );
    }
  }
}

macro_rules! test_case {
  ($name:ident, $mode:expr, $latency:expr, $slots:expr, $m:expr, $n:expr, $k:expr) => {
    #[test]
    fn $name() {
      init_log();
      run_case($mode, $latency, $slots, $m, $n, $k);
    }
  };
}

test_case!(test_split_lat1_slots2, FetchMode::Split, 1, 2, 4, 4, 16);
test_case!(test_split_lat4_slots2, FetchMode::Split, 4, 2, 4, 4, 16);
test_case!(test_split_lat4_slots6, FetchMode::Split, 4, 6, 4, 4, 16);
test_case!(test_split_lat16_slots6, FetchMode::Split, 16, 6, 4, 4, 16);
test_case!(test_split_lat3_slots3_remainder, FetchMode::Split, 3, 3, 4, 4, 11);
test_case!(test_interleaved_lat1_slots2, FetchMode::Interleaved, 1, 2, 4, 4, 16);
test_case!(test_interleaved_lat4_slots6, FetchMode::Interleaved, 4, 6, 4, 4, 16);
test_case!(test_interleaved_lat16_slots3, FetchMode::Interleaved, 16, 3, 4, 4, 16);
test_case!(test_split_lat8_multi_tile, FetchMode::Split, 8, 6, 8, 8, 12);

#[test]
fn test_more_slots_never_slower() {
  init_log();
  // 同等延迟下加深缓冲池不应变慢
  let deep = run_case(FetchMode::Split, 8, 6, 4, 4, 32);
  let shallow = run_case(FetchMode::Split, 8, 2, 4, 4, 32);
  assert!(
    deep <= shallow,
    "6 slots took {} steps, 2 slots took {}",
    deep,
    shallow
  );
}

#[test]
fn test_latency_monotonic() {
  init_log();
  let fast = run_case(FetchMode::Split, 1, 6, 4, 4, 16);
  let slow = run_case(FetchMode::Split, 16, 6, 4, 4, 16);
  assert!(fast <= slow, "latency 1 took {} steps, latency 16 took {}", fast, slow);
}

#[test]
#[cfg(feature = "long-tests")]
fn test_dense_parameter_sweep() {
  init_log();
  // 全量参数扫描，默认不随 cargo test 运行
  for &mode in &[FetchMode::Split, FetchMode::Interleaved] {
    for &latency in &[1u64, 2, 3, 5, 8, 16, 33] {
      for &slots in &[2usize, 3, 4, 6, 8] {
        for &k in &[1usize, 4, 6, 13, 32] {
          run_case(mode, latency, slots, 4, 4, k);
        }
      }
    }
  }
}
