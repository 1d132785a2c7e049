/// Accelerator simulator with workload execution and stepping
use super::config::AppConfig;
use super::driver::{self, reference_matmul, RunOutcome};
use super::mode::{SimConfig, StepMode};
use super::shell::{Shell, ShellCmd};
use super::trace::TraceWriter;
use super::utils::log_config::{set_compute_log, set_fetch_log, set_mmio_log};
use super::utils::report::{print_records, print_run_report};
use super::workload::Workload;
use crate::builtin::{Module, TraceRecord};
use crate::log_info;
use crate::top::Accelerator;
use std::io::Result;
use std::path::Path;

/// 一次工作负载运行的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  Passed,
  Failed,
  TimedOut,
}

pub struct Simulator {
  config: SimConfig,
  accel: Accelerator,
  trace: Option<TraceWriter>,
}

impl Simulator {
  pub fn new(app_config: &AppConfig) -> Result<Self> {
    let config = app_config.to_sim_config();

    // 日志区域开关；quiet 下全部关闭
    set_compute_log(app_config.logging.compute && !config.quiet);
    set_fetch_log(app_config.logging.fetch && !config.quiet);
    set_mmio_log(app_config.logging.mmio && !config.quiet);

    let trace = match config.trace_file {
      Some(ref path) => Some(TraceWriter::create(Path::new(path))?),
      None => None,
    };

    let accel_config = app_config.to_accel_config();
    Ok(Self {
      config,
      accel: Accelerator::new("accel", &accel_config),
      trace,
    })
  }

  pub fn accel(&mut self) -> &mut Accelerator {
    &mut self.accel
  }

  /// 推进 n 步，落盘并返回这段时间的事件记录
  pub fn step(&mut self, n: u64) -> Result<Vec<TraceRecord>> {
    for _ in 0..n {
      self.accel.run();
    }
    self.drain_records()
  }

  /// 运行到 done。返回 false 表示预算耗尽
  pub fn run_until_done(&mut self, budget: u64) -> Result<bool> {
    let mut used: u64 = 0;
    while !self.accel.is_done() {
      if used >= budget {
        self.drain_records()?;
        return Ok(false);
      }
      self.accel.run();
      used += 1;
    }
    self.drain_records()?;
    Ok(true)
  }

  /// 按配置运行：连续模式执行工作负载，步进模式进入 shell
  pub fn run(&mut self, workload: Option<&Workload>) -> Result<Verdict> {
    match self.config.step_mode {
      StepMode::Continuous => match workload {
        Some(w) => self.run_workload(w),
        None => {
          log_info!("no workload given, nothing to run");
          Ok(Verdict::Passed)
        }
      },
      StepMode::Step => {
        // 步进模式先装载第一个瓦片再交给 shell
        if let Some(w) = workload {
          let mode = w.fetch_mode()?;
          let (a, b) = w.materialize();
          driver::stage_tile(
            &mut self.accel,
            mode,
            &a,
            &b,
            w.m as usize,
            w.n as usize,
            w.k as usize,
            0,
            0,
          )?;
          log_info!("staged first tile of '{}'", w.name);
        }
        self.shell_loop()?;
        Ok(Verdict::Passed)
      }
    }
  }

  /// 执行工作负载，与软件参考比对，打印判定行
  pub fn run_workload(&mut self, workload: &Workload) -> Result<Verdict> {
    let mode = workload.fetch_mode()?;
    let (a, b) = workload.materialize();
    let m = workload.m as usize;
    let n = workload.n as usize;
    let k = workload.k as usize;
    let budget = u64::min(workload.max_steps, self.config.max_steps);

    log_info!(
      "workload '{}': {}x{}x{} mode={}",
      workload.name,
      m,
      n,
      k,
      workload.mode
    );

    let outcome = driver::run_matmul(&mut self.accel, mode, &a, &b, m, n, k, budget)?;
    self.drain_records()?;

    let verdict = match outcome {
      RunOutcome::Completed(run) => {
        let expected = reference_matmul(&a, &b, m, n, k);
        match first_mismatch(&run.c, &expected) {
          None => {
            println!("*** PASSED *** after {} simulation steps", run.steps);
            Verdict::Passed
          }
          Some(idx) => {
            println!(
              "*** FAILED *** c[{}][{}] = {}, expected {}",
              idx / n,
              idx % n,
              run.c[idx],
              expected[idx]
            );
            Verdict::Failed
          }
        }
      }
      RunOutcome::Timeout { steps } => {
        println!("*** TIMEOUT *** after {} simulation steps", steps);
        Verdict::TimedOut
      }
    };
    println!("Total steps: {}", self.accel.steps());

    if !self.config.quiet {
      print_run_report(&self.accel.stats());
    }
    Ok(verdict)
  }

  /// 交互式单步调试循环
  pub fn shell_loop(&mut self) -> Result<()> {
    let mut shell = Shell::new()?;
    println!("Step mode - Enter steps once, 'q' quits\n");
    loop {
      match shell.read_command()? {
        ShellCmd::Step(n) => {
          let records = self.step(n)?;
          // 没配 trace 文件时事件直接打到终端
          if self.trace.is_none() && !records.is_empty() {
            print_records(&records);
          }
          log_info!("stepped {}, total {}", n, self.accel.steps());
        }
        ShellCmd::Regs => {
          print!("{}", self.accel.dump_regs());
        }
        ShellCmd::Slots => {
          print!("{}", self.accel.dump_slots());
        }
        ShellCmd::Stats => {
          print_run_report(&self.accel.stats());
        }
        ShellCmd::Continue => {
          if self.run_until_done(self.config.max_steps)? {
            log_info!("done, total {} steps", self.accel.steps());
          } else {
            log_info!("step budget exhausted, total {} steps", self.accel.steps());
          }
        }
        ShellCmd::Quit => break,
      }
    }
    self.drain_records()?;
    Ok(())
  }

  fn drain_records(&mut self) -> Result<Vec<TraceRecord>> {
    let records = self.accel.take_records();
    if let Some(ref mut writer) = self.trace {
      writer.write_records(&records)?;
    }
    Ok(records)
  }
}

fn first_mismatch(got: &[i32], expected: &[i32]) -> Option<usize> {
  got.iter().zip(expected.iter()).position(|(g, e)| g != e)
}
