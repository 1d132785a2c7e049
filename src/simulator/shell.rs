use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Result};

pub enum ShellCmd {
  Step(u64), // Step N times
  Regs,
  Slots,
  Stats,
  Continue,
  Quit,
}

pub struct Shell {
  editor: DefaultEditor,
}

impl Shell {
  pub fn new() -> Result<Self> {
    let editor =
      DefaultEditor::new().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(Self { editor })
  }

  pub fn read_command(&mut self) -> Result<ShellCmd> {
    loop {
      match self.editor.readline("(opal) ") {
        Ok(line) => {
          let trimmed = line.trim();

          // Add to history if not empty
          if !trimmed.is_empty() {
            let _ = self.editor.add_history_entry(trimmed);
          }

          // Empty input: step once
          if trimmed.is_empty() {
            return Ok(ShellCmd::Step(1));
          }

          // si command: step N times, bare si steps once
          if let Some(rest) = trimmed.strip_prefix("si") {
            let num_str = rest.trim();

            if num_str.is_empty() {
              return Ok(ShellCmd::Step(1));
            }

            match num_str.parse::<u64>() {
              Ok(n) if n > 0 => return Ok(ShellCmd::Step(n)),
              Ok(_) => {
                eprintln!("Error: step count must be greater than 0");
                continue;
              }
              Err(e) => {
                eprintln!("Error: invalid number '{}': {}", num_str, e);
                continue;
              }
            }
          }

          // regs command: dump register surface
          if trimmed == "regs" {
            return Ok(ShellCmd::Regs);
          }

          // slots command: dump buffer pool state
          if trimmed == "slots" {
            return Ok(ShellCmd::Slots);
          }

          // stats command: dump run statistics
          if trimmed == "stats" {
            return Ok(ShellCmd::Stats);
          }

          // c command: run until done
          if trimmed == "c" {
            return Ok(ShellCmd::Continue);
          }

          // q command: quit
          if trimmed == "q" {
            return Ok(ShellCmd::Quit);
          }

          eprintln!(
            "Unknown command: '{}'. Use Enter or 'si N' to step, 'regs'/'slots'/'stats' to inspect, 'c' to run until done, 'q' to quit",
            trimmed
          );
        }
        Err(ReadlineError::Interrupted) => {
          // Ctrl-C: quit
          return Ok(ShellCmd::Quit);
        }
        Err(ReadlineError::Eof) => {
          // Ctrl-D: quit
          return Ok(ShellCmd::Quit);
        }
        Err(err) => {
          return Err(io::Error::new(io::ErrorKind::Other, err));
        }
      }
    }
  }
}
