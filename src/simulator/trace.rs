/// JSON-lines event trace output
use crate::builtin::TraceRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub struct TraceWriter {
  out: BufWriter<File>,
}

impl TraceWriter {
  pub fn create(path: &Path) -> io::Result<Self> {
    let file = File::create(path)?;
    Ok(Self {
      out: BufWriter::new(file),
    })
  }

  /// 每条记录写一行 JSON 对象
  pub fn write_records(&mut self, records: &[TraceRecord]) -> io::Result<()> {
    for record in records {
      let line = serde_json::to_string(record)?;
      writeln!(self.out, "{}", line)?;
    }
    Ok(())
  }

  pub fn flush(&mut self) -> io::Result<()> {
    self.out.flush()
  }
}

impl Drop for TraceWriter {
  fn drop(&mut self) {
    let _ = self.out.flush();
  }
}
