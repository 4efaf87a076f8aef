use std::io::{BufRead, Write};

use crate::core::conversion::Confirmation;

/// Blocking `(y) yes or (n) no` prompt. Anything else asks again; end of
/// input counts as `n`.
pub struct YesNoPrompt<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> YesNoPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirmation for YesNoPrompt<R, W> {
    fn confirm(&mut self, file_count: usize) -> std::io::Result<bool> {
        writeln!(self.output, "do you want to convert {} files?", file_count)?;

        loop {
            write!(self.output, "(y) yes or (n) no: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                writeln!(self.output, "quitting...")?;
                return Ok(false);
            }

            match line.trim_end_matches(['\r', '\n']) {
                "y" => return Ok(true),
                "n" => {
                    writeln!(self.output, "quitting...")?;
                    return Ok(false);
                }
                _ => continue,
            }
        }
    }
}
