//! Interactive line loop.
//!
//! A thin front-end over [`Executor`]: it reads lines, joins multi-line
//! input (a trailing `\` continues the statement on the next line), and
//! prints each result or error. Errors never end the session.

use crate::executor::Executor;
use anyhow::Result;
use std::io::{self, BufRead, Write};

pub fn run(executor: &mut Executor) -> Result<()> {
    println!("CSVQL REPL (type '.exit' or '.quit' to stop)");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        if buffer.is_empty() {
            print!("> ");
        } else {
            print!("    ");
        }
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim_end_matches(|c| c == '\n' || c == '\r');

        if buffer.is_empty() && (line.trim() == ".exit" || line.trim() == ".quit") {
            break;
        }

        // Multi-line support
        if let Some(stripped) = line.strip_suffix('\\') {
            buffer.push_str(stripped);
            continue;
        }
        buffer.push_str(line);

        let input = std::mem::take(&mut buffer);
        if input.trim().is_empty() {
            continue;
        }

        match executor.execute(&input) {
            Ok(output) => println!("{}", output),
            Err(err) => println!("{}", err),
        }
    }

    Ok(())
}
