//! Waiting for a manual precondition before the workers start.
//!
//! Some publishers only serve their pages to a logged-in session. Logging
//! in is done by a human; the collection must not start before it's done.

use std::io::{BufRead, Write};
use std::sync::Mutex;

use log::{info, trace};

use crate::errors::StartupError;

/// Blocks until an external precondition is satisfied.
pub trait StartupBarrier {
    /// Returns once the precondition is satisfied, or fails if it never will be.
    fn wait(&self) -> Result<(), StartupError>;
}

/// No precondition, the workers start right away.
pub struct NoBarrier;

impl StartupBarrier for NoBarrier {
    fn wait(&self) -> Result<(), StartupError> {
        Ok(())
    }
}

/// Asks the operator to confirm on a console that the login is done.
///
/// The confirmation is a line read from `input`. Reaching the end of the
/// input means nobody will ever confirm.
pub struct ConsoleConfirmation<R, W> {
    prompt: String,
    input: Mutex<R>,
    output: Mutex<W>,
}

impl<R: BufRead, W: Write> ConsoleConfirmation<R, W> {
    pub fn new(prompt: &str, input: R, output: W) -> Self {
        ConsoleConfirmation {
            prompt: prompt.to_string(),
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }
}

impl ConsoleConfirmation<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Reads the confirmation on the standard input.
    pub fn stdin(prompt: &str) -> Self {
        Self::new(prompt, std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> StartupBarrier for ConsoleConfirmation<R, W> {
    fn wait(&self) -> Result<(), StartupError> {
        trace!("Running ConsoleConfirmation::wait()");
        {
            let mut output = self.output.lock().unwrap_or_else(|e| e.into_inner());
            writeln!(output, "{}", self.prompt)
                .and_then(|_| output.flush())
                .map_err(|e| StartupError::LoginNotConfirmed(e.to_string()))?;
        }

        let mut line = String::new();
        let read = self
            .input
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .read_line(&mut line)
            .map_err(|e| StartupError::LoginNotConfirmed(e.to_string()))?;
        if read == 0 {
            return Err(StartupError::LoginNotConfirmed(
                "the input was closed".to_string(),
            ));
        }
        info!("Login confirmed by the operator");
        Ok(())
    }
}
