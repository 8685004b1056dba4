//! Line-oriented console over the discovery operations.
//!
//! Each round reads an operation by number or name, prompts for an address
//! when the operation needs one, and prints the result or the error. The
//! loop ends at end of input.

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::Arc;

use chainwatch_engine::TransactionDiscovery;
use chainwatch_types::Address;

const BANNER: &str = "chainwatch console

  1  GetCurrentBlock   last block reached by any scan
  2  Subscribe         start watching an address
  3  GetTransactions   transactions of a subscribed address
";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    GetCurrentBlock,
    Subscribe,
    GetTransactions,
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "GetCurrentBlock" => Ok(Operation::GetCurrentBlock),
            "2" | "Subscribe" => Ok(Operation::Subscribe),
            "3" | "GetTransactions" => Ok(Operation::GetTransactions),
            other => Err(format!("unknown operation '{other}'")),
        }
    }
}

pub struct Console<R, W> {
    discovery: Arc<dyn TransactionDiscovery>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(discovery: Arc<dyn TransactionDiscovery>, input: R, output: W) -> Self {
        Self {
            discovery,
            input,
            output,
        }
    }

    /// Run until the input is exhausted.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "{BANNER}")?;
        loop {
            write!(self.output, "Enter a name or number of operation: ")?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(());
            };
            if line.is_empty() {
                continue;
            }

            match line.parse::<Operation>() {
                Ok(op) => self.dispatch(op)?,
                Err(e) => writeln!(self.output, "Error: {e}")?,
            }
            writeln!(self.output)?;
        }
    }

    fn dispatch(&mut self, op: Operation) -> io::Result<()> {
        let outcome: Result<String, String> = match op {
            Operation::GetCurrentBlock => self
                .discovery
                .current_block()
                .map(|block| block.to_string())
                .map_err(|e| e.to_string()),
            Operation::Subscribe => match self.prompt_address("Enter subscribe address: ")? {
                Some(address) => self
                    .discovery
                    .subscribe(&address)
                    .map(|_| "true".to_string())
                    .map_err(|e| e.to_string()),
                None => return Ok(()),
            },
            Operation::GetTransactions => {
                match self.prompt_address("Enter subscriber address: ")? {
                    Some(address) => match self.discovery.transactions(&address) {
                        Ok(txs) => serde_json::to_string_pretty(&txs)
                            .map_err(|e| format!("failed to encode transactions: {e}")),
                        Err(e) => Err(e.to_string()),
                    },
                    None => return Ok(()),
                }
            }
        };

        match outcome {
            Ok(text) => writeln!(self.output, "{text}"),
            Err(e) => {
                tracing::debug!(?op, error = %e, "console operation failed");
                writeln!(self.output, "Error: {e}")
            }
        }
    }

    /// `None` when the input ended or the address did not parse; the
    /// parse error is printed.
    fn prompt_address(&mut self, prompt: &str) -> io::Result<Option<Address>> {
        writeln!(self.output, "{prompt}")?;
        self.output.flush()?;
        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        match Address::parse(&line) {
            Ok(address) => Ok(Some(address)),
            Err(e) => {
                writeln!(self.output, "Error: {e}")?;
                Ok(None)
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
