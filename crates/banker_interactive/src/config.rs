//! Initial configuration of the allocation engine.
//!
//! A configuration is either read from a file:
//!
//! ```text
//! # total units of each resource type
//! TOTAL 15 8 18 7
//! # one line per customer: maximum claim | initial allocation
//! CUSTOMER 4 1 5 2 | 3 1 4 1
//! CUSTOMER 7 4 8 3 | 2 1 3 1
//! ```
//!
//! or entered interactively, one quantity per prompt.

use std::{
    collections::VecDeque,
    io::{BufRead, Write},
    path::Path,
    str::FromStr,
};

use anyhow::Context;
use banker_core::allocation::{Units, api::service::AllocationApiService, init_allocator};
use tracing::info;

use crate::{display::resource_names, parse_units};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub total_units: Vec<Units>,
    pub maximum: Vec<Vec<Units>>,
    pub allocation: Vec<Vec<Units>>,
}

impl Configuration {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read configuration '{}': {}", path.display(), e))?;
        info!("Loaded configuration from {}", path.display());
        text.parse()
    }

    /// Ask for every quantity on `output`, reading answers from `input`.
    ///
    /// Answers are whitespace-separated, so several quantities may be typed on
    /// one line.
    pub fn prompt<R: BufRead, W: Write>(
        input: R,
        output: &mut W,
        customers: usize,
        resources: usize,
    ) -> anyhow::Result<Self> {
        if customers == 0 || resources == 0 {
            return Err(anyhow::anyhow!("At least one customer and one resource type are required"));
        }
        let names = resource_names(resources);
        let mut tokens = Tokens::new(input);

        writeln!(output, "Enter the total units of each resource:")?;
        let mut total_units = Vec::with_capacity(resources);
        for name in &names {
            write!(output, "Resource {}: ", name)?;
            output.flush()?;
            total_units.push(tokens.next_units()?);
        }

        writeln!(output, "Enter the maximum resources for each customer:")?;
        let maximum = prompt_table(&mut tokens, output, customers, &names, "Max")?;
        writeln!(output, "Enter the allocated resources for each customer:")?;
        let allocation = prompt_table(&mut tokens, output, customers, &names, "Allocated")?;

        Ok(Self { total_units, maximum, allocation })
    }

    pub fn customers(&self) -> usize {
        self.maximum.len()
    }

    pub fn resources(&self) -> usize {
        self.total_units.len()
    }

    /// Validate the tables and build the allocation service.
    pub fn into_service(self) -> anyhow::Result<AllocationApiService> {
        Ok(init_allocator(self.total_units, self.maximum, self.allocation)?)
    }
}

fn prompt_table<R: BufRead, W: Write>(
    tokens: &mut Tokens<R>,
    output: &mut W,
    customers: usize,
    names: &[String],
    label: &str,
) -> anyhow::Result<Vec<Vec<Units>>> {
    let mut table = Vec::with_capacity(customers);
    for customer in 0..customers {
        writeln!(output, "Customer {}:", customer)?;
        let mut row = Vec::with_capacity(names.len());
        for name in names {
            write!(output, "  {} {}: ", label, name)?;
            output.flush()?;
            row.push(tokens.next_units()?);
        }
        table.push(row);
    }
    Ok(table)
}

/// Whitespace-separated tokens pulled lazily from line-oriented input.
struct Tokens<R> {
    input: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    fn new(input: R) -> Self {
        Self { input, pending: VecDeque::new() }
    }

    fn next_units(&mut self) -> anyhow::Result<Units> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(anyhow::anyhow!("Unexpected end of input while reading configuration"));
            }
            self.pending.extend(line.split_whitespace().map(str::to_string));
        }
        let token = self.pending.pop_front().unwrap_or_default();
        let mut units = parse_units([token.as_str()])?;
        units.pop().ok_or_else(|| anyhow::anyhow!("Missing quantity"))
    }
}

impl FromStr for Configuration {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut total_units = None;
        let mut maximum = Vec::new();
        let mut allocation = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_num = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            match keyword.to_uppercase().as_str() {
                "TOTAL" => {
                    if total_units.is_some() {
                        return Err(anyhow::anyhow!("line {}: TOTAL given twice", line_num));
                    }
                    total_units = Some(
                        parse_units(rest.split_whitespace())
                            .with_context(|| format!("line {}", line_num))?,
                    );
                }
                "CUSTOMER" => {
                    let (max, held) = rest.split_once('|').ok_or_else(|| {
                        anyhow::anyhow!("line {}: expected CUSTOMER <maximum...> | <allocation...>", line_num)
                    })?;
                    maximum.push(
                        parse_units(max.split_whitespace())
                            .with_context(|| format!("line {}", line_num))?,
                    );
                    allocation.push(
                        parse_units(held.split_whitespace())
                            .with_context(|| format!("line {}", line_num))?,
                    );
                }
                other => {
                    return Err(anyhow::anyhow!("line {}: unknown keyword {}", line_num, other));
                }
            }
        }

        let total_units = total_units.ok_or_else(|| anyhow::anyhow!("Missing TOTAL line"))?;
        Ok(Self { total_units, maximum, allocation })
    }
}
