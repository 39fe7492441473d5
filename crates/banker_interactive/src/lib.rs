//! Instruction interpreter for the allocation engine.
//!
//! This module provides a small command language mapped one-to-one onto the
//! engine operations. Instructions follow the format:
//!
//! `ACTION [customer units...]`
//!
//! where:
//! - ACTION := "RQ" | "RL" | "CS" | "SAFE" | "DETECT" | "RESOLVE" | "STATE" | "HELP" | "EXIT"
//! - customer := customer index, starting at 0
//! - units := one non-negative quantity per resource type
//!
//! Examples:
//! - `RQ 0 1 0 1 1`
//! - `RL 0 4 1 5 2`
//! - `CS`

pub mod config;
pub mod display;

use std::{convert::TryFrom, io::Write};

use banker_core::allocation::{
    Units,
    api::{AllocationRequest, AllocationResponse, Resolution, service::AllocationApiService},
    core::victim::{AscendingIndex, DeadlockedOnly},
    error::AllocationError,
};
use clap::ValueEnum;
use tower::Service;
use tracing::debug;

/// Represents a command action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Nil,
    Request,
    Release,
    CheckState,
    Safe,
    Detect,
    Resolve,
    State,
    Help,
    Exit,
}

impl Command {
    /// Parse a command from a string
    fn parse(s: &str) -> anyhow::Result<Self> {
        match s.to_uppercase().as_str() {
            "RQ" | "REQUEST" => Ok(Command::Request),
            "RL" | "RELEASE" => Ok(Command::Release),
            "CS" | "CHECK" => Ok(Command::CheckState),
            "SAFE" => Ok(Command::Safe),
            "DETECT" => Ok(Command::Detect),
            "RESOLVE" => Ok(Command::Resolve),
            "STATE" | "*" => Ok(Command::State),
            "HELP" | "H" | "?" => Ok(Command::Help),
            "EXIT" | "QUIT" | "Q" => Ok(Command::Exit),
            _ => Err(anyhow::anyhow!("Unknown command: {}", s)),
        }
    }

    fn takes_units(&self) -> bool {
        matches!(self, Command::Request | Command::Release)
    }
}

/// Represents a complete instruction: ACTION [customer units...]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub command: Command,
    pub target: Target,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    Units {
        customer: usize,
        units: Vec<Units>,
    },
    #[default]
    None,
}

/// Parse whitespace-separated quantities, rejecting negative values.
pub fn parse_units<'a>(tokens: impl IntoIterator<Item = &'a str>) -> anyhow::Result<Vec<Units>> {
    tokens.into_iter().map(parse_quantity).collect()
}

fn parse_quantity(token: &str) -> anyhow::Result<Units> {
    let value: i64 =
        token.parse().map_err(|_| anyhow::anyhow!("Invalid quantity: {}", token))?;
    if value < 0 {
        return Err(anyhow::anyhow!("Invalid quantity: {} is negative", value));
    }
    Units::try_from(value).map_err(|_| anyhow::anyhow!("Invalid quantity: {} is too large", value))
}

impl TryFrom<&str> for Instruction {
    type Error = anyhow::Error;

    /// Parse an instruction string in the format "ACTION [customer units...]"
    ///
    /// # Examples
    /// - `RQ 1 0 2 0 1`
    /// - `detect`
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let s = s.trim();

        // Skip empty lines and comments
        if s.is_empty() || s.starts_with('#') {
            return Ok(Instruction { command: Command::Nil, target: Default::default() });
        }

        let mut parts = s.split_whitespace();
        let action = parts.next().ok_or_else(|| anyhow::anyhow!("Invalid instruction format"))?;
        let command = Command::parse(action)?;
        let args: Vec<&str> = parts.collect();

        let target = if command.takes_units() {
            let Some((customer, units)) = args.split_first() else {
                return Err(anyhow::anyhow!("{} requires a customer and quantities", action));
            };
            if units.is_empty() {
                return Err(anyhow::anyhow!("{} requires at least one quantity", action));
            }
            let customer = customer
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("Invalid customer number: {}", customer))?;
            Target::Units { customer, units: parse_units(units.iter().copied())? }
        } else if !args.is_empty() {
            return Err(anyhow::anyhow!(
                "Invalid number of arguments for command: {}, expected 0, got {}",
                action,
                args.len()
            ));
        } else {
            Target::None
        };

        Ok(Instruction { command, target })
    }
}

impl TryFrom<String> for Instruction {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Instruction, anyhow::Error> {
        Instruction::try_from(s.as_str())
    }
}

/// Victim selection order for deadlock resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum VictimOrder {
    /// Preempt every customer in ascending index order
    #[default]
    Ascending,
    /// Preempt only customers that cannot finish, in ascending index order
    Deadlocked,
}

impl VictimOrder {
    pub fn apply(self, service: AllocationApiService) -> AllocationApiService {
        match self {
            VictimOrder::Ascending => service.with_victim_policy(AscendingIndex),
            VictimOrder::Deadlocked => service.with_victim_policy(DeadlockedOnly),
        }
    }
}

/// Whether the command loop should keep reading instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Runs instructions against an allocation service and reports outcomes.
#[derive(Debug)]
pub struct Session {
    service: AllocationApiService,
    names: Vec<String>,
}

impl Session {
    pub fn new(service: AllocationApiService) -> anyhow::Result<Self> {
        let resources = service.with_engine(|engine| engine.resources())?;
        Ok(Self { service, names: display::resource_names(resources) })
    }

    async fn call(&mut self, request: AllocationRequest) -> Result<AllocationResponse, AllocationError> {
        debug!("[session] {:?}", request);
        self.service.call(request).await
    }

    /// Execute an instruction, writing user-facing output to `out`.
    ///
    /// Denied requests and releases are reported and are not errors.
    pub async fn execute<W: Write>(
        &mut self,
        instruction: &Instruction,
        out: &mut W,
    ) -> anyhow::Result<Flow> {
        match (&instruction.command, &instruction.target) {
            (Command::Nil, _) => {}
            (Command::Request, Target::Units { customer, units }) => {
                let request = AllocationRequest::Request { customer: *customer, units: units.clone() };
                match self.call(request).await {
                    Ok(_) => {
                        writeln!(out, "✓ Request granted.")?;
                        self.report_safety(out).await?;
                    }
                    Err(AllocationError::InternalError) => return Err(AllocationError::InternalError.into()),
                    Err(e) => writeln!(out, "✗ Request denied: {}", e)?,
                }
            }
            (Command::Release, Target::Units { customer, units }) => {
                let request = AllocationRequest::Release { customer: *customer, units: units.clone() };
                match self.call(request).await {
                    Ok(_) => {
                        writeln!(out, "✓ Resources released.")?;
                        self.report_safety(out).await?;
                    }
                    Err(AllocationError::InternalError) => return Err(AllocationError::InternalError.into()),
                    Err(e) => writeln!(out, "✗ Release denied: {}", e)?,
                }
            }
            (Command::Request | Command::Release, Target::None) => {
                return Err(anyhow::anyhow!("RQ/RL require a customer and quantities"));
            }
            (Command::CheckState, _) => {
                self.print_state(out).await?;
                if self.deadlocked(out).await? {
                    writeln!(out, "Deadlock detected! Resolving...")?;
                    self.resolve(out).await?;
                } else {
                    writeln!(out, "No deadlock detected.")?;
                }
            }
            (Command::Safe, _) => self.report_safety(out).await?,
            (Command::Detect, _) => {
                if !self.deadlocked(out).await? {
                    writeln!(out, "No deadlock detected.")?;
                }
            }
            (Command::Resolve, _) => self.resolve(out).await?,
            (Command::State, _) => self.print_state(out).await?,
            (Command::Help, _) => print_help(out)?,
            (Command::Exit, _) => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    async fn report_safety<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        match self.call(AllocationRequest::CheckSafety).await? {
            AllocationResponse::Safety { safe: true, sequence } => writeln!(
                out,
                "System is in a safe state (sequence: {}).",
                display::customer_list(&sequence)
            )?,
            AllocationResponse::Safety { safe: false, .. } => {
                writeln!(out, "System is not in a safe state.")?
            }
            other => return Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
        }
        Ok(())
    }

    /// Reports deadlocked customers, if any, and returns whether there are some.
    async fn deadlocked<W: Write>(&mut self, out: &mut W) -> anyhow::Result<bool> {
        match self.call(AllocationRequest::DetectDeadlock).await? {
            AllocationResponse::Deadlock { deadlocked } if deadlocked.is_empty() => Ok(false),
            AllocationResponse::Deadlock { deadlocked } => {
                writeln!(
                    out,
                    "Customers unable to finish: {}",
                    display::customer_list(&deadlocked)
                )?;
                Ok(true)
            }
            other => Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
        }
    }

    async fn resolve<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        let resolution = match self.call(AllocationRequest::ResolveDeadlock).await? {
            AllocationResponse::Resolution(resolution) => resolution,
            other => return Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
        };
        for customer in resolution.preempted() {
            writeln!(out, "Preempted resources from customer {}.", customer)?;
        }
        match resolution {
            Resolution::Resolved { .. } => writeln!(out, "✓ Deadlock resolved.")?,
            Resolution::Unresolved { .. } => writeln!(out, "✗ Failed to resolve deadlock.")?,
        }
        Ok(())
    }

    async fn print_state<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        match self.call(AllocationRequest::Snapshot).await? {
            AllocationResponse::Snapshot(snapshot) => {
                display::write_snapshot(out, &snapshot, &self.names)?;
                Ok(())
            }
            other => Err(anyhow::anyhow!("Unexpected response: {:?}", other)),
        }
    }
}

fn print_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Available instructions:")?;
    writeln!(out, "Allocation operations:")?;
    writeln!(out, " $ RQ <customer> <units...>        # Request units for a customer")?;
    writeln!(out, " $ RL <customer> <units...>        # Release units held by a customer")?;
    writeln!(out)?;
    writeln!(out, "Inspection:")?;
    writeln!(out, " $ CS                              # Show state, detect and resolve deadlock")?;
    writeln!(out, " $ SAFE                            # Check safety and print a safe sequence")?;
    writeln!(out, " $ DETECT                          # List customers that can never finish")?;
    writeln!(out, " $ RESOLVE                         # Preempt customers until no deadlock remains")?;
    writeln!(out, " $ STATE                           # Show the allocation tables")?;
    writeln!(out)?;
    writeln!(out, "Utility:")?;
    writeln!(out, " $ HELP                            # Show this help message")?;
    writeln!(out, " $ EXIT                            # Leave the session")?;
    writeln!(out, " $ # [comment]                     # Comment line")?;
    writeln!(out)?;
    writeln!(out, "Units are given once per resource type, in order: RQ 0 1 0 2 1")?;
    writeln!(out)?;
    Ok(())
}
